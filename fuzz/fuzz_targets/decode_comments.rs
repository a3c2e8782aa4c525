#![no_main]

use libfuzzer_sys::fuzz_target;
use reten_core::Comment;

// Comment threads are persisted as JSON arrays. Decoding arbitrary bytes
// must never panic, and anything that decodes must re-encode and decode to
// the same thread in the same order.
fuzz_target!(|data: &[u8]| {
    let Ok(comments) = serde_json::from_slice::<Vec<Comment>>(data) else {
        return;
    };

    let encoded = serde_json::to_string(&comments).expect("encode decoded comments");
    let decoded: Vec<Comment> = serde_json::from_str(&encoded).expect("decode re-encoded");
    assert_eq!(comments, decoded);
});
