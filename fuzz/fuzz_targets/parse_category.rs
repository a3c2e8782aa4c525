#![no_main]

use libfuzzer_sys::fuzz_target;
use reten_core::Category;

// Category parsing must never panic, and anything it accepts must survive
// a display/parse round trip.
fuzz_target!(|data: &[u8]| {
    let Ok(input) = std::str::from_utf8(data) else {
        return;
    };

    if let Ok(category) = input.parse::<Category>() {
        let reparsed: Category = category
            .to_string()
            .parse()
            .expect("displayed category parses back");
        assert_eq!(category, reparsed);
    }
});
