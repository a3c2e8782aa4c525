#![no_main]

use libfuzzer_sys::fuzz_target;
use reten_core::store::migrations;
use reten_core::{ReportId, ReportStore, SqliteReportStore};
use rusqlite::{Connection, params};

// A row written by another (possibly buggy) client may carry mangled JSON in
// the voter_tokens and comments columns. Loading such a row must surface a
// typed error, never panic.
fuzz_target!(|data: &[u8]| {
    let split = data.len() / 2;
    let voter_tokens = String::from_utf8_lossy(&data[..split]).into_owned();
    let comments = String::from_utf8_lossy(&data[split..]).into_owned();

    let dir = tempfile::tempdir().expect("create temp dir");
    let path = dir.path().join("fuzz.sqlite3");

    {
        let mut conn = Connection::open(&path).expect("open raw connection");
        migrations::migrate(&mut conn).expect("migrate");
        conn.execute(
            "INSERT INTO reports
                 (report_id, lat, lng, category, author_token,
                  confirmations, voter_tokens, comments, created_at_us)
             VALUES ('rt-0123456789ab', 4.711, -74.0721, 'unspecified', 'tok',
                     1, ?1, ?2, 0)",
            params![voter_tokens, comments],
        )
        .expect("insert mangled row");
    }

    let store = SqliteReportStore::open(&path).expect("open store");
    let _ = store.fetch(&ReportId::new("rt-0123456789ab"));
});
