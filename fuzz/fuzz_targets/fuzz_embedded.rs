//! Runs arbitrary text through extraction, normalization and a session.
//!
//! None of the stages may panic, and normalization must be idempotent.

#![no_main]

use libfuzzer_sys::fuzz_target;
use tablescope_core::{extract_embedded_sql, normalize, LineageSession};

fuzz_target!(|data: &[u8]| {
    if let Ok(source) = std::str::from_utf8(data) {
        let sql = normalize(&extract_embedded_sql(source));
        assert_eq!(normalize(&sql), sql);

        let mut session = LineageSession::new();
        let _ = session.parse_embedded_code(source);
    }
});
