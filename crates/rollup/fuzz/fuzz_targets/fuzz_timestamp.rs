//! Fuzz target for the lenient timestamp parser.
//!
//! Regex-guarded format probing must not panic or hang on pathological input.

#![no_main]

use libfuzzer_sys::fuzz_target;
use rollup::inference::{parse_number, parse_timestamp};

fuzz_target!(|data: &[u8]| {
    if data.len() > 1_000 {
        return;
    }

    if let Ok(text) = std::str::from_utf8(data) {
        let _ = parse_timestamp(text);
        let _ = parse_number(text);
    }
});
