//! Fuzz target for the delimited-text parser.
//!
//! The parser must never panic on malformed input, and whatever it accepts
//! must profile and aggregate without panicking.

#![no_main]

use libfuzzer_sys::fuzz_target;
use rollup::input::Parser;
use rollup::{PipelineConfig, Rollup};

fuzz_target!(|data: &[u8]| {
    // Only process reasonable-sized inputs to avoid OOM
    if data.len() > 100_000 {
        return;
    }

    let Ok((table, _)) = Parser::new().parse_bytes(data) else {
        return;
    };

    let rollup = Rollup::new();
    let _ = rollup.profile(&table);

    if let [x, y, ..] = table.headers.as_slice() {
        let config = PipelineConfig::new(x.clone()).metric(y.clone());
        let _ = rollup.run(&table, &config);
    }
});
