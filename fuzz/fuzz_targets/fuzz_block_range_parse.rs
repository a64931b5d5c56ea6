//! Fuzz target for sidechain block range parsing.
//!
//! Header verification parses untrusted range strings; it must never panic.

#![no_main]

use libfuzzer_sys::fuzz_target;
use vuser_chain::{format_block_range, parse_block_range};

fuzz_target!(|data: &[u8]| {
    let Ok(text) = std::str::from_utf8(data) else {
        return;
    };

    if let Ok((start, end)) = parse_block_range(text) {
        // Whatever parsed must format back to something that parses the same.
        let formatted = format_block_range(start, end);
        assert_eq!(parse_block_range(&formatted).unwrap(), (start, end));
    }
});
