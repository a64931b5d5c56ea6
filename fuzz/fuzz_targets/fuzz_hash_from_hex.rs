//! Fuzz target for Hash256::from_hex.

#![no_main]

use libfuzzer_sys::fuzz_target;
use vuser_crypto::Hash256;

fuzz_target!(|data: &[u8]| {
    let Ok(text) = std::str::from_utf8(data) else {
        return;
    };

    if let Ok(hash) = Hash256::from_hex(text) {
        assert_eq!(Hash256::from_hex(&hash.to_hex()).unwrap(), hash);
    }
});
