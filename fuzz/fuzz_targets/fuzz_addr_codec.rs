//! Fuzz target for the packed hexadecimal endpoint codec.

#![no_main]

use connstat::decode_addr;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if let Ok(s) = std::str::from_utf8(data) {
        let _ = decode_addr(s);
    }
});
