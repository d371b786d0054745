//! Fuzz target for socket-table parsing.
//!
//! Tests that /proc/net/tcp-format parsing handles arbitrary input without
//! panicking; malformed tables must come back as errors.

#![no_main]

use connstat::parse_socket_table;
use libfuzzer_sys::fuzz_target;
use std::io::Cursor;

fuzz_target!(|data: &[u8]| {
    let _ = parse_socket_table(Cursor::new(data));
});
