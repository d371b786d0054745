//! Fuzz target for ASN database CSV loading.
//!
//! Tests that table loading handles arbitrary input without panicking; a
//! bad row must abort the load with an error, never a partial table.

#![no_main]

use connstat::AsnTable;
use libfuzzer_sys::fuzz_target;
use std::io::Cursor;

fuzz_target!(|data: &[u8]| {
    let _ = AsnTable::from_reader(Cursor::new(data));
});
