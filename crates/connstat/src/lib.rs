//! Open-socket classification by TCP state and remote-peer ASN.
//!
//! This crate is the data-collection core of a netstat-style metrics
//! collector: it parses the kernel's socket tables (`/proc/net/tcp`,
//! `/proc/net/tcp6`), classifies each remote peer against a statically
//! loaded ASN ownership table, and aggregates per-cycle counts keyed by
//! (AS name, connection state, address family). The enclosing exporter
//! process owns scheduling, source locations, and metric transmission.
//!
//! Flow per collection cycle:
//! 1. [`socket_table`] parses one table per address family, decoding the
//!    packed hex endpoints via [`addr`]. Any malformed line fails the cycle.
//! 2. [`collect::aggregate`] folds the records into a fresh
//!    [`CountTable`], routing unclaimed peers to the `_other` bucket.
//! 3. The resulting [`SocketMetric`] rows go to the host's emission
//!    pipeline and the table is dropped; no state crosses cycles.
//!
//! The ASN table is loaded once before the first cycle and never mutated,
//! so concurrent cycles can share it freely. Lookup is first-match in file
//! order, deliberately not longest-prefix-match.

pub mod addr;
pub mod asn;
pub mod collect;
pub mod error;
#[cfg(feature = "metrics")]
pub mod metrics;
pub mod socket_table;

pub use addr::{decode_addr, encode_addr};
pub use asn::{AsnRecord, AsnTable, IpNetwork};
pub use collect::{
    aggregate, AddressFamily, ConnstatCollector, CountTable, SocketMetric, OTHER_OWNER,
};
pub use error::{Error, Result};
pub use socket_table::{
    parse_socket_table, parse_socket_table_content, state_name, SocketRecord, SOCKET_STATES,
};
