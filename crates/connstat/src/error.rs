//! Error types for socket classification.
//!
//! Every variant here is fatal to the operation that encountered it: a
//! failed ASN-table load aborts collector construction (no cycles ever
//! run), and a failed socket-table parse aborts the current collection
//! cycle with no partial counts. A remote address that no ASN range claims
//! is not an error; it lands in the `_other` bucket.

use std::io;
use thiserror::Error;

/// Result type alias for connstat operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Unified error type for socket classification.
#[derive(Error, Debug)]
pub enum Error {
    /// A socket-table or ASN-table source could not be opened.
    #[error("cannot open {name}: {source}")]
    SourceUnavailable {
        name: String,
        #[source]
        source: io::Error,
    },

    /// A socket-table line split into fewer than the 12 required fields.
    #[error("socket table: not enough fields: {count}, {fields:?}")]
    NotEnoughFields { count: usize, fields: Vec<String> },

    /// A packed `hexaddr:hexport` endpoint failed to decode.
    #[error("socket table: bad address string: {0:?}")]
    MalformedAddress(String),

    /// A state code was not valid hex or indexes past the state-name table.
    #[error("socket table: invalid state code: {0:?}")]
    InvalidStateCode(String),

    /// A network string was not valid CIDR notation.
    #[error("invalid network: {0:?}")]
    InvalidNetwork(String),

    /// An ASN-table row could not be used: bad network field or too few
    /// columns. The whole load aborts; no partial table is produced.
    #[error("asn table row {line}: invalid record: {value:?}")]
    MalformedAsnRow { line: usize, value: String },

    /// Read failure partway through an already-open source.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages_carry_context() {
        let err = Error::NotEnoughFields {
            count: 3,
            fields: vec!["0:".into(), "ab".into(), "cd".into()],
        };
        let msg = err.to_string();
        assert!(msg.contains("not enough fields: 3"));
        assert!(msg.contains("ab"));

        let err = Error::MalformedAsnRow {
            line: 7,
            value: "300.0.0.0/8".into(),
        };
        assert!(err.to_string().contains("row 7"));
        assert!(err.to_string().contains("300.0.0.0/8"));
    }
}
