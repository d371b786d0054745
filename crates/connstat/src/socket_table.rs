//! Parser for the kernel's line-oriented socket table format
//! (`/proc/net/tcp`, `/proc/net/tcp6`).
//!
//! The first line is a header and is skipped without validation. Every
//! later line must split into at least 12 whitespace-separated fields after
//! inline `#` comments are stripped; field 2 is the remote `hexaddr:hexport`
//! endpoint and field 3 the hex connection-state code. Any malformed line
//! fails the whole parse: a socket table the kernel printed wrong signals an
//! environment problem, not a per-record condition worth skipping.

use std::io::BufRead;
use std::net::IpAddr;

use serde::{Deserialize, Serialize};

use crate::addr::decode_addr;
use crate::error::{Error, Result};

/// Connection-state names indexed by the kernel's state code.
pub const SOCKET_STATES: [&str; 12] = [
    "UNKNOWN",
    "ESTABLISHED",
    "SYN_SENT",
    "SYN_RECV",
    "FIN_WAIT1",
    "FIN_WAIT2",
    "TIME_WAIT",
    "_close",
    "CLOSE_WAIT",
    "LAST_ACK",
    "LISTEN",
    "CLOSING",
];

/// Bounds-checked lookup of a state code's name.
pub fn state_name(code: u8) -> Result<&'static str> {
    SOCKET_STATES
        .get(usize::from(code))
        .copied()
        .ok_or_else(|| Error::InvalidStateCode(code.to_string()))
}

/// One decoded socket-table row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SocketRecord {
    /// Remote peer address.
    pub remote_ip: IpAddr,
    /// Remote peer port. Decoded for completeness; classification ignores it.
    pub remote_port: u16,
    /// Connection-state code, already validated against [`SOCKET_STATES`].
    pub state: u8,
}

impl SocketRecord {
    /// Name of this record's connection state.
    pub fn state_name(&self) -> &'static str {
        SOCKET_STATES[usize::from(self.state)]
    }
}

/// Parse a socket table from an already-open reader.
///
/// Returns every data row, or the first error encountered. No partial
/// results are produced for a failed parse.
pub fn parse_socket_table<R: BufRead>(reader: R) -> Result<Vec<SocketRecord>> {
    let mut records = Vec::new();
    for (index, line) in reader.lines().enumerate() {
        let line = line?;
        if index == 0 {
            // Header line, skipped unconditionally.
            continue;
        }
        records.push(parse_line(&line)?);
    }
    Ok(records)
}

/// Parse socket table text held in memory.
pub fn parse_socket_table_content(content: &str) -> Result<Vec<SocketRecord>> {
    parse_socket_table(std::io::Cursor::new(content))
}

fn parse_line(line: &str) -> Result<SocketRecord> {
    let line = match line.find('#') {
        Some(i) => &line[..i],
        None => line,
    };

    let fields: Vec<&str> = line.split_whitespace().collect();
    if fields.len() < 12 {
        return Err(Error::NotEnoughFields {
            count: fields.len(),
            fields: fields.iter().map(|f| f.to_string()).collect(),
        });
    }

    // Field 1 (local endpoint) is deliberately not decoded; only the remote
    // peer matters for classification.
    let (remote_ip, remote_port) = decode_addr(fields[2])?;

    let state = u8::from_str_radix(fields[3], 16)
        .map_err(|_| Error::InvalidStateCode(fields[3].to_string()))?;
    state_name(state)?;

    Ok(SocketRecord {
        remote_ip,
        remote_port,
        state,
    })
}
