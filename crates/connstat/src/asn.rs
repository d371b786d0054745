//! ASN ownership table: CIDR network ranges mapped to autonomous-system
//! names.
//!
//! The table is loaded once from a CSV in the IP2Location ASN database
//! layout (CIDR network at column index 2, AS name at column index 4) and
//! is immutable afterwards, so concurrent collection cycles can share it
//! without locking.
//!
//! Lookup is a linear scan returning the first range in file order that
//! contains the address — not longest-prefix-match. With overlapping
//! ranges the earliest-listed row wins; callers depend on that ordering,
//! so it is a contract, not an accident. Linear cost is fine at a
//! seconds-to-minutes collection cadence over a table of thousands of rows.

use std::fmt;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};
use std::path::Path;
use std::str::FromStr;

use crate::error::{Error, Result};

/// Column holding the CIDR network in the ASN database layout.
const NETWORK_COLUMN: usize = 2;
/// Column holding the autonomous-system name.
const NAME_COLUMN: usize = 4;

/// An IP network in CIDR form, either address family.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IpNetwork {
    addr: IpAddr,
    prefix_len: u8,
}

impl IpNetwork {
    /// Base address, masked to the prefix.
    pub fn addr(&self) -> IpAddr {
        self.addr
    }

    /// Prefix length in bits.
    pub fn prefix_len(&self) -> u8 {
        self.prefix_len
    }

    /// Whether `ip` falls inside this network. Addresses of the other
    /// family never match.
    pub fn contains(&self, ip: IpAddr) -> bool {
        match (self.addr, ip) {
            (IpAddr::V4(net), IpAddr::V4(ip)) => {
                let mask = v4_mask(self.prefix_len);
                (u32::from(ip) & mask) == (u32::from(net) & mask)
            }
            (IpAddr::V6(net), IpAddr::V6(ip)) => {
                let mask = v6_mask(self.prefix_len);
                (u128::from(ip) & mask) == (u128::from(net) & mask)
            }
            _ => false,
        }
    }
}

fn v4_mask(prefix_len: u8) -> u32 {
    if prefix_len == 0 {
        0
    } else {
        !0u32 << (32 - u32::from(prefix_len))
    }
}

fn v6_mask(prefix_len: u8) -> u128 {
    if prefix_len == 0 {
        0
    } else {
        !0u128 << (128 - u32::from(prefix_len))
    }
}

impl FromStr for IpNetwork {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let err = || Error::InvalidNetwork(s.to_string());
        let (addr_str, len_str) = s.split_once('/').ok_or_else(err)?;
        let addr: IpAddr = addr_str.trim().parse().map_err(|_| err())?;
        let prefix_len: u8 = len_str.trim().parse().map_err(|_| err())?;
        let max = match addr {
            IpAddr::V4(_) => 32,
            IpAddr::V6(_) => 128,
        };
        if prefix_len > max {
            return Err(err());
        }
        // Store the masked base so 10.0.0.7/8 and 10.0.0.0/8 compare and
        // print identically.
        let addr = match addr {
            IpAddr::V4(v4) => IpAddr::V4(Ipv4Addr::from(u32::from(v4) & v4_mask(prefix_len))),
            IpAddr::V6(v6) => IpAddr::V6(Ipv6Addr::from(u128::from(v6) & v6_mask(prefix_len))),
        };
        Ok(Self { addr, prefix_len })
    }
}

impl fmt::Display for IpNetwork {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.addr, self.prefix_len)
    }
}

/// One ASN ownership row: a network range and the operator that owns it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AsnRecord {
    /// Network range in CIDR form.
    pub network: IpNetwork,
    /// Autonomous-system name, free text.
    pub name: String,
}

/// Ordered collection of ASN ownership rows.
///
/// Row order is file order and is significant for [`AsnTable::lookup`].
#[derive(Debug, Clone, Default)]
pub struct AsnTable {
    records: Vec<AsnRecord>,
}

impl AsnTable {
    /// Load the table from an already-open CSV reader.
    ///
    /// A row whose network column is not valid CIDR, or that has too few
    /// columns, aborts the whole load.
    pub fn from_reader<R: BufRead>(reader: R) -> Result<Self> {
        let mut records = Vec::new();
        for (index, line) in reader.lines().enumerate() {
            let line = line?;
            if line.is_empty() {
                continue;
            }

            let fields = split_csv_row(&line);
            if fields.len() <= NAME_COLUMN {
                return Err(Error::MalformedAsnRow {
                    line: index + 1,
                    value: line.clone(),
                });
            }

            let network: IpNetwork =
                fields[NETWORK_COLUMN]
                    .parse()
                    .map_err(|_| Error::MalformedAsnRow {
                        line: index + 1,
                        value: fields[NETWORK_COLUMN].clone(),
                    })?;

            records.push(AsnRecord {
                network,
                name: fields[NAME_COLUMN].clone(),
            });
        }
        Ok(Self { records })
    }

    /// Load the table from a file path.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|source| Error::SourceUnavailable {
            name: path.display().to_string(),
            source,
        })?;
        Self::from_reader(BufReader::new(file))
    }

    /// First record in file order whose range contains `ip`, or `None`.
    pub fn lookup(&self, ip: IpAddr) -> Option<&AsnRecord> {
        self.records.iter().find(|r| r.network.contains(ip))
    }

    /// Number of loaded rows.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether the table holds no rows.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Rows in file order.
    pub fn records(&self) -> &[AsnRecord] {
        &self.records
    }
}

/// Split one CSV row into fields. Handles double-quoted fields with `""`
/// escapes, which is all the ASN database layout uses; AS names routinely
/// contain commas.
fn split_csv_row(line: &str) -> Vec<String> {
    let mut fields = Vec::new();
    let mut field = String::new();
    let mut in_quotes = false;
    let mut chars = line.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '"' if in_quotes => {
                if chars.peek() == Some(&'"') {
                    chars.next();
                    field.push('"');
                } else {
                    in_quotes = false;
                }
            }
            '"' => in_quotes = true,
            ',' if !in_quotes => fields.push(std::mem::take(&mut field)),
            _ => field.push(c),
        }
    }
    fields.push(field);
    fields
}
