//! Per-cycle aggregation of socket records into ASN × state counts.
//!
//! One collection cycle parses the IPv4 and IPv6 socket tables, classifies
//! every record's remote peer against the ASN table, and folds the results
//! into a fresh [`CountTable`]. The finished rows go to the host's
//! metrics-emission pipeline; nothing is kept between cycles.

use std::collections::BTreeMap;
use std::io::BufRead;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::asn::AsnTable;
use crate::error::Result;
use crate::socket_table::{parse_socket_table, SocketRecord};

/// Owner bucket for remote peers no ASN range claims.
pub const OTHER_OWNER: &str = "_other";

/// Address family of one socket-table source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AddressFamily {
    /// IPv4 (`/proc/net/tcp`).
    #[serde(rename = "4")]
    V4,
    /// IPv6 (`/proc/net/tcp6`).
    #[serde(rename = "6")]
    V6,
}

impl AddressFamily {
    /// Label value used on exported metrics.
    pub fn label(self) -> &'static str {
        match self {
            AddressFamily::V4 => "4",
            AddressFamily::V6 => "6",
        }
    }
}

/// Owner → state → count table for one collection cycle.
///
/// Cells are created lazily on first increment, so no zero-count cells
/// exist. A fresh table is built per cycle; if the host overlaps cycles,
/// each one gets its own table and there is no shared mutable state.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CountTable {
    counts: BTreeMap<String, BTreeMap<&'static str, u64>>,
}

impl CountTable {
    fn increment(&mut self, owner: &str, state: &'static str) {
        if let Some(states) = self.counts.get_mut(owner) {
            *states.entry(state).or_insert(0) += 1;
        } else {
            self.counts
                .insert(owner.to_string(), BTreeMap::from([(state, 1)]));
        }
    }

    /// Count for one (owner, state) cell; zero if the cell was never hit.
    pub fn get(&self, owner: &str, state: &str) -> u64 {
        self.counts
            .get(owner)
            .and_then(|states| states.get(state))
            .copied()
            .unwrap_or(0)
    }

    /// Whether no cell was ever incremented.
    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }

    /// Total sockets folded into this table.
    pub fn total(&self) -> u64 {
        self.counts.values().flat_map(|s| s.values()).sum()
    }

    /// Non-zero cells in (owner, state) order.
    pub fn cells(&self) -> impl Iterator<Item = (&str, &'static str, u64)> + '_ {
        self.counts.iter().flat_map(|(owner, states)| {
            states
                .iter()
                .map(move |(state, count)| (owner.as_str(), *state, *count))
        })
    }
}

/// Fold socket records into a count table, classifying each remote peer
/// against the ASN table.
///
/// Pure data-folding: validation already happened in parsing, and the
/// resulting counts do not depend on record order.
pub fn aggregate(records: &[SocketRecord], asns: &AsnTable) -> CountTable {
    let mut table = CountTable::default();
    for record in records {
        let owner = asns
            .lookup(record.remote_ip)
            .map(|r| r.name.as_str())
            .unwrap_or(OTHER_OWNER);
        table.increment(owner, record.state_name());
    }
    table
}

/// One exported row: a non-zero (owner, state) cell for one family.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SocketMetric {
    /// Autonomous-system name, or [`OTHER_OWNER`].
    pub asn: String,
    /// Connection-state name.
    pub state: String,
    /// Family of the source table the cell came from.
    pub family: AddressFamily,
    /// Sockets observed in this cycle.
    pub count: u64,
}

/// Socket classifier owning the immutable ASN table.
///
/// Built once at startup; a failed ASN load means no collector and no
/// cycles ever run. [`ConnstatCollector::collect`] runs one cycle and only
/// reads `self`, so overlapping cycles can share one collector.
#[derive(Debug, Clone)]
pub struct ConnstatCollector {
    asns: AsnTable,
}

impl ConnstatCollector {
    /// Build a collector around an already-loaded ASN table.
    pub fn new(asns: AsnTable) -> Self {
        Self { asns }
    }

    /// Load the ASN table from `path` and build a collector.
    pub fn from_asn_path(path: impl AsRef<std::path::Path>) -> Result<Self> {
        let asns = AsnTable::from_path(path)?;
        debug!(ranges = asns.len(), "loaded ASN table");
        Ok(Self::new(asns))
    }

    /// The loaded ASN table.
    pub fn asns(&self) -> &AsnTable {
        &self.asns
    }

    /// Run one collection cycle over the two per-family socket tables.
    ///
    /// Any parse failure is fatal to this cycle and no rows are returned
    /// for it; rows already emitted for earlier cycles are unaffected.
    pub fn collect<R4, R6>(&self, tcp4: R4, tcp6: R6) -> Result<Vec<SocketMetric>>
    where
        R4: BufRead,
        R6: BufRead,
    {
        let mut rows = self.collect_family(tcp4, AddressFamily::V4)?;
        rows.extend(self.collect_family(tcp6, AddressFamily::V6)?);
        Ok(rows)
    }

    /// Run one collection cycle over the live kernel tables.
    #[cfg(target_os = "linux")]
    pub fn collect_proc(&self) -> Result<Vec<SocketMetric>> {
        let tcp4 = open_source("/proc/net/tcp")?;
        let tcp6 = open_source("/proc/net/tcp6")?;
        self.collect(tcp4, tcp6)
    }

    fn collect_family<R: BufRead>(
        &self,
        reader: R,
        family: AddressFamily,
    ) -> Result<Vec<SocketMetric>> {
        let records = parse_socket_table(reader)?;
        let table = aggregate(&records, &self.asns);
        debug!(
            family = family.label(),
            sockets = records.len(),
            cells = table.cells().count(),
            "collected socket table"
        );

        Ok(table
            .cells()
            .map(|(asn, state, count)| SocketMetric {
                asn: asn.to_string(),
                state: state.to_string(),
                family,
                count,
            })
            .collect())
    }
}

#[cfg(target_os = "linux")]
fn open_source(path: &str) -> Result<std::io::BufReader<std::fs::File>> {
    std::fs::File::open(path)
        .map(std::io::BufReader::new)
        .map_err(|source| crate::error::Error::SourceUnavailable {
            name: path.to_string(),
            source,
        })
}
