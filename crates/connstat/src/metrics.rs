//! Prometheus export of collection-cycle rows (behind the `metrics`
//! feature).
//!
//! The host process owns the registry and the scrape endpoint; this module
//! only shapes one cycle's rows into the gauge the original exporter
//! published: `<namespace>_netstat_sockets{asn, state, ipv}`.

use prometheus::{IntGaugeVec, Opts, Registry};

use crate::collect::SocketMetric;

/// Build the sockets gauge, unregistered.
pub fn sockets_gauge(namespace: &str) -> prometheus::Result<IntGaugeVec> {
    IntGaugeVec::new(
        Opts::new("sockets", "Current os sockets")
            .namespace(namespace)
            .subsystem("netstat"),
        &["asn", "state", "ipv"],
    )
}

/// Build the sockets gauge and register it with `registry`.
pub fn register_sockets_gauge(
    registry: &Registry,
    namespace: &str,
) -> prometheus::Result<IntGaugeVec> {
    let gauge = sockets_gauge(namespace)?;
    registry.register(Box::new(gauge.clone()))?;
    Ok(gauge)
}

/// Replace the gauge's cells with one cycle's rows.
///
/// The gauge is reset first so cells that disappeared this cycle are not
/// carried over; emission is cycle-scoped, not cumulative.
pub fn set_cycle(gauge: &IntGaugeVec, rows: &[SocketMetric]) {
    gauge.reset();
    for row in rows {
        gauge
            .with_label_values(&[row.asn.as_str(), row.state.as_str(), row.family.label()])
            .set(row.count as i64);
    }
}
