//! End-to-end collection cycles over fixture socket tables and a fixture
//! ASN database in the IP2Location layout.

use std::fs::File;
use std::io::{BufReader, Cursor, Write};
use std::path::{Path, PathBuf};

use connstat::{
    AddressFamily, AsnTable, ConnstatCollector, Error, SocketMetric, OTHER_OWNER,
};

fn fixture(name: &str) -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("tests/fixtures")
        .join(name)
}

fn open_fixture(name: &str) -> BufReader<File> {
    BufReader::new(File::open(fixture(name)).expect("fixture should open"))
}

fn cell(rows: &[SocketMetric], asn: &str, state: &str, family: AddressFamily) -> Option<u64> {
    rows.iter()
        .find(|r| r.asn == asn && r.state == state && r.family == family)
        .map(|r| r.count)
}

#[test]
fn asn_fixture_loads_in_order() {
    let table = AsnTable::from_path(fixture("asn.csv")).unwrap();
    assert_eq!(table.len(), 4);

    let first = &table.records()[0];
    assert_eq!(first.network.to_string(), "2.63.144.0/20");
    assert_eq!(first.name, "Miranda-Media Ltd");
}

#[test]
fn full_cycle_over_fixture_tables() {
    let collector = ConnstatCollector::from_asn_path(fixture("asn.csv")).unwrap();
    let rows = collector
        .collect(open_fixture("proc_net_tcp"), open_fixture("proc_net_tcp6"))
        .unwrap();

    // IPv4: two established Google sockets, one Miranda TIME_WAIT, a local
    // listener and an unmatched peer in the _other bucket.
    assert_eq!(
        cell(&rows, "Google LLC", "ESTABLISHED", AddressFamily::V4),
        Some(2)
    );
    assert_eq!(
        cell(&rows, "Miranda-Media Ltd", "TIME_WAIT", AddressFamily::V4),
        Some(1)
    );
    assert_eq!(cell(&rows, OTHER_OWNER, "LISTEN", AddressFamily::V4), Some(1));
    assert_eq!(
        cell(&rows, OTHER_OWNER, "ESTABLISHED", AddressFamily::V4),
        Some(1)
    );

    // IPv6 rows are labeled independently of IPv4 ones.
    assert_eq!(
        cell(&rows, "Google LLC", "ESTABLISHED", AddressFamily::V6),
        Some(1)
    );
    assert_eq!(cell(&rows, OTHER_OWNER, "LISTEN", AddressFamily::V6), Some(1));

    // No zero-count cells are emitted.
    assert!(rows.iter().all(|r| r.count > 0));
    assert_eq!(rows.len(), 6);
}

#[test]
fn failed_cycle_emits_no_rows() {
    let collector = ConnstatCollector::from_asn_path(fixture("asn.csv")).unwrap();
    let bad_tcp4 = "header\n   0: 0100007F:0035 00000000:0000\n";

    let err = collector
        .collect(Cursor::new(bad_tcp4), open_fixture("proc_net_tcp6"))
        .unwrap_err();
    assert!(matches!(err, Error::NotEnoughFields { count: 3, .. }));

    // The collector itself is untouched; the next cycle works.
    let rows = collector
        .collect(open_fixture("proc_net_tcp"), open_fixture("proc_net_tcp6"))
        .unwrap();
    assert!(!rows.is_empty());
}

#[test]
fn missing_asn_source_prevents_construction() {
    let err = ConnstatCollector::from_asn_path("/nonexistent/asn_db.csv").unwrap_err();
    match err {
        Error::SourceUnavailable { name, .. } => {
            assert_eq!(name, "/nonexistent/asn_db.csv");
        }
        other => panic!("expected SourceUnavailable, got {other:?}"),
    }
}

#[test]
fn corrupt_asn_source_prevents_construction() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(
        file,
        "\"8.8.8.0\",\"8.8.8.255\",\"8.8.8.0/24\",\"AS15169\",\"Google LLC\""
    )
    .unwrap();
    writeln!(
        file,
        "\"0.0.0.0\",\"0.0.0.0\",\"500.1.2.0/24\",\"AS0\",\"Bogus\""
    )
    .unwrap();
    file.flush().unwrap();

    let err = ConnstatCollector::from_asn_path(file.path()).unwrap_err();
    assert!(matches!(err, Error::MalformedAsnRow { line: 2, .. }));
}

#[test]
fn metric_rows_serialize_with_family_labels() {
    let collector = ConnstatCollector::from_asn_path(fixture("asn.csv")).unwrap();
    let rows = collector
        .collect(open_fixture("proc_net_tcp"), open_fixture("proc_net_tcp6"))
        .unwrap();

    let json = serde_json::to_value(&rows).unwrap();
    let families: Vec<&str> = json
        .as_array()
        .unwrap()
        .iter()
        .map(|row| row["family"].as_str().unwrap())
        .collect();
    assert!(families.contains(&"4"));
    assert!(families.contains(&"6"));
}
