use std::fs;

use tabsync::{
    spawn_load, ConnectionParams, Coordinator, Dataset, ErrorKind, FileSource, RelationalSource,
    TableSchema, TabularSource,
};
use tempfile::TempDir;

const PRICES: &str = "Ref_Date,GEO,COMMOD,Vector,Coordinate,Value\n\
                      Jan-81,Canada,Meat,v1574569,1.1,60.9\n";

fn strings(values: &[&str]) -> Vec<String> {
    values.iter().map(|v| v.to_string()).collect()
}

fn table_in(dir: &TempDir, table: &str) -> RelationalSource {
    let host = dir.path().to_string_lossy().into_owned();
    RelationalSource::new(ConnectionParams::new(host, "phil", "pw", "stats", table))
}

#[test]
fn prices_file_loads_and_survives_save() {
    let dir = TempDir::new().unwrap();
    let input = dir.path().join("prices.csv");
    fs::write(&input, PRICES).unwrap();

    let mut coordinator = Coordinator::new();
    assert_eq!(coordinator.load_from_file(&input).unwrap(), 1);
    let header = strings(&["Ref_Date", "GEO", "COMMOD", "Vector", "Coordinate", "Value"]);
    let first = strings(&["Jan-81", "Canada", "Meat", "v1574569", "1.1", "60.9"]);
    assert_eq!(coordinator.header(), &header);
    assert_eq!(coordinator.rows()[0], first);

    let output = dir.path().join("copy.csv");
    coordinator.save_to_file(&output).unwrap();
    assert_eq!(fs::read_to_string(&output).unwrap(), PRICES);

    let (reloaded_header, reloaded_rows) = FileSource::new(&output).load().unwrap();
    assert_eq!(reloaded_header, header);
    assert_eq!(reloaded_rows, vec![first]);
}

#[test]
fn utf8_and_quoted_fields_round_trip() {
    let dir = TempDir::new().unwrap();
    let source = FileSource::new(dir.path().join("mixed.csv"));
    let dataset = Dataset::new(
        strings(&["ville", "note"]),
        vec![
            strings(&["Montréal", "a, b"]),
            strings(&["Zürich", "line\nbreak"]),
            strings(&["", "\"quoted\""]),
        ],
    );

    source.write_all(&dataset).unwrap();
    assert_eq!(source.read_all().unwrap(), dataset);
}

#[test]
fn missing_file_is_an_error_not_a_panic() {
    let dir = TempDir::new().unwrap();
    let mut coordinator = Coordinator::new();
    let err = coordinator
        .load_from_file(dir.path().join("nowhere.csv"))
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::SourceNotFound);
    assert!(coordinator.rows().is_empty());
}

#[test]
fn header_order_comes_from_column_ordinals() {
    let dir = TempDir::new().unwrap();
    let table = table_in(&dir, "ordered");
    table
        .create_table(&TableSchema::all_text(&strings(&["Value", "GEO", "Ref_Date"])))
        .unwrap();

    assert_eq!(
        table.get_headers().unwrap(),
        strings(&["Value", "GEO", "Ref_Date"])
    );
    assert!(table.get_all_records().unwrap().is_empty());
}

#[test]
fn exporting_twice_duplicates_rows() {
    let dir = TempDir::new().unwrap();
    let input = dir.path().join("prices.csv");
    fs::write(&input, PRICES).unwrap();
    let table = table_in(&dir, "prices");

    let mut coordinator = Coordinator::new();
    coordinator.load_from_file(&input).unwrap();
    coordinator.create_table(&table, false).unwrap();
    coordinator.insert_into_db(&table).unwrap();
    coordinator.insert_into_db(&table).unwrap();

    let records = table.get_all_records().unwrap();
    assert_eq!(records.len(), 2);
    assert_eq!(records[0], records[1]);
}

#[test]
fn connectivity_check_is_false_for_missing_host_or_database() {
    let dir = TempDir::new().unwrap();
    let table = table_in(&dir, "prices");
    let coordinator = Coordinator::new();
    assert!(!coordinator.is_connected(&table));

    // The embedded engine never checks user or password, so an unreachable
    // host is the only way to get a refused connection.
    let mut elsewhere = ConnectionParams::new(
        dir.path().join("no-such-host").to_string_lossy(),
        "phil",
        "pw",
        "stats",
        "prices",
    );
    elsewhere.set_table("");
    assert!(!coordinator.is_connected(&RelationalSource::new(elsewhere)));
}

#[test]
fn background_load_feeds_the_coordinator() {
    let dir = TempDir::new().unwrap();
    let input = dir.path().join("prices.csv");
    fs::write(&input, PRICES).unwrap();
    let table = table_in(&dir, "prices");

    let mut coordinator = Coordinator::new();
    coordinator.load_from_file(&input).unwrap();
    coordinator.create_table(&table, true).unwrap();
    coordinator.insert_into_db(&table).unwrap();
    let expected = coordinator.dataset().clone();
    coordinator.clear();

    let dataset = spawn_load(table)
        .wait(std::time::Duration::from_millis(1), || {})
        .unwrap();
    coordinator.apply(dataset);
    assert_eq!(coordinator.dataset(), &expected);
}
