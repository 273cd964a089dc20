#![allow(missing_docs)]

mod support;

use csv::ReaderBuilder;
use scenedex::{export, records_as_list, ExportFormat};
use serde_json::Value;
use support::Archive;

fn exported(format: ExportFormat, query: &str) -> String {
    let archive = Archive::new();
    let index = support::seeded_index(&archive);
    let results = index.search(query).unwrap();
    let trees = records_as_list(&index, &results).unwrap();
    let mut out = Vec::new();
    export(&mut out, format, &trees).unwrap();
    String::from_utf8(out).unwrap()
}

#[test]
fn json_export_is_the_tree_list() {
    let text = exported(ExportFormat::Json, "satellite = CBERS-4");
    let parsed: Value = serde_json::from_str(&text).unwrap();
    let records = parsed.as_array().unwrap();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0]["directory"]["date_str"], "2024-02-01");
    assert_eq!(records[0]["directory"]["projection_definition"], serde_json::json!([]));
}

#[test]
fn csv_export_has_one_row_per_result() {
    let text = exported(ExportFormat::Csv, "cloudperce >= 0");
    let mut reader = ReaderBuilder::new().from_reader(text.as_bytes());
    let headers = reader.headers().unwrap().clone();
    let column = |name: &str| {
        headers
            .iter()
            .position(|h| h == name)
            .unwrap_or_else(|| panic!("missing column {name}"))
    };
    let rows: Vec<_> = reader.records().map(|r| r.unwrap()).collect();
    assert_eq!(rows.len(), 3);

    let date = column("directory.date_str");
    let axis = column("directory.projection_definition.0.axis_entry.1.name");
    assert_eq!(&rows[0][date], "2024-01-01");
    assert_eq!(&rows[2][date], "2024-02-01");
    assert_eq!(&rows[0][axis], "Northing");
    assert_eq!(&rows[2][axis], "");
}

#[test]
fn toml_export_wraps_records() {
    let text = exported(ExportFormat::Toml, "scenepath = 215");
    let parsed: toml::Value = toml::from_str(&text).unwrap();
    let records = parsed["records"].as_array().unwrap();
    assert_eq!(records.len(), 2);
    assert_eq!(
        records[0]["directory"]["observation_record"][0]["satellite"].as_str(),
        Some("LANDSAT-8")
    );
}

#[test]
fn empty_results_export_cleanly() {
    let json = exported(ExportFormat::Json, "satellite = NONE");
    assert_eq!(serde_json::from_str::<Value>(&json).unwrap(), serde_json::json!([]));
    let toml_text = exported(ExportFormat::Toml, "satellite = NONE");
    let parsed: toml::Value = toml::from_str(&toml_text).unwrap();
    assert_eq!(parsed["records"].as_array().map(Vec::len), Some(0));
}
