#![allow(missing_docs)]

mod support;

use scenedex::stats::UNSUPPORTED_STATS;
use scenedex::{EntityKind, FieldStats, Index, ValueType};
use serde_json::json;
use support::{manifest, observation, Archive};

#[test]
fn cloud_cover_summary() {
    let archive = Archive::new();
    let index = support::seeded_index(&archive);
    let info = index.field_info("cloudperce").unwrap();
    assert_eq!(info.entity_kind, EntityKind::ObservationRecord);
    assert_eq!(info.value_type, ValueType::Float);
    let FieldStats::Numeric(stats) = info.stats else {
        panic!("expected numeric stats");
    };
    assert_eq!(stats.count, 3);
    assert_eq!(stats.unique_count, 3);
    assert_eq!(stats.min, Some(0.0));
    assert_eq!(stats.max, Some(10.0));
    assert_eq!(stats.mean, Some(5.0));
    assert_eq!(stats.median, Some(5.0));
    assert!((stats.std_dev - 5.0).abs() < 1e-9);
    assert!(!stats.has_missing);
}

#[test]
fn statistics_run_over_distinct_values() {
    let archive = Archive::new();
    let index = support::seeded_index(&archive);
    let FieldStats::Numeric(stats) = index.field_info("scenepath").unwrap().stats else {
        panic!("expected numeric stats");
    };
    assert_eq!(stats.count, 2);
    assert_eq!(stats.min, Some(150.0));
    assert_eq!(stats.max, Some(215.0));
}

#[test]
fn text_fields_list_sorted_samples() {
    let archive = Archive::new();
    let index = support::seeded_index(&archive);
    let FieldStats::Text(stats) = index.field_info("satellite").unwrap().stats else {
        panic!("expected text stats");
    };
    assert_eq!(stats.unique_count, 2);
    assert_eq!(stats.sample_values, ["CBERS-4", "LANDSAT-8"]);
}

#[test]
fn many_text_values_are_truncated() {
    let archive = Archive::new();
    let index = Index::open_in_memory().unwrap();
    let rows = (0..15)
        .map(|i| observation(&format!("SAT-{i:02}"), json!(i), i, i))
        .collect();
    index
        .ingest_directory(&manifest(&archive.metadata_dir("2024-09-09"), rows, None, vec![]))
        .unwrap();
    let FieldStats::Text(stats) = index.field_info("satellite").unwrap().stats else {
        panic!("expected text stats");
    };
    assert_eq!(stats.unique_count, 15);
    assert_eq!(stats.sample_values.len(), 11);
    assert_eq!(stats.sample_values[0], "SAT-00");
    assert_eq!(stats.sample_values[10], "...");
}

#[test]
fn dates_and_empty_tables() {
    let archive = Archive::new();
    let index = support::seeded_index(&archive);
    assert_eq!(
        index.field_info("acquisitio").unwrap().stats,
        FieldStats::Unsupported(UNSUPPORTED_STATS)
    );

    let empty = Index::open_in_memory().unwrap();
    let FieldStats::Numeric(stats) = empty.field_info("upper_left_x").unwrap().stats else {
        panic!("expected numeric stats");
    };
    assert_eq!(stats.count, 0);
    assert_eq!(stats.mean, None);
}

#[test]
fn field_names_follow_catalog_resolution() {
    let index = Index::open_in_memory().unwrap();
    assert_eq!(index.field_info("unknownfield").unwrap_err().code(), "UnknownFieldError");
    assert_eq!(index.field_info("name").unwrap_err().code(), "AmbiguousFieldError");
    let info = index.field_info("axis_entry.unit_conversion_factor").unwrap();
    assert_eq!(info.field_name, "axis_entry.unit_conversion_factor");
    assert_eq!(info.entity_kind, EntityKind::AxisEntry);
}

#[test]
fn info_serializes_flat() {
    let archive = Archive::new();
    let index = support::seeded_index(&archive);
    let json = serde_json::to_value(index.field_info("orbitid").unwrap()).unwrap();
    assert_eq!(json["entity_kind"], "observation_record");
    assert_eq!(json["value_type"], "integer");
    assert_eq!(json["stats"]["count"], 1);
    assert_eq!(json["stats"]["std_dev"], 0.0);
}
