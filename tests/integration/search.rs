#![allow(missing_docs)]

mod support;

use proptest::prelude::*;
use proptest::test_runner::{Config, TestRunner};
use scenedex::{EntityKind, Index};
use serde_json::json;
use support::{georeference, manifest, observation, stems, Archive};

#[test]
fn one_result_per_georeference_despite_fan_out() {
    let archive = Archive::new();
    let index = support::seeded_index(&archive);
    assert_eq!(stems(&index, "satellite = LANDSAT-8"), ["a1", "a2"]);
    assert_eq!(stems(&index, "axis_entry.direction in [east, north]"), ["a1", "a2"]);
    assert_eq!(
        stems(&index, "satellite = LANDSAT-8 & axis_entry.name != Up"),
        ["a1", "a2"]
    );
}

#[test]
fn numeric_comparisons_use_coerced_values() {
    let archive = Archive::new();
    let index = support::seeded_index(&archive);
    assert_eq!(stems(&index, "cloudperce > 4"), ["a1", "a2", "b1"]);
    assert_eq!(stems(&index, "cloudperce >= 10,0"), ["b1"]);
    assert_eq!(stems(&index, "cloudperce < 0.5"), ["a1", "a2"]);
    assert_eq!(stems(&index, "scenepath = '150'"), ["b1"]);
    assert!(stems(&index, "scenerow > 500").is_empty());
}

#[test]
fn conditions_on_one_kind_refer_to_the_same_row() {
    let archive = Archive::new();
    let index = support::seeded_index(&archive);
    assert_eq!(stems(&index, "scenepath = 215 & scenerow = 67"), ["a1", "a2"]);
    assert!(stems(&index, "satellite = CBERS-4 & scenerow = 66").is_empty());
}

#[test]
fn decimal_comma_and_point_match_the_same_rows() {
    let archive = Archive::new();
    let index = Index::open_in_memory().unwrap();
    let scene = archive.scene("2024-07-07", "c1", true);
    index
        .ingest_directory(&manifest(
            &archive.metadata_dir("2024-07-07"),
            vec![observation("A", json!("12,5"), 1, 1)],
            None,
            vec![georeference(&scene, 0.0)],
        ))
        .unwrap();
    assert_eq!(stems(&index, "cloudperce = 12.5"), ["c1"]);
    assert_eq!(stems(&index, "cloudperce = 12,5"), ["c1"]);
    assert_eq!(stems(&index, "cloudperce = '12,5'"), ["c1"]);
}

#[test]
fn membership_lists_keep_quoted_commas() {
    let archive = Archive::new();
    let index = Index::open_in_memory().unwrap();
    let scene = archive.scene("2024-08-08", "q1", true);
    index
        .ingest_directory(&manifest(
            &archive.metadata_dir("2024-08-08"),
            vec![observation("SAT, EXTENDED", json!(1), 1, 1)],
            None,
            vec![georeference(&scene, 0.0)],
        ))
        .unwrap();
    assert_eq!(stems(&index, "satellite in ['SAT, EXTENDED', OTHER]"), ["q1"]);
    assert!(stems(&index, "satellite in [SAT, EXTENDED]").is_empty());
    assert!(stems(&index, "satellite not in (\"SAT, EXTENDED\")").is_empty());
}

#[test]
fn membership_and_exclusion() {
    let archive = Archive::new();
    let index = support::seeded_index(&archive);
    assert_eq!(
        stems(&index, "satellite in [LANDSAT-8, 'CBERS-4']"),
        ["a1", "a2", "b1"]
    );
    assert_eq!(stems(&index, "satellite not in (CBERS-4)"), ["a1", "a2"]);
    assert!(stems(&index, "satellite in []").is_empty());
}

#[test]
fn directory_and_georeference_fields_are_searchable() {
    let archive = Archive::new();
    let index = support::seeded_index(&archive);
    assert_eq!(stems(&index, "date_str = 2024-02-01"), ["b1"]);
    assert_eq!(stems(&index, "upper_left_x >= 200"), ["a2", "b1"]);
    assert_eq!(stems(&index, "georeference_file.scale_x = 30"), ["a1", "a2", "b1"]);
    assert_eq!(stems(&index, "acquisitio = 2023-06-11"), ["a1", "a2", "b1"]);
}

#[test]
fn invalid_queries_report_their_kind() {
    let archive = Archive::new();
    let index = support::seeded_index(&archive);
    let code = |query: &str| index.search(query).unwrap_err().code();
    assert_eq!(code("unknownfield = 1"), "UnknownFieldError");
    assert_eq!(code("satellite == LANDSAT-8"), "QuerySyntaxError");
    assert_eq!(code("satellite"), "QuerySyntaxError");
    assert_eq!(code(""), "QuerySyntaxError");
    assert_eq!(code("satellite in [a, b"), "QuerySyntaxError");
    assert_eq!(code("name = Easting"), "AmbiguousFieldError");
    assert_eq!(code("cloudperce > lots"), "ValidationError");
    assert_eq!(code("acquisitio = yesterday"), "ValidationError");
    assert_eq!(code("cloudperce = NaN"), "ValidationError");
    assert_eq!(code("cloudperce < inf"), "ValidationError");
    assert_eq!(code("satellite IN [LANDSAT-8]"), "QuerySyntaxError");
    assert_eq!(code("satellite = 'LANDSAT-8 & scenepath = 215"), "QuerySyntaxError");
}

#[test]
fn apostrophe_in_a_bare_value_keeps_later_conditions() {
    let archive = Archive::new();
    let index = support::seeded_index(&archive);
    let predicate = index.compile("satellite != LANDSAT's & cloudperce <= 0").unwrap();
    assert_eq!(predicate.conditions().len(), 2);
    assert_eq!(index.execute(&predicate).unwrap().len(), 2);
    assert_eq!(stems(&index, "satellite != LANDSAT's & scenepath = 150"), ["b1"]);
}

#[test]
fn qualified_names_resolve_collisions() {
    let archive = Archive::new();
    let index = support::seeded_index(&archive);
    assert_eq!(stems(&index, "axis_entry.name = Easting"), ["a1", "a2"]);
    assert_eq!(
        stems(&index, "projection_definition.name = 'WGS 84 / UTM zone 23S'"),
        ["a1", "a2"]
    );
    assert!(stems(&index, "projection_definition.name = Easting").is_empty());
}

#[test]
fn injected_sql_is_treated_as_a_value() {
    let archive = Archive::new();
    let index = support::seeded_index(&archive);
    assert!(stems(&index, "satellite = \"x' OR '1'='1\"").is_empty());
    assert_eq!(index.count(EntityKind::GeoreferenceFile).unwrap(), 3);
}

#[test]
fn conjunction_order_does_not_change_results() {
    let archive = Archive::new();
    let index = support::seeded_index(&archive);
    let conditions = vec![
        "satellite in [LANDSAT-8, CBERS-4]",
        "cloudperce >= 0",
        "upper_left_x < 250",
        "date_str != 1999-01-01",
        "scenerow > 10",
    ];
    let expected = stems(&index, &conditions.join(" & "));
    assert_eq!(expected, ["a1", "a2"]);

    let mut runner = TestRunner::new(Config::with_cases(32));
    runner
        .run(&Just(conditions).prop_shuffle(), |order| {
            prop_assert_eq!(stems(&index, &order.join(" & ")), expected.clone());
            Ok(())
        })
        .unwrap();
}
