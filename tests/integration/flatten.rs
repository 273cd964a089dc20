#![allow(missing_docs)]

mod support;

use scenedex::flatten::TraversalContext;
use scenedex::{records_as_list, to_tree, EntityKind, EntityRef, VISITED_MARKER};
use serde_json::Value;
use support::Archive;

fn count_markers(value: &Value) -> usize {
    match value {
        Value::Object(map) if map.contains_key(VISITED_MARKER) => 1,
        Value::Object(map) => map.values().map(count_markers).sum(),
        Value::Array(items) => items.iter().map(count_markers).sum(),
        _ => 0,
    }
}

#[test]
fn georeference_tree_inlines_its_directory() {
    let archive = Archive::new();
    let index = support::seeded_index(&archive);
    let results = index.search("satellite = LANDSAT-8").unwrap();
    let tree = to_tree(&index, &results[0]).unwrap();

    assert!(tree["path"].as_str().unwrap().ends_with("a1.jgw"));
    let directory = &tree["directory"];
    assert_eq!(directory["date_str"], "2024-01-01");
    assert!(directory.get("georeference_file").is_none());

    let observations = directory["observation_record"].as_array().unwrap();
    assert_eq!(observations.len(), 2);
    assert_eq!(observations[1]["cloudperce"], 5.0);
    assert_eq!(observations[0]["acquisitio"], "2023-06-11");
    assert!(observations[0].get("directory").is_none());

    let projections = directory["projection_definition"].as_array().unwrap();
    assert_eq!(projections.len(), 1);
    let axes = projections[0]["axis_entry"].as_array().unwrap();
    let names: Vec<_> = axes.iter().map(|a| a["name"].as_str().unwrap()).collect();
    assert_eq!(names, ["Easting", "Northing"]);
    assert_eq!(count_markers(&tree), 0);
}

#[test]
fn directory_tree_reaches_every_record_once() {
    let archive = Archive::new();
    let index = support::seeded_index(&archive);
    let directory = index.directory_by_token("2024-01-01").unwrap().unwrap();

    let mut ctx = TraversalContext::new(&index);
    let tree = ctx.flatten(&directory).unwrap();
    assert_eq!(tree["georeference_file"].as_array().unwrap().len(), 2);
    // directory, two observations, projection, two axes, two georeferences
    assert_eq!(ctx.visited().len(), 8);
    assert!(ctx
        .visited()
        .contains(&EntityRef::new(EntityKind::AxisEntry, 2)));
}

#[test]
fn shared_context_marks_revisits() {
    let archive = Archive::new();
    let index = support::seeded_index(&archive);
    let results = index.search("date_str = 2024-01-01").unwrap();
    assert_eq!(results.len(), 2);

    let mut ctx = TraversalContext::new(&index);
    ctx.flatten(&results[0]).unwrap();
    let second = ctx.flatten(&results[1]).unwrap();
    assert_eq!(
        second["directory"][VISITED_MARKER],
        "metadata_directory/1"
    );
    assert_eq!(count_markers(&second), 1);
}

#[test]
fn records_as_list_starts_fresh_per_record() {
    let archive = Archive::new();
    let index = support::seeded_index(&archive);
    let results = index.search("date_str = 2024-01-01").unwrap();
    let trees = records_as_list(&index, &results).unwrap();
    assert_eq!(trees.len(), 2);
    for tree in &trees {
        assert_eq!(count_markers(tree), 0);
        assert_eq!(tree["directory"]["date_str"], "2024-01-01");
    }
    assert_ne!(trees[0]["id"], trees[1]["id"]);
}
