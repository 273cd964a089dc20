#![allow(missing_docs)]

mod support;

use scenedex::model::{Entity, GeoreferenceFile};
use scenedex::{AnyEntity, EntityKind, EntityRef, Index, IndexOptions};
use serde_json::json;
use support::{georeference, manifest, observation, projection, seeded_manifests, Archive};

#[test]
fn seeded_archive_counts() {
    let archive = Archive::new();
    let index = support::seeded_index(&archive);
    assert_eq!(index.count(EntityKind::MetadataDirectory).unwrap(), 2);
    assert_eq!(index.count(EntityKind::ObservationRecord).unwrap(), 3);
    assert_eq!(index.count(EntityKind::ProjectionDefinition).unwrap(), 1);
    assert_eq!(index.count(EntityKind::AxisEntry).unwrap(), 2);
    assert_eq!(index.count(EntityKind::GeoreferenceFile).unwrap(), 3);
}

#[test]
fn ingest_summary_reports_rows_written() {
    let archive = Archive::new();
    let index = Index::open_in_memory().unwrap();
    let manifests = seeded_manifests(&archive);
    let summary = index.ingest_directory(&manifests[0]).unwrap();
    assert_eq!(summary.date_token, "2024-01-01");
    assert_eq!(summary.observations, 2);
    assert_eq!(summary.projections, 1);
    assert_eq!(summary.axes, 2);
    assert_eq!(summary.georeferences, 2);
}

#[test]
fn reingesting_a_directory_reuses_it() {
    let archive = Archive::new();
    let index = Index::open_in_memory().unwrap();
    let dir = archive.metadata_dir("2024-03-03");
    let first = index
        .ingest_directory(&manifest(&dir, vec![observation("A", json!(1), 1, 1)], None, vec![]))
        .unwrap();
    let second = index
        .ingest_directory(&manifest(&dir, vec![observation("B", json!(2), 2, 2)], None, vec![]))
        .unwrap();
    assert_eq!(first.directory_id, second.directory_id);
    assert_eq!(index.count(EntityKind::MetadataDirectory).unwrap(), 1);
    assert_eq!(index.count(EntityKind::ObservationRecord).unwrap(), 2);
    assert!(index.directory_by_token("2024-03-03").unwrap().is_some());
}

#[test]
fn observation_values_are_coerced() {
    let archive = Archive::new();
    let index = support::seeded_index(&archive);
    let Some(AnyEntity::Observation(row)) = index
        .get(EntityRef::new(EntityKind::ObservationRecord, 2))
        .unwrap()
    else {
        panic!("observation 2 missing");
    };
    assert_eq!(row.cloudperce, 5.0);
    assert_eq!(row.tarsize, 1024);
    assert_eq!(row.acquisitio.map(|d| d.to_string()), Some("2023-06-11".to_owned()));
    assert!(row.attributes().iter().all(|(name, _)| *name != "filename"));
}

#[test]
fn projection_numbers_accept_decimal_commas() {
    let archive = Archive::new();
    let index = support::seeded_index(&archive);
    let Some(AnyEntity::Projection(projection)) = index
        .get(EntityRef::new(EntityKind::ProjectionDefinition, 1))
        .unwrap()
    else {
        panic!("projection missing");
    };
    assert_eq!(projection.datum_ellipsoid_inverse_flattening, 298.257223563);
    assert_eq!(projection.datum_ellipsoid_semi_major_axis, 6378137.0);
    assert_eq!(projection.datum_id_code, 6326);
}

#[test]
fn missing_image_fails_without_georeferences() {
    let archive = Archive::new();
    let index = Index::open_in_memory().unwrap();
    let good = archive.scene("2024-04-04", "good", true);
    let orphan = archive.scene("2024-04-04", "orphan", false);
    let err = index
        .ingest_directory(&manifest(
            &archive.metadata_dir("2024-04-04"),
            vec![observation("A", json!("1,5"), 1, 1)],
            Some(projection()),
            vec![georeference(&good, 1.0), georeference(&orphan, 2.0)],
        ))
        .unwrap_err();

    assert_eq!(err.code(), "ValidationError");
    assert!(err.to_string().contains("orphan.jpg"), "{err}");
    assert_eq!(index.count(EntityKind::GeoreferenceFile).unwrap(), 0);
    assert_eq!(index.count(EntityKind::ObservationRecord).unwrap(), 1);
    assert_eq!(index.count(EntityKind::ProjectionDefinition).unwrap(), 1);
}

#[test]
fn second_projection_for_a_directory_is_rejected() {
    let archive = Archive::new();
    let index = Index::open_in_memory().unwrap();
    let dir = archive.metadata_dir("2024-05-05");
    index
        .ingest_directory(&manifest(&dir, vec![], Some(projection()), vec![]))
        .unwrap();
    let err = index
        .ingest_directory(&manifest(&dir, vec![], Some(projection()), vec![]))
        .unwrap_err();
    assert_eq!(err.code(), "ValidationError");
    assert_eq!(index.count(EntityKind::ProjectionDefinition).unwrap(), 1);
    assert_eq!(index.count(EntityKind::AxisEntry).unwrap(), 2);
}

#[test]
fn malformed_numbers_are_validation_errors() {
    let archive = Archive::new();
    let index = Index::open_in_memory().unwrap();
    let err = index
        .ingest_directory(&manifest(
            &archive.metadata_dir("2024-06-06"),
            vec![observation("A", json!("cloudy"), 1, 1)],
            None,
            vec![],
        ))
        .unwrap_err();
    assert_eq!(err.code(), "ValidationError");
    assert!(err.to_string().contains("cloudperce"), "{err}");
}

#[test]
fn non_finite_numbers_are_validation_errors() {
    let archive = Archive::new();
    let index = Index::open_in_memory().unwrap();
    for (i, raw) in ["NaN", "inf", "1e400"].into_iter().enumerate() {
        let err = index
            .ingest_directory(&manifest(
                &archive.metadata_dir(&format!("2024-07-0{}", i + 1)),
                vec![observation("A", json!(raw), 1, 1)],
                None,
                vec![],
            ))
            .unwrap_err();
        assert_eq!(err.code(), "ValidationError", "{raw}: {err}");
        assert!(err.to_string().contains("cloudperce"), "{err}");
    }
    assert_eq!(index.count(EntityKind::ObservationRecord).unwrap(), 0);
}

#[test]
fn georeference_defaults_to_sibling_image() {
    let archive = Archive::new();
    let index = support::seeded_index(&archive);
    let results: Vec<GeoreferenceFile> = index.search("path_str != ''").unwrap();
    assert_eq!(results.len(), 3);
    for file in &results {
        assert!(file.jpg.ends_with(".jpg"), "{}", file.jpg);
        assert_eq!(file.jpg.trim_end_matches(".jpg"), file.path.trim_end_matches(".jgw"));
        assert_eq!(file.scale_y, -30.0);
    }
}

#[test]
fn file_index_persists_between_opens() {
    let archive = Archive::new();
    let db = archive.root().join("db").join("index.sqlite");
    {
        let index = Index::open(&IndexOptions::file(&db)).unwrap();
        for manifest in seeded_manifests(&archive) {
            index.ingest_directory(&manifest).unwrap();
        }
    }
    let reopened = Index::open(&IndexOptions::file(&db).create_if_missing(false)).unwrap();
    assert_eq!(reopened.count(EntityKind::GeoreferenceFile).unwrap(), 3);

    let missing = archive.root().join("absent.sqlite");
    let err = Index::open(&IndexOptions::file(&missing).create_if_missing(false)).unwrap_err();
    assert_eq!(err.code(), "MissingDatabase");
}
