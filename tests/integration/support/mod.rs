#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};

use scenedex::{DirectoryManifest, Index};
use serde_json::{json, Value};
use tempfile::TempDir;

/// Scratch archive laid out as `<root>/<date>/metadata/<scene>.{jgw,jpg}`.
pub struct Archive {
    dir: TempDir,
}

impl Archive {
    pub fn new() -> Self {
        Self {
            dir: TempDir::new().expect("tempdir"),
        }
    }

    pub fn root(&self) -> &Path {
        self.dir.path()
    }

    pub fn metadata_dir(&self, date: &str) -> PathBuf {
        let path = self.root().join(date).join("metadata");
        fs::create_dir_all(&path).expect("create metadata dir");
        path
    }

    /// Writes `<scene>.jgw` and, when `with_image` is set, `<scene>.jpg`.
    pub fn scene(&self, date: &str, scene: &str, with_image: bool) -> PathBuf {
        let dir = self.metadata_dir(date);
        let jgw = dir.join(format!("{scene}.jgw"));
        fs::write(&jgw, "30.0\n0.0\n0.0\n-30.0\n500000.0\n9000000.0\n").expect("write jgw");
        if with_image {
            fs::write(jgw.with_extension("jpg"), b"\xff\xd8\xff\xd9").expect("write jpg");
        }
        jgw
    }
}

pub fn observation(satellite: &str, cloud: Value, scenepath: i64, scenerow: i64) -> Value {
    json!({
        "BATCH": "B1",
        "TARSIZE": "1024",
        "SATELLITE": satellite,
        "SENSORID": "MUX",
        "ACQUISITIO": "20230611",
        "CLOUDPERCE": cloud,
        "ORBITID": 17,
        "SCENEPATH": scenepath,
        "SCENEROW": scenerow,
        "FILENAME": "ignored.tar.gz"
    })
}

pub fn projection() -> Value {
    let axis = |name: &str, abbreviation: &str, direction: &str| {
        json!({
            "name": name,
            "abbreviation": abbreviation,
            "direction": direction,
            "unit": {"type": "LinearUnit", "name": "metre", "conversion_factor": 1}
        })
    };
    json!({
        "$schema": "https://proj.org/schemas/v0.7/projjson.schema.json",
        "type": "ProjectedCRS",
        "name": "WGS 84 / UTM zone 23S",
        "datum": {
            "type": "GeodeticReferenceFrame",
            "name": "World Geodetic System 1984",
            "ellipsoid": {
                "name": "WGS 84",
                "semi_major_axis": 6378137,
                "inverse_flattening": "298,257223563"
            },
            "id": {"authority": "EPSG", "code": 6326}
        },
        "coordinate_system": {
            "subtype": "Cartesian",
            "axis": [axis("Easting", "E", "east"), axis("Northing", "N", "north")]
        }
    })
}

pub fn georeference(jgw: &Path, upper_left_x: f64) -> Value {
    json!({
        "path": jgw,
        "scale_x": 30.0,
        "rotation_y": 0.0,
        "rotation_x": 0.0,
        "scale_y": -30.0,
        "upper_left_x": upper_left_x,
        "upper_left_y": 9000000.0
    })
}

pub fn manifest(
    path: &Path,
    observations: Vec<Value>,
    projection: Option<Value>,
    georeferences: Vec<Value>,
) -> DirectoryManifest {
    serde_json::from_value(manifest_json(path, observations, projection, georeferences))
        .expect("valid manifest")
}

pub fn manifest_json(
    path: &Path,
    observations: Vec<Value>,
    projection: Option<Value>,
    georeferences: Vec<Value>,
) -> Value {
    json!({
        "path": path,
        "observations": observations,
        "projection": projection,
        "georeferences": georeferences
    })
}

/// Two directories:
///
/// - `2024-01-01`: two LANDSAT-8 rows (cloud 0 and 5), a projection with
///   Easting/Northing axes and georeferences `a1`, `a2`;
/// - `2024-02-01`: one CBERS-4 row (cloud 10), no projection and `b1`.
pub fn seeded_manifests(archive: &Archive) -> Vec<DirectoryManifest> {
    let a1 = archive.scene("2024-01-01", "a1", true);
    let a2 = archive.scene("2024-01-01", "a2", true);
    let b1 = archive.scene("2024-02-01", "b1", true);
    vec![
        manifest(
            &archive.metadata_dir("2024-01-01"),
            vec![
                observation("LANDSAT-8", json!("0"), 215, 66),
                observation("LANDSAT-8", json!("5,0"), 215, 67),
            ],
            Some(projection()),
            vec![georeference(&a1, 100.0), georeference(&a2, 200.0)],
        ),
        manifest(
            &archive.metadata_dir("2024-02-01"),
            vec![observation("CBERS-4", json!(10), 150, 120)],
            None,
            vec![georeference(&b1, 300.0)],
        ),
    ]
}

pub fn seeded_index(archive: &Archive) -> Index {
    let index = Index::open_in_memory().expect("open index");
    for manifest in seeded_manifests(archive) {
        index.ingest_directory(&manifest).expect("ingest");
    }
    index
}

/// File stems of the matched georeference paths, in result order.
pub fn stems(index: &Index, query: &str) -> Vec<String> {
    index
        .search(query)
        .unwrap_or_else(|err| panic!("search '{query}' failed: {err}"))
        .iter()
        .map(|g| {
            Path::new(&g.path)
                .file_stem()
                .and_then(|s| s.to_str())
                .unwrap_or_default()
                .to_owned()
        })
        .collect()
}
