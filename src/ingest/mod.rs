//! Ingestion of extracted directory metadata.
//!
//! Extraction collaborators parse attribute tables, projection descriptors and
//! georeferencing files; this module receives their structured output as a
//! [`DirectoryManifest`] and writes it through the index.
//!
//! Storage order within a directory is observations, projection, then
//! georeferences. Every paired image is checked before the first georeference
//! row is written, so a missing image leaves no georeference of that directory
//! behind. Observation and projection rows written before the failure stay.

mod builders;

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::{IndexError, Result};
use crate::store::{Index, ParentRef};

pub use builders::{NewAxis, NewGeoreference, NewObservation, NewProjection};

/// One attribute-table row as produced by the extractor.
pub type RawRecord = serde_json::Map<String, serde_json::Value>;

/// Everything extracted from one archive metadata directory.
#[derive(Clone, Debug, Deserialize)]
pub struct DirectoryManifest {
    /// Metadata directory path.
    pub path: PathBuf,
    /// Date token; derived from `path` when absent.
    #[serde(default)]
    pub date_token: Option<String>,
    /// Attribute-table rows.
    #[serde(default)]
    pub observations: Vec<RawRecord>,
    /// Projection descriptor.
    #[serde(default)]
    pub projection: Option<ProjectionDescriptor>,
    /// Georeferencing records.
    #[serde(default)]
    pub georeferences: Vec<GeoreferenceRecord>,
}

impl DirectoryManifest {
    /// Date token used as the directory key.
    pub fn resolved_date_token(&self) -> Result<String> {
        match &self.date_token {
            Some(token) => Ok(token.clone()),
            None => date_token_from_path(&self.path),
        }
    }
}

/// Projection descriptor of a directory.
#[derive(Clone, Debug, Deserialize)]
pub struct ProjectionDescriptor {
    /// Descriptor schema URI.
    #[serde(alias = "$schema")]
    pub schema: String,
    /// Coordinate reference system type.
    #[serde(rename = "type")]
    pub kind: String,
    /// Coordinate reference system name.
    pub name: String,
    /// Geodetic datum.
    pub datum: DatumDescriptor,
    /// Coordinate system and its axes.
    pub coordinate_system: CoordinateSystemDescriptor,
}

/// Geodetic datum of a projection.
#[derive(Clone, Debug, Deserialize)]
pub struct DatumDescriptor {
    /// Datum type.
    #[serde(rename = "type")]
    pub kind: String,
    /// Datum name.
    pub name: String,
    /// Reference ellipsoid.
    pub ellipsoid: EllipsoidDescriptor,
    /// Authority identifier.
    pub id: AuthorityId,
}

/// Reference ellipsoid. Numeric members may be numbers or locale text.
#[derive(Clone, Debug, Deserialize)]
pub struct EllipsoidDescriptor {
    /// Ellipsoid name.
    pub name: String,
    /// Semi-major axis.
    pub semi_major_axis: serde_json::Value,
    /// Inverse flattening.
    pub inverse_flattening: serde_json::Value,
}

/// Authority and code identifying a datum.
#[derive(Clone, Debug, Deserialize)]
pub struct AuthorityId {
    /// Authority name.
    pub authority: String,
    /// Authority code.
    pub code: serde_json::Value,
}

/// Coordinate system of a projection.
#[derive(Clone, Debug, Deserialize)]
pub struct CoordinateSystemDescriptor {
    /// Coordinate system subtype.
    pub subtype: String,
    /// Axes in order.
    #[serde(default)]
    pub axis: Vec<AxisDescriptor>,
}

/// One coordinate axis.
#[derive(Clone, Debug, Deserialize)]
pub struct AxisDescriptor {
    /// Axis name.
    pub name: String,
    /// Axis abbreviation.
    pub abbreviation: String,
    /// Axis direction.
    pub direction: String,
    /// Axis unit.
    pub unit: UnitDescriptor,
}

/// Unit of an axis.
#[derive(Clone, Debug, Deserialize)]
pub struct UnitDescriptor {
    /// Unit type.
    #[serde(rename = "type")]
    pub kind: String,
    /// Unit name.
    pub name: String,
    /// Conversion factor to the base unit.
    pub conversion_factor: serde_json::Value,
}

/// Parsed six-parameter georeferencing file.
#[derive(Clone, Debug, Deserialize)]
pub struct GeoreferenceRecord {
    /// Georeferencing file path.
    pub path: PathBuf,
    /// Paired image; defaults to `path` with a `.jpg` extension.
    #[serde(default)]
    pub jpg: Option<PathBuf>,
    /// Pixel size in x.
    pub scale_x: f64,
    /// Rotation about y.
    pub rotation_y: f64,
    /// Rotation about x.
    pub rotation_x: f64,
    /// Pixel size in y.
    pub scale_y: f64,
    /// X of the upper-left pixel centre.
    pub upper_left_x: f64,
    /// Y of the upper-left pixel centre.
    pub upper_left_y: f64,
}

impl GeoreferenceRecord {
    /// Path of the paired raster image.
    pub fn image_path(&self) -> PathBuf {
        self.jpg
            .clone()
            .unwrap_or_else(|| self.path.with_extension("jpg"))
    }
}

/// Rows written for one directory.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct IngestSummary {
    /// Id of the created or reused directory.
    pub directory_id: i64,
    /// Directory key.
    pub date_token: String,
    /// Observation rows written.
    pub observations: usize,
    /// Projection rows written (0 or 1).
    pub projections: usize,
    /// Axis rows written.
    pub axes: usize,
    /// Georeference rows written.
    pub georeferences: usize,
}

/// Date token of a metadata directory: the name of its parent directory.
///
/// `/archive/2024-01-01/metadata` yields `2024-01-01`.
pub fn date_token_from_path(path: &Path) -> Result<String> {
    path.parent()
        .and_then(Path::file_name)
        .and_then(|name| name.to_str())
        .filter(|name| !name.is_empty())
        .map(str::to_owned)
        .ok_or_else(|| {
            IndexError::validation(
                "date_str",
                format!("cannot derive a date token from {}", path.display()),
            )
        })
}

impl Index {
    /// Stores one directory's extracted metadata.
    pub fn ingest_directory(&self, manifest: &DirectoryManifest) -> Result<IngestSummary> {
        let date_token = manifest.resolved_date_token()?;
        let directory = self.get_or_create_directory(&date_token, &manifest.path)?;
        let parent = ParentRef::from(&directory);
        let mut summary = IngestSummary {
            directory_id: directory.id,
            date_token,
            ..IngestSummary::default()
        };

        for record in &manifest.observations {
            self.store_observation(parent, record)?;
            summary.observations += 1;
        }

        if let Some(descriptor) = &manifest.projection {
            let (_, axes) = self.store_projection(parent, descriptor)?;
            summary.projections = 1;
            summary.axes = axes.len();
        }

        let georeferences = manifest
            .georeferences
            .iter()
            .map(NewGeoreference::from_record)
            .collect::<Result<Vec<_>>>()?;
        summary.georeferences = self.insert_georeferences(directory.id, &georeferences)?.len();

        info!(
            date_token = %summary.date_token,
            observations = summary.observations,
            axes = summary.axes,
            georeferences = summary.georeferences,
            "ingested metadata directory"
        );
        Ok(summary)
    }
}
