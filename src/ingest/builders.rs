//! Validating constructors for rows about to be written.
//!
//! Each builder performs the explicit coercion for its kind: locale-aware
//! decimal parsing, integer checks and required-column checks. A builder that
//! returns `Ok` always produces a row the table accepts.

use std::collections::BTreeMap;

use time::Date;
use tracing::debug;

use crate::error::{IndexError, Result};
use crate::model::{coerce, Value, ValueType};

use super::{AxisDescriptor, GeoreferenceRecord, ProjectionDescriptor, RawRecord};

const OBSERVATION_COLUMNS: [&str; 9] = [
    "batch",
    "tarsize",
    "satellite",
    "sensorid",
    "acquisitio",
    "cloudperce",
    "orbitid",
    "scenepath",
    "scenerow",
];

/// Column carried by attribute tables but not stored.
const DROPPED_COLUMN: &str = "filename";

fn unexpected(field: &str, value: &Value) -> IndexError {
    IndexError::validation(field, format!("unexpected value {value}"))
}

fn text(raw: Option<&serde_json::Value>, field: &str) -> Result<String> {
    match coerce::from_json(field, ValueType::Text, raw, false)? {
        Value::Text(v) => Ok(v),
        other => Err(unexpected(field, &other)),
    }
}

fn integer(raw: Option<&serde_json::Value>, field: &str) -> Result<i64> {
    match coerce::from_json(field, ValueType::Integer, raw, false)? {
        Value::Integer(v) => Ok(v),
        other => Err(unexpected(field, &other)),
    }
}

fn float(raw: Option<&serde_json::Value>, field: &str) -> Result<f64> {
    match coerce::from_json(field, ValueType::Float, raw, false)? {
        Value::Float(v) => Ok(v),
        other => Err(unexpected(field, &other)),
    }
}

fn optional_date(raw: Option<&serde_json::Value>, field: &str) -> Result<Option<Date>> {
    match coerce::from_json(field, ValueType::Date, raw, true)? {
        Value::Date(v) => Ok(Some(v)),
        Value::Null => Ok(None),
        other => Err(unexpected(field, &other)),
    }
}

/// A validated attribute-table row.
#[derive(Clone, Debug, PartialEq)]
pub struct NewObservation {
    /// Processing batch label.
    pub batch: String,
    /// Archive size.
    pub tarsize: i64,
    /// Satellite name.
    pub satellite: String,
    /// Sensor identifier.
    pub sensorid: String,
    /// Acquisition date.
    pub acquisitio: Option<Date>,
    /// Cloud cover percentage.
    pub cloudperce: f64,
    /// Orbit identifier.
    pub orbitid: i64,
    /// Scene path.
    pub scenepath: i64,
    /// Scene row.
    pub scenerow: i64,
}

impl NewObservation {
    /// Validates one extracted attribute-table row. Column names match
    /// case-insensitively; unknown columns are ignored.
    pub fn from_record(record: &RawRecord) -> Result<Self> {
        let columns: BTreeMap<String, &serde_json::Value> = record
            .iter()
            .map(|(k, v)| (k.to_ascii_lowercase(), v))
            .collect();
        for key in columns.keys() {
            if key != DROPPED_COLUMN && !OBSERVATION_COLUMNS.contains(&key.as_str()) {
                debug!(column = %key, "ignoring attribute-table column");
            }
        }
        let get = |name: &str| columns.get(name).copied();

        Ok(Self {
            batch: text(get("batch"), "batch")?,
            tarsize: integer(get("tarsize"), "tarsize")?,
            satellite: text(get("satellite"), "satellite")?,
            sensorid: text(get("sensorid"), "sensorid")?,
            acquisitio: optional_date(get("acquisitio"), "acquisitio")?,
            cloudperce: float(get("cloudperce"), "cloudperce")?,
            orbitid: integer(get("orbitid"), "orbitid")?,
            scenepath: integer(get("scenepath"), "scenepath")?,
            scenerow: integer(get("scenerow"), "scenerow")?,
        })
    }

    pub(crate) fn columns(&self) -> Vec<(&'static str, Value)> {
        vec![
            ("batch", Value::from(self.batch.as_str())),
            ("tarsize", Value::Integer(self.tarsize)),
            ("satellite", Value::from(self.satellite.as_str())),
            ("sensorid", Value::from(self.sensorid.as_str())),
            ("acquisitio", Value::from(self.acquisitio)),
            ("cloudperce", Value::Float(self.cloudperce)),
            ("orbitid", Value::Integer(self.orbitid)),
            ("scenepath", Value::Integer(self.scenepath)),
            ("scenerow", Value::Integer(self.scenerow)),
        ]
    }
}

/// A validated projection descriptor, flattened to columns.
#[derive(Clone, Debug, PartialEq)]
pub struct NewProjection {
    /// Descriptor schema URI.
    pub schema: String,
    /// Coordinate reference system type.
    pub r#type: String,
    /// Coordinate reference system name.
    pub name: String,
    /// Datum type.
    pub datum_type: String,
    /// Datum name.
    pub datum_name: String,
    /// Ellipsoid name.
    pub datum_ellipsoid_name: String,
    /// Ellipsoid semi-major axis.
    pub datum_ellipsoid_semi_major_axis: f64,
    /// Ellipsoid inverse flattening.
    pub datum_ellipsoid_inverse_flattening: f64,
    /// Datum identifier authority.
    pub datum_id_authority: String,
    /// Datum identifier code.
    pub datum_id_code: i64,
    /// Coordinate system subtype.
    pub coordinate_system_subtype: String,
    /// Validated axes.
    pub axes: Vec<NewAxis>,
}

impl NewProjection {
    /// Validates a projection descriptor and all of its axes.
    pub fn from_descriptor(descriptor: &ProjectionDescriptor) -> Result<Self> {
        let datum = &descriptor.datum;
        Ok(Self {
            schema: descriptor.schema.clone(),
            r#type: descriptor.kind.clone(),
            name: descriptor.name.clone(),
            datum_type: datum.kind.clone(),
            datum_name: datum.name.clone(),
            datum_ellipsoid_name: datum.ellipsoid.name.clone(),
            datum_ellipsoid_semi_major_axis: float(
                Some(&datum.ellipsoid.semi_major_axis),
                "datum_ellipsoid_semi_major_axis",
            )?,
            datum_ellipsoid_inverse_flattening: float(
                Some(&datum.ellipsoid.inverse_flattening),
                "datum_ellipsoid_inverse_flattening",
            )?,
            datum_id_authority: datum.id.authority.clone(),
            datum_id_code: integer(Some(&datum.id.code), "datum_id_code")?,
            coordinate_system_subtype: descriptor.coordinate_system.subtype.clone(),
            axes: descriptor
                .coordinate_system
                .axis
                .iter()
                .map(NewAxis::from_descriptor)
                .collect::<Result<_>>()?,
        })
    }

    pub(crate) fn columns(&self) -> Vec<(&'static str, Value)> {
        vec![
            ("schema", Value::from(self.schema.as_str())),
            ("type", Value::from(self.r#type.as_str())),
            ("name", Value::from(self.name.as_str())),
            ("datum_type", Value::from(self.datum_type.as_str())),
            ("datum_name", Value::from(self.datum_name.as_str())),
            ("datum_ellipsoid_name", Value::from(self.datum_ellipsoid_name.as_str())),
            (
                "datum_ellipsoid_semi_major_axis",
                Value::Float(self.datum_ellipsoid_semi_major_axis),
            ),
            (
                "datum_ellipsoid_inverse_flattening",
                Value::Float(self.datum_ellipsoid_inverse_flattening),
            ),
            ("datum_id_authority", Value::from(self.datum_id_authority.as_str())),
            ("datum_id_code", Value::Integer(self.datum_id_code)),
            (
                "coordinate_system_subtype",
                Value::from(self.coordinate_system_subtype.as_str()),
            ),
        ]
    }
}

/// A validated coordinate axis.
#[derive(Clone, Debug, PartialEq)]
pub struct NewAxis {
    /// Axis name.
    pub name: String,
    /// Axis abbreviation.
    pub abbreviation: String,
    /// Axis direction.
    pub direction: String,
    /// Unit type.
    pub unit_type: String,
    /// Unit name.
    pub unit_name: String,
    /// Unit conversion factor.
    pub unit_conversion_factor: f64,
}

impl NewAxis {
    /// Validates one axis descriptor.
    pub fn from_descriptor(axis: &AxisDescriptor) -> Result<Self> {
        Ok(Self {
            name: axis.name.clone(),
            abbreviation: axis.abbreviation.clone(),
            direction: axis.direction.clone(),
            unit_type: axis.unit.kind.clone(),
            unit_name: axis.unit.name.clone(),
            unit_conversion_factor: float(
                Some(&axis.unit.conversion_factor),
                "unit_conversion_factor",
            )?,
        })
    }

    pub(crate) fn columns(&self) -> Vec<(&'static str, Value)> {
        vec![
            ("name", Value::from(self.name.as_str())),
            ("abbreviation", Value::from(self.abbreviation.as_str())),
            ("direction", Value::from(self.direction.as_str())),
            ("unit_type", Value::from(self.unit_type.as_str())),
            ("unit_name", Value::from(self.unit_name.as_str())),
            ("unit_conversion_factor", Value::Float(self.unit_conversion_factor)),
        ]
    }
}

/// A validated georeferencing record whose paired image exists.
#[derive(Clone, Debug, PartialEq)]
pub struct NewGeoreference {
    /// Georeferencing file path.
    pub path: String,
    /// Paired image path.
    pub jpg: String,
    /// Six affine parameters in file order.
    pub parameters: [f64; 6],
}

impl NewGeoreference {
    /// Validates a georeferencing record; fails if the paired image is missing.
    pub fn from_record(record: &GeoreferenceRecord) -> Result<Self> {
        let image = record.image_path();
        if !image.is_file() {
            return Err(IndexError::validation(
                "jpg",
                format!("paired image {} does not exist", image.display()),
            ));
        }
        Ok(Self {
            path: record.path.to_string_lossy().into_owned(),
            jpg: image.to_string_lossy().into_owned(),
            parameters: [
                record.scale_x,
                record.rotation_y,
                record.rotation_x,
                record.scale_y,
                record.upper_left_x,
                record.upper_left_y,
            ],
        })
    }

    pub(crate) fn columns(&self) -> Vec<(&'static str, Value)> {
        const NAMES: [&str; 6] = [
            "scale_x",
            "rotation_y",
            "rotation_x",
            "scale_y",
            "upper_left_x",
            "upper_left_y",
        ];
        let mut columns = vec![
            ("path", Value::from(self.path.as_str())),
            ("jpg", Value::from(self.jpg.as_str())),
        ];
        columns.extend(NAMES.into_iter().zip(self.parameters).map(|(n, v)| (n, Value::Float(v))));
        columns
    }
}
