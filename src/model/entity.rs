use std::path::Path;

use rusqlite::types::Type;
use rusqlite::Row;
use time::Date;

use super::{coerce, EntityKind, EntityRef, Value};

/// Common view over the typed records of every entity kind.
pub trait Entity {
    /// Kind of this record.
    fn kind(&self) -> EntityKind;
    /// Surrogate key.
    fn id(&self) -> i64;
    /// The record this one belongs to, if its kind has a parent.
    fn parent(&self) -> Option<EntityRef>;
    /// Own attributes including `id`, `created_at` and `updated_at`, in
    /// declared order. Relationship columns are not included.
    fn attributes(&self) -> Vec<(&'static str, Value)>;

    /// Identity of this record.
    fn entity_ref(&self) -> EntityRef {
        EntityRef::new(self.kind(), self.id())
    }
}

fn audit(id: i64, created_at: &str, updated_at: &str) -> Vec<(&'static str, Value)> {
    vec![
        ("id", Value::Integer(id)),
        ("created_at", Value::from(created_at)),
        ("updated_at", Value::from(updated_at)),
    ]
}

fn get_date(row: &Row<'_>, column: &str) -> rusqlite::Result<Option<Date>> {
    let raw: Option<String> = row.get(column)?;
    raw.map(|text| {
        coerce::parse_date_text(&text).ok_or_else(|| {
            rusqlite::Error::FromSqlConversionFailure(
                0,
                Type::Text,
                format!("invalid stored date '{text}' in column {column}").into(),
            )
        })
    })
    .transpose()
}

/// One archive metadata directory.
#[derive(Clone, Debug, PartialEq)]
pub struct MetadataDirectory {
    /// Surrogate key.
    pub id: i64,
    /// Globally unique date token.
    pub date_str: String,
    /// Directory path as first ingested.
    pub path_str: String,
    /// RFC 3339 creation time.
    pub created_at: String,
    /// RFC 3339 update time.
    pub updated_at: String,
}

impl MetadataDirectory {
    /// Directory path as a [`Path`].
    pub fn path(&self) -> &Path {
        Path::new(&self.path_str)
    }

    pub(crate) fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get("id")?,
            date_str: row.get("date_str")?,
            path_str: row.get("path_str")?,
            created_at: row.get("created_at")?,
            updated_at: row.get("updated_at")?,
        })
    }
}

impl Entity for MetadataDirectory {
    fn kind(&self) -> EntityKind {
        EntityKind::MetadataDirectory
    }

    fn id(&self) -> i64 {
        self.id
    }

    fn parent(&self) -> Option<EntityRef> {
        None
    }

    fn attributes(&self) -> Vec<(&'static str, Value)> {
        let mut attrs = audit(self.id, &self.created_at, &self.updated_at);
        attrs.push(("date_str", Value::from(self.date_str.as_str())));
        attrs.push(("path_str", Value::from(self.path_str.as_str())));
        attrs
    }
}

/// One attribute-table row describing an archived scene.
#[derive(Clone, Debug, PartialEq)]
pub struct ObservationRecord {
    /// Surrogate key.
    pub id: i64,
    /// Owning directory.
    pub directory_id: i64,
    /// Processing batch label.
    pub batch: String,
    /// Archive size.
    pub tarsize: i64,
    /// Satellite name.
    pub satellite: String,
    /// Sensor identifier.
    pub sensorid: String,
    /// Acquisition date, when recorded.
    pub acquisitio: Option<Date>,
    /// Cloud cover percentage.
    pub cloudperce: f64,
    /// Orbit identifier.
    pub orbitid: i64,
    /// Scene path.
    pub scenepath: i64,
    /// Scene row.
    pub scenerow: i64,
    /// RFC 3339 creation time.
    pub created_at: String,
    /// RFC 3339 update time.
    pub updated_at: String,
}

impl ObservationRecord {
    pub(crate) fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get("id")?,
            directory_id: row.get("directory_id")?,
            batch: row.get("batch")?,
            tarsize: row.get("tarsize")?,
            satellite: row.get("satellite")?,
            sensorid: row.get("sensorid")?,
            acquisitio: get_date(row, "acquisitio")?,
            cloudperce: row.get("cloudperce")?,
            orbitid: row.get("orbitid")?,
            scenepath: row.get("scenepath")?,
            scenerow: row.get("scenerow")?,
            created_at: row.get("created_at")?,
            updated_at: row.get("updated_at")?,
        })
    }
}

impl Entity for ObservationRecord {
    fn kind(&self) -> EntityKind {
        EntityKind::ObservationRecord
    }

    fn id(&self) -> i64 {
        self.id
    }

    fn parent(&self) -> Option<EntityRef> {
        Some(EntityRef::new(EntityKind::MetadataDirectory, self.directory_id))
    }

    fn attributes(&self) -> Vec<(&'static str, Value)> {
        let mut attrs = audit(self.id, &self.created_at, &self.updated_at);
        attrs.extend([
            ("batch", Value::from(self.batch.as_str())),
            ("tarsize", Value::Integer(self.tarsize)),
            ("satellite", Value::from(self.satellite.as_str())),
            ("sensorid", Value::from(self.sensorid.as_str())),
            ("acquisitio", Value::from(self.acquisitio)),
            ("cloudperce", Value::Float(self.cloudperce)),
            ("orbitid", Value::Integer(self.orbitid)),
            ("scenepath", Value::Integer(self.scenepath)),
            ("scenerow", Value::Integer(self.scenerow)),
        ]);
        attrs
    }
}

/// Projection of a metadata directory.
#[derive(Clone, Debug, PartialEq)]
pub struct ProjectionDefinition {
    /// Surrogate key.
    pub id: i64,
    /// Owning directory.
    pub directory_id: i64,
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
    /// RFC 3339 creation time.
    pub created_at: String,
    /// RFC 3339 update time.
    pub updated_at: String,
}

impl ProjectionDefinition {
    pub(crate) fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get("id")?,
            directory_id: row.get("directory_id")?,
            schema: row.get("schema")?,
            r#type: row.get("type")?,
            name: row.get("name")?,
            datum_type: row.get("datum_type")?,
            datum_name: row.get("datum_name")?,
            datum_ellipsoid_name: row.get("datum_ellipsoid_name")?,
            datum_ellipsoid_semi_major_axis: row.get("datum_ellipsoid_semi_major_axis")?,
            datum_ellipsoid_inverse_flattening: row.get("datum_ellipsoid_inverse_flattening")?,
            datum_id_authority: row.get("datum_id_authority")?,
            datum_id_code: row.get("datum_id_code")?,
            coordinate_system_subtype: row.get("coordinate_system_subtype")?,
            created_at: row.get("created_at")?,
            updated_at: row.get("updated_at")?,
        })
    }
}

impl Entity for ProjectionDefinition {
    fn kind(&self) -> EntityKind {
        EntityKind::ProjectionDefinition
    }

    fn id(&self) -> i64 {
        self.id
    }

    fn parent(&self) -> Option<EntityRef> {
        Some(EntityRef::new(EntityKind::MetadataDirectory, self.directory_id))
    }

    fn attributes(&self) -> Vec<(&'static str, Value)> {
        let mut attrs = audit(self.id, &self.created_at, &self.updated_at);
        attrs.extend([
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
        ]);
        attrs
    }
}

/// One coordinate axis of a projection.
#[derive(Clone, Debug, PartialEq)]
pub struct AxisEntry {
    /// Surrogate key.
    pub id: i64,
    /// Owning projection.
    pub projection_id: i64,
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
    /// Unit conversion factor to the base unit.
    pub unit_conversion_factor: f64,
    /// RFC 3339 creation time.
    pub created_at: String,
    /// RFC 3339 update time.
    pub updated_at: String,
}

impl AxisEntry {
    pub(crate) fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get("id")?,
            projection_id: row.get("projection_id")?,
            name: row.get("name")?,
            abbreviation: row.get("abbreviation")?,
            direction: row.get("direction")?,
            unit_type: row.get("unit_type")?,
            unit_name: row.get("unit_name")?,
            unit_conversion_factor: row.get("unit_conversion_factor")?,
            created_at: row.get("created_at")?,
            updated_at: row.get("updated_at")?,
        })
    }
}

impl Entity for AxisEntry {
    fn kind(&self) -> EntityKind {
        EntityKind::AxisEntry
    }

    fn id(&self) -> i64 {
        self.id
    }

    fn parent(&self) -> Option<EntityRef> {
        Some(EntityRef::new(EntityKind::ProjectionDefinition, self.projection_id))
    }

    fn attributes(&self) -> Vec<(&'static str, Value)> {
        let mut attrs = audit(self.id, &self.created_at, &self.updated_at);
        attrs.extend([
            ("name", Value::from(self.name.as_str())),
            ("abbreviation", Value::from(self.abbreviation.as_str())),
            ("direction", Value::from(self.direction.as_str())),
            ("unit_type", Value::from(self.unit_type.as_str())),
            ("unit_name", Value::from(self.unit_name.as_str())),
            ("unit_conversion_factor", Value::Float(self.unit_conversion_factor)),
        ]);
        attrs
    }
}

/// One six-parameter georeferencing file and its paired image.
#[derive(Clone, Debug, PartialEq)]
pub struct GeoreferenceFile {
    /// Surrogate key.
    pub id: i64,
    /// Owning directory.
    pub directory_id: i64,
    /// Georeferencing file path.
    pub path: String,
    /// Paired raster image path.
    pub jpg: String,
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
    /// RFC 3339 creation time.
    pub created_at: String,
    /// RFC 3339 update time.
    pub updated_at: String,
}

impl GeoreferenceFile {
    pub(crate) fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get("id")?,
            directory_id: row.get("directory_id")?,
            path: row.get("path")?,
            jpg: row.get("jpg")?,
            scale_x: row.get("scale_x")?,
            rotation_y: row.get("rotation_y")?,
            rotation_x: row.get("rotation_x")?,
            scale_y: row.get("scale_y")?,
            upper_left_x: row.get("upper_left_x")?,
            upper_left_y: row.get("upper_left_y")?,
            created_at: row.get("created_at")?,
            updated_at: row.get("updated_at")?,
        })
    }
}

impl Entity for GeoreferenceFile {
    fn kind(&self) -> EntityKind {
        EntityKind::GeoreferenceFile
    }

    fn id(&self) -> i64 {
        self.id
    }

    fn parent(&self) -> Option<EntityRef> {
        Some(EntityRef::new(EntityKind::MetadataDirectory, self.directory_id))
    }

    fn attributes(&self) -> Vec<(&'static str, Value)> {
        let mut attrs = audit(self.id, &self.created_at, &self.updated_at);
        attrs.extend([
            ("path", Value::from(self.path.as_str())),
            ("jpg", Value::from(self.jpg.as_str())),
            ("scale_x", Value::Float(self.scale_x)),
            ("rotation_y", Value::Float(self.rotation_y)),
            ("rotation_x", Value::Float(self.rotation_x)),
            ("scale_y", Value::Float(self.scale_y)),
            ("upper_left_x", Value::Float(self.upper_left_x)),
            ("upper_left_y", Value::Float(self.upper_left_y)),
        ]);
        attrs
    }
}

/// A record of any kind.
#[derive(Clone, Debug, PartialEq)]
pub enum AnyEntity {
    /// See [`MetadataDirectory`].
    Directory(MetadataDirectory),
    /// See [`ObservationRecord`].
    Observation(ObservationRecord),
    /// See [`ProjectionDefinition`].
    Projection(ProjectionDefinition),
    /// See [`AxisEntry`].
    Axis(AxisEntry),
    /// See [`GeoreferenceFile`].
    Georeference(GeoreferenceFile),
}

impl AnyEntity {
    pub(crate) fn from_row(kind: EntityKind, row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(match kind {
            EntityKind::MetadataDirectory => AnyEntity::Directory(MetadataDirectory::from_row(row)?),
            EntityKind::ObservationRecord => {
                AnyEntity::Observation(ObservationRecord::from_row(row)?)
            }
            EntityKind::ProjectionDefinition => {
                AnyEntity::Projection(ProjectionDefinition::from_row(row)?)
            }
            EntityKind::AxisEntry => AnyEntity::Axis(AxisEntry::from_row(row)?),
            EntityKind::GeoreferenceFile => {
                AnyEntity::Georeference(GeoreferenceFile::from_row(row)?)
            }
        })
    }

    fn inner(&self) -> &dyn Entity {
        match self {
            AnyEntity::Directory(e) => e,
            AnyEntity::Observation(e) => e,
            AnyEntity::Projection(e) => e,
            AnyEntity::Axis(e) => e,
            AnyEntity::Georeference(e) => e,
        }
    }
}

impl Entity for AnyEntity {
    fn kind(&self) -> EntityKind {
        self.inner().kind()
    }

    fn id(&self) -> i64 {
        self.inner().id()
    }

    fn parent(&self) -> Option<EntityRef> {
        self.inner().parent()
    }

    fn attributes(&self) -> Vec<(&'static str, Value)> {
        self.inner().attributes()
    }
}

macro_rules! any_entity_from {
    ($($ty:ident => $variant:ident),* $(,)?) => {
        $(impl From<$ty> for AnyEntity {
            fn from(value: $ty) -> Self {
                AnyEntity::$variant(value)
            }
        })*
    };
}

any_entity_from!(
    MetadataDirectory => Directory,
    ObservationRecord => Observation,
    ProjectionDefinition => Projection,
    AxisEntry => Axis,
    GeoreferenceFile => Georeference,
);
