//! Entity kinds, scalar values and the typed records stored in the index.
//!
//! Every stored row is surfaced as a dedicated value object
//! ([`MetadataDirectory`], [`ObservationRecord`], ...). [`AnyEntity`] wraps
//! them for code that walks the relationship graph without caring which kind
//! it holds.

pub mod coerce;
mod entity;
mod value;

use std::fmt;
use std::str::FromStr;

use serde::Serialize;

pub use entity::{
    AnyEntity, AxisEntry, Entity, GeoreferenceFile, MetadataDirectory, ObservationRecord,
    ProjectionDefinition,
};
pub use value::{Value, ValueType};

/// The five entity kinds known to the index.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    /// One archive metadata directory, keyed by its date token.
    MetadataDirectory,
    /// One attribute-table row describing a scene.
    ObservationRecord,
    /// The projection of a metadata directory.
    ProjectionDefinition,
    /// One coordinate axis of a projection.
    AxisEntry,
    /// One six-parameter georeferencing file and its paired image.
    GeoreferenceFile,
}

impl EntityKind {
    /// All kinds in declaration order.
    pub const ALL: [EntityKind; 5] = [
        EntityKind::MetadataDirectory,
        EntityKind::ObservationRecord,
        EntityKind::ProjectionDefinition,
        EntityKind::AxisEntry,
        EntityKind::GeoreferenceFile,
    ];

    /// Snake-case name, also used as the table name.
    pub fn name(self) -> &'static str {
        match self {
            EntityKind::MetadataDirectory => "metadata_directory",
            EntityKind::ObservationRecord => "observation_record",
            EntityKind::ProjectionDefinition => "projection_definition",
            EntityKind::AxisEntry => "axis_entry",
            EntityKind::GeoreferenceFile => "georeference_file",
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for EntityKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        EntityKind::ALL
            .into_iter()
            .find(|kind| kind.name() == s)
            .ok_or_else(|| format!("unknown entity kind '{s}'"))
    }
}

/// Identity of one stored entity instance.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct EntityRef {
    /// Kind of the referenced row.
    pub kind: EntityKind,
    /// Surrogate key of the referenced row.
    pub id: i64,
}

impl EntityRef {
    /// Creates a reference to row `id` of `kind`.
    pub fn new(kind: EntityKind, id: i64) -> Self {
        Self { kind, id }
    }
}

impl fmt::Display for EntityRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.kind, self.id)
    }
}
