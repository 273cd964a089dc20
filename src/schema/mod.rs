//! Statically declared entity registry.
//!
//! Each entity kind is described by an [`EntityDescriptor`]: its typed fields,
//! an optional parent relationship slot and an optional unique key. Slots are
//! declared on the child and wired to a parent kind by [`SchemaBuilder`], which
//! rejects registries with unwired slots, unknown parents, duplicate
//! declarations or cyclic ownership. The storage layer generates its DDL from
//! the resulting [`Schema`].

mod catalog;

use std::collections::HashSet;

use thiserror::Error;

use crate::model::{EntityKind, ValueType};

pub use catalog::{FieldCatalog, FieldSpec};

/// Column names every table carries and that no descriptor may redeclare.
pub const AUDIT_COLUMNS: [&str; 3] = ["id", "created_at", "updated_at"];

/// Misconfiguration detected while assembling a [`Schema`].
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SchemaError {
    /// A kind was declared twice.
    #[error("entity kind '{0}' declared twice")]
    DuplicateKind(EntityKind),
    /// A field name repeats within a kind.
    #[error("field '{field}' declared twice on '{kind}'")]
    DuplicateField {
        /// Declaring kind.
        kind: EntityKind,
        /// Repeated field.
        field: &'static str,
    },
    /// A field reuses an audit or relationship column name.
    #[error("field '{field}' on '{kind}' collides with a reserved column")]
    ReservedField {
        /// Declaring kind.
        kind: EntityKind,
        /// Offending field.
        field: &'static str,
    },
    /// A relationship slot was declared but never wired to a parent.
    #[error("relationship '{field}' on '{kind}' was never wired")]
    UnwiredRelation {
        /// Declaring kind.
        kind: EntityKind,
        /// Relationship field.
        field: &'static str,
    },
    /// Wiring targets a kind without a relationship slot.
    #[error("'{0}' declares no relationship slot to wire")]
    MissingRelationSlot(EntityKind),
    /// Wiring names a parent kind that is not declared.
    #[error("'{kind}' is wired to undeclared parent '{parent}'")]
    UnknownParent {
        /// Child kind.
        kind: EntityKind,
        /// Missing parent kind.
        parent: EntityKind,
    },
    /// A kind was wired more than once.
    #[error("'{0}' is wired more than once")]
    DuplicateWiring(EntityKind),
    /// Ownership loops back to the kind itself.
    #[error("ownership of '{0}' is cyclic")]
    Cycle(EntityKind),
    /// A lookup asked for a kind the registry does not hold.
    #[error("entity kind '{0}' is not declared")]
    UndeclaredKind(EntityKind),
}

/// One typed attribute of an entity kind.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FieldDef {
    /// Column and attribute name.
    pub name: &'static str,
    /// Declared value type.
    pub value_type: ValueType,
    /// Whether the column admits nulls.
    pub nullable: bool,
}

impl FieldDef {
    /// Required text field.
    pub const fn text(name: &'static str) -> Self {
        Self::required(name, ValueType::Text)
    }

    /// Required integer field.
    pub const fn integer(name: &'static str) -> Self {
        Self::required(name, ValueType::Integer)
    }

    /// Required float field.
    pub const fn float(name: &'static str) -> Self {
        Self::required(name, ValueType::Float)
    }

    /// Nullable date field.
    pub const fn optional_date(name: &'static str) -> Self {
        Self {
            name,
            value_type: ValueType::Date,
            nullable: true,
        }
    }

    const fn required(name: &'static str, value_type: ValueType) -> Self {
        Self {
            name,
            value_type,
            nullable: false,
        }
    }
}

/// Parent relationship slot of a child kind.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RelationDef {
    /// Attribute name used when the parent is inlined (`directory`).
    pub field: &'static str,
    /// Foreign-key column (`directory_id`).
    pub column: &'static str,
    /// Whether each parent owns at most one child of this kind.
    pub unique: bool,
    /// Parent kind, set by [`SchemaBuilder::wire`].
    pub parent: Option<EntityKind>,
}

/// Declaration of one entity kind.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EntityDescriptor {
    /// Kind being declared.
    pub kind: EntityKind,
    /// Typed attributes in declared order.
    pub fields: Vec<FieldDef>,
    /// Parent relationship slot, if any.
    pub relation: Option<RelationDef>,
    /// Field that must be unique across rows.
    pub unique_key: Option<&'static str>,
}

impl EntityDescriptor {
    /// Declares `kind` with `fields`.
    pub fn new(kind: EntityKind, fields: &[FieldDef]) -> Self {
        Self {
            kind,
            fields: fields.to_vec(),
            relation: None,
            unique_key: None,
        }
    }

    /// Declares a many-to-one relationship slot.
    pub fn belongs_to(mut self, field: &'static str, column: &'static str) -> Self {
        self.relation = Some(RelationDef {
            field,
            column,
            unique: false,
            parent: None,
        });
        self
    }

    /// Declares a one-to-one relationship slot.
    pub fn belongs_to_unique(self, field: &'static str, column: &'static str) -> Self {
        let mut this = self.belongs_to(field, column);
        if let Some(relation) = this.relation.as_mut() {
            relation.unique = true;
        }
        this
    }

    /// Marks `field` as unique across rows.
    pub fn unique(mut self, field: &'static str) -> Self {
        self.unique_key = Some(field);
        self
    }

    /// Parent kind once wired.
    pub fn parent(&self) -> Option<EntityKind> {
        self.relation.and_then(|r| r.parent)
    }

    /// Looks up a field by name.
    pub fn field(&self, name: &str) -> Option<&FieldDef> {
        self.fields.iter().find(|f| f.name == name)
    }
}

/// Assembles and validates a [`Schema`].
#[derive(Debug, Default)]
pub struct SchemaBuilder {
    entities: Vec<EntityDescriptor>,
    wiring: Vec<(EntityKind, EntityKind)>,
}

impl SchemaBuilder {
    /// Empty builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Declares an entity kind.
    pub fn entity(mut self, descriptor: EntityDescriptor) -> Self {
        self.entities.push(descriptor);
        self
    }

    /// Wires the relationship slot of `child` to `parent`.
    pub fn wire(mut self, child: EntityKind, parent: EntityKind) -> Self {
        self.wiring.push((child, parent));
        self
    }

    /// Validates declarations and wiring.
    pub fn build(mut self) -> Result<Schema, SchemaError> {
        let mut kinds = HashSet::new();
        for descriptor in &self.entities {
            if !kinds.insert(descriptor.kind) {
                return Err(SchemaError::DuplicateKind(descriptor.kind));
            }
            let mut names = HashSet::new();
            for field in &descriptor.fields {
                let reserved = AUDIT_COLUMNS.contains(&field.name)
                    || descriptor
                        .relation
                        .is_some_and(|r| r.field == field.name || r.column == field.name);
                if reserved {
                    return Err(SchemaError::ReservedField {
                        kind: descriptor.kind,
                        field: field.name,
                    });
                }
                if !names.insert(field.name) {
                    return Err(SchemaError::DuplicateField {
                        kind: descriptor.kind,
                        field: field.name,
                    });
                }
            }
        }

        for (child, parent) in std::mem::take(&mut self.wiring) {
            if !kinds.contains(&parent) {
                return Err(SchemaError::UnknownParent {
                    kind: child,
                    parent,
                });
            }
            let descriptor = self
                .entities
                .iter_mut()
                .find(|d| d.kind == child)
                .ok_or(SchemaError::UndeclaredKind(child))?;
            let relation = descriptor
                .relation
                .as_mut()
                .ok_or(SchemaError::MissingRelationSlot(child))?;
            if relation.parent.is_some() {
                return Err(SchemaError::DuplicateWiring(child));
            }
            relation.parent = Some(parent);
        }

        for descriptor in &self.entities {
            if let Some(relation) = descriptor.relation {
                if relation.parent.is_none() {
                    return Err(SchemaError::UnwiredRelation {
                        kind: descriptor.kind,
                        field: relation.field,
                    });
                }
            }
        }

        let schema = Schema {
            entities: self.entities,
        };
        for descriptor in &schema.entities {
            schema.check_acyclic(descriptor.kind)?;
        }
        Ok(schema)
    }
}

/// Validated entity registry.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Schema {
    entities: Vec<EntityDescriptor>,
}

impl Schema {
    /// The five-kind registry used by the index.
    pub fn standard() -> Result<Self, SchemaError> {
        use EntityKind::*;

        SchemaBuilder::new()
            .entity(
                EntityDescriptor::new(
                    MetadataDirectory,
                    &[FieldDef::text("date_str"), FieldDef::text("path_str")],
                )
                .unique("date_str"),
            )
            .entity(
                EntityDescriptor::new(
                    ObservationRecord,
                    &[
                        FieldDef::text("batch"),
                        FieldDef::integer("tarsize"),
                        FieldDef::text("satellite"),
                        FieldDef::text("sensorid"),
                        FieldDef::optional_date("acquisitio"),
                        FieldDef::float("cloudperce"),
                        FieldDef::integer("orbitid"),
                        FieldDef::integer("scenepath"),
                        FieldDef::integer("scenerow"),
                    ],
                )
                .belongs_to("directory", "directory_id"),
            )
            .entity(
                EntityDescriptor::new(
                    ProjectionDefinition,
                    &[
                        FieldDef::text("schema"),
                        FieldDef::text("type"),
                        FieldDef::text("name"),
                        FieldDef::text("datum_type"),
                        FieldDef::text("datum_name"),
                        FieldDef::text("datum_ellipsoid_name"),
                        FieldDef::float("datum_ellipsoid_semi_major_axis"),
                        FieldDef::float("datum_ellipsoid_inverse_flattening"),
                        FieldDef::text("datum_id_authority"),
                        FieldDef::integer("datum_id_code"),
                        FieldDef::text("coordinate_system_subtype"),
                    ],
                )
                .belongs_to_unique("directory", "directory_id"),
            )
            .entity(
                EntityDescriptor::new(
                    AxisEntry,
                    &[
                        FieldDef::text("name"),
                        FieldDef::text("abbreviation"),
                        FieldDef::text("direction"),
                        FieldDef::text("unit_type"),
                        FieldDef::text("unit_name"),
                        FieldDef::float("unit_conversion_factor"),
                    ],
                )
                .belongs_to("projection", "projection_id"),
            )
            .entity(
                EntityDescriptor::new(
                    GeoreferenceFile,
                    &[
                        FieldDef::text("path"),
                        FieldDef::text("jpg"),
                        FieldDef::float("scale_x"),
                        FieldDef::float("rotation_y"),
                        FieldDef::float("rotation_x"),
                        FieldDef::float("scale_y"),
                        FieldDef::float("upper_left_x"),
                        FieldDef::float("upper_left_y"),
                    ],
                )
                .belongs_to("directory", "directory_id"),
            )
            .wire(ObservationRecord, MetadataDirectory)
            .wire(ProjectionDefinition, MetadataDirectory)
            .wire(AxisEntry, ProjectionDefinition)
            .wire(GeoreferenceFile, MetadataDirectory)
            .build()
    }

    /// Descriptors in declared order.
    pub fn entities(&self) -> &[EntityDescriptor] {
        &self.entities
    }

    /// Descriptor of `kind`.
    pub fn descriptor(&self, kind: EntityKind) -> Result<&EntityDescriptor, SchemaError> {
        self.entities
            .iter()
            .find(|d| d.kind == kind)
            .ok_or(SchemaError::UndeclaredKind(kind))
    }

    /// Parent kind and relationship slot of `kind`.
    pub fn parent_of(&self, kind: EntityKind) -> Option<(EntityKind, RelationDef)> {
        let relation = self.descriptor(kind).ok()?.relation?;
        Some((relation.parent?, relation))
    }

    /// Descriptors whose relationship points at `kind`.
    pub fn children_of(&self, kind: EntityKind) -> impl Iterator<Item = &EntityDescriptor> {
        self.entities
            .iter()
            .filter(move |d| d.parent() == Some(kind))
    }

    fn check_acyclic(&self, start: EntityKind) -> Result<(), SchemaError> {
        let mut seen = HashSet::from([start]);
        let mut current = start;
        while let Some((parent, _)) = self.parent_of(current) {
            if !seen.insert(parent) {
                return Err(SchemaError::Cycle(start));
            }
            current = parent;
        }
        Ok(())
    }
}
