//! Cycle-safe conversion of stored records into nested trees.
//!
//! A record is rendered with its own attributes, its parent inlined under the
//! relationship field (`directory`, `projection`) and each kind of child as a
//! list keyed by the child kind's name. Parent and child links point both
//! ways, so the traversal carries two guards in a [`TraversalContext`] owned
//! by the top-level call:
//!
//! - every instance is expanded at most once; later encounters render as
//!   `{"$visited": "<kind>/<id>"}`;
//! - a kind already expanded as an ancestor on the current path is not
//!   descended into again.

use std::collections::{BTreeSet, HashSet};

use serde_json::{Map, Value as Json};

use crate::error::{IndexError, Result};
use crate::model::{AnyEntity, Entity, EntityKind, EntityRef};
use crate::schema::Schema;
use crate::store::Index;

/// Key of the marker rendered for already visited instances.
pub const VISITED_MARKER: &str = "$visited";

/// Read access to records and their relationships.
pub trait EntitySource {
    /// Registry describing the relationships.
    fn schema(&self) -> &Schema;
    /// Loads one record.
    fn load(&self, entity: EntityRef) -> Result<AnyEntity>;
    /// Records of `kind` owned by `parent`, ordered by id.
    fn children(&self, parent: EntityRef, kind: EntityKind) -> Result<Vec<AnyEntity>>;
}

impl EntitySource for Index {
    fn schema(&self) -> &Schema {
        Index::schema(self)
    }

    fn load(&self, entity: EntityRef) -> Result<AnyEntity> {
        self.get(entity)?
            .ok_or_else(|| IndexError::InvalidArgument(format!("{entity} does not exist")))
    }

    fn children(&self, parent: EntityRef, kind: EntityKind) -> Result<Vec<AnyEntity>> {
        Index::children(self, parent, kind)
    }
}

/// Guards for one top-level flattening call.
pub struct TraversalContext<'a, S: EntitySource + ?Sized> {
    source: &'a S,
    visited: HashSet<EntityRef>,
}

impl<'a, S: EntitySource + ?Sized> TraversalContext<'a, S> {
    /// Fresh context with no visited instances.
    pub fn new(source: &'a S) -> Self {
        Self {
            source,
            visited: HashSet::new(),
        }
    }

    /// Instances expanded so far.
    pub fn visited(&self) -> &HashSet<EntityRef> {
        &self.visited
    }

    /// Flattens `entity` with no ancestors on the path.
    pub fn flatten(&mut self, entity: &dyn Entity) -> Result<Json> {
        self.flatten_under(entity, &BTreeSet::new())
    }

    fn flatten_under(&mut self, entity: &dyn Entity, upper: &BTreeSet<EntityKind>) -> Result<Json> {
        let this = entity.entity_ref();
        if !self.visited.insert(this) {
            let mut marker = Map::new();
            marker.insert(VISITED_MARKER.to_owned(), Json::String(this.to_string()));
            return Ok(Json::Object(marker));
        }

        let mut tree = Map::new();
        for (name, value) in entity.attributes() {
            tree.insert(name.to_owned(), value.to_json());
        }

        let mut path = upper.clone();
        path.insert(this.kind);
        let source = self.source;
        let schema = source.schema();

        if let (Some((parent_kind, relation)), Some(parent)) =
            (schema.parent_of(this.kind), entity.parent())
        {
            if !path.contains(&parent_kind) {
                let record = source.load(parent)?;
                let inlined = self.flatten_under(&record, &path)?;
                tree.insert(relation.field.to_owned(), inlined);
            }
        }

        let child_kinds: Vec<EntityKind> = schema.children_of(this.kind).map(|d| d.kind).collect();
        for kind in child_kinds {
            if path.contains(&kind) {
                continue;
            }
            let children = source.children(this, kind)?;
            let mut items = Vec::with_capacity(children.len());
            for child in &children {
                items.push(self.flatten_under(child, &path)?);
            }
            tree.insert(kind.name().to_owned(), Json::Array(items));
        }

        Ok(Json::Object(tree))
    }
}

/// Flattens one record and everything reachable from it.
pub fn to_tree<S: EntitySource + ?Sized>(source: &S, entity: &dyn Entity) -> Result<Json> {
    TraversalContext::new(source).flatten(entity)
}

/// Flattens each record with its own fresh guards.
pub fn records_as_list<S, E>(source: &S, entities: &[E]) -> Result<Vec<Json>>
where
    S: EntitySource + ?Sized,
    E: Entity,
{
    entities.iter().map(|entity| to_tree(source, entity)).collect()
}
