use std::collections::BTreeMap;

use serde::Serialize;

use crate::error::{IndexError, Result};
use crate::model::{EntityKind, ValueType};

use super::{Schema, AUDIT_COLUMNS};

/// A queryable field and the kind that declares it.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct FieldSpec {
    /// Declaring kind.
    pub kind: EntityKind,
    /// Bare field name, also the column name.
    pub name: &'static str,
    /// Declared value type.
    pub value_type: ValueType,
}

impl FieldSpec {
    /// `<kind>.<field>` form, accepted for every field.
    pub fn qualified_name(&self) -> String {
        format!("{}.{}", self.kind, self.name)
    }
}

#[derive(Debug, Clone)]
enum Resolution {
    Unique(usize),
    Ambiguous(Vec<usize>),
}

/// The set of fields a query may filter on.
///
/// Identity, audit-timestamp and relationship columns are never searchable.
/// A bare name declared by several kinds (`name`) only resolves through its
/// qualified forms.
#[derive(Debug, Clone)]
pub struct FieldCatalog {
    fields: Vec<FieldSpec>,
    bare: BTreeMap<&'static str, Resolution>,
}

impl FieldCatalog {
    /// Collects the searchable fields of `schema`.
    pub fn from_schema(schema: &Schema) -> Self {
        let fields: Vec<FieldSpec> = schema
            .entities()
            .iter()
            .flat_map(|descriptor| {
                let relation = descriptor.relation;
                descriptor
                    .fields
                    .iter()
                    .filter(move |f| {
                        !AUDIT_COLUMNS.contains(&f.name)
                            && relation.map_or(true, |r| r.field != f.name && r.column != f.name)
                    })
                    .map(move |f| FieldSpec {
                        kind: descriptor.kind,
                        name: f.name,
                        value_type: f.value_type,
                    })
            })
            .collect();

        let mut bare: BTreeMap<&'static str, Resolution> = BTreeMap::new();
        for (idx, field) in fields.iter().enumerate() {
            bare.entry(field.name)
                .and_modify(|res| {
                    *res = match res {
                        Resolution::Unique(first) => Resolution::Ambiguous(vec![*first, idx]),
                        Resolution::Ambiguous(all) => {
                            let mut all = std::mem::take(all);
                            all.push(idx);
                            Resolution::Ambiguous(all)
                        }
                    }
                })
                .or_insert(Resolution::Unique(idx));
        }
        Self { fields, bare }
    }

    /// Every searchable field in declared order.
    pub fn fields(&self) -> &[FieldSpec] {
        &self.fields
    }

    /// Field name to field mapping. Unique bare names map directly; colliding
    /// names appear only in their qualified form.
    pub fn searchable_fields(&self) -> BTreeMap<String, &FieldSpec> {
        let mut out = BTreeMap::new();
        for (name, resolution) in &self.bare {
            match resolution {
                Resolution::Unique(idx) => {
                    out.insert((*name).to_owned(), &self.fields[*idx]);
                }
                Resolution::Ambiguous(all) => {
                    for idx in all {
                        let field = &self.fields[*idx];
                        out.insert(field.qualified_name(), field);
                    }
                }
            }
        }
        out
    }

    /// Entity-kind name to its searchable field names, in declared order.
    pub fn fields_by_entity_kind(&self) -> BTreeMap<&'static str, Vec<&'static str>> {
        let mut out: BTreeMap<&'static str, Vec<&'static str>> = BTreeMap::new();
        for field in &self.fields {
            out.entry(field.kind.name()).or_default().push(field.name);
        }
        out
    }

    /// Resolves a bare or qualified field name.
    pub fn resolve(&self, name: &str) -> Result<&FieldSpec> {
        if let Some((kind, field)) = name.split_once('.') {
            return self
                .fields
                .iter()
                .find(|f| f.kind.name() == kind && f.name == field)
                .ok_or_else(|| IndexError::UnknownField(name.to_owned()));
        }
        match self.bare.get(name) {
            Some(Resolution::Unique(idx)) => Ok(&self.fields[*idx]),
            Some(Resolution::Ambiguous(all)) => Err(IndexError::AmbiguousField {
                name: name.to_owned(),
                candidates: all.iter().map(|idx| self.fields[*idx].qualified_name()).collect(),
            }),
            None => Err(IndexError::UnknownField(name.to_owned())),
        }
    }
}
