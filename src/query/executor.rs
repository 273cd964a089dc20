use std::collections::BTreeSet;

use rusqlite::params_from_iter;
use tracing::debug;

use crate::error::{IndexError, Result};
use crate::model::{EntityKind, GeoreferenceFile, Value};
use crate::schema::{Schema, SchemaError};
use crate::store::{quote, Index};

use super::ast::Operator;
use super::compiler::{CompiledPredicate, Operand, QueryCompiler};

/// Result rows are always georeference files.
const RESULT_KIND: EntityKind = EntityKind::GeoreferenceFile;

/// Join order: directory, then its observations, then projection and axes.
const JOIN_ORDER: [EntityKind; 4] = [
    EntityKind::MetadataDirectory,
    EntityKind::ObservationRecord,
    EntityKind::ProjectionDefinition,
    EntityKind::AxisEntry,
];

fn alias(kind: EntityKind) -> &'static str {
    match kind {
        EntityKind::MetadataDirectory => "d",
        EntityKind::ObservationRecord => "o",
        EntityKind::ProjectionDefinition => "p",
        EntityKind::AxisEntry => "a",
        EntityKind::GeoreferenceFile => "g",
    }
}

/// Renders `predicate` as one `SELECT DISTINCT` over georeference files with
/// its bound parameters.
pub(crate) fn build_sql(
    schema: &Schema,
    predicate: &CompiledPredicate,
) -> Result<(String, Vec<Value>)> {
    let mut needed: BTreeSet<EntityKind> = BTreeSet::new();
    for kind in predicate.kinds().into_iter().filter(|kind| *kind != RESULT_KIND) {
        let mut current = kind;
        needed.insert(current);
        while let Some((parent, _)) = schema.parent_of(current) {
            needed.insert(parent);
            current = parent;
        }
    }

    let result = alias(RESULT_KIND);
    let mut sql = format!(
        "SELECT DISTINCT {result}.* FROM {} AS {result}",
        quote(RESULT_KIND.name())
    );
    let result_parent = schema.parent_of(RESULT_KIND);
    for kind in JOIN_ORDER.into_iter().filter(|k| needed.contains(k)) {
        let a = alias(kind);
        let table = quote(kind.name());
        match result_parent {
            Some((parent, relation)) if parent == kind => sql.push_str(&format!(
                " JOIN {table} AS {a} ON {a}.id = {result}.{}",
                quote(relation.column)
            )),
            _ => {
                let (parent, relation) = schema
                    .parent_of(kind)
                    .ok_or(SchemaError::UndeclaredKind(kind))?;
                if !needed.contains(&parent) {
                    return Err(IndexError::InvalidArgument(format!(
                        "{kind} cannot be joined to {RESULT_KIND}"
                    )));
                }
                sql.push_str(&format!(
                    " LEFT JOIN {table} AS {a} ON {a}.{} = {}.id",
                    quote(relation.column),
                    alias(parent)
                ));
            }
        }
    }

    let mut clauses = Vec::with_capacity(predicate.conditions().len());
    let mut params = Vec::new();
    for condition in predicate.conditions() {
        let column = format!(
            "{}.{}",
            alias(condition.field.kind),
            quote(condition.field.name)
        );
        let clause = match (&condition.operand, condition.op) {
            (Operand::List(values), Operator::In) if values.is_empty() => "0".to_owned(),
            (Operand::List(values), Operator::NotIn) if values.is_empty() => {
                format!("{column} IS NOT NULL")
            }
            (Operand::List(values), op) => {
                params.extend(values.iter().cloned());
                let marks = vec!["?"; values.len()].join(", ");
                format!("{column} {} ({marks})", op.sql())
            }
            (Operand::Scalar(value), op) => {
                params.push(value.clone());
                format!("{column} {} ?", op.sql())
            }
        };
        clauses.push(clause);
    }
    if !clauses.is_empty() {
        sql.push_str(" WHERE ");
        sql.push_str(&clauses.join(" AND "));
    }
    sql.push_str(&format!(" ORDER BY {result}.id"));
    Ok((sql, params))
}

impl Index {
    /// Compiles `query` against this index's catalog.
    pub fn compile(&self, query: &str) -> Result<CompiledPredicate> {
        QueryCompiler::new(self.catalog()).compile(query)
    }

    /// Georeference files satisfying `predicate`, ordered by id, each once.
    pub fn execute(&self, predicate: &CompiledPredicate) -> Result<Vec<GeoreferenceFile>> {
        let (sql, params) = build_sql(self.schema(), predicate)?;
        debug!(%sql, params = params.len(), "executing query");
        let conn = self.lock();
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt.query_map(params_from_iter(params), GeoreferenceFile::from_row)?;
        Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
    }

    /// Compiles and executes `query`.
    pub fn search(&self, query: &str) -> Result<Vec<GeoreferenceFile>> {
        let predicate = self.compile(query)?;
        self.execute(&predicate)
    }
}
