use std::collections::BTreeSet;

use tracing::debug;

use crate::error::Result;
use crate::model::{coerce, EntityKind, Value};
use crate::schema::{FieldCatalog, FieldSpec};

use super::ast::{Condition, Operator, RawOperand};
use super::parser::parse_query;

/// Coerced operand of a bound condition.
#[derive(Clone, Debug, PartialEq)]
pub enum Operand {
    /// Comparison value.
    Scalar(Value),
    /// Membership values.
    List(Vec<Value>),
}

/// A condition resolved against the catalog with its operand coerced to the
/// field's declared type.
#[derive(Clone, Debug, PartialEq)]
pub struct BoundCondition {
    /// Resolved field.
    pub field: FieldSpec,
    /// Operator.
    pub op: Operator,
    /// Typed operand.
    pub operand: Operand,
}

/// Conjunction of bound conditions, in written order.
#[derive(Clone, Debug, PartialEq)]
pub struct CompiledPredicate {
    conditions: Vec<BoundCondition>,
}

impl CompiledPredicate {
    /// Wraps already bound conditions.
    pub fn new(conditions: Vec<BoundCondition>) -> Self {
        Self { conditions }
    }

    /// Conditions in written order.
    pub fn conditions(&self) -> &[BoundCondition] {
        &self.conditions
    }

    /// Entity kinds the predicate filters on.
    pub fn kinds(&self) -> BTreeSet<EntityKind> {
        self.conditions.iter().map(|c| c.field.kind).collect()
    }
}

/// Compiles query strings against a [`FieldCatalog`].
#[derive(Clone, Copy, Debug)]
pub struct QueryCompiler<'a> {
    catalog: &'a FieldCatalog,
}

impl<'a> QueryCompiler<'a> {
    /// Compiler resolving fields through `catalog`.
    pub fn new(catalog: &'a FieldCatalog) -> Self {
        Self { catalog }
    }

    /// Parses, resolves and coerces every condition of `query`.
    pub fn compile(&self, query: &str) -> Result<CompiledPredicate> {
        let conditions = parse_query(query)?;
        let bound = conditions
            .iter()
            .map(|condition| self.bind(condition))
            .collect::<Result<Vec<_>>>()?;
        debug!(query, conditions = bound.len(), "compiled query");
        Ok(CompiledPredicate::new(bound))
    }

    /// Resolves and coerces one parsed condition.
    pub fn bind(&self, condition: &Condition) -> Result<BoundCondition> {
        let field = self.catalog.resolve(&condition.field.to_string())?.clone();
        let operand = match &condition.operand {
            RawOperand::Scalar(raw) => {
                Operand::Scalar(coerce::from_text(field.name, field.value_type, raw)?)
            }
            RawOperand::List(items) => Operand::List(
                items
                    .iter()
                    .map(|raw| coerce::from_text(field.name, field.value_type, raw))
                    .collect::<Result<_>>()?,
            ),
        };
        Ok(BoundCondition {
            field,
            op: condition.op,
            operand,
        })
    }
}
