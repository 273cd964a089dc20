#![forbid(unsafe_code)]

//! Conjunctive query language over the searchable fields.
//!
//! A query such as `satellite = 'Landsat-8' & cloudperce <= 10` is parsed into
//! [`ast::Condition`]s, resolved and coerced against the
//! [`FieldCatalog`](crate::schema::FieldCatalog) into a [`CompiledPredicate`],
//! and executed as a single SQL statement returning georeference files.

/// Syntax tree for parsed conditions.
///
/// Holds operators, field paths and raw operands before any type coercion.
pub mod ast;

/// Field resolution and value coercion.
///
/// Turns parsed conditions into typed predicate fragments.
pub mod compiler;

/// SQL generation and execution.
///
/// Joins the entity kinds a predicate touches and returns matching rows.
pub mod executor;

/// Hand-written tokenizer for the condition grammar.
///
/// Includes the literal-collection parser used by `in` and `not in`.
pub mod parser;

pub use ast::{Condition, FieldPath, Operator, RawOperand};
pub use compiler::{BoundCondition, CompiledPredicate, Operand, QueryCompiler};
pub use parser::{parse_literal_list, parse_query};
