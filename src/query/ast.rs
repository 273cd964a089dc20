//! Parsed form of a query string.
//!
//! Nothing here is typed yet: operands are raw text exactly as written, and
//! field paths have not been resolved against the catalog.

use std::fmt;

/// Comparison operator of a condition.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Operator {
    /// `=`
    Eq,
    /// `!=`
    Ne,
    /// `<`
    Lt,
    /// `<=`
    Le,
    /// `>`
    Gt,
    /// `>=`
    Ge,
    /// `in`
    In,
    /// `not in`
    NotIn,
}

impl Operator {
    /// Symbolic operators, longest first.
    pub(crate) const SYMBOLS: [(&'static str, Operator); 6] = [
        ("!=", Operator::Ne),
        ("<=", Operator::Le),
        (">=", Operator::Ge),
        ("=", Operator::Eq),
        ("<", Operator::Lt),
        (">", Operator::Gt),
    ];

    /// Operator as written in a query.
    pub fn symbol(self) -> &'static str {
        match self {
            Operator::Eq => "=",
            Operator::Ne => "!=",
            Operator::Lt => "<",
            Operator::Le => "<=",
            Operator::Gt => ">",
            Operator::Ge => ">=",
            Operator::In => "in",
            Operator::NotIn => "not in",
        }
    }

    /// True for `in` and `not in`.
    pub fn is_membership(self) -> bool {
        matches!(self, Operator::In | Operator::NotIn)
    }

    /// SQL spelling of the operator.
    pub(crate) fn sql(self) -> &'static str {
        match self {
            Operator::Eq => "=",
            Operator::Ne => "<>",
            Operator::Lt => "<",
            Operator::Le => "<=",
            Operator::Gt => ">",
            Operator::Ge => ">=",
            Operator::In => "IN",
            Operator::NotIn => "NOT IN",
        }
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

/// Field reference, optionally qualified with an entity kind.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FieldPath {
    /// Entity kind qualifier (`axis_entry` in `axis_entry.name`).
    pub qualifier: Option<String>,
    /// Field name.
    pub name: String,
}

impl fmt::Display for FieldPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.qualifier {
            Some(kind) => write!(f, "{kind}.{}", self.name),
            None => f.write_str(&self.name),
        }
    }
}

/// Operand text before coercion.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RawOperand {
    /// Trimmed remainder of a comparison condition.
    Scalar(String),
    /// Items of a literal collection, quotes preserved.
    List(Vec<String>),
}

/// One `<field> <op> <value>` condition.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Condition {
    /// Condition text as written, trimmed.
    pub segment: String,
    /// Referenced field.
    pub field: FieldPath,
    /// Operator.
    pub op: Operator,
    /// Raw operand.
    pub operand: RawOperand,
}
