//! Scalar value representation shared by storage, query and statistics layers.
use std::fmt;

use rusqlite::types::{FromSqlError, ToSql, ToSqlOutput, Type, ValueRef};
use serde::{Serialize, Serializer};
use time::Date;

use super::coerce;

/// Declared type of a stored field.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ValueType {
    /// UTF-8 text.
    Text,
    /// Signed 64-bit integer.
    Integer,
    /// 64-bit float.
    Float,
    /// Calendar date, stored as ISO text.
    Date,
}

impl ValueType {
    /// Lowercase type name.
    pub fn name(self) -> &'static str {
        match self {
            ValueType::Text => "text",
            ValueType::Integer => "integer",
            ValueType::Float => "float",
            ValueType::Date => "date",
        }
    }

    /// True for integer and float fields.
    pub fn is_numeric(self) -> bool {
        matches!(self, ValueType::Integer | ValueType::Float)
    }

    pub(crate) fn sql_type(self) -> &'static str {
        match self {
            ValueType::Text | ValueType::Date => "TEXT",
            ValueType::Integer => "INTEGER",
            ValueType::Float => "REAL",
        }
    }
}

impl fmt::Display for ValueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Typed scalar held by an entity attribute or bound into a query.
#[derive(Clone, Debug, PartialEq)]
pub enum Value {
    /// Missing value.
    Null,
    /// Signed 64-bit integer.
    Integer(i64),
    /// 64-bit float.
    Float(f64),
    /// UTF-8 text.
    Text(String),
    /// Calendar date.
    Date(Date),
}

impl Value {
    /// True for [`Value::Null`].
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Numeric view of integers and floats.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Integer(v) => Some(*v as f64),
            Value::Float(v) => Some(*v),
            _ => None,
        }
    }

    /// Converts into the tree representation used by flattening and export.
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            Value::Null => serde_json::Value::Null,
            Value::Integer(v) => serde_json::Value::from(*v),
            Value::Float(v) => serde_json::Number::from_f64(*v)
                .map(serde_json::Value::Number)
                .unwrap_or(serde_json::Value::Null),
            Value::Text(v) => serde_json::Value::String(v.clone()),
            Value::Date(d) => serde_json::Value::String(coerce::format_date(*d)),
        }
    }

    /// Reads column `idx` of `row`, interpreting it as `ty`.
    pub(crate) fn read(row: &rusqlite::Row<'_>, idx: usize, ty: ValueType) -> rusqlite::Result<Value> {
        let value = match row.get_ref(idx)? {
            ValueRef::Null => Value::Null,
            ValueRef::Integer(v) if ty == ValueType::Float => Value::Float(v as f64),
            ValueRef::Integer(v) => Value::Integer(v),
            ValueRef::Real(v) => Value::Float(v),
            ValueRef::Text(raw) => {
                let text = std::str::from_utf8(raw).map_err(|err| {
                    rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(err))
                })?;
                if ty == ValueType::Date {
                    let date = coerce::parse_date_text(text).ok_or_else(|| {
                        rusqlite::Error::FromSqlConversionFailure(
                            idx,
                            Type::Text,
                            format!("invalid stored date '{text}'").into(),
                        )
                    })?;
                    Value::Date(date)
                } else {
                    Value::Text(text.to_owned())
                }
            }
            ValueRef::Blob(_) => {
                return Err(rusqlite::Error::FromSqlConversionFailure(
                    idx,
                    Type::Blob,
                    Box::new(FromSqlError::InvalidType),
                ))
            }
        };
        Ok(value)
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => f.write_str("null"),
            Value::Integer(v) => write!(f, "{v}"),
            Value::Float(v) => write!(f, "{v}"),
            Value::Text(v) => f.write_str(v),
            Value::Date(d) => f.write_str(&coerce::format_date(*d)),
        }
    }
}

impl Serialize for Value {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Value::Null => serializer.serialize_none(),
            Value::Integer(v) => serializer.serialize_i64(*v),
            Value::Float(v) => serializer.serialize_f64(*v),
            Value::Text(v) => serializer.serialize_str(v),
            Value::Date(d) => serializer.serialize_str(&coerce::format_date(*d)),
        }
    }
}

impl ToSql for Value {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        let out = match self {
            Value::Null => ToSqlOutput::Owned(rusqlite::types::Value::Null),
            Value::Integer(v) => ToSqlOutput::Owned(rusqlite::types::Value::Integer(*v)),
            Value::Float(v) => ToSqlOutput::Owned(rusqlite::types::Value::Real(*v)),
            Value::Text(v) => ToSqlOutput::Borrowed(ValueRef::Text(v.as_bytes())),
            Value::Date(d) => ToSqlOutput::Owned(rusqlite::types::Value::Text(coerce::format_date(*d))),
        };
        Ok(out)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::Text(value.to_owned())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::Text(value)
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Value::Integer(value)
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Value::Float(value)
    }
}

impl From<Date> for Value {
    fn from(value: Date) -> Self {
        Value::Date(value)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(value: Option<T>) -> Self {
        value.map_or(Value::Null, Into::into)
    }
}
