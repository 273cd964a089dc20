//! Error type shared by every layer of the index.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

use crate::schema::SchemaError;

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, IndexError>;

/// Errors surfaced by ingestion, querying, statistics and export.
#[derive(Debug, Error)]
pub enum IndexError {
    /// The entity registry was misconfigured.
    #[error(transparent)]
    Schema(#[from] SchemaError),
    /// A value could not be coerced to its declared type or a required input
    /// was missing.
    #[error("invalid value for '{field}': {reason}")]
    Validation {
        /// Field or input the failure refers to.
        field: String,
        /// Human readable cause.
        reason: String,
    },
    /// A query condition did not match the grammar.
    #[error("invalid query condition '{segment}': {reason}")]
    QuerySyntax {
        /// Offending condition text.
        segment: String,
        /// Human readable cause.
        reason: String,
    },
    /// The field is not part of the searchable catalog.
    #[error("unknown field '{0}'")]
    UnknownField(String),
    /// A bare field name is declared by several entity kinds.
    #[error("field '{name}' is ambiguous; use one of: {}", .candidates.join(", "))]
    AmbiguousField {
        /// Name as written in the query.
        name: String,
        /// Qualified names that would resolve it.
        candidates: Vec<String>,
    },
    /// The storage engine reported a fault.
    #[error("storage error: {0}")]
    Execution(#[from] rusqlite::Error),
    /// The database file does not exist and creation was disabled.
    #[error("database not found at {0}")]
    MissingDatabase(PathBuf),
    /// A caller supplied an argument the index cannot act on.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
    /// I/O error while reading manifests or writing exports.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
    /// JSON encoding or decoding failed.
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
    /// CSV encoding failed.
    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),
    /// TOML encoding failed.
    #[error("toml error: {0}")]
    Toml(#[from] toml::ser::Error),
    /// YAML encoding failed.
    #[error("yaml error: {0}")]
    Yaml(#[from] serde_yaml::Error),
    /// A timestamp could not be rendered.
    #[error("timestamp error: {0}")]
    Timestamp(#[from] time::error::Format),
}

impl IndexError {
    /// Builds an [`IndexError::Validation`].
    pub fn validation(field: impl Into<String>, reason: impl Into<String>) -> Self {
        IndexError::Validation {
            field: field.into(),
            reason: reason.into(),
        }
    }

    /// Builds an [`IndexError::QuerySyntax`].
    pub fn syntax(segment: impl Into<String>, reason: impl Into<String>) -> Self {
        IndexError::QuerySyntax {
            segment: segment.into(),
            reason: reason.into(),
        }
    }

    /// Returns a machine-readable code for the error variant.
    pub fn code(&self) -> &'static str {
        match self {
            IndexError::Schema(_) => "SchemaError",
            IndexError::Validation { .. } => "ValidationError",
            IndexError::QuerySyntax { .. } => "QuerySyntaxError",
            IndexError::UnknownField(_) => "UnknownFieldError",
            IndexError::AmbiguousField { .. } => "AmbiguousFieldError",
            IndexError::Execution(_) => "ExecutionError",
            IndexError::MissingDatabase(_) => "MissingDatabase",
            IndexError::InvalidArgument(_) => "InvalidArgument",
            IndexError::Io(_) => "IoError",
            IndexError::Json(_)
            | IndexError::Csv(_)
            | IndexError::Toml(_)
            | IndexError::Yaml(_) => "EncodingError",
            IndexError::Timestamp(_) => "TimestampError",
        }
    }
}
