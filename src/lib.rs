//! Relational index and query engine for satellite scene archive metadata.
//!
//! Extracted archive metadata (attribute-table rows, projection descriptors and
//! six-parameter georeferencing files) is ingested into a small fixed schema
//! backed by SQLite. Scenes are then filtered with a compact conjunctive query
//! language, individual fields are summarized statistically, and results are
//! flattened into cycle-safe trees for export.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod error;
pub mod export;
pub mod flatten;
pub mod ingest;
pub mod logging;
pub mod model;
pub mod query;
pub mod schema;
pub mod stats;
pub mod store;

pub use error::{IndexError, Result};
pub use export::{export, ExportFormat};
pub use flatten::{records_as_list, to_tree, EntitySource, VISITED_MARKER};
pub use ingest::{DirectoryManifest, IngestSummary};
pub use model::{AnyEntity, Entity, EntityKind, EntityRef, Value, ValueType};
pub use query::{CompiledPredicate, QueryCompiler};
pub use schema::{FieldCatalog, FieldSpec, Schema, SchemaBuilder, SchemaError};
pub use stats::{FieldInfo, FieldStats};
pub use store::{Backend, Index, IndexOptions, ParentRef, Synchronous};
