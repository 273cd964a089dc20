//! SQLite-backed storage for the entity registry.
//!
//! [`Index`] owns one connection behind a mutex, so every read and write is
//! serialized and the index can be shared across threads behind an `Arc`.
//! Tables are generated from the [`Schema`] registry on open.

mod ddl;
mod options;
mod write;

use std::path::Path;
use std::time::Duration;

use parking_lot::{Mutex, MutexGuard};
use rusqlite::{Connection, OptionalExtension};
use time::format_description::well_known::Rfc3339;
use time::OffsetDateTime;
use tracing::debug;

use crate::error::{IndexError, Result};
use crate::model::{AnyEntity, EntityKind, EntityRef, MetadataDirectory};
use crate::schema::{FieldCatalog, Schema};

pub(crate) use ddl::quote;
pub use options::{Backend, IndexOptions, Synchronous};

/// Parent directory of a dependent record.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ParentRef<'a> {
    /// An already stored directory id.
    Resolved(i64),
    /// A directory to create-or-fetch by date token.
    Directory {
        /// Unique date token.
        date_token: &'a str,
        /// Directory path, stored only when the directory is created.
        path: &'a Path,
    },
}

impl From<&MetadataDirectory> for ParentRef<'_> {
    fn from(directory: &MetadataDirectory) -> Self {
        ParentRef::Resolved(directory.id)
    }
}

/// An opened metadata index.
pub struct Index {
    conn: Mutex<Connection>,
    schema: Schema,
    catalog: FieldCatalog,
    backend: Backend,
}

impl std::fmt::Debug for Index {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Index")
            .field("backend", &self.backend)
            .finish_non_exhaustive()
    }
}

impl Index {
    /// Opens (and if allowed, creates) an index with the standard schema.
    pub fn open(options: &IndexOptions) -> Result<Self> {
        let schema = Schema::standard()?;
        let conn = match &options.backend {
            Backend::Memory => Connection::open_in_memory()?,
            Backend::File(path) => {
                if !path.exists() {
                    if !options.create_if_missing {
                        return Err(IndexError::MissingDatabase(path.clone()));
                    }
                    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                        std::fs::create_dir_all(parent)?;
                    }
                }
                let conn = Connection::open(path)?;
                conn.pragma_update_and_check(None, "journal_mode", "WAL", |row| {
                    row.get::<_, String>(0)
                })?;
                conn
            }
        };
        conn.pragma_update(None, "foreign_keys", "ON")?;
        conn.pragma_update(None, "synchronous", options.synchronous.pragma_value())?;
        conn.busy_timeout(Duration::from_millis(options.busy_timeout_ms))?;
        ddl::create_tables(&conn, &schema)?;
        debug!(backend = ?options.backend, "index opened");

        let catalog = FieldCatalog::from_schema(&schema);
        Ok(Self {
            conn: Mutex::new(conn),
            schema,
            catalog,
            backend: options.backend.clone(),
        })
    }

    /// Opens a private in-memory index.
    pub fn open_in_memory() -> Result<Self> {
        Self::open(&IndexOptions::memory())
    }

    /// Entity registry backing this index.
    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    /// Searchable fields of this index.
    pub fn catalog(&self) -> &FieldCatalog {
        &self.catalog
    }

    /// Backend the index was opened on.
    pub fn backend(&self) -> &Backend {
        &self.backend
    }

    pub(crate) fn lock(&self) -> MutexGuard<'_, Connection> {
        self.conn.lock()
    }

    /// Fetches one record, or `None` if it does not exist.
    pub fn get(&self, entity: EntityRef) -> Result<Option<AnyEntity>> {
        let conn = self.lock();
        fetch(&conn, entity)
    }

    /// Fetches the directory registered under `date_token`.
    pub fn directory_by_token(&self, date_token: &str) -> Result<Option<MetadataDirectory>> {
        let conn = self.lock();
        let directory = conn
            .query_row(
                "SELECT * FROM metadata_directory WHERE date_str = ?1",
                [date_token],
                MetadataDirectory::from_row,
            )
            .optional()?;
        Ok(directory)
    }

    /// Records of `kind` owned by `parent`, ordered by id.
    pub fn children(&self, parent: EntityRef, kind: EntityKind) -> Result<Vec<AnyEntity>> {
        let relation = match self.schema.parent_of(kind) {
            Some((parent_kind, relation)) if parent_kind == parent.kind => relation,
            _ => {
                return Err(IndexError::InvalidArgument(format!(
                    "{kind} is not owned by {}",
                    parent.kind
                )))
            }
        };
        let conn = self.lock();
        let mut stmt = conn.prepare_cached(&format!(
            "SELECT * FROM {} WHERE {} = ?1 ORDER BY id",
            quote(kind.name()),
            quote(relation.column)
        ))?;
        let rows = stmt.query_map([parent.id], |row| AnyEntity::from_row(kind, row))?;
        Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
    }

    /// Number of stored records of `kind`.
    pub fn count(&self, kind: EntityKind) -> Result<u64> {
        let conn = self.lock();
        let count: i64 = conn.query_row(
            &format!("SELECT COUNT(*) FROM {}", quote(kind.name())),
            [],
            |row| row.get(0),
        )?;
        Ok(count.max(0) as u64)
    }
}

pub(crate) fn fetch(conn: &Connection, entity: EntityRef) -> Result<Option<AnyEntity>> {
    let record = conn
        .query_row(
            &format!("SELECT * FROM {} WHERE id = ?1", quote(entity.kind.name())),
            [entity.id],
            |row| AnyEntity::from_row(entity.kind, row),
        )
        .optional()?;
    Ok(record)
}

pub(crate) fn now_timestamp() -> Result<String> {
    Ok(OffsetDateTime::now_utc().format(&Rfc3339)?)
}
