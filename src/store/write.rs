use std::path::Path;

use rusqlite::{params, params_from_iter, Connection, OptionalExtension, Row, TransactionBehavior};
use tracing::{debug, info};

use crate::error::{IndexError, Result};
use crate::ingest::{
    AxisDescriptor, GeoreferenceRecord, NewAxis, NewGeoreference, NewObservation, NewProjection,
    ProjectionDescriptor, RawRecord,
};
use crate::model::{
    AxisEntry, EntityKind, GeoreferenceFile, MetadataDirectory, ObservationRecord,
    ProjectionDefinition, Value,
};

use super::{now_timestamp, quote, Index, ParentRef};

fn insert_row(
    conn: &Connection,
    kind: EntityKind,
    parent: (&'static str, i64),
    columns: Vec<(&'static str, Value)>,
    now: &str,
) -> Result<i64> {
    let mut names = Vec::with_capacity(columns.len() + 3);
    let mut values = Vec::with_capacity(columns.len() + 3);
    names.push(quote(parent.0));
    values.push(Value::Integer(parent.1));
    for (name, value) in columns {
        names.push(quote(name));
        values.push(value);
    }
    names.push("created_at".to_owned());
    values.push(Value::from(now));
    names.push("updated_at".to_owned());
    values.push(Value::from(now));

    let placeholders: Vec<String> = (1..=values.len()).map(|i| format!("?{i}")).collect();
    let sql = format!(
        "INSERT INTO {} ({}) VALUES ({})",
        quote(kind.name()),
        names.join(", "),
        placeholders.join(", ")
    );
    conn.prepare_cached(&sql)?.execute(params_from_iter(values))?;
    let id = conn.last_insert_rowid();
    debug!(kind = kind.name(), id, "inserted row");
    Ok(id)
}

fn fetch_as<T>(
    conn: &Connection,
    kind: EntityKind,
    id: i64,
    map: fn(&Row<'_>) -> rusqlite::Result<T>,
) -> Result<T> {
    Ok(conn.query_row(
        &format!("SELECT * FROM {} WHERE id = ?1", quote(kind.name())),
        [id],
        map,
    )?)
}

fn exists(conn: &Connection, kind: EntityKind, id: i64) -> Result<bool> {
    let found = conn
        .query_row(
            &format!("SELECT 1 FROM {} WHERE id = ?1", quote(kind.name())),
            [id],
            |_| Ok(()),
        )
        .optional()?;
    Ok(found.is_some())
}

impl Index {
    /// Returns the directory keyed by `date_token`, creating it with `path`
    /// if absent. The path of an existing directory is left untouched.
    pub fn get_or_create_directory(
        &self,
        date_token: &str,
        path: impl AsRef<Path>,
    ) -> Result<MetadataDirectory> {
        if date_token.trim().is_empty() {
            return Err(IndexError::validation("date_str", "date token is empty"));
        }
        let path_str = path.as_ref().to_string_lossy().into_owned();
        let now = now_timestamp()?;

        let mut conn = self.lock();
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
        let created = tx.execute(
            "INSERT INTO metadata_directory (date_str, path_str, created_at, updated_at) \
             VALUES (?1, ?2, ?3, ?3) ON CONFLICT (date_str) DO NOTHING",
            params![date_token, path_str, now],
        )?;
        let directory = tx.query_row(
            "SELECT * FROM metadata_directory WHERE date_str = ?1",
            [date_token],
            MetadataDirectory::from_row,
        )?;
        tx.commit()?;

        if created > 0 {
            info!(date_token, id = directory.id, "created metadata directory");
        } else {
            debug!(date_token, id = directory.id, "reusing metadata directory");
        }
        Ok(directory)
    }

    fn resolve_directory(&self, parent: ParentRef<'_>) -> Result<i64> {
        match parent {
            ParentRef::Directory { date_token, path } => {
                Ok(self.get_or_create_directory(date_token, path)?.id)
            }
            ParentRef::Resolved(id) => {
                let conn = self.lock();
                if exists(&conn, EntityKind::MetadataDirectory, id)? {
                    Ok(id)
                } else {
                    Err(IndexError::validation(
                        "directory",
                        format!("no metadata directory with id {id}"),
                    ))
                }
            }
        }
    }

    /// Validates and stores one attribute-table row.
    pub fn store_observation(
        &self,
        directory: ParentRef<'_>,
        record: &RawRecord,
    ) -> Result<ObservationRecord> {
        let new = NewObservation::from_record(record)?;
        let directory_id = self.resolve_directory(directory)?;
        let now = now_timestamp()?;
        let conn = self.lock();
        let id = insert_row(
            &conn,
            EntityKind::ObservationRecord,
            ("directory_id", directory_id),
            new.columns(),
            &now,
        )?;
        fetch_as(&conn, EntityKind::ObservationRecord, id, ObservationRecord::from_row)
    }

    /// Validates and stores a projection with all of its axes.
    ///
    /// A directory holds at most one projection; a second one is rejected.
    pub fn store_projection(
        &self,
        directory: ParentRef<'_>,
        descriptor: &ProjectionDescriptor,
    ) -> Result<(ProjectionDefinition, Vec<AxisEntry>)> {
        let new = NewProjection::from_descriptor(descriptor)?;
        let directory_id = self.resolve_directory(directory)?;
        let now = now_timestamp()?;

        let mut conn = self.lock();
        let tx = conn.transaction()?;
        let existing: Option<i64> = tx
            .query_row(
                "SELECT id FROM projection_definition WHERE directory_id = ?1",
                [directory_id],
                |row| row.get(0),
            )
            .optional()?;
        if let Some(existing) = existing {
            return Err(IndexError::validation(
                "projection",
                format!("directory {directory_id} already has projection {existing}"),
            ));
        }
        let projection_id = insert_row(
            &tx,
            EntityKind::ProjectionDefinition,
            ("directory_id", directory_id),
            new.columns(),
            &now,
        )?;
        let mut axes = Vec::with_capacity(new.axes.len());
        for axis in &new.axes {
            let id = insert_row(
                &tx,
                EntityKind::AxisEntry,
                ("projection_id", projection_id),
                axis.columns(),
                &now,
            )?;
            axes.push(fetch_as(&tx, EntityKind::AxisEntry, id, AxisEntry::from_row)?);
        }
        let projection = fetch_as(
            &tx,
            EntityKind::ProjectionDefinition,
            projection_id,
            ProjectionDefinition::from_row,
        )?;
        tx.commit()?;
        Ok((projection, axes))
    }

    /// Validates and stores one axis of an existing projection.
    pub fn store_axis(&self, projection_id: i64, axis: &AxisDescriptor) -> Result<AxisEntry> {
        let new = NewAxis::from_descriptor(axis)?;
        let now = now_timestamp()?;
        let conn = self.lock();
        if !exists(&conn, EntityKind::ProjectionDefinition, projection_id)? {
            return Err(IndexError::validation(
                "projection",
                format!("no projection definition with id {projection_id}"),
            ));
        }
        let id = insert_row(
            &conn,
            EntityKind::AxisEntry,
            ("projection_id", projection_id),
            new.columns(),
            &now,
        )?;
        fetch_as(&conn, EntityKind::AxisEntry, id, AxisEntry::from_row)
    }

    /// Validates and stores one georeferencing record. Fails without writing
    /// if the paired image does not exist.
    pub fn store_georeference(
        &self,
        directory: ParentRef<'_>,
        record: &GeoreferenceRecord,
    ) -> Result<GeoreferenceFile> {
        let new = NewGeoreference::from_record(record)?;
        let directory_id = self.resolve_directory(directory)?;
        let mut stored = self.insert_georeferences(directory_id, std::slice::from_ref(&new))?;
        stored
            .pop()
            .ok_or_else(|| IndexError::InvalidArgument("georeference was not stored".into()))
    }

    pub(crate) fn insert_georeferences(
        &self,
        directory_id: i64,
        records: &[NewGeoreference],
    ) -> Result<Vec<GeoreferenceFile>> {
        let now = now_timestamp()?;
        let mut conn = self.lock();
        let tx = conn.transaction()?;
        let mut stored = Vec::with_capacity(records.len());
        for record in records {
            let id = insert_row(
                &tx,
                EntityKind::GeoreferenceFile,
                ("directory_id", directory_id),
                record.columns(),
                &now,
            )?;
            stored.push(fetch_as(&tx, EntityKind::GeoreferenceFile, id, GeoreferenceFile::from_row)?);
        }
        tx.commit()?;
        Ok(stored)
    }
}
