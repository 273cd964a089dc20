use rusqlite::Connection;
use tracing::debug;

use crate::error::Result;
use crate::schema::{EntityDescriptor, Schema};

/// Quotes an SQL identifier.
pub(crate) fn quote(ident: &str) -> String {
    format!("\"{}\"", ident.replace('"', "\"\""))
}

pub(crate) fn create_table_sql(schema: &Schema, descriptor: &EntityDescriptor) -> Result<String> {
    let mut columns = vec!["id INTEGER PRIMARY KEY AUTOINCREMENT".to_owned()];
    if let Some((parent, relation)) = schema.parent_of(descriptor.kind) {
        schema.descriptor(parent)?;
        columns.push(format!(
            "{} INTEGER NOT NULL REFERENCES {} (id)",
            quote(relation.column),
            quote(parent.name())
        ));
    }
    for field in &descriptor.fields {
        let null = if field.nullable { "" } else { " NOT NULL" };
        columns.push(format!(
            "{} {}{null}",
            quote(field.name),
            field.value_type.sql_type()
        ));
    }
    columns.push("created_at TEXT NOT NULL".to_owned());
    columns.push("updated_at TEXT NOT NULL".to_owned());
    if let Some(key) = descriptor.unique_key {
        columns.push(format!("UNIQUE ({})", quote(key)));
    }
    if let Some(relation) = descriptor.relation.filter(|r| r.unique) {
        columns.push(format!("UNIQUE ({})", quote(relation.column)));
    }
    Ok(format!(
        "CREATE TABLE IF NOT EXISTS {} (\n    {}\n)",
        quote(descriptor.kind.name()),
        columns.join(",\n    ")
    ))
}

/// Creates every table of `schema` plus an index on each foreign key.
pub(crate) fn create_tables(conn: &Connection, schema: &Schema) -> Result<()> {
    for descriptor in schema.entities() {
        let sql = create_table_sql(schema, descriptor)?;
        debug!(table = descriptor.kind.name(), "ensuring table");
        conn.execute(&sql, [])?;
        if let Some(relation) = descriptor.relation.filter(|r| !r.unique) {
            conn.execute(
                &format!(
                    "CREATE INDEX IF NOT EXISTS {} ON {} ({})",
                    quote(&format!("idx_{}_{}", descriptor.kind.name(), relation.column)),
                    quote(descriptor.kind.name()),
                    quote(relation.column)
                ),
                [],
            )?;
        }
    }
    Ok(())
}
