//! Encoders for flattened result trees.

use std::fmt;
use std::io::Write;
use std::path::Path;
use std::str::FromStr;

use csv::WriterBuilder;
use serde::Serialize;
use serde_json::Value as Json;

use crate::error::{IndexError, Result};

/// Output encoding of [`export`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum ExportFormat {
    /// Pretty-printed JSON array.
    #[default]
    Json,
    /// One row per tree with dotted column names.
    Csv,
    /// `records = [...]` document with nulls omitted.
    Toml,
    /// YAML sequence of trees.
    Yaml,
}

impl ExportFormat {
    /// All formats.
    pub const ALL: [ExportFormat; 4] = [
        ExportFormat::Json,
        ExportFormat::Csv,
        ExportFormat::Toml,
        ExportFormat::Yaml,
    ];

    /// Lowercase tag, also the file extension.
    pub fn tag(self) -> &'static str {
        match self {
            ExportFormat::Json => "json",
            ExportFormat::Csv => "csv",
            ExportFormat::Toml => "toml",
            ExportFormat::Yaml => "yaml",
        }
    }

    /// Format implied by the extension of `path`.
    pub fn from_path(path: &Path) -> Option<Self> {
        path.extension()?.to_str()?.parse().ok()
    }
}

impl fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

impl FromStr for ExportFormat {
    type Err = IndexError;

    fn from_str(s: &str) -> Result<Self> {
        if s.eq_ignore_ascii_case("yml") {
            return Ok(ExportFormat::Yaml);
        }
        ExportFormat::ALL
            .into_iter()
            .find(|format| format.tag().eq_ignore_ascii_case(s))
            .ok_or_else(|| {
                IndexError::InvalidArgument(format!(
                    "unsupported export format '{s}' (expected json, csv, toml or yaml)"
                ))
            })
    }
}

/// Writes `trees` to `writer` in `format`.
pub fn export<W: Write>(mut writer: W, format: ExportFormat, trees: &[Json]) -> Result<()> {
    match format {
        ExportFormat::Json => {
            serde_json::to_writer_pretty(&mut writer, trees)?;
            writer.write_all(b"\n")?;
        }
        ExportFormat::Csv => write_csv(&mut writer, trees)?,
        ExportFormat::Toml => {
            #[derive(Serialize)]
            struct Document {
                records: Vec<Json>,
            }
            let document = Document {
                records: trees.iter().filter_map(strip_nulls).collect(),
            };
            writer.write_all(toml::to_string_pretty(&document)?.as_bytes())?;
        }
        ExportFormat::Yaml => serde_yaml::to_writer(&mut writer, trees)?,
    }
    writer.flush()?;
    Ok(())
}

fn write_csv<W: Write>(writer: W, trees: &[Json]) -> Result<()> {
    let rows: Vec<Vec<(String, String)>> = trees
        .iter()
        .map(|tree| {
            let mut row = Vec::new();
            flatten_cells("", tree, &mut row);
            row
        })
        .collect();

    let mut header: Vec<&str> = Vec::new();
    for row in &rows {
        for (key, _) in row {
            if !header.contains(&key.as_str()) {
                header.push(key);
            }
        }
    }

    if header.is_empty() {
        return Ok(());
    }
    let mut csv = WriterBuilder::new().from_writer(writer);
    csv.write_record(&header)?;
    for row in &rows {
        let record: Vec<&str> = header
            .iter()
            .map(|column| {
                row.iter()
                    .find(|(key, _)| key == column)
                    .map_or("", |(_, cell)| cell.as_str())
            })
            .collect();
        csv.write_record(&record)?;
    }
    csv.flush()?;
    Ok(())
}

/// Collects `(dotted.key, cell)` pairs; list elements are keyed by index.
fn flatten_cells(prefix: &str, value: &Json, out: &mut Vec<(String, String)>) {
    let join = |key: &str| {
        if prefix.is_empty() {
            key.to_owned()
        } else {
            format!("{prefix}.{key}")
        }
    };
    match value {
        Json::Object(map) => {
            for (key, child) in map {
                flatten_cells(&join(key), child, out);
            }
        }
        Json::Array(items) => {
            for (idx, child) in items.iter().enumerate() {
                flatten_cells(&join(&idx.to_string()), child, out);
            }
        }
        Json::Null => out.push((prefix.to_owned(), String::new())),
        Json::String(s) => out.push((prefix.to_owned(), s.clone())),
        Json::Bool(b) => out.push((prefix.to_owned(), b.to_string())),
        Json::Number(n) => out.push((prefix.to_owned(), n.to_string())),
    }
}

/// TOML has no null; drop null members and elements.
fn strip_nulls(value: &Json) -> Option<Json> {
    match value {
        Json::Null => None,
        Json::Object(map) => Some(Json::Object(
            map.iter()
                .filter_map(|(k, v)| strip_nulls(v).map(|v| (k.clone(), v)))
                .collect(),
        )),
        Json::Array(items) => Some(Json::Array(items.iter().filter_map(strip_nulls).collect())),
        other => Some(other.clone()),
    }
}
