use super::SynchronousArg;
use clap::ValueEnum;
use scenedex::ExportFormat;
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Default)]
pub struct CliConfig {
    data: RawConfig,
}

impl CliConfig {
    pub fn load(explicit: Option<PathBuf>) -> Result<Self, ConfigError> {
        let path = explicit.or_else(default_config_path);
        let data = match path.as_ref() {
            Some(config_path) if config_path.exists() => read_file(config_path)?,
            _ => RawConfig::default(),
        };
        Ok(Self { data })
    }

    pub fn default_db_path(&self) -> Option<&PathBuf> {
        self.data.database.default_path.as_ref()
    }

    pub fn log_level(&self) -> Option<&str> {
        self.data.logging.level.as_deref()
    }

    pub fn synchronous(&self) -> Result<Option<SynchronousArg>, ConfigError> {
        self.data
            .database
            .synchronous
            .as_deref()
            .map(|value| {
                SynchronousArg::from_str(value, true).map_err(|_| ConfigError::InvalidSynchronous {
                    value: value.to_string(),
                })
            })
            .transpose()
    }

    pub fn export_format(&self) -> Result<Option<ExportFormat>, ConfigError> {
        self.data
            .export
            .format
            .as_deref()
            .map(|value| {
                value
                    .parse::<ExportFormat>()
                    .map_err(|_| ConfigError::InvalidExportFormat {
                        value: value.to_string(),
                    })
            })
            .transpose()
    }
}

fn read_file(path: &Path) -> Result<RawConfig, ConfigError> {
    let contents = fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    toml::from_str(&contents).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

#[derive(Debug, Default, Deserialize)]
struct RawConfig {
    #[serde(default)]
    database: DatabaseSection,
    #[serde(default)]
    logging: LoggingSection,
    #[serde(default)]
    export: ExportSection,
}

#[derive(Debug, Default, Deserialize)]
struct DatabaseSection {
    #[serde(rename = "default")]
    default_path: Option<PathBuf>,
    synchronous: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct LoggingSection {
    level: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct ExportSection {
    format: Option<String>,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read CLI config {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to parse CLI config {path}: {source}")]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
    #[error("config synchronous value '{value}' is invalid")]
    InvalidSynchronous { value: String },
    #[error("config export format '{value}' is invalid (expected json, csv, toml or yaml)")]
    InvalidExportFormat { value: String },
}

pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|base| base.join("scenedex").join("config.toml"))
}
