//! Binary entry point for the scenedex command-line interface.
#![forbid(unsafe_code)]

#[path = "cli/config.rs"]
mod config;

use std::error::Error;
use std::fs::{self, File};
use std::io::{self, BufWriter};
use std::path::{Path, PathBuf};

use clap::{Args, Parser, Subcommand, ValueEnum};
use scenedex::{
    export, logging, records_as_list, DirectoryManifest, ExportFormat, FieldInfo, FieldStats,
    Index, IndexOptions, IngestSummary, Synchronous,
};

use crate::config::CliConfig;

#[derive(Parser, Debug)]
#[command(
    name = "scenedex",
    version,
    about = "Index, search and export satellite scene archive metadata",
    disable_help_subcommand = true
)]
struct Cli {
    #[arg(
        long,
        global = true,
        value_name = "FILE",
        env = "SCENEDEX_CONFIG",
        help = "Path to the CLI config file"
    )]
    config: Option<PathBuf>,

    #[arg(
        long,
        global = true,
        value_name = "FILE",
        env = "SCENEDEX_DB",
        help = "Index database (defaults to [database] default in the config)"
    )]
    db: Option<PathBuf>,

    #[arg(
        long,
        global = true,
        value_name = "DIRECTIVE",
        help = "Log filter, e.g. info or scenedex=debug"
    )]
    log_level: Option<String>,

    #[arg(long, global = true, value_enum, help = "SQLite synchronous mode")]
    synchronous: Option<SynchronousArg>,

    #[arg(
        long,
        global = true,
        value_enum,
        default_value_t = OutputFormat::Text,
        help = "Output format for command results"
    )]
    format: OutputFormat,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    #[command(about = "Ingest extracted directory manifests (JSON)")]
    Ingest(IngestCmd),
    #[command(about = "Search georeference files and export the matches")]
    Search(SearchCmd),
    #[command(about = "List searchable fields grouped by entity kind")]
    Fields,
    #[command(about = "Summarize the stored values of one field")]
    Info {
        #[arg(value_name = "FIELD")]
        field: String,
    },
}

#[derive(Args, Debug)]
struct IngestCmd {
    #[arg(value_name = "MANIFEST", required = true, num_args = 1..)]
    manifests: Vec<PathBuf>,
}

#[derive(Args, Debug)]
struct SearchCmd {
    #[arg(long, short, value_name = "QUERY", help = "Conditions joined with '&'")]
    query: String,
    #[arg(long, value_name = "FILE", help = "Write results to FILE instead of stdout")]
    to: Option<PathBuf>,
    #[arg(
        long,
        value_name = "FORMAT",
        value_parser = parse_export_format,
        help = "json, csv, toml or yaml (defaults to the --to extension, then the config)"
    )]
    export: Option<ExportFormat>,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum OutputFormat {
    Text,
    Json,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub(crate) enum SynchronousArg {
    Full,
    Normal,
    Off,
}

impl From<SynchronousArg> for Synchronous {
    fn from(value: SynchronousArg) -> Self {
        match value {
            SynchronousArg::Full => Synchronous::Full,
            SynchronousArg::Normal => Synchronous::Normal,
            SynchronousArg::Off => Synchronous::Off,
        }
    }
}

fn parse_export_format(raw: &str) -> Result<ExportFormat, String> {
    raw.parse().map_err(|err: scenedex::IndexError| err.to_string())
}

fn main() {
    if let Err(err) = run() {
        eprintln!("error: {err}");
        std::process::exit(1);
    }
}

fn run() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();
    let config = CliConfig::load(cli.config.clone())?;

    let directive = cli
        .log_level
        .clone()
        .or_else(|| config.log_level().map(str::to_owned))
        .unwrap_or_else(|| logging::DEFAULT_DIRECTIVE.to_owned());
    logging::init_logging(&directive)?;

    let db_path = cli
        .db
        .clone()
        .or_else(|| config.default_db_path().cloned())
        .ok_or("no database given; pass --db or set [database] default in the config")?;
    let synchronous = match cli.synchronous {
        Some(mode) => Some(mode),
        None => config.synchronous()?,
    }
    .unwrap_or(SynchronousArg::Normal);
    let options = IndexOptions::file(&db_path)
        .create_if_missing(matches!(cli.command, Command::Ingest(_)))
        .synchronous(synchronous.into());
    let index = Index::open(&options)?;

    match &cli.command {
        Command::Ingest(cmd) => {
            let mut summaries = Vec::new();
            for path in &cmd.manifests {
                for manifest in read_manifests(path)? {
                    summaries.push(index.ingest_directory(&manifest)?);
                }
            }
            emit(&cli.format, &summaries, |_| print_ingest_text(&summaries))?;
        }
        Command::Search(cmd) => {
            let results = index.search(&cmd.query)?;
            let trees = records_as_list(&index, &results)?;
            let format = match cmd
                .export
                .or_else(|| cmd.to.as_deref().and_then(ExportFormat::from_path))
            {
                Some(format) => format,
                None => config.export_format()?.unwrap_or_default(),
            };
            match &cmd.to {
                Some(path) => {
                    export(BufWriter::new(File::create(path)?), format, &trees)?;
                    println!(
                        "wrote {} record(s) to {} as {format}",
                        trees.len(),
                        path.display()
                    );
                }
                None => export(io::stdout().lock(), format, &trees)?,
            }
        }
        Command::Fields => {
            let grouped = index.catalog().fields_by_entity_kind();
            emit(&cli.format, &grouped, |_| {
                for (kind, fields) in &grouped {
                    println!("{kind}:");
                    for field in fields {
                        println!("  {field}");
                    }
                }
            })?;
        }
        Command::Info { field } => {
            let info = index.field_info(field)?;
            emit(&cli.format, &info, |_| print_info_text(&info))?;
        }
    }
    Ok(())
}

/// A manifest file holds one manifest object or an array of them.
fn read_manifests(path: &Path) -> Result<Vec<DirectoryManifest>, Box<dyn Error>> {
    let text = fs::read_to_string(path)
        .map_err(|err| format!("failed to read manifest {}: {err}", path.display()))?;
    let parsed: serde_json::Value = serde_json::from_str(&text)
        .map_err(|err| format!("failed to parse manifest {}: {err}", path.display()))?;
    let manifests = match parsed {
        serde_json::Value::Array(items) => items
            .into_iter()
            .map(serde_json::from_value)
            .collect::<Result<Vec<_>, _>>(),
        single => serde_json::from_value(single).map(|manifest| vec![manifest]),
    };
    Ok(manifests.map_err(|err| format!("invalid manifest {}: {err}", path.display()))?)
}

fn emit<T, F>(format: &OutputFormat, value: &T, printer: F) -> Result<(), Box<dyn Error>>
where
    T: serde::Serialize,
    F: Fn(OutputFormat),
{
    match format {
        OutputFormat::Json => {
            let json = serde_json::to_string_pretty(value)?;
            println!("{json}");
        }
        OutputFormat::Text => printer(OutputFormat::Text),
    }
    Ok(())
}

fn print_ingest_text(summaries: &[IngestSummary]) {
    for summary in summaries {
        println!(
            "{} (directory {}): observations={} projections={} axes={} georeferences={}",
            summary.date_token,
            summary.directory_id,
            summary.observations,
            summary.projections,
            summary.axes,
            summary.georeferences
        );
    }
}

fn print_info_text(info: &FieldInfo) {
    println!("field: {}", info.field_name);
    println!("entity_kind: {}", info.entity_kind.name());
    println!("value_type: {}", info.value_type.name());
    match &info.stats {
        FieldStats::Numeric(stats) => {
            let show = |value: Option<f64>| value.map_or_else(|| "-".to_owned(), |v| v.to_string());
            println!("  count={} unique_count={}", stats.count, stats.unique_count);
            println!("  min={} max={}", show(stats.min), show(stats.max));
            println!(
                "  mean={} median={} std_dev={}",
                show(stats.mean),
                show(stats.median),
                stats.std_dev
            );
            println!("  has_missing={}", stats.has_missing);
        }
        FieldStats::Text(stats) => {
            println!("  count={} unique_count={}", stats.count, stats.unique_count);
            println!("  samples: {}", stats.sample_values.join(", "));
        }
        FieldStats::Unsupported(message) => println!("  {message}"),
    }
}
