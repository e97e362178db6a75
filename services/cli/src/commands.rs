use clap::{Args, ValueEnum};
use selection_dw::config::{parse_delimiter, AppConfig};
use selection_dw::error::AppError;
use selection_dw::etl::{run_etl, EtlOptions};
use selection_dw::report::{open_read_only, KpiReport};
use selection_dw::warehouse::PartialLoadPolicy;
use std::path::PathBuf;
use tracing::warn;

#[derive(Args, Debug, Default)]
pub(crate) struct EtlArgs {
    /// Candidate export to read (defaults to DW_SOURCE_PATH)
    #[arg(long)]
    pub(crate) source: Option<PathBuf>,
    /// Warehouse database file (defaults to DW_DATABASE_PATH)
    #[arg(long)]
    pub(crate) database: Option<PathBuf>,
    /// Single-character field delimiter of the export
    #[arg(long, value_parser = delimiter_arg)]
    pub(crate) delimiter: Option<u8>,
    /// Drop existing warehouse tables before loading
    #[arg(long)]
    pub(crate) fresh: bool,
    /// keep_partial or rollback_all
    #[arg(long)]
    pub(crate) load_policy: Option<PartialLoadPolicy>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub(crate) enum ReportFormat {
    #[default]
    Text,
    Json,
}

#[derive(Args, Debug, Default)]
pub(crate) struct ReportArgs {
    /// Warehouse database file (defaults to DW_DATABASE_PATH)
    #[arg(long)]
    pub(crate) database: Option<PathBuf>,
    #[arg(long, value_enum, default_value_t = ReportFormat::Text)]
    pub(crate) format: ReportFormat,
}

fn delimiter_arg(raw: &str) -> Result<u8, String> {
    parse_delimiter(raw).map_err(|err| err.to_string())
}

pub(crate) fn run_etl_command(args: EtlArgs, config: &AppConfig) -> Result<(), AppError> {
    let mut options = EtlOptions::from_config(config);
    if let Some(source) = args.source {
        options.source = source;
    }
    if let Some(database) = args.database {
        options.database_path = database;
    }
    if let Some(delimiter) = args.delimiter {
        options.delimiter = delimiter;
    }
    if let Some(policy) = args.load_policy {
        options.load_policy = policy;
    }
    options.fresh = args.fresh;

    let summary = run_etl(&options)?;
    if !summary.load.is_complete() {
        warn!(
            database = %options.database_path.display(),
            "warehouse load did not complete; rerun with --fresh after fixing the failure"
        );
    }

    print!("{summary}");
    Ok(())
}

pub(crate) fn run_report_command(args: ReportArgs, config: &AppConfig) -> Result<(), AppError> {
    let database = args
        .database
        .unwrap_or_else(|| config.warehouse.database_path.clone());
    let conn = open_read_only(&database)?;
    let report = KpiReport::collect(&conn)?;

    match args.format {
        ReportFormat::Text => print!("{report}"),
        ReportFormat::Json => {
            let rendered = serde_json::to_string_pretty(&report).map_err(std::io::Error::other)?;
            println!("{rendered}");
        }
    }
    Ok(())
}
