//! End-to-end run: export file to populated warehouse.

use crate::config::AppConfig;
use crate::error::AppError;
use crate::extract::{CandidateExtractor, ExtractOptions, RawRecord};
use crate::transform::{transform, TransformSummary};
use crate::warehouse::{
    normalize, LoadError, LoadReport, PartialLoadPolicy, SqliteWarehouse, TableLoadStatus,
};
use serde::Serialize;
use std::fmt;
use std::path::PathBuf;
use tracing::{info, info_span};

#[derive(Debug, Clone)]
pub struct EtlOptions {
    pub source: PathBuf,
    pub delimiter: u8,
    pub database_path: PathBuf,
    pub load_policy: PartialLoadPolicy,
    /// Drop existing warehouse tables before loading.
    pub fresh: bool,
}

impl EtlOptions {
    pub fn from_config(config: &AppConfig) -> Self {
        Self {
            source: config.source.path.clone(),
            delimiter: config.source.delimiter,
            database_path: config.warehouse.database_path.clone(),
            load_policy: config.warehouse.load_policy,
            fresh: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EtlSummary {
    pub transform: TransformSummary,
    pub load: LoadReport,
}

impl fmt::Display for EtlSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let transform = &self.transform;
        writeln!(f, "Selection warehouse ETL")?;
        writeln!(
            f,
            "- records read: {} | facts built: {} | hired: {}",
            transform.raw_records, transform.fact_rows, transform.hired
        )?;
        writeln!(
            f,
            "- dropped: {} (unparseable dates: {})",
            transform.dropped(),
            transform.unparseable_dates
        )?;

        writeln!(f, "Load ({})", self.load.policy)?;
        for outcome in &self.load.tables {
            let status = match &outcome.status {
                TableLoadStatus::Inserted { rows } => format!("inserted {rows} rows"),
                TableLoadStatus::Failed { reason } => format!("FAILED: {reason}"),
                TableLoadStatus::RolledBack { rows } => format!("rolled back {rows} rows"),
                TableLoadStatus::Skipped => "skipped".to_string(),
            };
            writeln!(f, "- {} | {}", outcome.table, status)?;
        }
        if self.load.is_partial() {
            writeln!(f, "Warehouse is PARTIAL: some tables were not loaded")?;
        }
        Ok(())
    }
}

/// Transforms `records` and loads them into an open warehouse.
pub fn populate(
    warehouse: &mut SqliteWarehouse,
    records: &[RawRecord],
    fresh: bool,
    policy: PartialLoadPolicy,
) -> Result<EtlSummary, LoadError> {
    let output = transform(records);
    let tables = normalize(&output.schema);

    if fresh {
        warehouse.drop_schema()?;
    }
    warehouse.ensure_schema()?;
    let load = warehouse.load(&tables, policy)?;

    Ok(EtlSummary {
        transform: output.summary,
        load,
    })
}

pub fn run_etl(options: &EtlOptions) -> Result<EtlSummary, AppError> {
    let span = info_span!(
        "etl",
        source = %options.source.display(),
        database = %options.database_path.display()
    );
    let _entered = span.enter();

    let extract_options = ExtractOptions {
        delimiter: options.delimiter,
    };
    let records = CandidateExtractor::from_path(&options.source, &extract_options)?;

    let mut warehouse = SqliteWarehouse::open(&options.database_path)?;
    let summary = populate(
        &mut warehouse,
        &records,
        options.fresh,
        options.load_policy,
    )?;

    info!(
        facts = summary.transform.fact_rows,
        complete = summary.load.is_complete(),
        "ETL run finished"
    );
    Ok(summary)
}
