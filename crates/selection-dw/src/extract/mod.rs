//! Reads the raw candidate export into typed records.

mod normalizer;
mod parser;

use serde::{Deserialize, Serialize};
use std::io::Read;
use std::path::Path;
use tracing::{info, warn};

/// One row of the recruitment export. Empty cells are `None`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawRecord {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email: Option<String>,
    pub yoe: Option<i64>,
    pub application_date: Option<String>,
    pub country: Option<String>,
    pub seniority: Option<String>,
    pub technology: Option<String>,
    pub code_challenge_score: Option<i64>,
    pub technical_interview_score: Option<i64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExtractOptions {
    pub delimiter: u8,
}

impl Default for ExtractOptions {
    fn default() -> Self {
        Self { delimiter: b';' }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ExtractError {
    #[error("failed to read candidate export: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid candidate CSV data: {0}")]
    Csv(#[from] csv::Error),
    #[error("candidate export is missing required columns: {}", .0.join(", "))]
    MissingColumns(Vec<String>),
}

pub struct CandidateExtractor;

impl CandidateExtractor {
    pub fn from_path<P: AsRef<Path>>(
        path: P,
        options: &ExtractOptions,
    ) -> Result<Vec<RawRecord>, ExtractError> {
        let path = path.as_ref();
        info!(path = %path.display(), "reading candidate export");
        let file = std::fs::File::open(path)?;
        Self::from_reader(file, options)
    }

    pub fn from_reader<R: Read>(
        reader: R,
        options: &ExtractOptions,
    ) -> Result<Vec<RawRecord>, ExtractError> {
        let (records, stats) = parser::parse_records(reader, options)?;

        if stats.malformed_numbers > 0 {
            warn!(
                malformed = stats.malformed_numbers,
                "non-numeric values in integer columns were treated as missing"
            );
        }
        info!(rows = stats.rows, "candidate export extracted");

        Ok(records)
    }
}
