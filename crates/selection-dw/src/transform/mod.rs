//! Star-schema construction from raw candidate records.
//!
//! The transformer is a pure function of its input: dimension keys are
//! assigned in first-seen order, facts are produced by inner joins against
//! those dimensions, and the outcome of every drop is reported in
//! [`TransformSummary`] rather than failing the run.

mod dates;
pub mod dimension;
pub mod fact;
pub mod keys;

pub use dates::parse_application_date;
pub use dimension::{
    CandidateAttributes, CandidateDimension, DateDimension, DateParts, Dimension, DimensionRow,
    LabelDimension,
};
pub use fact::{is_hired, FactRow, JoinLosses, HIRING_SCORE_THRESHOLD};
pub use keys::{assign_surrogate_keys, KeyAssignment, SurrogateKey};

use crate::extract::RawRecord;
use crate::warehouse::schema::TableName;
use chrono::NaiveDate;
use dimension::{build_candidate_dimension, build_date_dimension, build_label_dimension};
use fact::{build_facts, DimensionSet};
use serde::Serialize;
use tracing::{info, warn};

/// A raw record with its application date parsed.
#[derive(Debug, Clone, Copy)]
pub struct StagedRecord<'a> {
    pub raw: &'a RawRecord,
    pub application_date: Option<NaiveDate>,
}

impl<'a> StagedRecord<'a> {
    pub fn from_raw(raw: &'a RawRecord) -> Self {
        Self {
            raw,
            application_date: raw
                .application_date
                .as_deref()
                .and_then(parse_application_date),
        }
    }

    /// Date text was present but could not be parsed.
    fn has_unparseable_date(&self) -> bool {
        self.raw.application_date.is_some() && self.application_date.is_none()
    }
}

/// Every table produced by one transformation run.
#[derive(Debug, Clone, PartialEq)]
pub struct StarSchema {
    pub candidates: CandidateDimension,
    pub dates: DateDimension,
    pub countries: LabelDimension,
    pub technologies: LabelDimension,
    pub seniorities: LabelDimension,
    pub facts: Vec<FactRow>,
}

impl StarSchema {
    pub fn row_count(&self, table: TableName) -> usize {
        match table {
            TableName::DimCandidate => self.candidates.len(),
            TableName::DimDate => self.dates.len(),
            TableName::DimCountry => self.countries.len(),
            TableName::DimTechnology => self.technologies.len(),
            TableName::DimSeniority => self.seniorities.len(),
            TableName::FactSelection => self.facts.len(),
        }
    }
}

/// Coverage of the fact table relative to the raw input.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TransformSummary {
    pub raw_records: usize,
    pub unparseable_dates: usize,
    pub fact_rows: usize,
    pub hired: usize,
    pub join_losses: JoinLosses,
}

impl TransformSummary {
    pub fn dropped(&self) -> usize {
        self.raw_records - self.fact_rows
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct TransformOutput {
    pub schema: StarSchema,
    pub summary: TransformSummary,
}

pub fn transform(records: &[RawRecord]) -> TransformOutput {
    let staged = records
        .iter()
        .map(StagedRecord::from_raw)
        .collect::<Vec<_>>();

    let unparseable_dates = staged
        .iter()
        .filter(|record| record.has_unparseable_date())
        .count();
    if unparseable_dates > 0 {
        warn!(
            count = unparseable_dates,
            "application dates could not be parsed; affected records are excluded from dim_date and fact_selection"
        );
    }

    let candidates = build_candidate_dimension(&staged);
    let dates = build_date_dimension(&staged);
    let countries = build_label_dimension(TableName::DimCountry, &staged, |record| {
        record.raw.country.clone()
    });
    let technologies = build_label_dimension(TableName::DimTechnology, &staged, |record| {
        record.raw.technology.clone()
    });
    let seniorities = build_label_dimension(TableName::DimSeniority, &staged, |record| {
        record.raw.seniority.clone()
    });

    let (facts, join_losses) = build_facts(
        &staged,
        &DimensionSet {
            candidates: &candidates,
            dates: &dates,
            countries: &countries,
            technologies: &technologies,
            seniorities: &seniorities,
        },
    );

    let schema = StarSchema {
        candidates,
        dates,
        countries,
        technologies,
        seniorities,
        facts,
    };

    for table in TableName::load_order() {
        info!(table = %table, rows = schema.row_count(table), "table built");
    }

    let summary = TransformSummary {
        raw_records: records.len(),
        unparseable_dates,
        fact_rows: schema.facts.len(),
        hired: schema.facts.iter().filter(|fact| fact.hired).count(),
        join_losses,
    };

    if join_losses.total() > 0 {
        warn!(
            dropped = join_losses.total(),
            candidate = join_losses.candidate,
            date = join_losses.date,
            country = join_losses.country,
            technology = join_losses.technology,
            seniority = join_losses.seniority,
            "records without a complete set of dimension keys were left out of fact_selection"
        );
    }
    info!(
        raw_rows = summary.raw_records,
        fact_rows = summary.fact_rows,
        "transformation complete"
    );

    TransformOutput { schema, summary }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(email: &str, date: &str, scores: (i64, i64)) -> RawRecord {
        RawRecord {
            first_name: Some("Dana".into()),
            last_name: Some("Reyes".into()),
            email: Some(email.into()),
            yoe: Some(4),
            application_date: Some(date.into()),
            country: Some("Ecuador".into()),
            seniority: Some("Senior".into()),
            technology: Some("Game Development".into()),
            code_challenge_score: Some(scores.0),
            technical_interview_score: Some(scores.1),
        }
    }

    #[test]
    fn summary_counts_unparseable_dates_and_hires() {
        let records = vec![
            record("a@x.com", "2020-03-01", (7, 7)),
            record("b@x.com", "31/31/2020", (9, 9)),
            record("c@x.com", "2020-03-02", (6, 9)),
        ];

        let output = transform(&records);

        assert_eq!(output.summary.raw_records, 3);
        assert_eq!(output.summary.unparseable_dates, 1);
        assert_eq!(output.summary.fact_rows, 2);
        assert_eq!(output.summary.hired, 1);
        assert_eq!(output.summary.join_losses.date, 1);
        assert_eq!(output.summary.dropped(), 1);
        assert_eq!(output.schema.row_count(TableName::DimDate), 2);
        assert_eq!(output.schema.row_count(TableName::DimCandidate), 3);
    }

    #[test]
    fn missing_date_text_is_not_counted_as_unparseable() {
        let mut missing = record("a@x.com", "", (7, 7));
        missing.application_date = None;

        let output = transform(&[missing]);
        assert_eq!(output.summary.unparseable_dates, 0);
        assert_eq!(output.summary.fact_rows, 0);
        assert_eq!(output.summary.join_losses.date, 1);
    }

    #[test]
    fn empty_input_produces_empty_tables() {
        let output = transform(&[]);
        for table in TableName::load_order() {
            assert_eq!(output.schema.row_count(table), 0);
        }
        assert_eq!(output.summary, TransformSummary::default());
    }
}
