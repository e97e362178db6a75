use super::normalizer::normalize_header;
use super::{ExtractError, ExtractOptions, RawRecord};
use crate::warehouse::schema::{self, ColumnMapping, RAW_COLUMNS};
use csv::StringRecord;
use std::collections::HashMap;
use std::io::Read;

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub(crate) struct ParseStats {
    pub(crate) rows: usize,
    pub(crate) malformed_numbers: usize,
}

/// Positions of the required raw columns within one export's header row.
struct ColumnIndex {
    positions: HashMap<&'static str, usize>,
}

impl ColumnIndex {
    fn from_headers(headers: &StringRecord) -> Result<Self, ExtractError> {
        let normalized = headers.iter().map(normalize_header).collect::<Vec<_>>();
        let mut positions = HashMap::with_capacity(RAW_COLUMNS.len());
        let mut missing = Vec::new();

        for mapping in RAW_COLUMNS {
            let wanted = normalize_header(mapping.raw);
            match normalized.iter().position(|header| *header == wanted) {
                Some(position) => {
                    positions.insert(mapping.raw, position);
                }
                None => missing.push(mapping.raw.to_string()),
            }
        }

        if !missing.is_empty() {
            return Err(ExtractError::MissingColumns(missing));
        }

        Ok(Self { positions })
    }

    fn text(&self, row: &StringRecord, mapping: ColumnMapping) -> Option<String> {
        let position = *self.positions.get(mapping.raw)?;
        row.get(position)
            .map(str::trim)
            .filter(|value| !value.is_empty())
            .map(str::to_string)
    }

    fn integer(
        &self,
        row: &StringRecord,
        mapping: ColumnMapping,
        stats: &mut ParseStats,
    ) -> Option<i64> {
        let raw = self.text(row, mapping)?;
        let parsed = parse_integer(&raw);
        if parsed.is_none() {
            stats.malformed_numbers += 1;
        }
        parsed
    }
}

pub(crate) fn parse_records<R: Read>(
    reader: R,
    options: &ExtractOptions,
) -> Result<(Vec<RawRecord>, ParseStats), ExtractError> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .delimiter(options.delimiter)
        .trim(csv::Trim::All)
        .flexible(true)
        .from_reader(reader);

    let index = ColumnIndex::from_headers(csv_reader.headers()?)?;
    let mut stats = ParseStats::default();
    let mut records = Vec::new();

    for row in csv_reader.records() {
        let row = row?;
        stats.rows += 1;

        records.push(RawRecord {
            first_name: index.text(&row, schema::FIRST_NAME),
            last_name: index.text(&row, schema::LAST_NAME),
            email: index.text(&row, schema::EMAIL),
            yoe: index.integer(&row, schema::YOE, &mut stats),
            application_date: index.text(&row, schema::APPLICATION_DATE),
            country: index.text(&row, schema::COUNTRY),
            seniority: index.text(&row, schema::SENIORITY),
            technology: index.text(&row, schema::TECHNOLOGY),
            code_challenge_score: index.integer(&row, schema::CODE_CHALLENGE_SCORE, &mut stats),
            technical_interview_score: index.integer(
                &row,
                schema::TECHNICAL_INTERVIEW_SCORE,
                &mut stats,
            ),
        });
    }

    Ok((records, stats))
}

/// 2^63, the first whole value past `i64::MAX`.
const I64_BOUND: f64 = 9_223_372_036_854_775_808.0;

/// Accepts plain integers and whole-valued decimals such as `7.0`. Decimals
/// outside the `i64` range are rejected rather than saturated.
fn parse_integer(value: &str) -> Option<i64> {
    if let Ok(parsed) = value.parse::<i64>() {
        return Some(parsed);
    }

    match value.parse::<f64>() {
        Ok(parsed)
            if parsed.fract() == 0.0 && (-I64_BOUND..I64_BOUND).contains(&parsed) =>
        {
            Some(parsed as i64)
        }
        _ => None,
    }
}
