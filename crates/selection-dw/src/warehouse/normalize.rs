use super::schema::TableName;
use crate::transform::{Dimension, SurrogateKey, StarSchema};
use chrono::NaiveDate;
use rusqlite::types::{ToSql, ToSqlOutput, Value, ValueRef};
use serde::Serialize;
use std::hash::Hash;

/// Native cell representation handed to the persistence layer.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum SqlValue {
    Integer(i64),
    Real(f64),
    Text(String),
    Null,
}

impl From<i64> for SqlValue {
    fn from(value: i64) -> Self {
        Self::Integer(value)
    }
}

impl From<i32> for SqlValue {
    fn from(value: i32) -> Self {
        Self::Integer(i64::from(value))
    }
}

impl From<u32> for SqlValue {
    fn from(value: u32) -> Self {
        Self::Integer(i64::from(value))
    }
}

impl From<f64> for SqlValue {
    fn from(value: f64) -> Self {
        Self::Real(value)
    }
}

impl From<bool> for SqlValue {
    fn from(value: bool) -> Self {
        Self::Integer(i64::from(value))
    }
}

impl From<SurrogateKey> for SqlValue {
    fn from(value: SurrogateKey) -> Self {
        Self::Integer(value.get())
    }
}

impl From<&str> for SqlValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<&String> for SqlValue {
    fn from(value: &String) -> Self {
        Self::Text(value.clone())
    }
}

impl From<NaiveDate> for SqlValue {
    fn from(value: NaiveDate) -> Self {
        Self::Text(value.format("%Y-%m-%d").to_string())
    }
}

impl<T> From<Option<T>> for SqlValue
where
    T: Into<SqlValue>,
{
    fn from(value: Option<T>) -> Self {
        value.map_or(Self::Null, Into::into)
    }
}

impl ToSql for SqlValue {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(match self {
            SqlValue::Integer(value) => ToSqlOutput::Owned(Value::Integer(*value)),
            SqlValue::Real(value) => ToSqlOutput::Owned(Value::Real(*value)),
            SqlValue::Text(value) => ToSqlOutput::Borrowed(ValueRef::Text(value.as_bytes())),
            SqlValue::Null => ToSqlOutput::Owned(Value::Null),
        })
    }
}

/// Column list does not line up with the declared warehouse schema.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SchemaMismatch {
    #[error("{table}: expected columns [{expected}], got [{actual}]")]
    Columns {
        table: TableName,
        expected: String,
        actual: String,
    },
    #[error("{table}: row {row} has {actual} cells, expected {expected}")]
    RowWidth {
        table: TableName,
        row: usize,
        expected: usize,
        actual: usize,
    },
}

/// One table, fully serialized, ready for insertion.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TableData {
    pub table: TableName,
    pub columns: Vec<&'static str>,
    pub rows: Vec<Vec<SqlValue>>,
}

impl TableData {
    fn new(table: TableName, rows: Vec<Vec<SqlValue>>) -> Self {
        Self {
            table,
            columns: table.schema().column_names().collect(),
            rows,
        }
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Checks the column list and every row width against the fixed schema.
    pub fn validate(&self) -> Result<(), SchemaMismatch> {
        let schema = self.table.schema();
        if !schema.column_names().eq(self.columns.iter().copied()) {
            return Err(SchemaMismatch::Columns {
                table: self.table,
                expected: schema.column_names().collect::<Vec<_>>().join(", "),
                actual: self.columns.join(", "),
            });
        }

        let width = self.columns.len();
        if let Some((row, cells)) = self
            .rows
            .iter()
            .enumerate()
            .find(|(_, cells)| cells.len() != width)
        {
            return Err(SchemaMismatch::RowWidth {
                table: self.table,
                row,
                expected: width,
                actual: cells.len(),
            });
        }

        Ok(())
    }
}

fn dimension_rows<K, A, F>(dimension: &Dimension<K, A>, cells: F) -> Vec<Vec<SqlValue>>
where
    K: Eq + Hash + Clone,
    F: Fn(&K, &A) -> Vec<SqlValue>,
{
    dimension
        .rows()
        .map(|row| {
            let mut values = Vec::with_capacity(8);
            values.push(SqlValue::from(row.key));
            values.extend(cells(row.natural_key, row.attributes));
            values
        })
        .collect()
}

/// Serializes every table of the star schema, in load order.
pub fn normalize(schema: &StarSchema) -> Vec<TableData> {
    TableName::load_order()
        .into_iter()
        .map(|table| {
            let rows = match table {
                TableName::DimCandidate => dimension_rows(&schema.candidates, |email, candidate| {
                    vec![
                        candidate.first_name.as_ref().into(),
                        candidate.last_name.as_ref().into(),
                        email.into(),
                        candidate.yoe.into(),
                    ]
                }),
                TableName::DimDate => dimension_rows(&schema.dates, |date, parts| {
                    vec![
                        parts.year.into(),
                        parts.month.into(),
                        parts.day.into(),
                        (*date).into(),
                    ]
                }),
                TableName::DimCountry => {
                    dimension_rows(&schema.countries, |name, _| vec![name.into()])
                }
                TableName::DimTechnology => {
                    dimension_rows(&schema.technologies, |name, _| vec![name.into()])
                }
                TableName::DimSeniority => {
                    dimension_rows(&schema.seniorities, |name, _| vec![name.into()])
                }
                TableName::FactSelection => schema
                    .facts
                    .iter()
                    .map(|fact| {
                        vec![
                            fact.selection_id.into(),
                            fact.candidate_id.into(),
                            fact.date_id.into(),
                            fact.country_id.into(),
                            fact.technology_id.into(),
                            fact.seniority_id.into(),
                            fact.code_challenge_score.into(),
                            fact.technical_interview_score.into(),
                            fact.hired.into(),
                        ]
                    })
                    .collect(),
            };
            TableData::new(table, rows)
        })
        .collect()
}
