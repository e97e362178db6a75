use super::keys::{KeyAssignment, SurrogateKey};
use super::StagedRecord;
use crate::warehouse::schema::TableName;
use chrono::{Datelike, NaiveDate};
use serde::Serialize;
use std::borrow::Borrow;
use std::hash::Hash;

/// Distinct natural keys of one attribute domain, each with its surrogate key
/// and the attributes of the record where it was first seen.
#[derive(Debug, Clone, PartialEq)]
pub struct Dimension<K, A> {
    table: TableName,
    keys: KeyAssignment<K>,
    attributes: Vec<A>,
}

/// Borrowed view of one dimension row.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DimensionRow<'a, K, A> {
    pub key: SurrogateKey,
    pub natural_key: &'a K,
    pub attributes: &'a A,
}

impl<K, A> Dimension<K, A>
where
    K: Eq + Hash + Clone,
{
    /// Records whose natural key is missing are skipped; the first record
    /// seen for a natural key supplies its attributes.
    pub fn build<'r, R, I, F, G>(
        table: TableName,
        records: I,
        mut natural_key: F,
        mut attributes: G,
    ) -> Self
    where
        R: 'r,
        I: IntoIterator<Item = &'r R>,
        F: FnMut(&'r R) -> Option<K>,
        G: FnMut(&'r R, &K) -> A,
    {
        let mut keys = KeyAssignment::default();
        let mut collected = Vec::new();

        for record in records {
            let Some(key) = natural_key(record) else {
                continue;
            };
            if let Some(stored) = keys.insert(key) {
                collected.push(attributes(record, stored));
            }
        }

        Self {
            table,
            keys,
            attributes: collected,
        }
    }

    pub fn table(&self) -> TableName {
        self.table
    }

    pub fn key_for<Q>(&self, natural_key: &Q) -> Option<SurrogateKey>
    where
        K: Borrow<Q>,
        Q: Eq + Hash + ?Sized,
    {
        self.keys.get(natural_key)
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    pub fn rows(&self) -> impl Iterator<Item = DimensionRow<'_, K, A>> + '_ {
        self.keys
            .iter()
            .zip(&self.attributes)
            .map(|((key, natural_key), attributes)| DimensionRow {
                key,
                natural_key,
                attributes,
            })
    }

    pub fn row(&self, key: SurrogateKey) -> Option<DimensionRow<'_, K, A>> {
        let natural_key = self.keys.natural_key(key)?;
        let position = usize::try_from(key.get() - 1).ok()?;
        Some(DimensionRow {
            key,
            natural_key,
            attributes: self.attributes.get(position)?,
        })
    }
}

/// Candidate attributes carried next to the email natural key.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CandidateAttributes {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub yoe: Option<i64>,
}

/// Calendar parts stored alongside each distinct application date.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DateParts {
    pub year: i32,
    pub month: u32,
    pub day: u32,
}

impl From<NaiveDate> for DateParts {
    fn from(date: NaiveDate) -> Self {
        Self {
            year: date.year(),
            month: date.month(),
            day: date.day(),
        }
    }
}

pub type CandidateDimension = Dimension<String, CandidateAttributes>;
pub type DateDimension = Dimension<NaiveDate, DateParts>;
/// Dimensions whose natural key is also their only attribute.
pub type LabelDimension = Dimension<String, ()>;

pub fn build_candidate_dimension(records: &[StagedRecord<'_>]) -> CandidateDimension {
    Dimension::build(
        TableName::DimCandidate,
        records,
        |record| record.raw.email.clone(),
        |record, _| CandidateAttributes {
            first_name: record.raw.first_name.clone(),
            last_name: record.raw.last_name.clone(),
            yoe: record.raw.yoe,
        },
    )
}

pub fn build_date_dimension(records: &[StagedRecord<'_>]) -> DateDimension {
    Dimension::build(
        TableName::DimDate,
        records,
        |record| record.application_date,
        |_, date| DateParts::from(*date),
    )
}

pub fn build_label_dimension<F>(
    table: TableName,
    records: &[StagedRecord<'_>],
    mut label: F,
) -> LabelDimension
where
    F: FnMut(&StagedRecord<'_>) -> Option<String>,
{
    Dimension::build(table, records, |record| label(record), |_, _| ())
}
