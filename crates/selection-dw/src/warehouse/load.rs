use super::normalize::{SchemaMismatch, TableData};
use super::schema::TableName;
use rusqlite::{params_from_iter, Connection, Transaction};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use std::str::FromStr;
use tracing::{error, info, warn};

/// What happens to tables already inserted when a later table fails.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PartialLoadPolicy {
    /// Each table commits on its own; failures leave earlier tables in place.
    #[default]
    KeepPartial,
    /// All tables share one transaction; any failure rolls back the run.
    RollbackAll,
}

impl PartialLoadPolicy {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::KeepPartial => "keep_partial",
            Self::RollbackAll => "rollback_all",
        }
    }
}

impl fmt::Display for PartialLoadPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PartialLoadPolicy {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "keep_partial" | "partial" => Ok(Self::KeepPartial),
            "rollback_all" | "rollback" => Ok(Self::RollbackAll),
            other => Err(format!(
                "unknown load policy '{other}' (expected keep_partial or rollback_all)"
            )),
        }
    }
}

/// Connection-level failures. These abort the run; per-table insert failures
/// are reported through [`LoadReport`] instead.
#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    #[error("failed to open warehouse at {path}: {source}")]
    Connection {
        path: String,
        #[source]
        source: rusqlite::Error,
    },
    #[error("failed to create warehouse schema for {table}: {source}")]
    Schema {
        table: TableName,
        #[source]
        source: rusqlite::Error,
    },
    #[error("failed to count rows in {table}: {source}")]
    Query {
        table: TableName,
        #[source]
        source: rusqlite::Error,
    },
    #[error("warehouse transaction failed: {0}")]
    Transaction(#[from] rusqlite::Error),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum TableLoadStatus {
    Inserted { rows: usize },
    Failed { reason: String },
    RolledBack { rows: usize },
    Skipped,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TableLoadOutcome {
    pub table: TableName,
    #[serde(flatten)]
    pub status: TableLoadStatus,
}

/// Per-table outcome of one load.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LoadReport {
    pub policy: PartialLoadPolicy,
    pub tables: Vec<TableLoadOutcome>,
}

impl LoadReport {
    pub fn inserted_rows(&self) -> usize {
        self.tables
            .iter()
            .map(|outcome| match outcome.status {
                TableLoadStatus::Inserted { rows } => rows,
                _ => 0,
            })
            .sum()
    }

    pub fn failures(&self) -> impl Iterator<Item = &TableLoadOutcome> + '_ {
        self.tables
            .iter()
            .filter(|outcome| matches!(outcome.status, TableLoadStatus::Failed { .. }))
    }

    pub fn is_complete(&self) -> bool {
        self.tables
            .iter()
            .all(|outcome| matches!(outcome.status, TableLoadStatus::Inserted { .. }))
    }

    /// Some tables were committed while others were not.
    pub fn is_partial(&self) -> bool {
        let inserted = self
            .tables
            .iter()
            .any(|outcome| matches!(outcome.status, TableLoadStatus::Inserted { .. }));
        inserted && !self.is_complete()
    }

    pub fn status_of(&self, table: TableName) -> Option<&TableLoadStatus> {
        self.tables
            .iter()
            .find(|outcome| outcome.table == table)
            .map(|outcome| &outcome.status)
    }
}

#[derive(Debug, thiserror::Error)]
enum InsertError {
    #[error(transparent)]
    Schema(#[from] SchemaMismatch),
    #[error(transparent)]
    Sqlite(#[from] rusqlite::Error),
}

/// SQLite-backed selection warehouse.
pub struct SqliteWarehouse {
    conn: Connection,
}

impl SqliteWarehouse {
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, LoadError> {
        let path = path.as_ref();
        let conn = Connection::open(path).map_err(|source| LoadError::Connection {
            path: path.display().to_string(),
            source,
        })?;
        info!(path = %path.display(), "warehouse connection established");
        Self::with_connection(conn, &path.display().to_string())
    }

    pub fn open_in_memory() -> Result<Self, LoadError> {
        let conn = Connection::open_in_memory().map_err(|source| LoadError::Connection {
            path: ":memory:".to_string(),
            source,
        })?;
        Self::with_connection(conn, ":memory:")
    }

    fn with_connection(conn: Connection, path: &str) -> Result<Self, LoadError> {
        conn.pragma_update(None, "foreign_keys", true)
            .map_err(|source| LoadError::Connection {
                path: path.to_string(),
                source,
            })?;
        Ok(Self { conn })
    }

    pub fn connection(&self) -> &Connection {
        &self.conn
    }

    /// Creates any missing table; existing tables and rows are left alone.
    pub fn ensure_schema(&self) -> Result<(), LoadError> {
        for table in TableName::load_order() {
            self.conn
                .execute_batch(&table.schema().create_statement())
                .map_err(|source| LoadError::Schema { table, source })?;
            info!(table = %table, "table verified/created");
        }
        Ok(())
    }

    /// Drops all warehouse tables, fact table first.
    pub fn drop_schema(&self) -> Result<(), LoadError> {
        for table in TableName::load_order().into_iter().rev() {
            self.conn
                .execute_batch(&table.schema().drop_statement())
                .map_err(|source| LoadError::Schema { table, source })?;
        }
        warn!("warehouse tables dropped");
        Ok(())
    }

    pub fn row_count(&self, table: TableName) -> Result<usize, LoadError> {
        let count: i64 = self
            .conn
            .query_row(&format!("SELECT COUNT(*) FROM {table}"), [], |row| row.get(0))
            .map_err(|source| LoadError::Query { table, source })?;
        Ok(usize::try_from(count).unwrap_or_default())
    }

    /// Inserts every table in the order given.
    pub fn load(
        &mut self,
        tables: &[TableData],
        policy: PartialLoadPolicy,
    ) -> Result<LoadReport, LoadError> {
        let outcomes = match policy {
            PartialLoadPolicy::KeepPartial => self.load_keep_partial(tables)?,
            PartialLoadPolicy::RollbackAll => self.load_rollback_all(tables)?,
        };

        let report = LoadReport {
            policy,
            tables: outcomes,
        };

        if report.is_complete() {
            info!(rows = report.inserted_rows(), "warehouse load complete");
        } else if report.is_partial() {
            warn!(
                %policy,
                failed = report.failures().count(),
                "warehouse load is partial; some tables were not inserted"
            );
        } else {
            error!(%policy, "warehouse load inserted no tables");
        }

        Ok(report)
    }

    fn load_keep_partial(
        &mut self,
        tables: &[TableData],
    ) -> Result<Vec<TableLoadOutcome>, LoadError> {
        let mut outcomes = Vec::with_capacity(tables.len());

        for data in tables {
            let tx = self.conn.transaction()?;
            let status = match insert_table(&tx, data) {
                Ok(rows) => {
                    tx.commit()?;
                    info!(table = %data.table, rows, "rows inserted");
                    TableLoadStatus::Inserted { rows }
                }
                Err(err) => {
                    drop(tx);
                    error!(table = %data.table, error = %err, "table insert failed");
                    TableLoadStatus::Failed {
                        reason: err.to_string(),
                    }
                }
            };
            outcomes.push(TableLoadOutcome {
                table: data.table,
                status,
            });
        }

        Ok(outcomes)
    }

    fn load_rollback_all(
        &mut self,
        tables: &[TableData],
    ) -> Result<Vec<TableLoadOutcome>, LoadError> {
        let tx = self.conn.transaction()?;
        let mut inserted = Vec::with_capacity(tables.len());

        for (position, data) in tables.iter().enumerate() {
            match insert_table(&tx, data) {
                Ok(rows) => {
                    info!(table = %data.table, rows, "rows staged");
                    inserted.push((data.table, rows));
                }
                Err(err) => {
                    error!(
                        table = %data.table,
                        error = %err,
                        "table insert failed; rolling back run"
                    );
                    tx.rollback()?;

                    let mut outcomes = inserted
                        .into_iter()
                        .map(|(table, rows)| TableLoadOutcome {
                            table,
                            status: TableLoadStatus::RolledBack { rows },
                        })
                        .collect::<Vec<_>>();
                    outcomes.push(TableLoadOutcome {
                        table: data.table,
                        status: TableLoadStatus::Failed {
                            reason: err.to_string(),
                        },
                    });
                    outcomes.extend(tables[position + 1..].iter().map(|rest| TableLoadOutcome {
                        table: rest.table,
                        status: TableLoadStatus::Skipped,
                    }));
                    return Ok(outcomes);
                }
            }
        }

        tx.commit()?;
        Ok(inserted
            .into_iter()
            .map(|(table, rows)| TableLoadOutcome {
                table,
                status: TableLoadStatus::Inserted { rows },
            })
            .collect())
    }
}

fn insert_table(tx: &Transaction<'_>, data: &TableData) -> Result<usize, InsertError> {
    data.validate()?;
    let mut statement = tx.prepare(&data.table.schema().insert_statement())?;
    for row in &data.rows {
        statement.execute(params_from_iter(row.iter()))?;
    }
    Ok(data.rows.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extract::RawRecord;
    use crate::transform::transform;
    use crate::warehouse::normalize::{normalize, SqlValue};

    fn tables() -> Vec<TableData> {
        let records = vec![
            RawRecord {
                first_name: Some("Ana".into()),
                last_name: Some("Paz".into()),
                email: Some("ana@example.com".into()),
                yoe: Some(2),
                application_date: Some("2020-05-05".into()),
                country: Some("Colombia".into()),
                seniority: Some("Junior".into()),
                technology: Some("Data Engineer".into()),
                code_challenge_score: Some(8),
                technical_interview_score: Some(9),
            },
            RawRecord {
                first_name: Some("Bo".into()),
                last_name: Some("Lin".into()),
                email: Some("bo@example.com".into()),
                yoe: Some(6),
                application_date: Some("2021-01-10".into()),
                country: Some("USA".into()),
                seniority: Some("Senior".into()),
                technology: Some("DevOps".into()),
                code_challenge_score: Some(5),
                technical_interview_score: Some(9),
            },
        ];
        normalize(&transform(&records).schema)
    }

    fn warehouse() -> SqliteWarehouse {
        let warehouse = SqliteWarehouse::open_in_memory().expect("in-memory warehouse");
        warehouse.ensure_schema().expect("schema");
        warehouse
    }

    #[test]
    fn ensure_schema_is_idempotent() {
        let warehouse = warehouse();
        warehouse.ensure_schema().expect("second call succeeds");
        assert_eq!(warehouse.row_count(TableName::FactSelection).expect("count"), 0);
    }

    #[test]
    fn row_count_names_the_table_it_could_not_read() {
        let warehouse = SqliteWarehouse::open_in_memory().expect("warehouse");
        let error = warehouse
            .row_count(TableName::FactSelection)
            .expect_err("no schema yet");

        assert!(matches!(
            error,
            LoadError::Query {
                table: TableName::FactSelection,
                ..
            }
        ));
        assert!(error
            .to_string()
            .starts_with("failed to count rows in fact_selection"));
    }

    #[test]
    fn load_inserts_every_table() {
        let mut warehouse = warehouse();
        let report = warehouse
            .load(&tables(), PartialLoadPolicy::KeepPartial)
            .expect("load");

        assert!(report.is_complete());
        assert!(!report.is_partial());
        assert_eq!(warehouse.row_count(TableName::DimCandidate).expect("count"), 2);
        assert_eq!(warehouse.row_count(TableName::FactSelection).expect("count"), 2);
        assert_eq!(report.inserted_rows(), 2 * 6);
    }

    #[test]
    fn keep_partial_continues_after_a_failed_table() {
        let mut warehouse = warehouse();
        let mut data = tables();
        data[2].rows.push(vec![SqlValue::Integer(1), SqlValue::from("Duplicate")]);

        let report = warehouse
            .load(&data, PartialLoadPolicy::KeepPartial)
            .expect("load returns a report");

        assert!(report.is_partial());
        assert!(matches!(
            report.status_of(TableName::DimCountry),
            Some(TableLoadStatus::Failed { .. })
        ));
        assert_eq!(
            report.status_of(TableName::DimTechnology),
            Some(&TableLoadStatus::Inserted { rows: 2 })
        );
        assert_eq!(warehouse.row_count(TableName::DimCountry).expect("count"), 0);
        assert_eq!(warehouse.row_count(TableName::DimCandidate).expect("count"), 2);
        // facts reference country ids that never landed
        assert!(matches!(
            report.status_of(TableName::FactSelection),
            Some(TableLoadStatus::Failed { .. })
        ));
    }

    #[test]
    fn rollback_all_leaves_no_rows_behind() {
        let mut warehouse = warehouse();
        let mut data = tables();
        data[3].columns = vec!["technology_id", "technology"];

        let report = warehouse
            .load(&data, PartialLoadPolicy::RollbackAll)
            .expect("load returns a report");

        assert!(!report.is_partial());
        assert_eq!(
            report.status_of(TableName::DimCandidate),
            Some(&TableLoadStatus::RolledBack { rows: 2 })
        );
        assert!(matches!(
            report.status_of(TableName::DimTechnology),
            Some(TableLoadStatus::Failed { reason }) if reason.contains("expected columns")
        ));
        assert_eq!(
            report.status_of(TableName::FactSelection),
            Some(&TableLoadStatus::Skipped)
        );
        for table in TableName::load_order() {
            assert_eq!(warehouse.row_count(table).expect("count"), 0);
        }
    }

    #[test]
    fn reloading_the_same_run_conflicts_on_primary_keys() {
        let mut warehouse = warehouse();
        let data = tables();
        warehouse
            .load(&data, PartialLoadPolicy::KeepPartial)
            .expect("first load");

        let report = warehouse
            .load(&data, PartialLoadPolicy::KeepPartial)
            .expect("second load reports");

        assert_eq!(report.failures().count(), 6);
        assert_eq!(warehouse.row_count(TableName::FactSelection).expect("count"), 2);
    }

    #[test]
    fn drop_schema_allows_a_fresh_load() {
        let mut warehouse = warehouse();
        let data = tables();
        warehouse
            .load(&data, PartialLoadPolicy::KeepPartial)
            .expect("first load");

        warehouse.drop_schema().expect("drop");
        warehouse.ensure_schema().expect("recreate");
        let report = warehouse
            .load(&data, PartialLoadPolicy::RollbackAll)
            .expect("fresh load");
        assert!(report.is_complete());
    }

    #[test]
    fn policy_parses_from_config_strings() {
        assert_eq!(
            "rollback-all".parse::<PartialLoadPolicy>(),
            Ok(PartialLoadPolicy::RollbackAll)
        );
        assert_eq!(
            " Keep_Partial ".parse::<PartialLoadPolicy>(),
            Ok(PartialLoadPolicy::KeepPartial)
        );
        assert!("sometimes".parse::<PartialLoadPolicy>().is_err());
    }
}
