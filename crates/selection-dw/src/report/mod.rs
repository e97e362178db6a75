//! Read-only hiring KPIs over a populated warehouse.

pub mod kpis;

pub use kpis::{
    CountryYearHires, HireRate, SeniorityHires, SeniorityScores, TechnologyHires, YearHires,
    REPORTED_COUNTRIES,
};

use rusqlite::{Connection, OpenFlags};
use serde::Serialize;
use std::fmt;
use std::path::Path;
use tracing::debug;

#[derive(Debug, thiserror::Error)]
pub enum ReportError {
    #[error("failed to open warehouse {path} for reporting: {source}")]
    Open {
        path: String,
        #[source]
        source: rusqlite::Error,
    },
    #[error("KPI query failed: {0}")]
    Query(#[from] rusqlite::Error),
}

/// Opens an existing warehouse without write access.
pub fn open_read_only<P: AsRef<Path>>(path: P) -> Result<Connection, ReportError> {
    let path = path.as_ref();
    Connection::open_with_flags(
        path,
        OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX,
    )
    .map_err(|source| ReportError::Open {
        path: path.display().to_string(),
        source,
    })
}

/// All six KPIs, collected in one pass.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct KpiReport {
    pub hire_rate: HireRate,
    pub avg_scores_by_seniority: Vec<SeniorityScores>,
    pub hires_by_technology: Vec<TechnologyHires>,
    pub hires_by_year: Vec<YearHires>,
    pub hires_by_seniority: Vec<SeniorityHires>,
    pub hires_by_country_and_year: Vec<CountryYearHires>,
}

impl KpiReport {
    pub fn collect(conn: &Connection) -> Result<Self, ReportError> {
        let report = Self {
            hire_rate: kpis::hire_rate(conn)?,
            avg_scores_by_seniority: kpis::avg_scores_hired_by_seniority(conn)?,
            hires_by_technology: kpis::hires_by_technology(conn)?,
            hires_by_year: kpis::hires_by_year(conn)?,
            hires_by_seniority: kpis::hires_by_seniority(conn)?,
            hires_by_country_and_year: kpis::hires_by_country_and_year(conn)?,
        };
        debug!(
            total = report.hire_rate.total,
            hired = report.hire_rate.hired,
            "KPI report collected"
        );
        Ok(report)
    }
}

fn format_average(value: Option<f64>) -> String {
    value.map_or_else(|| "n/a".to_string(), |avg| format!("{avg:.2}"))
}

impl fmt::Display for KpiReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "--- KPI 1: Hiring Rate ---")?;
        match self.hire_rate.hire_rate {
            Some(rate) => writeln!(
                f,
                "- {rate:.2}% hired ({} of {} selections)",
                self.hire_rate.hired, self.hire_rate.total
            )?,
            None => writeln!(f, "- no selections loaded")?,
        }

        writeln!(
            f,
            "\n--- KPI 2: Average Scores (Challenge & Interview) by Seniority [only hired] ---"
        )?;
        for entry in &self.avg_scores_by_seniority {
            writeln!(
                f,
                "- {}: challenge {} | interview {}",
                entry.seniority,
                format_average(entry.avg_code_challenge),
                format_average(entry.avg_technical_interview)
            )?;
        }

        writeln!(f, "\n--- KPI 3: Hires by Technology ---")?;
        for entry in &self.hires_by_technology {
            writeln!(f, "- {}: {}", entry.technology, entry.total_hires)?;
        }

        writeln!(f, "\n--- KPI 4: Hires by Year ---")?;
        for entry in &self.hires_by_year {
            writeln!(f, "- {}: {}", entry.year, entry.total_hires)?;
        }

        writeln!(f, "\n--- KPI 5: Hires by Seniority ---")?;
        for entry in &self.hires_by_seniority {
            writeln!(f, "- {}: {}", entry.seniority, entry.total_hires)?;
        }

        writeln!(
            f,
            "\n--- KPI 6: Hires by Country ({}) ---",
            REPORTED_COUNTRIES.join(", ")
        )?;
        for entry in &self.hires_by_country_and_year {
            writeln!(
                f,
                "- {} {}: {}",
                entry.year, entry.country, entry.total_hires
            )?;
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extract::RawRecord;
    use crate::transform::transform;
    use crate::warehouse::{normalize, PartialLoadPolicy, SqliteWarehouse};

    fn hire(email: &str, date: &str, country: &str, technology: &str, seniority: &str) -> RawRecord {
        scored(email, date, country, technology, seniority, (8, 9))
    }

    fn scored(
        email: &str,
        date: &str,
        country: &str,
        technology: &str,
        seniority: &str,
        scores: (i64, i64),
    ) -> RawRecord {
        RawRecord {
            first_name: Some("First".into()),
            last_name: Some("Last".into()),
            email: Some(email.into()),
            yoe: Some(3),
            application_date: Some(date.into()),
            country: Some(country.into()),
            seniority: Some(seniority.into()),
            technology: Some(technology.into()),
            code_challenge_score: Some(scores.0),
            technical_interview_score: Some(scores.1),
        }
    }

    fn warehouse_with(records: &[RawRecord]) -> SqliteWarehouse {
        let mut warehouse = SqliteWarehouse::open_in_memory().expect("warehouse");
        warehouse.ensure_schema().expect("schema");
        let tables = normalize(&transform(records).schema);
        let report = warehouse
            .load(&tables, PartialLoadPolicy::RollbackAll)
            .expect("load");
        assert!(report.is_complete());
        warehouse
    }

    #[test]
    fn hire_rate_is_a_percentage_of_all_selections() {
        let warehouse = warehouse_with(&[
            hire("a@x.com", "2020-01-01", "USA", "Java", "Junior"),
            scored("b@x.com", "2020-01-01", "USA", "Java", "Junior", (6, 9)),
            scored("c@x.com", "2020-01-01", "USA", "Java", "Junior", (7, 6)),
            hire("d@x.com", "2020-01-01", "USA", "Java", "Junior"),
        ]);

        let rate = kpis::hire_rate(warehouse.connection()).expect("rate");
        assert_eq!(rate.total, 4);
        assert_eq!(rate.hired, 2);
        assert_eq!(rate.hire_rate, Some(50.0));
    }

    #[test]
    fn hire_rate_is_undefined_for_an_empty_warehouse() {
        let warehouse = warehouse_with(&[]);
        let rate = kpis::hire_rate(warehouse.connection()).expect("rate");
        assert_eq!(rate.total, 0);
        assert_eq!(rate.hire_rate, None);
    }

    #[test]
    fn averages_only_consider_hired_rows() {
        let warehouse = warehouse_with(&[
            scored("a@x.com", "2020-01-01", "USA", "Java", "Senior", (10, 8)),
            scored("b@x.com", "2020-01-01", "USA", "Java", "Senior", (7, 7)),
            scored("c@x.com", "2020-01-01", "USA", "Java", "Senior", (2, 2)),
            scored("d@x.com", "2020-01-01", "USA", "Java", "Intern", (9, 9)),
        ]);

        let averages = kpis::avg_scores_hired_by_seniority(warehouse.connection()).expect("kpi");
        assert_eq!(
            averages,
            vec![
                SeniorityScores {
                    seniority: "Intern".into(),
                    avg_code_challenge: Some(9.0),
                    avg_technical_interview: Some(9.0),
                },
                SeniorityScores {
                    seniority: "Senior".into(),
                    avg_code_challenge: Some(8.5),
                    avg_technical_interview: Some(7.5),
                },
            ]
        );
    }

    #[test]
    fn count_reports_order_by_hires_descending() {
        let warehouse = warehouse_with(&[
            hire("a@x.com", "2019-01-01", "USA", "Java", "Lead"),
            hire("b@x.com", "2021-01-01", "USA", "Rust", "Lead"),
            hire("c@x.com", "2021-06-01", "USA", "Rust", "Junior"),
            hire("d@x.com", "2020-06-01", "USA", "Rust", "Junior"),
            scored("e@x.com", "2020-06-01", "USA", "Go", "Junior", (1, 1)),
        ]);
        let conn = warehouse.connection();

        let by_technology = kpis::hires_by_technology(conn).expect("kpi");
        assert_eq!(
            by_technology,
            vec![
                TechnologyHires {
                    technology: "Rust".into(),
                    total_hires: 3
                },
                TechnologyHires {
                    technology: "Java".into(),
                    total_hires: 1
                },
            ]
        );

        let by_year = kpis::hires_by_year(conn).expect("kpi");
        let years = by_year
            .iter()
            .map(|entry| (entry.year, entry.total_hires))
            .collect::<Vec<_>>();
        assert_eq!(years, vec![(2019, 1), (2020, 1), (2021, 2)]);

        let by_seniority = kpis::hires_by_seniority(conn).expect("kpi");
        assert_eq!(by_seniority[0].seniority, "Junior");
        assert_eq!(by_seniority[0].total_hires, 2);
        assert_eq!(by_seniority[1].seniority, "Lead");
    }

    #[test]
    fn country_report_is_restricted_to_tracked_countries() {
        let warehouse = warehouse_with(&[
            hire("a@x.com", "2020-01-01", "Brazil", "Java", "Lead"),
            hire("b@x.com", "2020-02-01", "Brazil", "Java", "Lead"),
            hire("c@x.com", "2020-03-01", "Ecuador", "Java", "Lead"),
            hire("d@x.com", "2019-03-01", "USA", "Java", "Lead"),
            hire("e@x.com", "2019-03-01", "Germany", "Java", "Lead"),
        ]);

        let rows = kpis::hires_by_country_and_year(warehouse.connection()).expect("kpi");
        let flattened = rows
            .iter()
            .map(|row| (row.year, row.country.as_str(), row.total_hires))
            .collect::<Vec<_>>();
        assert_eq!(
            flattened,
            vec![(2019, "USA", 1), (2020, "Brazil", 2), (2020, "Ecuador", 1)]
        );
    }

    #[test]
    fn country_report_is_empty_when_only_untracked_countries_hire() {
        let warehouse = warehouse_with(&[hire("a@x.com", "2020-01-01", "Germany", "Java", "Lead")]);
        let rows = kpis::hires_by_country_and_year(warehouse.connection()).expect("kpi");
        assert!(rows.is_empty());
    }

    #[test]
    fn text_rendering_has_a_section_per_kpi() {
        let warehouse = warehouse_with(&[hire("a@x.com", "2020-01-01", "Colombia", "Java", "Lead")]);
        let report = KpiReport::collect(warehouse.connection()).expect("report");
        let text = report.to_string();

        for section in 1..=6 {
            assert!(text.contains(&format!("--- KPI {section}:")));
        }
        assert!(text.contains("- 100.00% hired (1 of 1 selections)"));
        assert!(text.contains("- 2020 Colombia: 1"));
    }

    #[test]
    fn reporting_requires_an_existing_warehouse() {
        let dir = tempfile::tempdir().expect("temp dir");
        let error = open_read_only(dir.path().join("missing.sqlite3")).expect_err("no file");
        assert!(matches!(error, ReportError::Open { .. }));
    }
}
