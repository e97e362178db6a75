use super::ReportError;
use rusqlite::{params, Connection, Params, Row};
use serde::Serialize;

/// Countries covered by the hires-by-country report.
pub const REPORTED_COUNTRIES: [&str; 4] = ["USA", "Brazil", "Colombia", "Ecuador"];

const HIRED: i64 = 1;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HireRate {
    pub total: i64,
    pub hired: i64,
    /// `None` when the fact table is empty.
    pub hire_rate: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SeniorityScores {
    pub seniority: String,
    pub avg_code_challenge: Option<f64>,
    pub avg_technical_interview: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TechnologyHires {
    pub technology: String,
    pub total_hires: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct YearHires {
    pub year: i64,
    pub total_hires: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SeniorityHires {
    pub seniority: String,
    pub total_hires: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CountryYearHires {
    pub country: String,
    pub year: i64,
    pub total_hires: i64,
}

fn query_rows<T, P, F>(
    conn: &Connection,
    sql: &str,
    params: P,
    map: F,
) -> Result<Vec<T>, ReportError>
where
    P: Params,
    F: FnMut(&Row<'_>) -> rusqlite::Result<T>,
{
    let mut statement = conn.prepare(sql)?;
    let rows = statement
        .query_map(params, map)?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(rows)
}

pub fn hire_rate(conn: &Connection) -> Result<HireRate, ReportError> {
    let sql = "
        SELECT
            COUNT(*) AS total,
            COALESCE(SUM(CASE WHEN f.hired = ?1 THEN 1 ELSE 0 END), 0) AS hired,
            100.0 * SUM(CASE WHEN f.hired = ?1 THEN 1 ELSE 0 END) / COUNT(*) AS hire_rate
        FROM fact_selection f
    ";
    let rate = conn.query_row(sql, params![HIRED], |row| {
        Ok(HireRate {
            total: row.get(0)?,
            hired: row.get(1)?,
            hire_rate: row.get(2)?,
        })
    })?;
    Ok(rate)
}

pub fn avg_scores_hired_by_seniority(
    conn: &Connection,
) -> Result<Vec<SeniorityScores>, ReportError> {
    let sql = "
        SELECT
            s.seniority_name,
            AVG(f.code_challenge_score) AS avg_challenge_hired,
            AVG(f.technical_interview_score) AS avg_interview_hired
        FROM fact_selection f
        JOIN dim_seniority s ON f.seniority_id = s.seniority_id
        WHERE f.hired = ?1
        GROUP BY s.seniority_name
        ORDER BY s.seniority_name
    ";
    query_rows(conn, sql, params![HIRED], |row| {
        Ok(SeniorityScores {
            seniority: row.get(0)?,
            avg_code_challenge: row.get(1)?,
            avg_technical_interview: row.get(2)?,
        })
    })
}

pub fn hires_by_technology(conn: &Connection) -> Result<Vec<TechnologyHires>, ReportError> {
    let sql = "
        SELECT
            t.technology_name,
            COUNT(*) AS total_hires
        FROM fact_selection f
        JOIN dim_technology t ON f.technology_id = t.technology_id
        WHERE f.hired = ?1
        GROUP BY t.technology_name
        ORDER BY total_hires DESC, t.technology_name
    ";
    query_rows(conn, sql, params![HIRED], |row| {
        Ok(TechnologyHires {
            technology: row.get(0)?,
            total_hires: row.get(1)?,
        })
    })
}

pub fn hires_by_year(conn: &Connection) -> Result<Vec<YearHires>, ReportError> {
    let sql = "
        SELECT
            d.year,
            COUNT(*) AS total_hires
        FROM fact_selection f
        JOIN dim_date d ON f.date_id = d.date_id
        WHERE f.hired = ?1
        GROUP BY d.year
        ORDER BY d.year
    ";
    query_rows(conn, sql, params![HIRED], |row| {
        Ok(YearHires {
            year: row.get(0)?,
            total_hires: row.get(1)?,
        })
    })
}

pub fn hires_by_seniority(conn: &Connection) -> Result<Vec<SeniorityHires>, ReportError> {
    let sql = "
        SELECT
            s.seniority_name,
            COUNT(*) AS total_hires
        FROM fact_selection f
        JOIN dim_seniority s ON f.seniority_id = s.seniority_id
        WHERE f.hired = ?1
        GROUP BY s.seniority_name
        ORDER BY total_hires DESC, s.seniority_name
    ";
    query_rows(conn, sql, params![HIRED], |row| {
        Ok(SeniorityHires {
            seniority: row.get(0)?,
            total_hires: row.get(1)?,
        })
    })
}

pub fn hires_by_country_and_year(
    conn: &Connection,
) -> Result<Vec<CountryYearHires>, ReportError> {
    let sql = "
        SELECT
            c.country_name,
            d.year,
            COUNT(*) AS total_hires
        FROM fact_selection f
        JOIN dim_country c ON f.country_id = c.country_id
        JOIN dim_date d ON f.date_id = d.date_id
        WHERE f.hired = ?1
          AND c.country_name IN (?2, ?3, ?4, ?5)
        GROUP BY c.country_name, d.year
        ORDER BY d.year, total_hires DESC, c.country_name
    ";
    let [first, second, third, fourth] = REPORTED_COUNTRIES;
    query_rows(
        conn,
        sql,
        params![HIRED, first, second, third, fourth],
        |row| {
            Ok(CountryYearHires {
                country: row.get(0)?,
                year: row.get(1)?,
                total_hires: row.get(2)?,
            })
        },
    )
}
