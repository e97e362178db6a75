//! Recruitment selection warehouse: extract the candidate export, build a
//! star schema, load it into SQLite and report hiring KPIs.

pub mod config;
pub mod error;
pub mod etl;
pub mod extract;
pub mod report;
pub mod telemetry;
pub mod transform;
pub mod warehouse;
