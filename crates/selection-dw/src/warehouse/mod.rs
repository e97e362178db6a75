//! Physical warehouse: fixed schema, the serialization step in front of it,
//! and the SQLite loader.

pub mod load;
pub mod normalize;
pub mod schema;

pub use load::{
    LoadError, LoadReport, PartialLoadPolicy, SqliteWarehouse, TableLoadOutcome, TableLoadStatus,
};
pub use normalize::{normalize, SchemaMismatch, SqlValue, TableData};
pub use schema::{ColumnMapping, TableName, TableSchema, RAW_COLUMNS};
