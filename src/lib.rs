//! Sparkify warehouse loader.
//!
//! Two batch jobs share this library: `initialize-schema` drops and recreates
//! the staging and star-schema tables, `run-load` bulk-loads the raw JSON
//! event and song data into staging and fills the dimension and fact tables
//! from it.

pub mod cli;
pub mod config;
pub mod pipeline;
pub mod queries;
pub mod schema;
pub mod warehouse;

// Re-export commonly used types for convenience
pub use config::{AppConfig, CliConfig, FileConfig};
pub use pipeline::{run_job, JobError, JobKind, Pipeline};
pub use warehouse::{Dialect, RedshiftWarehouse, SqliteWarehouse, Warehouse};
