//! Warehouse connections.
//!
//! A job talks to exactly one warehouse through the [`Warehouse`] trait. Every
//! statement runs in its own transaction and is committed before the next one
//! starts, so a failure leaves all previously executed statements in place.

mod json_source;
mod redshift;
mod sqlite;

pub use redshift::RedshiftWarehouse;
pub use sqlite::SqliteWarehouse;

use crate::config::BackendSettings;
use crate::pipeline::{CopyCommand, Statement};
use anyhow::Result;
use clap::ValueEnum;
use serde::Deserialize;

/// SQL flavour spoken by a warehouse backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Dialect {
    #[default]
    Redshift,
    Sqlite,
}

/// Calendar fields extracted from a timestamp for the `time` dimension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DatePart {
    Hour,
    Day,
    Week,
    Month,
    Year,
    Weekday,
}

impl Dialect {
    /// Expression converting an epoch-milliseconds column into a timestamp,
    /// truncated to whole seconds.
    pub fn epoch_millis_to_timestamp(&self, column: &str) -> String {
        match self {
            Dialect::Redshift => {
                format!("TIMESTAMP 'epoch' + {} / 1000 * INTERVAL '1 second'", column)
            }
            Dialect::Sqlite => format!("datetime({} / 1000, 'unixepoch')", column),
        }
    }

    /// Expression extracting one calendar field from a timestamp expression.
    pub fn extract(&self, part: DatePart, expr: &str) -> String {
        match self {
            Dialect::Redshift => {
                let field = match part {
                    DatePart::Hour => "hour",
                    DatePart::Day => "day",
                    DatePart::Week => "week",
                    DatePart::Month => "month",
                    DatePart::Year => "year",
                    DatePart::Weekday => "dow",
                };
                format!("EXTRACT({} FROM {})", field, expr)
            }
            Dialect::Sqlite => {
                let format = match part {
                    DatePart::Hour => "%H",
                    DatePart::Day => "%d",
                    DatePart::Week => "%V",
                    DatePart::Month => "%m",
                    DatePart::Year => "%Y",
                    DatePart::Weekday => "%w",
                };
                format!("CAST(strftime('{}', {}) AS INTEGER)", format, expr)
            }
        }
    }
}

impl std::fmt::Display for Dialect {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Dialect::Redshift => write!(f, "redshift"),
            Dialect::Sqlite => write!(f, "sqlite"),
        }
    }
}

/// A live connection to the target warehouse.
pub trait Warehouse {
    /// The SQL dialect statements must be rendered in for this warehouse.
    fn dialect(&self) -> Dialect;

    /// Executes a single SQL statement and commits it.
    fn execute_sql(&mut self, sql: &str) -> Result<()>;

    /// Bulk-loads external JSON data into a staging table and commits it.
    fn bulk_load(&mut self, copy: &CopyCommand) -> Result<()>;

    /// Column names of `table`, in declaration order. Empty if the table does
    /// not exist.
    fn table_columns(&mut self, table: &str) -> Result<Vec<String>>;

    /// Number of rows currently stored in `table`.
    fn row_count(&mut self, table: &str) -> Result<u64>;

    /// Runs one pipeline statement.
    fn execute(&mut self, statement: &Statement) -> Result<()> {
        match statement {
            Statement::Sql(sql) => self.execute_sql(sql),
            Statement::Copy(copy) => self.bulk_load(copy),
        }
    }

    /// Closes the connection, surfacing any error raised while shutting down.
    fn close(self: Box<Self>) -> Result<()>;
}

/// Opens the warehouse described by `backend`.
pub fn connect(backend: &BackendSettings) -> Result<Box<dyn Warehouse>> {
    match backend {
        BackendSettings::Redshift(cluster) => Ok(Box::new(RedshiftWarehouse::connect(cluster)?)),
        BackendSettings::Sqlite { database } => Ok(Box::new(SqliteWarehouse::open(database)?)),
    }
}
