//! Table definitions and their rendering into DDL.

mod tables;

pub use tables::{
    ALL_TABLES, ARTISTS_TABLE, SONGPLAYS_TABLE, SONGS_TABLE, STAGING_EVENTS_TABLE,
    STAGING_SONGS_TABLE, TIME_TABLE, USERS_TABLE,
};

use crate::warehouse::{Dialect, Warehouse};
use anyhow::{bail, Result};
use tracing::info;

#[macro_export]
macro_rules! warehouse_column {
    ($name:expr, $sql_type:expr $(, $field:ident = $value:expr)*) => {
        {
            // Only mutated when optional fields are given.
            #[allow(unused_mut)]
            let mut column = $crate::schema::Column {
                name: $name,
                sql_type: $sql_type,
                is_primary_key: false,
                non_null: false,
                foreign_key: None,
            };
            $(
                column.$field = $value;
            )*
            column
        }
    };
}

#[derive(Debug, PartialEq, Eq)]
pub enum SqlType {
    /// Bounded text; `None` means the warehouse maximum.
    Varchar(Option<u16>),
    Integer,
    BigInt,
    Float,
    Timestamp,
    /// Auto-incrementing integer surrogate key.
    Identity,
}

impl SqlType {
    fn render(&self, dialect: Dialect) -> String {
        match dialect {
            Dialect::Redshift => match self {
                SqlType::Varchar(Some(len)) => format!("VARCHAR({})", len),
                SqlType::Varchar(None) => "VARCHAR(MAX)".to_string(),
                SqlType::Integer => "INTEGER".to_string(),
                SqlType::BigInt => "BIGINT".to_string(),
                SqlType::Float => "FLOAT".to_string(),
                SqlType::Timestamp => "TIMESTAMP".to_string(),
                SqlType::Identity => "INTEGER IDENTITY(0,1)".to_string(),
            },
            Dialect::Sqlite => match self {
                SqlType::Varchar(_) | SqlType::Timestamp => "TEXT".to_string(),
                SqlType::Integer | SqlType::BigInt | SqlType::Identity => "INTEGER".to_string(),
                SqlType::Float => "REAL".to_string(),
            },
        }
    }
}

pub struct ForeignKey {
    pub foreign_table: &'static str,
    pub foreign_column: &'static str,
}

pub struct Column {
    pub name: &'static str,
    pub sql_type: &'static SqlType,
    pub is_primary_key: bool,
    pub non_null: bool,
    pub foreign_key: Option<&'static ForeignKey>,
}

/// Redshift distribution style. Ignored by other dialects.
#[derive(Debug, PartialEq, Eq)]
pub enum Distribution {
    /// No clause, the warehouse default.
    Default,
    Auto,
    All,
    Key(&'static str),
}

pub struct Table {
    pub name: &'static str,
    pub columns: &'static [Column],
    pub distribution: Distribution,
    pub sort_key: &'static [&'static str],
}

impl Table {
    pub fn column_names(&self) -> Vec<&'static str> {
        self.columns.iter().map(|c| c.name).collect()
    }

    pub fn drop_sql(&self) -> String {
        format!("DROP TABLE IF EXISTS {};", self.name)
    }

    pub fn create_sql(&self, dialect: Dialect) -> String {
        let mut create_sql = format!("CREATE TABLE IF NOT EXISTS {} (", self.name);
        for (column_index, column) in self.columns.iter().enumerate() {
            if column_index > 0 {
                create_sql.push(',');
            }
            create_sql.push_str(&format!(
                "\n    {} {}",
                column.name,
                column.sql_type.render(dialect)
            ));
            if column.is_primary_key {
                create_sql.push_str(" PRIMARY KEY");
            }
            if column.non_null {
                create_sql.push_str(" NOT NULL");
            }
            if let Some(foreign_key) = column.foreign_key {
                create_sql.push_str(&format!(
                    " REFERENCES {}({})",
                    foreign_key.foreign_table, foreign_key.foreign_column
                ));
            }
        }
        create_sql.push_str("\n)");

        if dialect == Dialect::Redshift {
            match self.distribution {
                Distribution::Default => {}
                Distribution::Auto => create_sql.push_str("\nDISTSTYLE AUTO"),
                Distribution::All => create_sql.push_str("\nDISTSTYLE ALL"),
                Distribution::Key(column) => {
                    create_sql.push_str(&format!("\nDISTSTYLE KEY\nDISTKEY ({})", column))
                }
            }
            if !self.sort_key.is_empty() {
                create_sql.push_str(&format!("\nSORTKEY ({})", self.sort_key.join(", ")));
            }
        }
        create_sql.push(';');
        create_sql
    }
}

/// Checks that every table exists with exactly the expected columns, in order.
pub fn verify(warehouse: &mut dyn Warehouse, tables: &[&Table]) -> Result<()> {
    for table in tables {
        let actual = warehouse.table_columns(table.name)?;
        if actual.is_empty() {
            bail!("Table {} does not exist", table.name);
        }
        let expected = table.column_names();
        let matches = actual.len() == expected.len()
            && actual
                .iter()
                .zip(expected.iter())
                .all(|(a, e)| a.eq_ignore_ascii_case(e));
        if !matches {
            bail!(
                "Table {} has columns ({}), expected ({})",
                table.name,
                actual.join(", "),
                expected.join(", ")
            );
        }
    }
    info!("Verified {} tables", tables.len());
    Ok(())
}
