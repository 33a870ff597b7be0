//! Local SQLite warehouse.
//!
//! Runs the same pipelines as the cluster against a single database file.
//! COPY is emulated by reading JSON documents from the local filesystem.

use super::json_source::{read_documents, source_files, ColumnMapping};
use super::{Dialect, Warehouse};
use crate::pipeline::{CopyCommand, JsonFormat};
use anyhow::{bail, Context, Result};
use rusqlite::{params_from_iter, Connection};
use std::path::Path;
use tracing::{debug, info};

pub struct SqliteWarehouse {
    conn: Connection,
}

impl SqliteWarehouse {
    pub fn open(path: &Path) -> Result<Self> {
        let conn = Connection::open(path)
            .with_context(|| format!("Failed to open warehouse database: {:?}", path))?;
        info!("Opened sqlite warehouse at {:?}", path);
        Ok(Self { conn })
    }

    #[cfg(test)]
    pub fn open_in_memory() -> Result<Self> {
        Ok(Self {
            conn: Connection::open_in_memory()?,
        })
    }
}

impl Warehouse for SqliteWarehouse {
    fn dialect(&self) -> Dialect {
        Dialect::Sqlite
    }

    fn execute_sql(&mut self, sql: &str) -> Result<()> {
        let tx = self.conn.transaction()?;
        tx.execute_batch(sql)?;
        tx.commit()?;
        Ok(())
    }

    fn bulk_load(&mut self, copy: &CopyCommand) -> Result<()> {
        let mapping = match &copy.format {
            JsonFormat::Auto => ColumnMapping::Auto,
            JsonFormat::JsonPaths(path) => ColumnMapping::from_jsonpaths_file(Path::new(path))?,
        };
        if let ColumnMapping::Paths(paths) = &mapping {
            if paths.len() != copy.columns.len() {
                bail!(
                    "jsonpaths file has {} expressions but {} has {} columns",
                    paths.len(),
                    copy.table,
                    copy.columns.len()
                );
            }
        }

        let files = source_files(Path::new(&copy.source))?;
        let placeholders = (1..=copy.columns.len())
            .map(|i| format!("?{}", i))
            .collect::<Vec<_>>()
            .join(", ");
        let insert_sql = format!(
            "INSERT INTO {} ({}) VALUES ({})",
            copy.table,
            copy.columns.join(", "),
            placeholders
        );

        let tx = self.conn.transaction()?;
        let mut rows = 0usize;
        {
            let mut stmt = tx.prepare(&insert_sql)?;
            for file in &files {
                debug!("Loading {:?} into {}", file, copy.table);
                for document in read_documents(file)? {
                    let values = mapping
                        .extract(&document, &copy.columns)
                        .with_context(|| format!("Failed to map document in {:?}", file))?;
                    stmt.execute(params_from_iter(values.iter()))?;
                    rows += 1;
                }
            }
        }
        tx.commit()?;

        info!(
            "Loaded {} rows into {} from {} files",
            rows,
            copy.table,
            files.len()
        );
        Ok(())
    }

    fn table_columns(&mut self, table: &str) -> Result<Vec<String>> {
        let mut stmt = self
            .conn
            .prepare("SELECT name FROM pragma_table_info(?1) ORDER BY cid")?;
        let columns = stmt
            .query_map([table], |row| row.get::<_, String>(0))?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(columns)
    }

    fn row_count(&mut self, table: &str) -> Result<u64> {
        let count: i64 =
            self.conn
                .query_row(&format!("SELECT COUNT(*) FROM {}", table), [], |row| {
                    row.get(0)
                })?;
        Ok(count as u64)
    }

    fn close(self: Box<Self>) -> Result<()> {
        self.conn.close().map_err(|(_, e)| e)?;
        Ok(())
    }
}
