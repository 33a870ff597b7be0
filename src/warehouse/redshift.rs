use super::{Dialect, Warehouse};
use crate::config::ClusterSettings;
use crate::pipeline::CopyCommand;
use anyhow::{Context, Result};
use postgres::{Client, NoTls};
use tracing::info;

/// Redshift cluster reached over the PostgreSQL wire protocol.
pub struct RedshiftWarehouse {
    client: Client,
}

impl RedshiftWarehouse {
    pub fn connect(cluster: &ClusterSettings) -> Result<Self> {
        info!("Connecting to {}", cluster.redacted_connection_string());
        let client = Client::connect(&cluster.connection_string(), NoTls)
            .with_context(|| format!("Failed to connect to cluster at {}", cluster.host))?;
        Ok(Self { client })
    }
}

impl Warehouse for RedshiftWarehouse {
    fn dialect(&self) -> Dialect {
        Dialect::Redshift
    }

    fn execute_sql(&mut self, sql: &str) -> Result<()> {
        let mut tx = self.client.transaction()?;
        tx.batch_execute(sql)?;
        tx.commit()?;
        Ok(())
    }

    /// The cluster pulls the data itself; the command only has to be sent.
    fn bulk_load(&mut self, copy: &CopyCommand) -> Result<()> {
        self.execute_sql(&copy.to_sql())
    }

    fn table_columns(&mut self, table: &str) -> Result<Vec<String>> {
        let rows = self.client.query(
            "SELECT column_name::text FROM information_schema.columns \
             WHERE table_schema = current_schema() AND table_name = $1 \
             ORDER BY ordinal_position",
            &[&table],
        )?;
        let columns = rows
            .iter()
            .map(|row| row.try_get::<_, String>(0))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(columns)
    }

    fn row_count(&mut self, table: &str) -> Result<u64> {
        let sql = format!("SELECT COUNT(*) FROM {}", table);
        let row = self.client.query_one(sql.as_str(), &[])?;
        let count: i64 = row.try_get(0)?;
        Ok(count as u64)
    }

    fn close(self: Box<Self>) -> Result<()> {
        self.client.close()?;
        Ok(())
    }
}
