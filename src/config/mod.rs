mod file_config;

pub use file_config::{
    ClusterConfig, FileConfig, IamRoleConfig, LocalConfig, PortValue, S3Config,
};

use crate::warehouse::Dialect;
use anyhow::{anyhow, bail, Result};
use std::path::PathBuf;

/// CLI arguments that take part in config resolution.
/// TOML values override these where present.
#[derive(Debug, Clone, Default)]
pub struct CliConfig {
    pub backend: Option<Dialect>,
    pub sqlite_db: Option<PathBuf>,
}

/// Fully resolved configuration handed to a job.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub backend: BackendSettings,
    /// Bulk-load sources, only needed by the load job.
    pub storage: Option<StorageSettings>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BackendSettings {
    Redshift(ClusterSettings),
    Sqlite { database: PathBuf },
}

#[derive(Clone, PartialEq, Eq)]
pub struct ClusterSettings {
    pub host: String,
    pub db_name: String,
    pub db_user: String,
    pub db_password: String,
    pub db_port: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorageSettings {
    pub log_data: String,
    pub log_jsonpath: String,
    pub song_data: String,
    pub region: Option<String>,
    pub iam_role_arn: Option<String>,
}

impl BackendSettings {
    pub fn dialect(&self) -> Dialect {
        match self {
            BackendSettings::Redshift(_) => Dialect::Redshift,
            BackendSettings::Sqlite { .. } => Dialect::Sqlite,
        }
    }
}

/// Quotes a libpq keyword value so spaces and quotes survive parsing.
fn quote_conn_value(value: &str) -> String {
    if !value.is_empty()
        && !value
            .chars()
            .any(|c| c.is_whitespace() || c == '\'' || c == '\\')
    {
        return value.to_string();
    }
    let escaped = value.replace('\\', "\\\\").replace('\'', "\\'");
    format!("'{}'", escaped)
}

impl ClusterSettings {
    /// `host=… dbname=… user=… password=… port=…` connection string.
    pub fn connection_string(&self) -> String {
        format!(
            "host={} dbname={} user={} password={} port={}",
            quote_conn_value(&self.host),
            quote_conn_value(&self.db_name),
            quote_conn_value(&self.db_user),
            quote_conn_value(&self.db_password),
            quote_conn_value(&self.db_port),
        )
    }

    /// Same as [`Self::connection_string`] with the password masked, for logs.
    pub fn redacted_connection_string(&self) -> String {
        format!(
            "host={} dbname={} user={} password=*** port={}",
            quote_conn_value(&self.host),
            quote_conn_value(&self.db_name),
            quote_conn_value(&self.db_user),
            quote_conn_value(&self.db_port),
        )
    }
}

impl std::fmt::Debug for ClusterSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClusterSettings")
            .field("host", &self.host)
            .field("db_name", &self.db_name)
            .field("db_user", &self.db_user)
            .field("db_password", &"***")
            .field("db_port", &self.db_port)
            .finish()
    }
}

fn required<T>(value: Option<T>, key: &str) -> Result<T> {
    value.ok_or_else(|| anyhow!("{} must be specified in the config file", key))
}

impl AppConfig {
    /// Resolve configuration from CLI arguments and optional TOML file config.
    /// TOML values override CLI values where present.
    pub fn resolve(cli: &CliConfig, file_config: Option<FileConfig>) -> Result<Self> {
        let file = file_config.unwrap_or_default();

        let dialect = file.backend.or(cli.backend).unwrap_or_default();

        let backend = match dialect {
            Dialect::Redshift => {
                let cluster = file.cluster.unwrap_or_default();
                BackendSettings::Redshift(ClusterSettings {
                    host: required(cluster.host, "CLUSTER.HOST")?,
                    db_name: required(cluster.db_name, "CLUSTER.DB_NAME")?,
                    db_user: required(cluster.db_user, "CLUSTER.DB_USER")?,
                    db_password: required(cluster.db_password, "CLUSTER.DB_PASSWORD")?,
                    db_port: required(cluster.db_port, "CLUSTER.DB_PORT")?.to_string(),
                })
            }
            Dialect::Sqlite => {
                let database = file
                    .local
                    .and_then(|local| local.database)
                    .map(PathBuf::from)
                    .or_else(|| cli.sqlite_db.clone())
                    .ok_or_else(|| {
                        anyhow!(
                            "sqlite backend requires LOCAL.DATABASE in the config file or --sqlite-db"
                        )
                    })?;
                if database.is_dir() {
                    bail!("sqlite database path is a directory: {:?}", database);
                }
                BackendSettings::Sqlite { database }
            }
        };

        let iam_role_arn = file.iam_role.and_then(|role| role.arn);
        let storage = match file.s3 {
            Some(s3) => Some(StorageSettings {
                log_data: required(s3.log_data, "S3.LOG_DATA")?,
                log_jsonpath: required(s3.log_jsonpath, "S3.LOG_JSONPATH")?,
                song_data: required(s3.song_data, "S3.SONG_DATA")?,
                region: s3.region,
                iam_role_arn,
            }),
            None => None,
        };

        Ok(Self { backend, storage })
    }

    pub fn dialect(&self) -> Dialect {
        self.backend.dialect()
    }

    /// Storage settings for the load job; fails if the S3 section is missing
    /// or if the backend needs a role the config does not provide.
    pub fn storage(&self) -> Result<&StorageSettings> {
        let storage = self
            .storage
            .as_ref()
            .ok_or_else(|| anyhow!("S3 section must be specified in the config file"))?;
        if self.dialect() == Dialect::Redshift && storage.iam_role_arn.is_none() {
            bail!("IAM_ROLE.ARN must be specified in the config file");
        }
        Ok(storage)
    }
}
