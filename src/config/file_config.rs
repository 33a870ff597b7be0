use crate::warehouse::Dialect;
use anyhow::{Context, Result};
use serde::Deserialize;
use std::fmt;
use std::path::Path;

/// Raw contents of the TOML config file. Every field is optional here;
/// required keys are checked during [`super::AppConfig::resolve`].
#[derive(Debug, Deserialize, Default)]
#[serde(default)]
pub struct FileConfig {
    #[serde(alias = "BACKEND")]
    pub backend: Option<Dialect>,

    #[serde(rename = "CLUSTER", alias = "cluster")]
    pub cluster: Option<ClusterConfig>,

    #[serde(rename = "S3", alias = "s3")]
    pub s3: Option<S3Config>,

    #[serde(rename = "IAM_ROLE", alias = "iam_role")]
    pub iam_role: Option<IamRoleConfig>,

    #[serde(rename = "LOCAL", alias = "local")]
    pub local: Option<LocalConfig>,
}

#[derive(Debug, Deserialize, Default, Clone)]
#[serde(default)]
pub struct ClusterConfig {
    #[serde(alias = "HOST")]
    pub host: Option<String>,
    #[serde(alias = "DB_NAME", alias = "dbname")]
    pub db_name: Option<String>,
    #[serde(alias = "DB_USER", alias = "user")]
    pub db_user: Option<String>,
    #[serde(alias = "DB_PASSWORD", alias = "password")]
    pub db_password: Option<String>,
    #[serde(alias = "DB_PORT", alias = "port")]
    pub db_port: Option<PortValue>,
}

#[derive(Debug, Deserialize, Default, Clone)]
#[serde(default)]
pub struct S3Config {
    #[serde(alias = "LOG_DATA")]
    pub log_data: Option<String>,
    #[serde(alias = "LOG_JSONPATH")]
    pub log_jsonpath: Option<String>,
    #[serde(alias = "SONG_DATA")]
    pub song_data: Option<String>,
    /// Region of the bucket, needed when it differs from the cluster's.
    #[serde(alias = "REGION")]
    pub region: Option<String>,
}

#[derive(Debug, Deserialize, Default, Clone)]
#[serde(default)]
pub struct IamRoleConfig {
    #[serde(alias = "ARN")]
    pub arn: Option<String>,
}

#[derive(Debug, Deserialize, Default, Clone)]
#[serde(default)]
pub struct LocalConfig {
    /// SQLite database file used by the sqlite backend.
    #[serde(alias = "DATABASE")]
    pub database: Option<String>,
}

/// Port as written in the file, either `5439` or `"5439"`.
#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
#[serde(untagged)]
pub enum PortValue {
    Number(u16),
    Text(String),
}

impl fmt::Display for PortValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PortValue::Number(n) => write!(f, "{}", n),
            PortValue::Text(s) => write!(f, "{}", s),
        }
    }
}

impl FileConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {:?}", path))?;
        Self::parse(&content).with_context(|| format!("Failed to parse config file: {:?}", path))
    }

    pub fn parse(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }
}
