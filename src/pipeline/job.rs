use super::{Pipeline, StepReport};
use crate::config::AppConfig;
use crate::queries;
use crate::schema::{self, ALL_TABLES};
use crate::warehouse::{self, Warehouse};
use thiserror::Error;
use tracing::{error, info, warn};

/// Errors that stop a job, by the stage that raised them.
#[derive(Debug, Error)]
pub enum JobError {
    #[error("Configuration error: {0}")]
    Config(#[source] anyhow::Error),

    #[error("Unable to connect to the warehouse: {0}")]
    Connection(#[source] anyhow::Error),

    #[error("Step '{step}' failed at statement {statement} of {total}: {source}")]
    Statement {
        step: String,
        statement: usize,
        total: usize,
        #[source]
        source: anyhow::Error,
    },

    #[error("Schema verification failed: {0}")]
    Verification(#[source] anyhow::Error),
}

/// The two batch jobs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobKind {
    /// Drop and recreate every table.
    InitializeSchema,
    /// Bulk-load staging, then fill the star schema from it.
    Load,
}

impl JobKind {
    pub fn name(&self) -> &'static str {
        match self {
            JobKind::InitializeSchema => "initialize-schema",
            JobKind::Load => "run-load",
        }
    }

    /// Builds the job's statements for the configured warehouse.
    pub fn pipeline(&self, config: &AppConfig) -> Result<Pipeline, JobError> {
        match self {
            JobKind::InitializeSchema => Ok(queries::initialize_schema_pipeline(config.dialect())),
            JobKind::Load => {
                let storage = config.storage().map_err(JobError::Config)?;
                Ok(queries::load_pipeline(config.dialect(), storage))
            }
        }
    }

    fn finish(&self, warehouse: &mut dyn Warehouse) -> Result<(), JobError> {
        match self {
            JobKind::InitializeSchema => {
                schema::verify(warehouse, &ALL_TABLES).map_err(JobError::Verification)
            }
            JobKind::Load => {
                for table in ALL_TABLES {
                    match warehouse.row_count(table.name) {
                        Ok(count) => info!("{}: {} rows", table.name, count),
                        Err(e) => warn!("Unable to count rows of {}: {}", table.name, e),
                    }
                }
                Ok(())
            }
        }
    }
}

/// Runs `job` on an already open warehouse, without closing it.
pub fn run_on(
    job: JobKind,
    config: &AppConfig,
    warehouse: &mut dyn Warehouse,
) -> Result<Vec<StepReport>, JobError> {
    let pipeline = job.pipeline(config)?;
    let reports = pipeline.run(warehouse)?;
    job.finish(warehouse)?;
    Ok(reports)
}

/// Connects to the configured warehouse, runs `job` to completion and closes
/// the connection. The first failing statement aborts the job; statements
/// already committed stay committed.
pub fn run_job(job: JobKind, config: &AppConfig) -> Result<Vec<StepReport>, JobError> {
    // Built before connecting so configuration problems never open a connection.
    job.pipeline(config)?;

    let mut warehouse = warehouse::connect(&config.backend).map_err(JobError::Connection)?;
    let result = run_on(job, config, warehouse.as_mut());

    if let Err(e) = warehouse.close() {
        error!("Error closing the warehouse connection: {}", e);
    }

    match &result {
        Ok(reports) => info!("Job '{}' completed: {} steps", job.name(), reports.len()),
        Err(e) => error!("Job '{}' failed: {}", job.name(), e),
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{BackendSettings, StorageSettings};
    use crate::pipeline::tests::RecordingWarehouse;
    use std::path::PathBuf;

    fn sqlite_config(storage: Option<StorageSettings>) -> AppConfig {
        AppConfig {
            backend: BackendSettings::Sqlite {
                database: PathBuf::from("unused.db"),
            },
            storage,
        }
    }

    #[test]
    fn test_load_without_storage_is_config_error() {
        let result = JobKind::Load.pipeline(&sqlite_config(None));
        assert!(matches!(result, Err(JobError::Config(_))));
    }

    #[test]
    fn test_initialize_schema_verification_failure() {
        // The recording warehouse reports no columns for any table.
        let mut warehouse = RecordingWarehouse::new();
        let result = run_on(
            JobKind::InitializeSchema,
            &sqlite_config(None),
            &mut warehouse,
        );
        assert!(matches!(result, Err(JobError::Verification(_))));
        assert_eq!(warehouse.executed.len(), 14);
    }

    #[test]
    fn test_load_runs_every_statement() {
        let storage = StorageSettings {
            log_data: "log_data".to_string(),
            log_jsonpath: "log_json_path.json".to_string(),
            song_data: "song_data".to_string(),
            region: None,
            iam_role_arn: None,
        };
        let mut warehouse = RecordingWarehouse::new();

        let reports = run_on(JobKind::Load, &sqlite_config(Some(storage)), &mut warehouse).unwrap();

        assert_eq!(reports.len(), 7);
        assert_eq!(warehouse.executed.len(), 9);
        assert_eq!(warehouse.executed[0], "DELETE FROM staging_events;");
        assert!(warehouse.executed[8].starts_with("INSERT INTO songplays"));
    }

    #[test]
    fn test_job_names() {
        assert_eq!(JobKind::InitializeSchema.name(), "initialize-schema");
        assert_eq!(JobKind::Load.name(), "run-load");
    }
}
