//! Command-line entry point shared by both job binaries.

use crate::config::{AppConfig, CliConfig, FileConfig};
use crate::pipeline::{run_job, JobError, JobKind};
use crate::warehouse::Dialect;
use anyhow::{Context, Result};
use clap::Parser;
use std::path::{Path, PathBuf};
use tracing::{info, level_filters::LevelFilter};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Config file read when `--config` is not given. Unlike an explicit path, it
/// may be missing.
pub const DEFAULT_CONFIG_FILE: &str = "dwh.toml";

/// Resolves `s` to an absolute path. Paths that do not exist yet are joined
/// onto the working directory instead of canonicalized.
fn parse_path(s: &str) -> Result<PathBuf> {
    let path = PathBuf::from(s);
    match path.canonicalize() {
        Ok(resolved) => Ok(resolved),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            if path.is_absolute() {
                Ok(path)
            } else {
                Ok(std::env::current_dir()?.join(path))
            }
        }
        Err(e) => Err(e).with_context(|| format!("Error resolving path: {}", s)),
    }
}

#[derive(Parser, Debug)]
#[command(about = "Runs one warehouse job")]
pub struct JobArgs {
    /// Path to the TOML config file. Defaults to ./dwh.toml.
    #[clap(short, long, value_parser = parse_path)]
    pub config: Option<PathBuf>,

    /// Warehouse backend. The config file's `backend` key takes precedence.
    #[clap(long)]
    pub backend: Option<Dialect>,

    /// SQLite database file, used when the backend is sqlite and the config
    /// file has no [LOCAL] DATABASE.
    #[clap(long, value_parser = parse_path)]
    pub sqlite_db: Option<PathBuf>,

    /// Print the statements the job would run and exit without connecting.
    #[clap(long)]
    pub dry_run: bool,
}

impl JobArgs {
    /// Loads the config file named on the command line, or the default one if
    /// it exists.
    pub fn load_file_config(&self) -> Result<Option<FileConfig>> {
        match &self.config {
            Some(path) => FileConfig::load(path).map(Some),
            None => {
                let default_path = Path::new(DEFAULT_CONFIG_FILE);
                if default_path.exists() {
                    FileConfig::load(default_path).map(Some)
                } else {
                    Ok(None)
                }
            }
        }
    }

    pub fn resolve_config(&self) -> Result<AppConfig> {
        let cli_config = CliConfig {
            backend: self.backend,
            sqlite_db: self.sqlite_db.clone(),
        };
        AppConfig::resolve(&cli_config, self.load_file_config()?)
    }
}

/// Installs the global tracing subscriber. The filter is read from `LOG_LEVEL`
/// and defaults to `info`.
pub fn init_tracing() -> Result<()> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(
            EnvFilter::builder()
                .with_default_directive(LevelFilter::INFO.into())
                .with_env_var("LOG_LEVEL")
                .from_env_lossy(),
        )
        .try_init()
        .context("Failed to initialize logging")
}

/// Parses the command line and runs `job`.
pub fn run(job: JobKind) -> Result<()> {
    let args = JobArgs::parse();
    init_tracing()?;
    run_with_args(job, &args)
}

pub fn run_with_args(job: JobKind, args: &JobArgs) -> Result<()> {
    let config = args.resolve_config().map_err(JobError::Config)?;
    info!("Job '{}' using the {} backend", job.name(), config.dialect());

    if args.dry_run {
        let pipeline = job.pipeline(&config)?;
        println!("{}", pipeline.render());
        return Ok(());
    }

    run_job(job, &config)?;
    Ok(())
}
