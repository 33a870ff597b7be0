//! Ordered execution of named SQL steps.
//!
//! A [`Pipeline`] is a fixed list of [`Step`]s, each holding the statements
//! it runs. Steps and their statements execute strictly in list order, one
//! committed statement at a time, and the first failure stops the run.

mod job;

pub use job::{run_job, run_on, JobError, JobKind};

use crate::warehouse::Warehouse;
use std::time::{Duration, Instant};
use tracing::{debug, info};

/// Column mapping used when bulk-loading JSON documents.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JsonFormat {
    /// Object keys are matched to column names.
    Auto,
    /// A jsonpaths file lists one path expression per column, in column order.
    JsonPaths(String),
}

/// Bulk load of JSON documents from external storage into a staging table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CopyCommand {
    pub table: &'static str,
    pub columns: Vec<&'static str>,
    pub source: String,
    pub format: JsonFormat,
    pub iam_role: Option<String>,
    pub region: Option<String>,
}

impl CopyCommand {
    /// Renders the command as a Redshift `COPY` statement.
    pub fn to_sql(&self) -> String {
        let format = match &self.format {
            JsonFormat::Auto => "auto",
            JsonFormat::JsonPaths(path) => path.as_str(),
        };
        let mut sql = format!(
            "COPY {} ({})\nFROM '{}'\n",
            self.table,
            self.columns.join(", "),
            self.source
        );
        if let Some(iam_role) = &self.iam_role {
            sql.push_str(&format!("IAM_ROLE '{}'\n", iam_role));
        }
        sql.push_str(&format!("FORMAT AS JSON '{}'", format));
        if let Some(region) = &self.region {
            sql.push_str(&format!("\nREGION '{}'", region));
        }
        sql.push(';');
        sql
    }
}

/// One statement of a pipeline step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Statement {
    Sql(String),
    Copy(CopyCommand),
}

impl std::fmt::Display for Statement {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Statement::Sql(sql) => write!(f, "{}", sql),
            Statement::Copy(copy) => write!(f, "{}", copy.to_sql()),
        }
    }
}

/// A named group of statements, e.g. "drop users" or "load staging_events".
#[derive(Debug, Clone)]
pub struct Step {
    pub name: String,
    pub statements: Vec<Statement>,
}

impl Step {
    pub fn new(name: impl Into<String>, statements: Vec<Statement>) -> Self {
        Self {
            name: name.into(),
            statements,
        }
    }

    pub fn sql(name: impl Into<String>, sql: impl Into<String>) -> Self {
        Self::new(name, vec![Statement::Sql(sql.into())])
    }
}

/// Outcome of a successfully executed step.
#[derive(Debug, Clone)]
pub struct StepReport {
    pub name: String,
    pub statements: usize,
    pub elapsed: Duration,
}

#[derive(Debug, Clone)]
pub struct Pipeline {
    pub name: &'static str,
    pub steps: Vec<Step>,
}

impl Pipeline {
    pub fn new(name: &'static str, steps: Vec<Step>) -> Self {
        Self { name, steps }
    }

    pub fn statement_count(&self) -> usize {
        self.steps.iter().map(|s| s.statements.len()).sum()
    }

    /// Executes every statement in order against `warehouse`, stopping at the
    /// first error.
    pub fn run(&self, warehouse: &mut dyn Warehouse) -> Result<Vec<StepReport>, JobError> {
        info!(
            "Running pipeline '{}': {} steps, {} statements",
            self.name,
            self.steps.len(),
            self.statement_count()
        );
        let mut reports = Vec::with_capacity(self.steps.len());
        for step in &self.steps {
            let started = Instant::now();
            info!("Step '{}' started", step.name);
            let total = step.statements.len();
            for (index, statement) in step.statements.iter().enumerate() {
                debug!("Executing statement {}/{}:\n{}", index + 1, total, statement);
                warehouse
                    .execute(statement)
                    .map_err(|source| JobError::Statement {
                        step: step.name.clone(),
                        statement: index + 1,
                        total,
                        source,
                    })?;
            }
            let elapsed = started.elapsed();
            info!("Step '{}' finished in {:?}", step.name, elapsed);
            reports.push(StepReport {
                name: step.name.clone(),
                statements: total,
                elapsed,
            });
        }
        Ok(reports)
    }

    /// Human readable listing of the steps and their rendered statements.
    pub fn render(&self) -> String {
        let mut out = format!("-- pipeline: {}\n", self.name);
        for step in &self.steps {
            out.push_str(&format!("\n-- step: {}\n", step.name));
            for statement in &step.statements {
                out.push_str(&statement.to_string());
                out.push('\n');
            }
        }
        out
    }
}
