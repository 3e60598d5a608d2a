//! End-to-end `validate` run: paths → discovery → (execute) → validate → summary.

use std::path::{Path, PathBuf};
use std::time::Instant;

use tracing::{info, instrument, warn};

use nbcheck_shared::{AppConfig, NbcheckError, Notebook, Result};

use crate::discovery::{DiscoveryOptions, discover_notebooks};
use crate::execute::Executor;
use crate::report::{NotebookOutcome, RunSummary};
use crate::validate::{CheckMode, ValidateOptions, ValidationReport, validate};

/// Configuration for [`check_notebooks`].
#[derive(Debug, Clone)]
pub struct CheckRunConfig {
    /// Files or directories as given on the command line.
    pub inputs: Vec<PathBuf>,
    pub validate: ValidateOptions,
    pub discovery: DiscoveryOptions,
    /// Run each notebook through this executor before validating.
    pub executor: Option<Executor>,
}

impl CheckRunConfig {
    /// Build a run from loaded config. Executing implies [`CheckMode::CheckExecution`].
    pub fn from_app_config(
        inputs: Vec<PathBuf>,
        mode: CheckMode,
        execute: bool,
        config: &AppConfig,
    ) -> Result<Self> {
        let mode = if execute { CheckMode::CheckExecution } else { mode };
        Ok(Self {
            inputs,
            validate: ValidateOptions::from_config(mode, &config.checks),
            discovery: DiscoveryOptions::from_config(&config.discovery)?,
            executor: execute.then(|| Executor::from_config(&config.execute)),
        })
    }
}

/// Progress callback, called once per notebook as soon as its verdict is known.
pub trait NotebookReporter: Send + Sync {
    /// The notebook was loaded and validated.
    fn checked(&self, report: &ValidationReport);
    /// The notebook could not be read, parsed or executed.
    fn failed(&self, path: &Path, error: &NbcheckError);
}

/// No-op reporter for headless/test usage.
pub struct SilentReporter;

impl NotebookReporter for SilentReporter {
    fn checked(&self, _report: &ValidationReport) {}
    fn failed(&self, _path: &Path, _error: &NbcheckError) {}
}

/// Validate every notebook named by `config.inputs`.
///
/// Discovery problems abort the run. Per-notebook load or execution problems
/// become [`NotebookOutcome::Failed`] and the run continues.
#[instrument(skip_all, fields(inputs = config.inputs.len(), mode = ?config.validate.mode))]
pub async fn check_notebooks(
    config: &CheckRunConfig,
    reporter: &dyn NotebookReporter,
) -> Result<RunSummary> {
    let start = Instant::now();
    let paths = discover_notebooks(&config.inputs, &config.discovery)?;

    let mut summary = RunSummary::default();
    for path in paths {
        let outcome = match load(&path, config.executor.as_ref()).await {
            Ok(notebook) => {
                let report = validate(&notebook, &config.validate);
                reporter.checked(&report);
                NotebookOutcome::Checked(report)
            }
            Err(error) => {
                warn!(path = %path.display(), %error, "notebook could not be checked");
                reporter.failed(&path, &error);
                NotebookOutcome::Failed {
                    path,
                    error: error.to_string(),
                }
            }
        };
        summary.outcomes.push(outcome);
    }

    info!(
        notebooks = summary.outcomes.len(),
        failed = summary.failed_count(),
        elapsed = ?start.elapsed(),
        "validation run finished"
    );
    Ok(summary)
}

async fn load(path: &Path, executor: Option<&Executor>) -> Result<Notebook> {
    match executor {
        Some(executor) => executor.execute(path).await,
        None => Notebook::load(path),
    }
}
