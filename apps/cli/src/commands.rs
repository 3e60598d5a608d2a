//! CLI command definitions, routing, and tracing setup.

use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use color_eyre::eyre::Result;
use nbcheck_core::pipeline::{CheckRunConfig, NotebookReporter, check_notebooks};
use nbcheck_core::report::{render_failure, render_report};
use nbcheck_core::validate::{CheckMode, ValidationReport};
use nbcheck_shared::{AppConfig, NbcheckError, init_config, load_config, load_config_from};
use tracing::{info, warn};

// ---------------------------------------------------------------------------
// CLI structure
// ---------------------------------------------------------------------------

/// nbcheck: verify that notebooks were executed in order without errors.
#[derive(Parser)]
#[command(
    name = "nbcheck",
    version,
    about = "Verify that Jupyter notebooks were executed in order without unexpected errors.",
    long_about = None,
)]
pub(crate) struct Cli {
    /// Log format: text (default) or json.
    #[arg(long, default_value = "text", global = true)]
    pub log_format: LogFormat,

    /// Verbosity level (-v, -vv, -vvv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Config file (defaults to ~/.nbcheck/nbcheck.toml).
    #[arg(long, env = "NBCHECK_CONFIG", global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

/// Log output format.
#[derive(Clone, Debug, clap::ValueEnum)]
pub(crate) enum LogFormat {
    Text,
    Json,
}

/// Top-level CLI subcommands.
#[derive(Subcommand)]
pub(crate) enum Command {
    /// Validate notebook files or directories of notebooks.
    Validate {
        /// Notebook files or directories to scan.
        #[arg(required = true)]
        paths: Vec<PathBuf>,

        /// Check for errors and execution order only (default).
        #[arg(long, conflicts_with = "check_execution")]
        check_only: bool,

        /// Also require every code cell to have been executed.
        #[arg(long)]
        check_execution: bool,

        /// Run each notebook with the configured kernel command first.
        #[arg(long, conflicts_with = "check_only")]
        execute: bool,

        /// Write a JSON summary of the run to this file.
        #[arg(long)]
        report: Option<PathBuf>,
    },

    /// Configuration management.
    Config {
        /// Config subcommand.
        #[command(subcommand)]
        action: ConfigAction,
    },
}

/// Config subcommands.
#[derive(Subcommand)]
pub(crate) enum ConfigAction {
    /// Initialize config file with defaults.
    Init,
    /// Show resolved configuration.
    Show,
}

// ---------------------------------------------------------------------------
// Tracing setup
// ---------------------------------------------------------------------------

/// Initialize tracing based on CLI flags. Logs go to stderr; stdout carries
/// only verdicts.
pub(crate) fn init_tracing(cli: &Cli) {
    use tracing_subscriber::{EnvFilter, fmt};

    let filter = match cli.verbose {
        0 => "nbcheck=warn",
        1 => "nbcheck=info",
        2 => "nbcheck=debug",
        _ => "nbcheck=trace",
    };

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(filter));

    match cli.log_format {
        LogFormat::Text => {
            fmt()
                .with_env_filter(env_filter)
                .with_writer(std::io::stderr)
                .with_target(false)
                .init();
        }
        LogFormat::Json => {
            fmt()
                .json()
                .with_env_filter(env_filter)
                .with_writer(std::io::stderr)
                .init();
        }
    }
}

// ---------------------------------------------------------------------------
// Command dispatch
// ---------------------------------------------------------------------------

/// Run the CLI command.
pub(crate) async fn run(cli: Cli) -> Result<ExitCode> {
    let config_path = cli.config;
    match cli.command {
        Command::Validate {
            paths,
            check_only: _,
            check_execution,
            execute,
            report,
        } => {
            let mode = if check_execution {
                CheckMode::CheckExecution
            } else {
                CheckMode::CheckOnly
            };
            cmd_validate(paths, mode, execute, report.as_deref(), config_path.as_deref()).await
        }
        Command::Config { action } => match action {
            ConfigAction::Init => cmd_config_init().await,
            ConfigAction::Show => cmd_config_show(config_path.as_deref()).await,
        },
    }
}

fn resolve_config(path: Option<&Path>) -> Result<AppConfig> {
    let config = match path {
        Some(p) => load_config_from(p)?,
        None => load_config()?,
    };
    Ok(config)
}

// ---------------------------------------------------------------------------
// Command handlers
// ---------------------------------------------------------------------------

async fn cmd_validate(
    paths: Vec<PathBuf>,
    mode: CheckMode,
    execute: bool,
    report_path: Option<&Path>,
    config_path: Option<&Path>,
) -> Result<ExitCode> {
    let config = resolve_config(config_path)?;
    let run_config = CheckRunConfig::from_app_config(paths, mode, execute, &config)?;

    info!(
        inputs = run_config.inputs.len(),
        mode = ?run_config.validate.mode,
        execute,
        "validating notebooks"
    );

    let summary = check_notebooks(&run_config, &CliReporter).await?;

    if let Some(path) = report_path {
        summary.write_json(path)?;
        info!(path = %path.display(), "wrote JSON report");
    }

    let total = summary.outcomes.len();
    let failed = summary.failed_count();
    if total > 1 && failed > 0 {
        eprintln!("{failed} of {total} notebook(s) failed");
    }

    Ok(if summary.passed() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}

async fn cmd_config_init() -> Result<ExitCode> {
    let path = init_config()?;
    println!("Config initialized at: {}", path.display());
    Ok(ExitCode::SUCCESS)
}

async fn cmd_config_show(config_path: Option<&Path>) -> Result<ExitCode> {
    let config = resolve_config(config_path)?;
    let toml_str = toml::to_string_pretty(&config)?;
    println!("{toml_str}");
    Ok(ExitCode::SUCCESS)
}

// ---------------------------------------------------------------------------
// CLI reporter
// ---------------------------------------------------------------------------

/// Writes verdicts to stdout/stderr as each notebook finishes.
struct CliReporter;

impl CliReporter {
    fn flush(out: &mut dyn Write, err: &mut dyn Write) {
        if let Err(e) = out.flush().and_then(|_| err.flush()) {
            warn!(error = %e, "failed to flush verdict output");
        }
    }
}

impl NotebookReporter for CliReporter {
    fn checked(&self, report: &ValidationReport) {
        let (mut out, mut err) = (std::io::stdout().lock(), std::io::stderr().lock());
        if let Err(e) = render_report(report, &mut out, &mut err) {
            warn!(error = %e, "failed to write verdict");
        }
        Self::flush(&mut out, &mut err);
    }

    fn failed(&self, path: &Path, error: &NbcheckError) {
        let (mut out, mut err) = (std::io::stdout().lock(), std::io::stderr().lock());
        if let Err(e) = render_failure(path, error, &mut out, &mut err) {
            warn!(error = %e, "failed to write verdict");
        }
        Self::flush(&mut out, &mut err);
    }
}
