//! Execution-order and error checks over a parsed notebook.
//!
//! A notebook passes when its non-blank code cells were run top to bottom
//! (execution counts exactly `1..=n`) and no output is an error other than a
//! configured placeholder kind such as `NotImplementedError`.

use std::path::PathBuf;

use serde::Serialize;
use tracing::{debug, instrument};

use nbcheck_shared::{Cell, ChecksConfig, Notebook};

/// How strict the check is.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum CheckMode {
    /// Errors and ordering of the cells that did run.
    #[default]
    CheckOnly,
    /// Additionally every non-blank code cell must have run.
    CheckExecution,
}

/// Inputs to [`validate`] besides the notebook itself.
#[derive(Debug, Clone)]
pub struct ValidateOptions {
    pub mode: CheckMode,
    /// Error kinds accepted as unfinished-exercise placeholders.
    pub placeholder_errors: Vec<String>,
}

impl ValidateOptions {
    pub fn new(mode: CheckMode) -> Self {
        Self::from_config(mode, &ChecksConfig::default())
    }

    pub fn from_config(mode: CheckMode, checks: &ChecksConfig) -> Self {
        Self {
            mode,
            placeholder_errors: checks.placeholder_errors.clone(),
        }
    }

    fn is_placeholder(&self, ename: &str) -> bool {
        self.placeholder_errors.iter().any(|p| p == ename)
    }
}

/// One observation about a notebook. Cell indices are 0-based positions in
/// the full cell list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Finding {
    /// Expected failure of an unfinished exercise. Not fatal.
    PlaceholderError {
        cell: usize,
        ename: String,
        evalue: String,
    },
    /// Any other error output.
    UnexpectedError {
        cell: usize,
        ename: String,
        evalue: String,
    },
    /// Execution counts are not exactly `1..=n` in cell order.
    OrderingViolation { execution_counts: Vec<u32> },
    /// Non-blank code cells without an execution count.
    IncompleteExecution { cells: Vec<usize> },
}

impl Finding {
    pub fn is_fatal(&self) -> bool {
        !matches!(self, Self::PlaceholderError { .. })
    }
}

/// Verdict for a single notebook.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidationReport {
    pub path: PathBuf,
    pub mode: CheckMode,
    pub findings: Vec<Finding>,
    /// Counts of the executed, non-blank code cells in document order.
    pub execution_counts: Vec<u32>,
}

impl ValidationReport {
    pub fn passed(&self) -> bool {
        !self.findings.iter().any(Finding::is_fatal)
    }

    pub fn fatal_findings(&self) -> impl Iterator<Item = &Finding> {
        self.findings.iter().filter(|f| f.is_fatal())
    }
}

/// Check `notebook` and collect every finding.
#[instrument(skip_all, fields(path = %notebook.path.display(), mode = ?options.mode))]
pub fn validate(notebook: &Notebook, options: &ValidateOptions) -> ValidationReport {
    let mut findings = Vec::new();
    let mut execution_counts = Vec::new();
    let mut unexecuted = Vec::new();

    for (index, cell) in notebook.code_cells() {
        let Cell::Code {
            source,
            execution_count,
            outputs,
        } = cell
        else {
            continue;
        };

        for (ename, evalue) in outputs.iter().filter_map(|o| o.as_error()) {
            let (cell, ename, evalue) = (index, ename.to_string(), evalue.to_string());
            if options.is_placeholder(&ename) {
                findings.push(Finding::PlaceholderError { cell, ename, evalue });
            } else {
                findings.push(Finding::UnexpectedError { cell, ename, evalue });
            }
        }

        // Jupyter never numbers a blank cell, so it says nothing about order.
        if source.is_blank() {
            continue;
        }
        match execution_count {
            Some(count) => execution_counts.push(*count),
            None => unexecuted.push(index),
        }
    }

    if !is_sequential(&execution_counts) {
        findings.push(Finding::OrderingViolation {
            execution_counts: execution_counts.clone(),
        });
    }

    if options.mode == CheckMode::CheckExecution && !unexecuted.is_empty() {
        findings.push(Finding::IncompleteExecution { cells: unexecuted });
    }

    debug!(
        findings = findings.len(),
        executed = execution_counts.len(),
        "notebook validated"
    );

    ValidationReport {
        path: notebook.path.clone(),
        mode: options.mode,
        findings,
        execution_counts,
    }
}

/// True when `counts` is exactly `1, 2, …, counts.len()`.
pub fn is_sequential(counts: &[u32]) -> bool {
    counts
        .iter()
        .zip(1u32..)
        .all(|(&count, expected)| count == expected)
}
