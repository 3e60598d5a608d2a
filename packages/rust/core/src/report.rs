//! Human-readable verdict text and the machine-readable run summary.
//!
//! Successes and expected placeholders go to the "out" stream, failures to
//! the "err" stream. Every notebook's path is echoed to "out" first, so it
//! appears there whatever the outcome. No timestamps: reruns print the same
//! bytes.

use std::io::{self, Write};
use std::path::{Path, PathBuf};

use serde::Serialize;

use nbcheck_shared::{NbcheckError, Result};

use crate::validate::{Finding, ValidationReport};

/// Write the verdict for one validated notebook.
pub fn render_report(
    report: &ValidationReport,
    out: &mut dyn Write,
    err: &mut dyn Write,
) -> io::Result<()> {
    let path = report.path.display();
    writeln!(out, "Checking {path}")?;

    for finding in &report.findings {
        match finding {
            Finding::PlaceholderError { cell, ename, .. } => {
                writeln!(out, "{path}: cell {cell} raised {ename} (expected placeholder)")?;
            }
            Finding::UnexpectedError {
                cell,
                ename,
                evalue,
            } => {
                writeln!(err, "{path}: cell {cell} raised {ename}: {evalue}")?;
            }
            Finding::OrderingViolation { execution_counts } => {
                writeln!(
                    err,
                    "{path} was not sequentially executed (execution counts: {execution_counts:?})"
                )?;
            }
            Finding::IncompleteExecution { cells } => {
                let cells = cells
                    .iter()
                    .map(ToString::to_string)
                    .collect::<Vec<_>>()
                    .join(", ");
                writeln!(err, "{path} has unexecuted code cell(s): {cells}")?;
            }
        }
    }

    if report.passed() {
        writeln!(out, "{path} passed")?;
    }
    Ok(())
}

/// Write the verdict for a notebook that could not be loaded or executed.
pub fn render_failure(
    path: &Path,
    error: &NbcheckError,
    out: &mut dyn Write,
    err: &mut dyn Write,
) -> io::Result<()> {
    writeln!(out, "Checking {}", path.display())?;
    writeln!(err, "{}: {error}", path.display())
}

// ---------------------------------------------------------------------------
// RunSummary
// ---------------------------------------------------------------------------

/// What happened to one notebook in a run.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum NotebookOutcome {
    Checked(ValidationReport),
    Failed { path: PathBuf, error: String },
}

impl NotebookOutcome {
    pub fn passed(&self) -> bool {
        match self {
            Self::Checked(report) => report.passed(),
            Self::Failed { .. } => false,
        }
    }

    pub fn path(&self) -> &Path {
        match self {
            Self::Checked(report) => &report.path,
            Self::Failed { path, .. } => path,
        }
    }
}

/// All outcomes of one `validate` invocation, in processing order.
#[derive(Debug, Clone, Default, Serialize)]
pub struct RunSummary {
    pub outcomes: Vec<NotebookOutcome>,
}

impl RunSummary {
    pub fn passed(&self) -> bool {
        self.outcomes.iter().all(NotebookOutcome::passed)
    }

    pub fn failed_count(&self) -> usize {
        self.outcomes.iter().filter(|o| !o.passed()).count()
    }

    /// Serialize to pretty JSON at `path`.
    pub fn write_json(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self)
            .map_err(|e| NbcheckError::validation(format!("cannot serialize report: {e}")))?;
        std::fs::write(path, json).map_err(|e| NbcheckError::io(path, e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::validate::CheckMode;

    fn report(findings: Vec<Finding>) -> ValidationReport {
        ValidationReport {
            path: PathBuf::from("tutorials/nb.ipynb"),
            mode: CheckMode::CheckOnly,
            findings,
            execution_counts: vec![1, 2],
        }
    }

    fn render(report: &ValidationReport) -> (String, String) {
        let (mut out, mut err) = (Vec::new(), Vec::new());
        render_report(report, &mut out, &mut err).expect("render");
        (
            String::from_utf8(out).expect("utf8"),
            String::from_utf8(err).expect("utf8"),
        )
    }

    #[test]
    fn passing_report_goes_to_stdout() {
        let (out, err) = render(&report(vec![]));
        assert_eq!(out, "Checking tutorials/nb.ipynb\ntutorials/nb.ipynb passed\n");
        assert!(err.is_empty());
    }

    #[test]
    fn placeholder_is_reported_on_stdout() {
        let (out, err) = render(&report(vec![Finding::PlaceholderError {
            cell: 4,
            ename: "NotImplementedError".into(),
            evalue: "exercise".into(),
        }]));
        assert!(out.contains("cell 4 raised NotImplementedError (expected placeholder)"));
        assert!(out.contains("passed"));
        assert!(err.is_empty());
    }

    #[test]
    fn failures_go_to_stderr_with_path() {
        let (out, err) = render(&report(vec![
            Finding::UnexpectedError {
                cell: 1,
                ename: "NameError".into(),
                evalue: "name 'x' is not defined".into(),
            },
            Finding::OrderingViolation {
                execution_counts: vec![2, 1],
            },
            Finding::IncompleteExecution { cells: vec![3, 5] },
        ]));

        assert_eq!(out, "Checking tutorials/nb.ipynb\n");
        assert!(err.contains("tutorials/nb.ipynb: cell 1 raised NameError: name 'x' is not defined"));
        assert!(err.contains("tutorials/nb.ipynb was not sequentially executed (execution counts: [2, 1])"));
        assert!(err.contains("tutorials/nb.ipynb has unexecuted code cell(s): 3, 5"));
    }

    #[test]
    fn load_failure_is_rendered() {
        let (mut out, mut err) = (Vec::new(), Vec::new());
        let error = NbcheckError::parse("bad.ipynb", "expected value");
        render_failure(Path::new("bad.ipynb"), &error, &mut out, &mut err).expect("render");
        assert_eq!(String::from_utf8(out).unwrap(), "Checking bad.ipynb\n");
        assert!(String::from_utf8(err).unwrap().starts_with("bad.ipynb: parse error"));
    }

    #[test]
    fn summary_json() {
        let summary = RunSummary {
            outcomes: vec![
                NotebookOutcome::Checked(report(vec![])),
                NotebookOutcome::Failed {
                    path: "missing.ipynb".into(),
                    error: "I/O error".into(),
                },
            ],
        };
        assert!(!summary.passed());
        assert_eq!(summary.failed_count(), 1);

        let dir = tempfile::tempdir().expect("tempdir");
        let file = dir.path().join("report.json");
        summary.write_json(&file).expect("write");

        let value: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&file).unwrap()).unwrap();
        assert_eq!(value["outcomes"][0]["outcome"], "checked");
        assert_eq!(value["outcomes"][0]["mode"], "check-only");
        assert_eq!(value["outcomes"][1]["outcome"], "failed");
    }
}
