//! Notebook document model (nbformat v4) and loading.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{NbcheckError, Result};

/// The only nbformat major version we understand.
pub const SUPPORTED_NBFORMAT: u32 = 4;

// ---------------------------------------------------------------------------
// MultilineText
// ---------------------------------------------------------------------------

/// nbformat stores text either as one string or as a list of lines.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MultilineText {
    Single(String),
    Lines(Vec<String>),
}

impl Default for MultilineText {
    fn default() -> Self {
        Self::Single(String::new())
    }
}

impl MultilineText {
    /// Join into one string. Lines already carry their own `\n`.
    pub fn text(&self) -> String {
        match self {
            Self::Single(s) => s.clone(),
            Self::Lines(lines) => lines.concat(),
        }
    }

    /// True when there is nothing but whitespace.
    pub fn is_blank(&self) -> bool {
        match self {
            Self::Single(s) => s.trim().is_empty(),
            Self::Lines(lines) => lines.iter().all(|l| l.trim().is_empty()),
        }
    }
}

// ---------------------------------------------------------------------------
// Output
// ---------------------------------------------------------------------------

/// One output record of a code cell.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "output_type", rename_all = "snake_case")]
pub enum Output {
    Stream {
        #[serde(default)]
        name: String,
        #[serde(default)]
        text: MultilineText,
    },
    DisplayData {
        #[serde(default)]
        data: serde_json::Value,
    },
    ExecuteResult {
        #[serde(default)]
        execution_count: Option<u32>,
        #[serde(default)]
        data: serde_json::Value,
    },
    Error {
        ename: String,
        #[serde(default)]
        evalue: String,
        #[serde(default)]
        traceback: Vec<String>,
    },
    #[serde(other)]
    Unknown,
}

impl Output {
    /// `(kind, message)` when this output is an error record.
    pub fn as_error(&self) -> Option<(&str, &str)> {
        match self {
            Self::Error { ename, evalue, .. } => Some((ename, evalue)),
            _ => None,
        }
    }
}

// ---------------------------------------------------------------------------
// Cell
// ---------------------------------------------------------------------------

/// A notebook cell. Only code cells take part in validation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "cell_type", rename_all = "snake_case")]
pub enum Cell {
    Markdown {
        #[serde(default)]
        source: MultilineText,
    },
    Code {
        #[serde(default)]
        source: MultilineText,
        /// `None` means the cell was never run.
        #[serde(default)]
        execution_count: Option<u32>,
        #[serde(default)]
        outputs: Vec<Output>,
    },
    Raw {
        #[serde(default)]
        source: MultilineText,
    },
    #[serde(other)]
    Unknown,
}

impl Cell {
    /// Build a code cell; mostly for tests and fixtures.
    pub fn code(source: &str, execution_count: Option<u32>, outputs: Vec<Output>) -> Self {
        Self::Code {
            source: MultilineText::Single(source.into()),
            execution_count,
            outputs,
        }
    }

    /// Build a markdown cell.
    pub fn markdown(source: &str) -> Self {
        Self::Markdown {
            source: MultilineText::Single(source.into()),
        }
    }

    pub fn is_code(&self) -> bool {
        matches!(self, Self::Code { .. })
    }
}

// ---------------------------------------------------------------------------
// Notebook
// ---------------------------------------------------------------------------

/// A parsed notebook. `path` is where it was read from, not part of the JSON.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Notebook {
    #[serde(skip)]
    pub path: PathBuf,
    pub nbformat: u32,
    #[serde(default)]
    pub nbformat_minor: u32,
    #[serde(default)]
    pub cells: Vec<Cell>,
}

impl Notebook {
    /// Construct an in-memory v4 notebook.
    pub fn new(path: impl Into<PathBuf>, cells: Vec<Cell>) -> Self {
        Self {
            path: path.into(),
            nbformat: SUPPORTED_NBFORMAT,
            nbformat_minor: 5,
            cells,
        }
    }

    /// Read and parse the notebook at `path`.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| NbcheckError::io(path, e))?;
        Self::from_json(path, &content)
    }

    /// Parse notebook JSON, tagging the result with `path`.
    pub fn from_json(path: &Path, json: &str) -> Result<Self> {
        let mut notebook: Notebook =
            serde_json::from_str(json).map_err(|e| NbcheckError::parse(path, e.to_string()))?;

        if notebook.nbformat != SUPPORTED_NBFORMAT {
            return Err(NbcheckError::parse(
                path,
                format!(
                    "unsupported nbformat {} (expected {SUPPORTED_NBFORMAT})",
                    notebook.nbformat
                ),
            ));
        }

        notebook.path = path.to_path_buf();
        tracing::debug!(?path, cells = notebook.cells.len(), "notebook parsed");
        Ok(notebook)
    }

    /// Iterate code cells with their position in the full cell list.
    pub fn code_cells(&self) -> impl Iterator<Item = (usize, &Cell)> {
        self.cells.iter().enumerate().filter(|(_, c)| c.is_code())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r##"{
  "nbformat": 4,
  "nbformat_minor": 5,
  "metadata": {"kernelspec": {"name": "python3"}},
  "cells": [
    {"cell_type": "markdown", "metadata": {}, "source": ["# Tutorial 1\n", "Intro"]},
    {"cell_type": "code", "execution_count": 1, "metadata": {}, "source": "import numpy as np",
     "outputs": []},
    {"cell_type": "code", "execution_count": 2, "metadata": {}, "source": ["x = undefined\n"],
     "outputs": [
       {"output_type": "stream", "name": "stdout", "text": ["hello\n"]},
       {"output_type": "error", "ename": "NameError", "evalue": "name 'undefined' is not defined",
        "traceback": ["..."]}
     ]},
    {"cell_type": "code", "execution_count": null, "metadata": {}, "source": [], "outputs": []},
    {"cell_type": "raw", "metadata": {}, "source": "raw text"}
  ]
}"##;

    #[test]
    fn parses_v4_notebook() {
        let nb = Notebook::from_json(Path::new("t.ipynb"), SAMPLE).expect("parse");
        assert_eq!(nb.path, PathBuf::from("t.ipynb"));
        assert_eq!(nb.cells.len(), 5);
        assert_eq!(nb.code_cells().count(), 3);

        let Cell::Code {
            execution_count,
            outputs,
            ..
        } = &nb.cells[2]
        else {
            panic!("expected code cell");
        };
        assert_eq!(*execution_count, Some(2));
        assert_eq!(outputs.len(), 2);
        assert_eq!(
            outputs[1].as_error(),
            Some(("NameError", "name 'undefined' is not defined"))
        );
    }

    #[test]
    fn source_forms_are_equivalent() {
        let single: MultilineText = serde_json::from_str(r#""a = 1\nb = 2""#).unwrap();
        let lines: MultilineText = serde_json::from_str(r#"["a = 1\n", "b = 2"]"#).unwrap();
        assert_eq!(single.text(), lines.text());
        assert!(!single.is_blank());
        assert!(MultilineText::Lines(vec!["  \n".into(), "".into()]).is_blank());
    }

    #[test]
    fn missing_execution_count_means_unexecuted() {
        let json = r#"{"nbformat": 4, "cells": [{"cell_type": "code", "source": "1"}]}"#;
        let nb = Notebook::from_json(Path::new("m.ipynb"), json).expect("parse");
        assert!(matches!(
            nb.cells[0],
            Cell::Code {
                execution_count: None,
                ..
            }
        ));
    }

    #[test]
    fn unknown_output_type_is_tolerated() {
        let json = r#"{"nbformat": 4, "cells": [{"cell_type": "code", "source": "1",
            "execution_count": 1, "outputs": [{"output_type": "widget_state", "foo": 1}]}]}"#;
        let nb = Notebook::from_json(Path::new("w.ipynb"), json).expect("parse");
        let Cell::Code { outputs, .. } = &nb.cells[0] else {
            panic!("expected code cell");
        };
        assert_eq!(outputs[0], Output::Unknown);
    }

    #[test]
    fn rejects_nbformat_3() {
        let json = r#"{"nbformat": 3, "nbformat_minor": 0, "worksheets": []}"#;
        let err = Notebook::from_json(Path::new("old.ipynb"), json).unwrap_err();
        assert!(err.to_string().contains("unsupported nbformat 3"));
    }

    #[test]
    fn rejects_malformed_json() {
        let err = Notebook::from_json(Path::new("bad.ipynb"), "{not json").unwrap_err();
        assert!(matches!(err, NbcheckError::Parse { .. }));
    }
}
