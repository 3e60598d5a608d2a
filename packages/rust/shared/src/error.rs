//! Error types for nbcheck.
//!
//! Library crates use [`NbcheckError`] via `thiserror`.
//! The CLI wraps this with `color-eyre` for rich diagnostics.

use std::path::PathBuf;

/// Top-level error type for all nbcheck operations.
#[derive(Debug, thiserror::Error)]
pub enum NbcheckError {
    /// Configuration loading or validation error.
    #[error("config error: {message}")]
    Config { message: String },

    /// Filesystem I/O error.
    #[error("I/O error at {path:?}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Notebook JSON could not be decoded or has an unsupported format.
    #[error("parse error in {path:?}: {message}")]
    Parse { path: PathBuf, message: String },

    /// Invalid input (bad glob, empty directory, etc.).
    #[error("validation error: {message}")]
    Validation { message: String },

    /// The external kernel run failed, timed out, or could not be spawned.
    #[error("execution error: {0}")]
    Execution(String),
}

/// Convenience alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, NbcheckError>;

impl NbcheckError {
    /// Create a config error from any displayable message.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config {
            message: msg.into(),
        }
    }

    /// Create a parse error for the notebook at `path`.
    pub fn parse(path: impl Into<PathBuf>, msg: impl Into<String>) -> Self {
        Self::Parse {
            path: path.into(),
            message: msg.into(),
        }
    }

    /// Create a validation error from any displayable message.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation {
            message: msg.into(),
        }
    }

    /// Wrap a `std::io::Error` with a path for context.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}
