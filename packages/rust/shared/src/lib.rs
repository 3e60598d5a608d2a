//! Shared types, error model, and configuration for nbcheck.
//!
//! This crate is the foundation depended on by the other nbcheck crates.
//! It provides:
//! - [`NbcheckError`]: the unified error type
//! - The notebook model ([`Notebook`], [`Cell`], [`Output`])
//! - Configuration ([`AppConfig`], config loading)

pub mod config;
pub mod error;
pub mod notebook;

// Re-export public API at crate root for ergonomic imports.
pub use config::{
    AppConfig, ChecksConfig, DiscoveryConfig, ExecuteConfig, config_dir, config_file_path,
    init_config, load_config, load_config_from, validate_config,
};
pub use error::{NbcheckError, Result};
pub use notebook::{Cell, MultilineText, Notebook, Output, SUPPORTED_NBFORMAT};
