//! Notebook validation for nbcheck.
//!
//! This crate ties together notebook discovery, optional kernel execution,
//! the execution-order validator, and verdict reporting.

pub mod discovery;
pub mod execute;
pub mod pipeline;
pub mod report;
pub mod validate;
