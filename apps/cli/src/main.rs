//! nbcheck CLI: notebook execution validator.
//!
//! Checks that course notebooks were run top to bottom and raised no
//! unexpected errors before they go into a book build.

mod commands;

use std::process::ExitCode;

use clap::Parser;
use color_eyre::eyre::Result;

use commands::Cli;

#[tokio::main]
async fn main() -> Result<ExitCode> {
    color_eyre::install()?;
    let cli = Cli::parse();
    commands::init_tracing(&cli);
    commands::run(cli).await
}
