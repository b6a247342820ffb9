//! Model Validator - Main Entry Point
//!
//! Evaluates a binary classifier from the command line and exits with the
//! verdict's exit code.

use clap::Parser;
use model_validator::cli::{run, Cli};

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let code = run(cli)?;
    std::process::exit(code);
}
