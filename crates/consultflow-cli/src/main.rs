mod cli;
mod commands;

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use crate::cli::Cli;

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose)?;
    commands::run(&cli)
}

// Logs go to stderr so stdout carries only operator output.
fn init_tracing(verbose: bool) -> Result<()> {
    let default_level = if verbose { "debug" } else { "info" };
    let filter = if verbose {
        EnvFilter::new(default_level)
    } else {
        EnvFilter::try_from_default_env().or_else(|_| EnvFilter::try_new(default_level))?
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
    Ok(())
}
