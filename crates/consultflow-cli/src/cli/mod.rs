use std::path::PathBuf;

use clap::Parser;


#[derive(Debug, Parser)]
#[command(name = "consultflow")]
#[command(about = "Staged consulting workflow: summarize, research, propose, review, slides", version)]
pub struct Cli {
    /// Internal business data (csv, xls, xlsx, pdf or text).
    #[arg(long, value_name = "FILE")]
    pub internal: Option<PathBuf>,

    /// External reference document used when search is skipped.
    #[arg(long, value_name = "FILE")]
    pub external: Option<PathBuf>,

    /// Debug-level logging, including prompt dispatch.
    #[arg(long, short)]
    pub verbose: bool,
}
