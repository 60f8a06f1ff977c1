use std::io::{self, BufRead, Write};
use std::path::Path;

use anyhow::{Context, Result};
use consultflow_core::ingest::DocumentSource;
use consultflow_core::pipeline::{CommandOutcome, PipelineCommand};
use consultflow_core::{AppConfig, ConsultError, PipelineController};
use tracing::info;

use crate::cli::Cli;

mod parse;
mod support;


use self::parse::{HELP, ReplCommand, parse_line};
use self::support::{
    print_candidate, print_commit, print_error_payload, print_history, print_status, write_export,
};

pub(crate) fn run(cli: &Cli) -> Result<()> {
    let config = AppConfig::from_env();
    info!(
        model = %config.generation.model,
        search = config.research.search_endpoint.is_some(),
        "configuration loaded"
    );
    let mut controller =
        PipelineController::from_config(&config).context("failed to initialize pipeline")?;
    preload_documents(&mut controller, cli)?;

    let stdin = io::stdin();
    let stdout = io::stdout();
    run_session(&mut controller, stdin.lock(), stdout.lock())
}

fn preload_documents(controller: &mut PipelineController, cli: &Cli) -> Result<()> {
    if let Some(path) = &cli.internal {
        controller.load_internal(&read_source(path)?);
    }
    if let Some(path) = &cli.external {
        controller.load_external(&read_source(path)?);
    }
    Ok(())
}

fn read_source(path: &Path) -> Result<DocumentSource> {
    DocumentSource::from_path(path).with_context(|| format!("failed to read {}", path.display()))
}

/// Reads one command per line until `quit` or end of input.
pub(crate) fn run_session<R: BufRead, W: Write>(
    controller: &mut PipelineController,
    input: R,
    mut output: W,
) -> Result<()> {
    writeln!(
        output,
        "consultflow session {} (type `help` for commands)",
        controller.state().session_id()
    )?;
    for line in input.lines() {
        let line = line?;
        let command = match parse_line(&line) {
            Ok(ReplCommand::Quit) => break,
            Ok(command) => command,
            Err(err) => {
                writeln!(output, "error: {err}")?;
                continue;
            }
        };
        let operation = command.operation();
        if let Err(err) = execute(controller, command, &mut output) {
            print_error_payload(&mut output, &err, operation)?;
        }
    }
    Ok(())
}

// Stage failures come back as `ConsultError`; only output failures abort the loop.
fn execute<W: Write>(
    controller: &mut PipelineController,
    command: ReplCommand,
    output: &mut W,
) -> std::result::Result<(), ConsultError> {
    match command {
        ReplCommand::Empty | ReplCommand::Quit => {}
        ReplCommand::Help => writeln!(output, "{HELP}")?,
        ReplCommand::Status => print_status(output, controller)?,
        ReplCommand::History(limit) => print_history(output, &controller.recent_audit(limit))?,
        ReplCommand::Export(path) => {
            let export = controller.export_slides()?;
            let written = write_export(&export, path.as_deref())?;
            writeln!(output, "wrote {}", written.display())?;
        }
        ReplCommand::SearchSuggested => {
            let queries = controller
                .state()
                .query_candidates()
                .map(<[String]>::to_vec)
                .unwrap_or_default();
            let outcome = controller.apply(PipelineCommand::ExecuteSearch(queries))?;
            print_outcome(output, controller, &outcome)?;
        }
        ReplCommand::Pipeline(command) => {
            let outcome = controller.apply(command)?;
            print_outcome(output, controller, &outcome)?;
        }
    }
    Ok(())
}

fn print_outcome<W: Write>(
    output: &mut W,
    controller: &PipelineController,
    outcome: &CommandOutcome,
) -> io::Result<()> {
    match outcome {
        CommandOutcome::InputUpdated { revision } => {
            writeln!(output, "input updated (revision {revision})")
        }
        CommandOutcome::Committed(commit) => print_commit(output, controller.state(), commit),
        CommandOutcome::Unchanged => writeln!(output, "no change"),
        CommandOutcome::CandidateProposed(candidate) => print_candidate(output, candidate),
        CommandOutcome::CandidateDiscarded => writeln!(output, "kept current value"),
    }
}
