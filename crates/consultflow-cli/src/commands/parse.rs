use std::path::PathBuf;

use anyhow::{Result, anyhow, bail};
use consultflow_core::PipelineCommand;
use consultflow_core::models::ProposalCategory;
use consultflow_core::pipeline::EditableArtifact;

pub(super) const DEFAULT_HISTORY_WINDOW: usize = 5;

#[derive(Debug, Clone, PartialEq, Eq)]
pub(super) enum ReplCommand {
    Empty,
    Status,
    Help,
    Quit,
    /// `search` without arguments runs every suggested query.
    SearchSuggested,
    History(usize),
    Export(Option<PathBuf>),
    Pipeline(PipelineCommand),
}

impl ReplCommand {
    pub(super) const fn operation(&self) -> &'static str {
        match self {
            Self::Empty => "empty",
            Self::Status => "status",
            Self::Help => "help",
            Self::Quit => "quit",
            Self::SearchSuggested => "execute_search",
            Self::History(_) => "history",
            Self::Export(_) => "export",
            Self::Pipeline(command) => pipeline_operation(command),
        }
    }
}

const fn pipeline_operation(command: &PipelineCommand) -> &'static str {
    match command {
        PipelineCommand::SetInternalText(_) => "set_internal_text",
        PipelineCommand::SetExternalText(_) => "set_external_text",
        PipelineCommand::LoadInternal(_) => "load_internal",
        PipelineCommand::LoadExternal(_) => "load_external",
        PipelineCommand::SelectCategory(_) => "select_category",
        PipelineCommand::SummarizeInternal => "summarize_internal",
        PipelineCommand::SuggestQueries => "suggest_queries",
        PipelineCommand::ExecuteSearch(_) => "execute_search",
        PipelineCommand::SkipSearch => "skip_search",
        PipelineCommand::ExtractIssues => "extract_issues",
        PipelineCommand::GenerateProposals => "generate_proposals",
        PipelineCommand::RegenerateProposals => "regenerate_proposals",
        PipelineCommand::Review { .. } => "review",
        PipelineCommand::RegenerateReview { .. } => "regenerate_review",
        PipelineCommand::RefineProposals => "refine_proposals",
        PipelineCommand::AdoptCandidate => "adopt_candidate",
        PipelineCommand::KeepCurrent => "keep_current",
        PipelineCommand::BuildSlides => "build_slides",
        PipelineCommand::Edit { .. } => "edit_output",
    }
}

pub(super) fn parse_line(line: &str) -> Result<ReplCommand> {
    let line = line.trim();
    let (word, rest) = line
        .split_once(char::is_whitespace)
        .map_or((line, ""), |(word, rest)| (word, rest.trim()));
    let rest = (!rest.is_empty()).then_some(rest);

    let command = match word.to_ascii_lowercase().as_str() {
        "" => ReplCommand::Empty,
        "status" => ReplCommand::Status,
        "help" | "?" => ReplCommand::Help,
        "quit" | "exit" => ReplCommand::Quit,
        "paste" => ReplCommand::Pipeline(PipelineCommand::SetInternalText(unescape(
            required(rest, "paste <text>")?,
        ))),
        "external" => ReplCommand::Pipeline(PipelineCommand::SetExternalText(unescape(
            required(rest, "external <text>")?,
        ))),
        "summarize" => ReplCommand::Pipeline(PipelineCommand::SummarizeInternal),
        "queries" => ReplCommand::Pipeline(PipelineCommand::SuggestQueries),
        "search" => match rest {
            None => ReplCommand::SearchSuggested,
            Some(raw) => ReplCommand::Pipeline(PipelineCommand::ExecuteSearch(split_queries(raw))),
        },
        "skip-search" => ReplCommand::Pipeline(PipelineCommand::SkipSearch),
        "issues" => ReplCommand::Pipeline(PipelineCommand::ExtractIssues),
        "category" => {
            let category = required(rest, "category <maintain|expand|exit|auto>")?
                .parse::<ProposalCategory>()?;
            ReplCommand::Pipeline(PipelineCommand::SelectCategory(category))
        }
        "propose" => ReplCommand::Pipeline(PipelineCommand::GenerateProposals),
        "regenerate" => ReplCommand::Pipeline(PipelineCommand::RegenerateProposals),
        "review" => ReplCommand::Pipeline(PipelineCommand::Review {
            constraints: rest.map(ToString::to_string),
        }),
        "rereview" => ReplCommand::Pipeline(PipelineCommand::RegenerateReview {
            constraints: rest.map(ToString::to_string),
        }),
        "refine" => ReplCommand::Pipeline(PipelineCommand::RefineProposals),
        "adopt" => ReplCommand::Pipeline(PipelineCommand::AdoptCandidate),
        "keep" => ReplCommand::Pipeline(PipelineCommand::KeepCurrent),
        "slides" => ReplCommand::Pipeline(PipelineCommand::BuildSlides),
        "edit" => {
            let raw = required(rest, "edit <artifact> <text>")?;
            let (name, text) = raw
                .split_once(char::is_whitespace)
                .ok_or_else(|| anyhow!("usage: edit <artifact> <text>"))?;
            ReplCommand::Pipeline(PipelineCommand::Edit {
                artifact: name.parse::<EditableArtifact>()?,
                text: unescape(text.trim()),
            })
        }
        "history" => ReplCommand::History(match rest {
            None => DEFAULT_HISTORY_WINDOW,
            Some(raw) => raw
                .parse::<usize>()
                .map_err(|_| anyhow!("history window must be a number, got '{raw}'"))?,
        }),
        "export" => ReplCommand::Export(rest.map(PathBuf::from)),
        other => bail!("unknown command '{other}'; type `help`"),
    };
    Ok(command)
}

fn required<'a>(rest: Option<&'a str>, usage: &str) -> Result<&'a str> {
    rest.ok_or_else(|| anyhow!("usage: {usage}"))
}

fn split_queries(raw: &str) -> Vec<String> {
    raw.split('|')
        .map(str::trim)
        .filter(|query| !query.is_empty())
        .map(ToString::to_string)
        .collect()
}

// Single-line input: a literal `\n` stands for a line break.
fn unescape(text: &str) -> String {
    text.replace("\\n", "\n")
}

pub(super) const HELP: &str = "\
Inputs:
  paste <text>             set internal data (\\n for line breaks)
  external <text>          set the external reference document
Stages:
  summarize                summarize internal data
  queries                  suggest three search queries
  search [q1 | q2 ...]     search the given queries (default: all suggested)
  skip-search              continue with the external document only
  issues                   extract issues
  category <name>          maintain | expand | exit | auto
  propose                  generate proposals
  regenerate               propose replacement proposals (then adopt or keep)
  review [constraints]     review proposals under optional constraints
  rereview [constraints]   propose a replacement review (then adopt or keep)
  refine                   rewrite proposals against the review (then adopt or keep)
  adopt | keep             resolve the pending candidate
  slides                   build the slide outline
  edit <artifact> <text>   overwrite summary|queries|synthesis|issues|proposals|review|slides
Session:
  status                   phase, revision and enabled actions
  history [n]              most recent slide outlines
  export [path]            write slides.md (or an .html preview)
  help | quit";
