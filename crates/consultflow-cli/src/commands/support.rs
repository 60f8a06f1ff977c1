use std::io::{self, Write};
use std::path::{Path, PathBuf};

use consultflow_core::export::SlideExport;
use consultflow_core::models::AuditEntry;
use consultflow_core::pipeline::{Candidate, StageCommit};
use consultflow_core::{ConsultError, PipelineController, SessionState, Stage};

pub(super) fn print_error_payload<W: Write>(
    output: &mut W,
    err: &ConsultError,
    operation: &str,
) -> anyhow::Result<()> {
    serde_json::to_writer_pretty(&mut *output, &err.to_payload(operation))?;
    writeln!(output)?;
    Ok(())
}

pub(super) fn print_commit<W: Write>(
    output: &mut W,
    state: &SessionState,
    commit: &StageCommit,
) -> io::Result<()> {
    writeln!(output, "== {} (revision {})", commit.stage, commit.revision)?;
    writeln!(output, "{}", render_stage_output(state, commit.stage))?;
    if !commit.invalidated.is_empty() {
        let names = commit
            .invalidated
            .iter()
            .map(|stage| stage.as_str())
            .collect::<Vec<_>>()
            .join(", ");
        writeln!(output, "(cleared: {names})")?;
    }
    Ok(())
}

pub(super) fn print_candidate<W: Write>(output: &mut W, candidate: &Candidate) -> io::Result<()> {
    writeln!(
        output,
        "== {} candidate for {}",
        candidate.origin.as_str(),
        candidate.artifact
    )?;
    writeln!(output, "{}", candidate.diff.render())?;
    writeln!(output, "(adopt to commit, keep to discard)")
}

pub(super) fn print_status<W: Write>(
    output: &mut W,
    controller: &PipelineController,
) -> io::Result<()> {
    let state = controller.state();
    let enabled = controller
        .enabled_actions()
        .iter()
        .map(|action| action.as_str())
        .collect::<Vec<_>>()
        .join(", ");
    writeln!(output, "session:  {}", state.session_id())?;
    writeln!(output, "phase:    {:?}", state.phase())?;
    writeln!(output, "revision: {}", state.revision())?;
    writeln!(output, "category: {}", state.proposal_category())?;
    if let Some(candidate) = controller.pending_candidate() {
        writeln!(output, "pending:  {} ({})", candidate.artifact, candidate.origin.as_str())?;
    }
    writeln!(output, "enabled:  {enabled}")
}

pub(super) fn print_history<W: Write>(output: &mut W, entries: &[&AuditEntry]) -> io::Result<()> {
    if entries.is_empty() {
        return writeln!(output, "no slide outlines yet");
    }
    for entry in entries {
        writeln!(
            output,
            "#{} at {}",
            entry.sequence,
            entry.recorded_at.format("%Y-%m-%d %H:%M:%S")
        )?;
        writeln!(output, "{}", entry.render())?;
    }
    Ok(())
}

/// Writes Markdown, or the HTML preview when the target ends in `.html`.
pub(super) fn write_export(export: &SlideExport, path: Option<&Path>) -> io::Result<PathBuf> {
    let target = path.map_or_else(|| PathBuf::from(&export.filename), Path::to_path_buf);
    let is_html = target
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("html"));
    let content = if is_html {
        export.to_html()
    } else {
        export.markdown.clone()
    };
    std::fs::write(&target, content)?;
    Ok(target)
}

fn render_stage_output(state: &SessionState, stage: Stage) -> String {
    match stage {
        Stage::Summarize => state.internal_summary().unwrap_or_default().to_string(),
        Stage::SuggestQueries => state
            .query_candidates()
            .unwrap_or_default()
            .iter()
            .enumerate()
            .map(|(idx, query)| format!("{}. {query}", idx + 1))
            .collect::<Vec<_>>()
            .join("\n"),
        Stage::Search => render_search(state),
        Stage::ExtractIssues => state.issues().unwrap_or_default().to_string(),
        Stage::Propose => state.proposals().unwrap_or_default().to_string(),
        Stage::Review => state.review().unwrap_or_default().to_string(),
        Stage::BuildSlides => state.slide_outline().unwrap_or_default().to_string(),
    }
}

fn render_search(state: &SessionState) -> String {
    let mut lines = Vec::new();
    if let Some(executed) = state.executed_queries() {
        lines.push(format!("queries: {}", executed.join(" | ")));
    }
    if let Some(bundle) = state.search_bundle() {
        for card in &bundle.cards {
            lines.push(format!("- {} [{}] {}", card.title, card.source_label, card.url));
            lines.push(format!("  {}", card.synopsis));
        }
        lines.push(String::new());
        lines.push(bundle.synthesis.clone());
    }
    lines.join("\n")
}
