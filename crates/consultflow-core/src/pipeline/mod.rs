//! Seven-stage pipeline controller.
//!
//! [`PipelineController`] exclusively owns the [`SessionState`]. Every stage
//! action first checks its precondition, then runs its generation call against
//! borrowed inputs, and only then commits: the new output is written, all
//! downstream outputs are cleared and the revision is bumped in one step. A
//! failed generation therefore leaves the state exactly as it was.
//!
//! Regenerate and refine produce a [`Candidate`] that lives beside the state
//! until the operator adopts it (a normal commit) or keeps the current value
//! (no state change at all).

mod candidate;
mod commands;
mod diff;
mod invalidation;
mod state;

use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, info, warn};

use crate::config::AppConfig;
use crate::error::{ConsultError, Result};
use crate::export::SlideExport;
use crate::generation::{HttpTextGenerator, PromptRequest, TextGenerator, dispatch};
use crate::ingest::{DocumentSource, load_document};
use crate::models::{AuditEntry, ProposalCategory, SearchBundle};
use crate::research::{ResearchAggregator, is_fallback_bundle};
use crate::text::non_blank;

pub use candidate::{Candidate, CandidateOrigin, EditableArtifact};
pub use commands::{Action, CommandOutcome, PipelineCommand, StageCommit};
pub use diff::{DiffLine, LineChange, LineDiff};
pub use state::{PipelinePhase, SessionState, Stage};

use invalidation::invalidate_downstream;

pub const NO_SEARCH_MARKER: &str = "No search performed (internal data only)";
pub const NO_RESULTS_SUFFIX: &str = " (no results)";
pub const SLIDE_AUDIT_LABEL: &str = "Slide outline";

pub struct PipelineController {
    state: SessionState,
    pending: Option<Candidate>,
    generator: Arc<dyn TextGenerator>,
    research: ResearchAggregator,
}

impl std::fmt::Debug for PipelineController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PipelineController")
            .field("session_id", &self.state.session_id)
            .field("revision", &self.state.revision)
            .field("phase", &self.state.phase())
            .field("pending", &self.pending.as_ref().map(|c| c.artifact))
            .finish_non_exhaustive()
    }
}

impl PipelineController {
    pub fn new(generator: Arc<dyn TextGenerator>, research: ResearchAggregator) -> Self {
        let state = SessionState::new();
        info!(session_id = %state.session_id, "session started");
        Self {
            state,
            pending: None,
            generator,
            research,
        }
    }

    /// Controller wired to the HTTP generation, search and fetch adapters.
    pub fn from_config(config: &AppConfig) -> Result<Self> {
        let generator: Arc<dyn TextGenerator> =
            Arc::new(HttpTextGenerator::new(&config.generation)?);
        let research = ResearchAggregator::from_config(Arc::clone(&generator), &config.research)?;
        Ok(Self::new(generator, research))
    }

    pub const fn state(&self) -> &SessionState {
        &self.state
    }

    pub const fn pending_candidate(&self) -> Option<&Candidate> {
        self.pending.as_ref()
    }

    // Root inputs and category never invalidate stage outputs.

    pub fn set_internal_text(&mut self, text: impl Into<String>) -> u64 {
        let text = text.into();
        if self.state.internal_text != text {
            self.state.internal_text = text;
            self.bump_revision();
        }
        self.state.revision
    }

    pub fn set_external_text(&mut self, text: impl Into<String>) -> u64 {
        let text = text.into();
        if self.state.external_text != text {
            self.state.external_text = text;
            self.bump_revision();
        }
        self.state.revision
    }

    pub fn load_internal(&mut self, source: &DocumentSource) -> u64 {
        info!(source = source.label(), "loading internal data");
        self.set_internal_text(load_document(source))
    }

    pub fn load_external(&mut self, source: &DocumentSource) -> u64 {
        info!(source = source.label(), "loading external document");
        self.set_external_text(load_document(source))
    }

    pub fn select_category(&mut self, category: ProposalCategory) -> u64 {
        if self.state.proposal_category != category {
            self.state.proposal_category = category;
            self.bump_revision();
        }
        self.state.revision
    }

    pub fn summarize_internal(&mut self) -> Result<StageCommit> {
        self.require(Action::Summarize)?;
        let summary = self.generate(
            Stage::Summarize,
            &PromptRequest::SummarizeInternal {
                data: &self.state.internal_text,
            },
        )?;
        Ok(self.commit(Stage::Summarize, |state| {
            state.internal_summary = Some(summary);
        }))
    }

    pub fn suggest_queries(&mut self) -> Result<StageCommit> {
        self.require(Action::SuggestQueries)?;
        let summary = self.state.internal_summary.as_deref().unwrap_or_default();
        let queries = self.research.suggest_queries(summary);
        Ok(self.commit(Stage::SuggestQueries, |state| {
            state.query_candidates = Some(queries);
        }))
    }

    /// Runs every non-blank query in order and commits the merged bundle.
    pub fn execute_search(&mut self, queries: &[String]) -> Result<StageCommit> {
        self.require(Action::ExecuteSearch)?;
        let selected = queries
            .iter()
            .map(|query| query.trim())
            .filter(|query| !query.is_empty())
            .collect::<Vec<_>>();
        if selected.is_empty() {
            return Err(ConsultError::unavailable(
                Stage::Search,
                "no non-empty query selected",
            ));
        }

        let internal_summary = non_blank(self.state.internal_summary.as_deref());
        let max_results = self.research.max_results();
        let mut executed = Vec::with_capacity(selected.len());
        let mut cards = Vec::new();
        let mut syntheses = Vec::new();
        for query in selected {
            let bundle =
                self.research
                    .aggregate_search_with_context(query, max_results, internal_summary);
            executed.push(if is_fallback_bundle(&bundle) {
                format!("{query}{NO_RESULTS_SUFFIX}")
            } else {
                query.to_string()
            });
            if let Some(synthesis) = non_blank(Some(bundle.synthesis.as_str())) {
                syntheses.push(synthesis.to_string());
            }
            cards.extend(bundle.cards);
        }
        let bundle = SearchBundle {
            cards,
            synthesis: syntheses.join("\n"),
        };
        Ok(self.commit(Stage::Search, |state| {
            state.executed_queries = Some(executed);
            state.search_bundle = Some(bundle);
        }))
    }

    pub fn skip_search(&mut self) -> Result<StageCommit> {
        self.require(Action::SkipSearch)?;
        let bundle = SearchBundle::without_search(self.state.external_text.trim());
        Ok(self.commit(Stage::Search, |state| {
            state.executed_queries = Some(vec![NO_SEARCH_MARKER.to_string()]);
            state.search_bundle = Some(bundle);
        }))
    }

    pub fn extract_issues(&mut self) -> Result<StageCommit> {
        self.require(Action::ExtractIssues)?;
        let issues = self.generate(
            Stage::ExtractIssues,
            &PromptRequest::ExtractIssues {
                internal_summary: self.state.internal_summary.as_deref().unwrap_or_default(),
                external_summary: self.state.external_context(),
            },
        )?;
        Ok(self.commit(Stage::ExtractIssues, |state| {
            state.issues = Some(issues);
        }))
    }

    pub fn generate_proposals(&mut self) -> Result<StageCommit> {
        self.require(Action::GenerateProposals)?;
        let proposals = self.generate(Stage::Propose, &self.proposals_request())?;
        Ok(self.commit(Stage::Propose, |state| {
            state.proposals = Some(proposals);
        }))
    }

    pub fn review(&mut self, constraints: Option<&str>) -> Result<StageCommit> {
        self.require(Action::Review)?;
        let review = self.generate(Stage::Review, &self.review_request(constraints))?;
        Ok(self.commit(Stage::Review, |state| {
            state.review = Some(review);
        }))
    }

    /// Builds the slide outline and appends it to the audit log in the same commit.
    pub fn build_slides(&mut self) -> Result<StageCommit> {
        self.require(Action::BuildSlides)?;
        let state = &self.state;
        let outline = self.generate(
            Stage::BuildSlides,
            &PromptRequest::BuildSlides {
                internal_summary: state.internal_summary.as_deref().unwrap_or_default(),
                external_summary: state.external_context(),
                issues: state.issues.as_deref().unwrap_or_default(),
                proposals: state.proposals.as_deref().unwrap_or_default(),
                review: state.review.as_deref().unwrap_or_default(),
            },
        )?;
        let commit = self.commit(Stage::BuildSlides, |state| {
            let entry = AuditEntry {
                sequence: state.audit_log.len() as u64 + 1,
                label: SLIDE_AUDIT_LABEL.to_string(),
                text: outline.clone(),
                recorded_at: Utc::now(),
            };
            state.slide_outline = Some(outline);
            state.audit_log.push(entry);
        });
        info!(entries = self.state.audit_log.len(), "audit entry appended");
        Ok(commit)
    }

    pub fn regenerate_proposals(&mut self) -> Result<&Candidate> {
        self.require(Action::RegenerateProposals)?;
        let text = self.generate(Stage::Propose, &self.proposals_request())?;
        Ok(self.propose_candidate(CandidateOrigin::Regenerate, EditableArtifact::Proposals, text))
    }

    /// Rewrites the proposals against the stored review; adopting it is a stage-5 commit.
    pub fn refine_proposals(&mut self) -> Result<&Candidate> {
        self.require(Action::RefineProposals)?;
        let state = &self.state;
        let text = self.generate(
            Stage::Review,
            &PromptRequest::RefineProposals {
                proposals: state.proposals.as_deref().unwrap_or_default(),
                review: state.review.as_deref().unwrap_or_default(),
                internal_summary: state.internal_summary.as_deref().unwrap_or_default(),
                external_summary: state.external_context(),
            },
        )?;
        Ok(self.propose_candidate(CandidateOrigin::Refine, EditableArtifact::Proposals, text))
    }

    pub fn regenerate_review(&mut self, constraints: Option<&str>) -> Result<&Candidate> {
        self.require(Action::RegenerateReview)?;
        let text = self.generate(Stage::Review, &self.review_request(constraints))?;
        Ok(self.propose_candidate(CandidateOrigin::Regenerate, EditableArtifact::Review, text))
    }

    pub fn adopt_candidate(&mut self) -> Result<StageCommit> {
        let candidate = self.pending.take().ok_or(ConsultError::NoPendingCandidate)?;
        info!(
            artifact = candidate.artifact.as_str(),
            origin = candidate.origin.as_str(),
            "candidate adopted"
        );
        Ok(self.write_artifact(candidate.artifact, candidate.text))
    }

    pub fn keep_current(&mut self) -> Result<()> {
        let candidate = self.pending.take().ok_or(ConsultError::NoPendingCandidate)?;
        info!(
            artifact = candidate.artifact.as_str(),
            origin = candidate.origin.as_str(),
            "candidate discarded"
        );
        Ok(())
    }

    /// Overwrites a stored artifact by hand. Identical text is a no-op.
    pub fn edit_output(
        &mut self,
        artifact: EditableArtifact,
        text: &str,
    ) -> Result<Option<StageCommit>> {
        let stage = artifact.stage();
        if !self.state.has_output(stage) {
            return Err(ConsultError::unavailable(
                stage,
                format!("{artifact} has not been produced yet"),
            ));
        }
        let unchanged = match artifact {
            EditableArtifact::Queries => {
                self.state.query_candidates.as_deref() == Some(parse_query_lines(text).as_slice())
            }
            _ => self.artifact_text(artifact) == Some(text),
        };
        if unchanged {
            debug!(artifact = artifact.as_str(), "edit matches stored value; nothing to do");
            return Ok(None);
        }
        Ok(Some(self.write_artifact(artifact, text.to_string())))
    }

    #[must_use]
    pub fn enabled_actions(&self) -> Vec<Action> {
        Action::ALL
            .into_iter()
            .filter(|action| self.blocked_reason(*action).is_none())
            .collect()
    }

    #[must_use]
    pub fn is_enabled(&self, action: Action) -> bool {
        self.blocked_reason(action).is_none()
    }

    pub fn apply(&mut self, command: PipelineCommand) -> Result<CommandOutcome> {
        let outcome = match command {
            PipelineCommand::SetInternalText(text) => CommandOutcome::InputUpdated {
                revision: self.set_internal_text(text),
            },
            PipelineCommand::SetExternalText(text) => CommandOutcome::InputUpdated {
                revision: self.set_external_text(text),
            },
            PipelineCommand::LoadInternal(source) => CommandOutcome::InputUpdated {
                revision: self.load_internal(&source),
            },
            PipelineCommand::LoadExternal(source) => CommandOutcome::InputUpdated {
                revision: self.load_external(&source),
            },
            PipelineCommand::SelectCategory(category) => CommandOutcome::InputUpdated {
                revision: self.select_category(category),
            },
            PipelineCommand::SummarizeInternal => {
                CommandOutcome::Committed(self.summarize_internal()?)
            }
            PipelineCommand::SuggestQueries => CommandOutcome::Committed(self.suggest_queries()?),
            PipelineCommand::ExecuteSearch(queries) => {
                CommandOutcome::Committed(self.execute_search(&queries)?)
            }
            PipelineCommand::SkipSearch => CommandOutcome::Committed(self.skip_search()?),
            PipelineCommand::ExtractIssues => CommandOutcome::Committed(self.extract_issues()?),
            PipelineCommand::GenerateProposals => {
                CommandOutcome::Committed(self.generate_proposals()?)
            }
            PipelineCommand::RegenerateProposals => {
                CommandOutcome::CandidateProposed(self.regenerate_proposals()?.clone())
            }
            PipelineCommand::Review { constraints } => {
                CommandOutcome::Committed(self.review(constraints.as_deref())?)
            }
            PipelineCommand::RegenerateReview { constraints } => CommandOutcome::CandidateProposed(
                self.regenerate_review(constraints.as_deref())?.clone(),
            ),
            PipelineCommand::RefineProposals => {
                CommandOutcome::CandidateProposed(self.refine_proposals()?.clone())
            }
            PipelineCommand::AdoptCandidate => CommandOutcome::Committed(self.adopt_candidate()?),
            PipelineCommand::KeepCurrent => {
                self.keep_current()?;
                CommandOutcome::CandidateDiscarded
            }
            PipelineCommand::BuildSlides => CommandOutcome::Committed(self.build_slides()?),
            PipelineCommand::Edit { artifact, text } => self
                .edit_output(artifact, &text)?
                .map_or(CommandOutcome::Unchanged, CommandOutcome::Committed),
        };
        Ok(outcome)
    }

    /// Newest-first window over the audit log.
    #[must_use]
    pub fn recent_audit(&self, limit: usize) -> Vec<&AuditEntry> {
        self.state.audit_log.iter().rev().take(limit).collect()
    }

    pub fn export_slides(&self) -> Result<SlideExport> {
        self.require(Action::ExportSlides)?;
        Ok(SlideExport::new(
            self.state.slide_outline.as_deref().unwrap_or_default(),
        ))
    }

    fn blocked_reason(&self, action: Action) -> Option<&'static str> {
        let state = &self.state;
        match action {
            Action::Summarize => non_blank(Some(state.internal_text.as_str()))
                .is_none()
                .then_some("internal data is empty"),
            Action::SuggestQueries => non_blank(state.internal_summary.as_deref())
                .is_none()
                .then_some("internal summary is missing"),
            Action::ExecuteSearch | Action::SkipSearch => state
                .query_candidates
                .is_none()
                .then_some("queries have not been suggested"),
            Action::ExtractIssues => state
                .search_bundle
                .is_none()
                .then_some("search has been neither executed nor skipped"),
            Action::GenerateProposals => state.issues.is_none().then_some("issues are missing"),
            Action::RegenerateProposals | Action::Review => {
                state.proposals.is_none().then_some("proposals are missing")
            }
            Action::RegenerateReview | Action::RefineProposals | Action::BuildSlides => {
                state.review.is_none().then_some("review is missing")
            }
            Action::AdoptCandidate | Action::KeepCurrent => self
                .pending
                .is_none()
                .then_some("no candidate is pending"),
            Action::ExportSlides => state
                .slide_outline
                .is_none()
                .then_some("slide outline is missing"),
        }
    }

    fn require(&self, action: Action) -> Result<()> {
        let Some(reason) = self.blocked_reason(action) else {
            return Ok(());
        };
        match action.stage() {
            Some(stage) => Err(ConsultError::unavailable(stage, reason)),
            None => Err(ConsultError::NoPendingCandidate),
        }
    }

    fn generate(&self, stage: Stage, request: &PromptRequest<'_>) -> Result<String> {
        dispatch(self.generator.as_ref(), request).inspect_err(|err| {
            warn!(stage = stage.as_str(), error = %err, "stage generation failed; state unchanged");
        })
    }

    fn proposals_request(&self) -> PromptRequest<'_> {
        PromptRequest::GenerateProposals {
            issues: self.state.issues.as_deref().unwrap_or_default(),
            category: self.state.proposal_category,
        }
    }

    fn review_request<'a>(&'a self, constraints: Option<&'a str>) -> PromptRequest<'a> {
        PromptRequest::ReviewProposals {
            proposals: self.state.proposals.as_deref().unwrap_or_default(),
            internal_summary: self.state.internal_summary.as_deref().unwrap_or_default(),
            external_summary: self.state.external_context(),
            constraints,
        }
    }

    fn propose_candidate(
        &mut self,
        origin: CandidateOrigin,
        artifact: EditableArtifact,
        text: String,
    ) -> &Candidate {
        let current = self.artifact_text(artifact).unwrap_or_default();
        let candidate = Candidate::new(origin, artifact, current, text);
        info!(
            artifact = artifact.as_str(),
            origin = origin.as_str(),
            removed = candidate.diff.removed().count(),
            added = candidate.diff.added().count(),
            "candidate proposed"
        );
        self.pending.insert(candidate)
    }

    fn artifact_text(&self, artifact: EditableArtifact) -> Option<&str> {
        let state = &self.state;
        match artifact {
            EditableArtifact::Summary => state.internal_summary.as_deref(),
            EditableArtifact::Queries => None,
            EditableArtifact::Synthesis => state
                .search_bundle
                .as_ref()
                .map(|bundle| bundle.synthesis.as_str()),
            EditableArtifact::Issues => state.issues.as_deref(),
            EditableArtifact::Proposals => state.proposals.as_deref(),
            EditableArtifact::Review => state.review.as_deref(),
            EditableArtifact::Slides => state.slide_outline.as_deref(),
        }
    }

    fn write_artifact(&mut self, artifact: EditableArtifact, text: String) -> StageCommit {
        self.commit(artifact.stage(), |state| match artifact {
            EditableArtifact::Summary => state.internal_summary = Some(text),
            EditableArtifact::Queries => state.query_candidates = Some(parse_query_lines(&text)),
            EditableArtifact::Synthesis => {
                if let Some(bundle) = state.search_bundle.as_mut() {
                    bundle.synthesis = text;
                }
            }
            EditableArtifact::Issues => state.issues = Some(text),
            EditableArtifact::Proposals => state.proposals = Some(text),
            EditableArtifact::Review => state.review = Some(text),
            EditableArtifact::Slides => state.slide_outline = Some(text),
        })
    }

    fn commit(&mut self, stage: Stage, apply: impl FnOnce(&mut SessionState)) -> StageCommit {
        apply(&mut self.state);
        let invalidated = invalidate_downstream(&mut self.state, stage);
        self.bump_revision();
        info!(
            stage = stage.as_str(),
            revision = self.state.revision,
            phase = ?self.state.phase(),
            "stage committed"
        );
        StageCommit {
            stage,
            revision: self.state.revision,
            invalidated,
        }
    }

    fn bump_revision(&mut self) {
        self.state.revision += 1;
        if let Some(candidate) = self.pending.take() {
            debug!(
                artifact = candidate.artifact.as_str(),
                "pending candidate discarded by newer mutation"
            );
        }
    }
}

fn parse_query_lines(text: &str) -> Vec<String> {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(ToString::to_string)
        .collect()
}
