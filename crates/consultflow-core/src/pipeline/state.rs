use std::fmt;

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::models::{AuditEntry, ProposalCategory, SearchBundle};

/// The seven ordered pipeline stages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Summarize,
    SuggestQueries,
    Search,
    ExtractIssues,
    Propose,
    Review,
    BuildSlides,
}

impl Stage {
    pub const ALL: [Self; 7] = [
        Self::Summarize,
        Self::SuggestQueries,
        Self::Search,
        Self::ExtractIssues,
        Self::Propose,
        Self::Review,
        Self::BuildSlides,
    ];

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Summarize => "summarize",
            Self::SuggestQueries => "suggest_queries",
            Self::Search => "search",
            Self::ExtractIssues => "extract_issues",
            Self::Propose => "propose",
            Self::Review => "review",
            Self::BuildSlides => "build_slides",
        }
    }

    /// Position in [`Stage::ALL`].
    pub const fn index(self) -> usize {
        self as usize
    }

    /// Every stage strictly after this one, in order.
    pub fn downstream(self) -> impl Iterator<Item = Self> {
        Self::ALL.into_iter().skip(self.index() + 1)
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PipelinePhase {
    Empty,
    InternalSummarized,
    QueriesSuggested,
    Searched,
    IssuesExtracted,
    ProposalsGenerated,
    Reviewed,
    SlidesBuilt,
}

impl PipelinePhase {
    const fn after(stage: Stage) -> Self {
        match stage {
            Stage::Summarize => Self::InternalSummarized,
            Stage::SuggestQueries => Self::QueriesSuggested,
            Stage::Search => Self::Searched,
            Stage::ExtractIssues => Self::IssuesExtracted,
            Stage::Propose => Self::ProposalsGenerated,
            Stage::Review => Self::Reviewed,
            Stage::BuildSlides => Self::SlidesBuilt,
        }
    }
}

/// Single-session record owned by the controller.
///
/// Stage outputs only ever hold a prefix of [`Stage::ALL`]: an output may be
/// present only while every upstream output is present. All mutation goes
/// through the controller so the prefix rule and the audit log's append-only
/// rule hold at every observable point.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SessionState {
    pub(crate) session_id: Uuid,
    pub(crate) created_at: DateTime<Utc>,
    pub(crate) revision: u64,
    pub(crate) internal_text: String,
    pub(crate) external_text: String,
    pub(crate) internal_summary: Option<String>,
    pub(crate) query_candidates: Option<Vec<String>>,
    pub(crate) executed_queries: Option<Vec<String>>,
    pub(crate) search_bundle: Option<SearchBundle>,
    pub(crate) issues: Option<String>,
    pub(crate) proposal_category: ProposalCategory,
    pub(crate) proposals: Option<String>,
    pub(crate) review: Option<String>,
    pub(crate) slide_outline: Option<String>,
    pub(crate) audit_log: Vec<AuditEntry>,
}

impl Default for SessionState {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionState {
    #[must_use]
    pub fn new() -> Self {
        Self {
            session_id: Uuid::new_v4(),
            created_at: Utc::now(),
            revision: 0,
            internal_text: String::new(),
            external_text: String::new(),
            internal_summary: None,
            query_candidates: None,
            executed_queries: None,
            search_bundle: None,
            issues: None,
            proposal_category: ProposalCategory::default(),
            proposals: None,
            review: None,
            slide_outline: None,
            audit_log: Vec::new(),
        }
    }

    pub const fn session_id(&self) -> Uuid {
        self.session_id
    }

    pub const fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub const fn revision(&self) -> u64 {
        self.revision
    }

    pub fn internal_text(&self) -> &str {
        &self.internal_text
    }

    pub fn external_text(&self) -> &str {
        &self.external_text
    }

    pub fn internal_summary(&self) -> Option<&str> {
        self.internal_summary.as_deref()
    }

    pub fn query_candidates(&self) -> Option<&[String]> {
        self.query_candidates.as_deref()
    }

    pub fn executed_queries(&self) -> Option<&[String]> {
        self.executed_queries.as_deref()
    }

    pub const fn search_bundle(&self) -> Option<&SearchBundle> {
        self.search_bundle.as_ref()
    }

    pub fn issues(&self) -> Option<&str> {
        self.issues.as_deref()
    }

    pub const fn proposal_category(&self) -> ProposalCategory {
        self.proposal_category
    }

    pub fn proposals(&self) -> Option<&str> {
        self.proposals.as_deref()
    }

    pub fn review(&self) -> Option<&str> {
        self.review.as_deref()
    }

    pub fn slide_outline(&self) -> Option<&str> {
        self.slide_outline.as_deref()
    }

    pub fn audit_log(&self) -> &[AuditEntry] {
        &self.audit_log
    }

    /// External context for downstream prompts: the search synthesis, or the
    /// raw external document when the synthesis is blank.
    pub fn external_context(&self) -> &str {
        self.search_bundle
            .as_ref()
            .map(|bundle| bundle.synthesis.trim())
            .filter(|synthesis| !synthesis.is_empty())
            .unwrap_or_else(|| self.external_text.trim())
    }

    pub fn has_output(&self, stage: Stage) -> bool {
        match stage {
            Stage::Summarize => self.internal_summary.is_some(),
            Stage::SuggestQueries => self.query_candidates.is_some(),
            Stage::Search => self.search_bundle.is_some(),
            Stage::ExtractIssues => self.issues.is_some(),
            Stage::Propose => self.proposals.is_some(),
            Stage::Review => self.review.is_some(),
            Stage::BuildSlides => self.slide_outline.is_some(),
        }
    }

    #[must_use]
    pub fn phase(&self) -> PipelinePhase {
        Stage::ALL
            .into_iter()
            .take_while(|stage| self.has_output(*stage))
            .last()
            .map_or(PipelinePhase::Empty, PipelinePhase::after)
    }

    /// True when present outputs form a prefix of the stage order.
    #[must_use]
    pub fn outputs_form_prefix(&self) -> bool {
        let present = Stage::ALL
            .into_iter()
            .take_while(|stage| self.has_output(*stage))
            .count();
        Stage::ALL
            .into_iter()
            .skip(present)
            .all(|stage| !self.has_output(stage))
    }

    pub(crate) fn clear_output(&mut self, stage: Stage) {
        match stage {
            Stage::Summarize => self.internal_summary = None,
            Stage::SuggestQueries => self.query_candidates = None,
            Stage::Search => {
                self.executed_queries = None;
                self.search_bundle = None;
            }
            Stage::ExtractIssues => self.issues = None,
            Stage::Propose => self.proposals = None,
            Stage::Review => self.review = None,
            Stage::BuildSlides => self.slide_outline = None,
        }
    }
}
