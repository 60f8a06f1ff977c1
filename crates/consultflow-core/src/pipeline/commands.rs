use serde::Serialize;

use super::candidate::{Candidate, EditableArtifact};
use super::state::Stage;
use crate::ingest::DocumentSource;
use crate::models::ProposalCategory;

/// Operator actions gated by stage preconditions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Action {
    Summarize,
    SuggestQueries,
    ExecuteSearch,
    SkipSearch,
    ExtractIssues,
    GenerateProposals,
    RegenerateProposals,
    Review,
    RegenerateReview,
    RefineProposals,
    BuildSlides,
    AdoptCandidate,
    KeepCurrent,
    ExportSlides,
}

impl Action {
    pub const ALL: [Self; 14] = [
        Self::Summarize,
        Self::SuggestQueries,
        Self::ExecuteSearch,
        Self::SkipSearch,
        Self::ExtractIssues,
        Self::GenerateProposals,
        Self::RegenerateProposals,
        Self::Review,
        Self::RegenerateReview,
        Self::RefineProposals,
        Self::BuildSlides,
        Self::AdoptCandidate,
        Self::KeepCurrent,
        Self::ExportSlides,
    ];

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Summarize => "summarize",
            Self::SuggestQueries => "suggest_queries",
            Self::ExecuteSearch => "execute_search",
            Self::SkipSearch => "skip_search",
            Self::ExtractIssues => "extract_issues",
            Self::GenerateProposals => "generate_proposals",
            Self::RegenerateProposals => "regenerate_proposals",
            Self::Review => "review",
            Self::RegenerateReview => "regenerate_review",
            Self::RefineProposals => "refine_proposals",
            Self::BuildSlides => "build_slides",
            Self::AdoptCandidate => "adopt_candidate",
            Self::KeepCurrent => "keep_current",
            Self::ExportSlides => "export_slides",
        }
    }

    /// Stage card the action belongs to; candidate resolution has none.
    pub const fn stage(self) -> Option<Stage> {
        match self {
            Self::Summarize => Some(Stage::Summarize),
            Self::SuggestQueries => Some(Stage::SuggestQueries),
            Self::ExecuteSearch | Self::SkipSearch => Some(Stage::Search),
            Self::ExtractIssues => Some(Stage::ExtractIssues),
            Self::GenerateProposals | Self::RegenerateProposals => Some(Stage::Propose),
            Self::Review | Self::RegenerateReview | Self::RefineProposals => Some(Stage::Review),
            Self::BuildSlides | Self::ExportSlides => Some(Stage::BuildSlides),
            Self::AdoptCandidate | Self::KeepCurrent => None,
        }
    }
}

/// One discrete event from the presentation layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PipelineCommand {
    SetInternalText(String),
    SetExternalText(String),
    LoadInternal(DocumentSource),
    LoadExternal(DocumentSource),
    SelectCategory(ProposalCategory),
    SummarizeInternal,
    SuggestQueries,
    ExecuteSearch(Vec<String>),
    SkipSearch,
    ExtractIssues,
    GenerateProposals,
    RegenerateProposals,
    Review { constraints: Option<String> },
    RegenerateReview { constraints: Option<String> },
    RefineProposals,
    AdoptCandidate,
    KeepCurrent,
    BuildSlides,
    Edit {
        artifact: EditableArtifact,
        text: String,
    },
}

/// Result of a committed stage mutation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StageCommit {
    pub stage: Stage,
    pub revision: u64,
    pub invalidated: Vec<Stage>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum CommandOutcome {
    InputUpdated { revision: u64 },
    Committed(StageCommit),
    Unchanged,
    CandidateProposed(Candidate),
    CandidateDiscarded,
}
