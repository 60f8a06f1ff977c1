use std::fmt;
use std::str::FromStr;

use serde::Serialize;

use super::diff::LineDiff;
use super::state::Stage;
use crate::error::ConsultError;

/// Stored artifacts the operator may overwrite by hand or through a candidate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EditableArtifact {
    Summary,
    Queries,
    Synthesis,
    Issues,
    Proposals,
    Review,
    Slides,
}

impl EditableArtifact {
    pub const ALL: [Self; 7] = [
        Self::Summary,
        Self::Queries,
        Self::Synthesis,
        Self::Issues,
        Self::Proposals,
        Self::Review,
        Self::Slides,
    ];

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Summary => "summary",
            Self::Queries => "queries",
            Self::Synthesis => "synthesis",
            Self::Issues => "issues",
            Self::Proposals => "proposals",
            Self::Review => "review",
            Self::Slides => "slides",
        }
    }

    /// Stage whose output this artifact is; overwriting it invalidates that stage's downstream.
    pub const fn stage(self) -> Stage {
        match self {
            Self::Summary => Stage::Summarize,
            Self::Queries => Stage::SuggestQueries,
            Self::Synthesis => Stage::Search,
            Self::Issues => Stage::ExtractIssues,
            Self::Proposals => Stage::Propose,
            Self::Review => Stage::Review,
            Self::Slides => Stage::BuildSlides,
        }
    }
}

impl fmt::Display for EditableArtifact {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EditableArtifact {
    type Err = ConsultError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let normalized = raw.trim().to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|artifact| artifact.as_str() == normalized)
            .or(match normalized.as_str() {
                "external" | "brief" => Some(Self::Synthesis),
                "slide" | "outline" => Some(Self::Slides),
                _ => None,
            })
            .ok_or_else(|| ConsultError::Validation(format!("unknown artifact: {normalized}")))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CandidateOrigin {
    Regenerate,
    Refine,
}

impl CandidateOrigin {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Regenerate => "regenerate",
            Self::Refine => "refine",
        }
    }
}

/// Uncommitted replacement for a stored artifact, awaiting adopt or keep.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Candidate {
    pub origin: CandidateOrigin,
    pub artifact: EditableArtifact,
    pub text: String,
    pub diff: LineDiff,
}

impl Candidate {
    #[must_use]
    pub fn new(origin: CandidateOrigin, artifact: EditableArtifact, current: &str, text: String) -> Self {
        let diff = LineDiff::compute(current, &text);
        Self {
            origin,
            artifact,
            text,
            diff,
        }
    }
}
