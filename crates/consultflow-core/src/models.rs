use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::ConsultError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProposalCategory {
    Maintain,
    Expand,
    Exit,
    #[default]
    Auto,
}

impl ProposalCategory {
    pub const ALL: [Self; 4] = [Self::Maintain, Self::Expand, Self::Exit, Self::Auto];

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Maintain => "maintain",
            Self::Expand => "expand",
            Self::Exit => "exit",
            Self::Auto => "auto",
        }
    }

    /// Instruction folded into the proposal prompt; `None` leaves the choice to the model.
    pub const fn constraint(self) -> Option<&'static str> {
        match self {
            Self::Maintain => Some(
                "Limit every initiative to the maintain category: protect, stabilize and \
                 improve the efficiency of the existing business.",
            ),
            Self::Expand => Some(
                "Limit every initiative to the expand category: growth through new \
                 customers, products, channels or markets.",
            ),
            Self::Exit => Some(
                "Limit every initiative to the exit category: divestment, withdrawal or \
                 wind-down of underperforming businesses.",
            ),
            Self::Auto => None,
        }
    }
}

impl fmt::Display for ProposalCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProposalCategory {
    type Err = ConsultError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "maintain" | "maintenance" => Ok(Self::Maintain),
            "expand" | "growth" => Ok(Self::Expand),
            "exit" | "divest" | "divestment" => Ok(Self::Exit),
            "auto" | "recommended" | "all" => Ok(Self::Auto),
            other => Err(ConsultError::Validation(format!(
                "unknown proposal category: {other}"
            ))),
        }
    }
}

/// Display record for one external source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceCard {
    pub title: String,
    pub source_label: String,
    pub url: String,
    pub synopsis: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SearchBundle {
    pub cards: Vec<SourceCard>,
    pub synthesis: String,
}

impl SearchBundle {
    /// Bundle produced when search is bypassed: no cards, the external document stands in.
    #[must_use]
    pub fn without_search(external_text: &str) -> Self {
        Self {
            cards: Vec::new(),
            synthesis: external_text.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditEntry {
    pub sequence: u64,
    pub label: String,
    pub text: String,
    pub recorded_at: DateTime<Utc>,
}

impl AuditEntry {
    #[must_use]
    pub fn render(&self) -> String {
        format!("[{}]\n{}", self.label, self.text)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SlideHeading {
    pub level: u8,
    pub title: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn proposal_category_parses_known_aliases() {
        assert_eq!(
            "Maintain".parse::<ProposalCategory>().expect("maintain"),
            ProposalCategory::Maintain
        );
        assert_eq!(
            "growth".parse::<ProposalCategory>().expect("growth"),
            ProposalCategory::Expand
        );
        assert_eq!(
            " divest ".parse::<ProposalCategory>().expect("divest"),
            ProposalCategory::Exit
        );
        assert_eq!(
            "auto".parse::<ProposalCategory>().expect("auto"),
            ProposalCategory::Auto
        );
        assert!("sideways".parse::<ProposalCategory>().is_err());
    }

    #[test]
    fn only_auto_category_leaves_prompt_unconstrained() {
        for category in ProposalCategory::ALL {
            assert_eq!(
                category.constraint().is_none(),
                category == ProposalCategory::Auto
            );
        }
    }

    #[test]
    fn bundle_without_search_keeps_external_text_as_synthesis() {
        let bundle = SearchBundle::without_search("industry report");
        assert!(bundle.cards.is_empty());
        assert_eq!(bundle.synthesis, "industry report");
    }
}
