use crate::models::ProposalCategory;

const INTERNAL_SUMMARY_PLACEHOLDER: &str = "(the internal summary is referenced separately)";
const NO_EXTERNAL_INFORMATION: &str = "(no industry information)";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PromptTemplate {
    SummarizeInternal,
    SuggestQueries,
    SummarizeDocument,
    GlossTitle,
    SynthesizeBrief,
    ExtractIssues,
    GenerateProposals,
    ReviewProposals,
    RefineProposals,
    BuildSlides,
}

impl PromptTemplate {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::SummarizeInternal => "summarize_internal",
            Self::SuggestQueries => "suggest_queries",
            Self::SummarizeDocument => "summarize_document",
            Self::GlossTitle => "gloss_title",
            Self::SynthesizeBrief => "synthesize_brief",
            Self::ExtractIssues => "extract_issues",
            Self::GenerateProposals => "generate_proposals",
            Self::ReviewProposals => "review_proposals",
            Self::RefineProposals => "refine_proposals",
            Self::BuildSlides => "build_slides",
        }
    }

    pub const fn temperature(self) -> f32 {
        match self {
            Self::SummarizeInternal
            | Self::SummarizeDocument
            | Self::SynthesizeBrief
            | Self::ReviewProposals
            | Self::BuildSlides => 0.3,
            Self::ExtractIssues => 0.4,
            Self::SuggestQueries | Self::GlossTitle | Self::RefineProposals => 0.5,
            Self::GenerateProposals => 0.6,
        }
    }
}

/// One generation call: the template plus the inputs it is rendered from.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PromptRequest<'a> {
    SummarizeInternal {
        data: &'a str,
    },
    SuggestQueries {
        summary: &'a str,
    },
    SummarizeDocument {
        text: &'a str,
    },
    GlossTitle {
        title: &'a str,
    },
    SynthesizeBrief {
        internal_summary: Option<&'a str>,
        document_summaries: &'a [String],
    },
    ExtractIssues {
        internal_summary: &'a str,
        external_summary: &'a str,
    },
    GenerateProposals {
        issues: &'a str,
        category: ProposalCategory,
    },
    ReviewProposals {
        proposals: &'a str,
        internal_summary: &'a str,
        external_summary: &'a str,
        constraints: Option<&'a str>,
    },
    RefineProposals {
        proposals: &'a str,
        review: &'a str,
        internal_summary: &'a str,
        external_summary: &'a str,
    },
    BuildSlides {
        internal_summary: &'a str,
        external_summary: &'a str,
        issues: &'a str,
        proposals: &'a str,
        review: &'a str,
    },
}

impl PromptRequest<'_> {
    pub const fn template(&self) -> PromptTemplate {
        match self {
            Self::SummarizeInternal { .. } => PromptTemplate::SummarizeInternal,
            Self::SuggestQueries { .. } => PromptTemplate::SuggestQueries,
            Self::SummarizeDocument { .. } => PromptTemplate::SummarizeDocument,
            Self::GlossTitle { .. } => PromptTemplate::GlossTitle,
            Self::SynthesizeBrief { .. } => PromptTemplate::SynthesizeBrief,
            Self::ExtractIssues { .. } => PromptTemplate::ExtractIssues,
            Self::GenerateProposals { .. } => PromptTemplate::GenerateProposals,
            Self::ReviewProposals { .. } => PromptTemplate::ReviewProposals,
            Self::RefineProposals { .. } => PromptTemplate::RefineProposals,
            Self::BuildSlides { .. } => PromptTemplate::BuildSlides,
        }
    }

    pub const fn temperature(&self) -> f32 {
        self.template().temperature()
    }

    pub fn render(&self) -> String {
        match *self {
            Self::SummarizeInternal { data } => render_summarize_internal(data),
            Self::SuggestQueries { summary } => render_suggest_queries(summary),
            Self::SummarizeDocument { text } => render_summarize_document(text),
            Self::GlossTitle { title } => format!(
                "Infer what the page behind the following title or URL is about and describe it in one sentence:\n{}",
                title.trim()
            ),
            Self::SynthesizeBrief {
                internal_summary,
                document_summaries,
            } => render_synthesize_brief(internal_summary, document_summaries),
            Self::ExtractIssues {
                internal_summary,
                external_summary,
            } => render_extract_issues(internal_summary, external_summary),
            Self::GenerateProposals { issues, category } => {
                render_generate_proposals(issues, category)
            }
            Self::ReviewProposals {
                proposals,
                internal_summary,
                external_summary,
                constraints,
            } => render_review(proposals, internal_summary, external_summary, constraints),
            Self::RefineProposals {
                proposals,
                review,
                internal_summary,
                external_summary,
            } => render_refine(proposals, review, internal_summary, external_summary),
            Self::BuildSlides {
                internal_summary,
                external_summary,
                issues,
                proposals,
                review,
            } => render_build_slides(internal_summary, external_summary, issues, proposals, review),
        }
    }
}

fn push_section(prompt: &mut String, heading: &str, body: &str) {
    prompt.push('[');
    prompt.push_str(heading);
    prompt.push_str("]\n");
    prompt.push_str(body.trim());
    prompt.push_str("\n\n");
}

fn external_or_placeholder(external_summary: &str) -> &str {
    let trimmed = external_summary.trim();
    if trimmed.is_empty() {
        NO_EXTERNAL_INFORMATION
    } else {
        trimmed
    }
}

fn render_summarize_internal(data: &str) -> String {
    let mut prompt = String::from(
        "Summarize the following internal business data.\n\
         - Keep every figure and fact.\n\
         - Include the important details.\n\
         - Write roughly 5 to 8 lines.\n\
         - Use bullet points or short paragraphs.\n\n",
    );
    push_section(&mut prompt, "Internal data", data);
    prompt
}

fn render_suggest_queries(summary: &str) -> String {
    let mut prompt = String::from(
        "From the internal summary below, propose exactly 3 web search queries that would \
         gather useful external context.\n\
         - Each query is a short, concrete noun phrase.\n\
         - Output one query per line with no commentary.\n\n",
    );
    push_section(&mut prompt, "Internal summary", summary);
    prompt
}

fn render_summarize_document(text: &str) -> String {
    let char_count = text.chars().count();
    let mut prompt =
        String::from("Summarize the following document body in 1 to 3 sentences. Be concise.\n\n");
    push_section(
        &mut prompt,
        &format!("Body (first {char_count} characters)"),
        text,
    );
    prompt
}

fn render_synthesize_brief(internal_summary: Option<&str>, document_summaries: &[String]) -> String {
    let joined = document_summaries
        .iter()
        .map(|summary| summary.trim())
        .filter(|summary| !summary.is_empty())
        .map(|summary| format!("- {summary}"))
        .collect::<Vec<_>>()
        .join("\n");
    let internal = internal_summary
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .unwrap_or(INTERNAL_SUMMARY_PLACEHOLDER);

    let mut prompt = String::from(
        "Combine the internal summary and the external source summaries into one concise \
         brief of 3 to 5 lines.\n\
         - Treat the internal summary as authoritative fact.\n\
         - Use the external summaries as supplementary information.\n\
         - Where they contradict each other, state the contradiction conditionally instead \
         of resolving it silently.\n\n",
    );
    push_section(&mut prompt, "Internal summary", internal);
    push_section(
        &mut prompt,
        "External summaries (1-3 sentences per source)",
        &joined,
    );
    prompt
}

fn render_extract_issues(internal_summary: &str, external_summary: &str) -> String {
    let mut prompt = String::from(
        "Organize the business issues found in the information below. If there is no \
         industry information, extract only issues grounded in the internal data. Do not \
         list a small amount of data as an issue in itself.\n\n",
    );
    push_section(&mut prompt, "Internal data", internal_summary);
    push_section(
        &mut prompt,
        "Industry information",
        external_or_placeholder(external_summary),
    );
    prompt.push_str(
        "Classification:\n\
         1. Issues grounded in the internal data\n\
         2. Issues grounded in the industry information\n\
         3. Issues derived from comparing 1 and 2 (gaps, contradictions, missing pieces)\n\n\
         Summarize each item in 2 to 3 lines.",
    );
    prompt
}

fn render_generate_proposals(issues: &str, category: ProposalCategory) -> String {
    let mut prompt = String::from(
        "Propose initiatives that address the issues below.\n\
         - Make each initiative as concrete as possible.\n\
         - Include numeric targets or implementation examples.\n\
         - Add a one-sentence rationale to each.\n\
         - Propose 3 initiatives in total.\n",
    );
    if let Some(constraint) = category.constraint() {
        prompt.push_str("- ");
        prompt.push_str(constraint);
        prompt.push('\n');
    }
    prompt.push('\n');
    push_section(&mut prompt, "Issues", issues);
    prompt
}

fn render_review(
    proposals: &str,
    internal_summary: &str,
    external_summary: &str,
    constraints: Option<&str>,
) -> String {
    let mut prompt = String::from(
        "You are an experienced consultant reviewing initiatives drafted by a junior \
         colleague. Review them against the internal data and the industry information, \
         then summarize the overall risk.\n\n",
    );
    push_section(&mut prompt, "Initiatives", proposals);
    push_section(&mut prompt, "Internal data", internal_summary);
    push_section(
        &mut prompt,
        "Industry information",
        external_or_placeholder(external_summary),
    );
    if let Some(constraints) = constraints
        .map(str::trim)
        .filter(|value| !value.is_empty())
    {
        push_section(&mut prompt, "Additional conditions from the operator", constraints);
    }
    prompt.push_str(
        "Output format:\n\
         - Output only the review, without describing a persona.\n\
         - For each initiative, one sentence on its strength and one on what to improve.\n\
         - The overall risk in 2 to 3 lines.",
    );
    prompt
}

fn render_refine(
    proposals: &str,
    review: &str,
    internal_summary: &str,
    external_summary: &str,
) -> String {
    let mut prompt =
        String::from("Revise the initiatives below so that they address the review feedback.\n\n");
    push_section(&mut prompt, "Current initiatives", proposals);
    push_section(&mut prompt, "Review feedback", review);
    push_section(&mut prompt, "Internal summary", internal_summary);
    push_section(
        &mut prompt,
        "External summary",
        external_or_placeholder(external_summary),
    );
    prompt.push_str(
        "Output format:\n\
         - 3 revised initiatives.\n\
         - For each, one sentence explaining what was improved.",
    );
    prompt
}

fn render_build_slides(
    internal_summary: &str,
    external_summary: &str,
    issues: &str,
    proposals: &str,
    review: &str,
) -> String {
    let mut prompt = String::from(
        "Using the information below, write a proposal slide outline in Markdown. Omit the \
         industry parts when there is no industry information.\n\n",
    );
    push_section(&mut prompt, "Internal data", internal_summary);
    push_section(
        &mut prompt,
        "Industry information",
        external_or_placeholder(external_summary),
    );
    push_section(&mut prompt, "Issues", issues);
    push_section(&mut prompt, "Initiatives", proposals);
    if !review.trim().is_empty() {
        push_section(&mut prompt, "Review", review);
    }
    prompt.push_str(
        "Slide structure:\n\
         # Proposal title\n\
         ## Issue overview\n\
         - Internal data\n\
         - Industry information\n\
         - Issues from comparing internal data with the industry\n\n\
         ## Proposed initiatives\n\
         - Initiative 1\n\
         - Initiative 2\n\
         - Initiative 3\n\n\
         ## Expected impact\n\
         - Expected improvement in revenue, profit or share, quantified or qualitative\n\n\
         ## Summary\n\
         - Next steps",
    );
    prompt
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn proposal_prompt_folds_category_constraint_only_when_constrained() {
        let constrained = PromptRequest::GenerateProposals {
            issues: "churn up 2%",
            category: ProposalCategory::Exit,
        }
        .render();
        assert!(constrained.contains("exit category"));
        assert!(constrained.contains("[Issues]\nchurn up 2%"));

        let open = PromptRequest::GenerateProposals {
            issues: "churn up 2%",
            category: ProposalCategory::Auto,
        }
        .render();
        assert!(!open.contains("category"));
    }

    #[test]
    fn review_prompt_appends_operator_constraints_verbatim() {
        let prompt = PromptRequest::ReviewProposals {
            proposals: "A, B, C",
            internal_summary: "revenue up",
            external_summary: "",
            constraints: Some("Budget capped at 100M per year; low risk preferred"),
        }
        .render();
        assert!(prompt.contains("Budget capped at 100M per year; low risk preferred"));
        assert!(prompt.contains(NO_EXTERNAL_INFORMATION));

        let without = PromptRequest::ReviewProposals {
            proposals: "A",
            internal_summary: "revenue up",
            external_summary: "market grows",
            constraints: Some("   "),
        }
        .render();
        assert!(!without.contains("Additional conditions"));
    }

    #[test]
    fn synthesis_prompt_lists_non_empty_document_summaries() {
        let summaries = vec!["Demand grows 4%.".to_string(), "  ".to_string()];
        let prompt = PromptRequest::SynthesizeBrief {
            internal_summary: None,
            document_summaries: &summaries,
        }
        .render();
        assert!(prompt.contains("- Demand grows 4%."));
        assert!(prompt.contains(INTERNAL_SUMMARY_PLACEHOLDER));
        assert!(prompt.contains("contradiction conditionally"));
        let section = prompt
            .split("[External summaries (1-3 sentences per source)]\n")
            .nth(1)
            .expect("external section");
        assert_eq!(section.trim(), "- Demand grows 4%.");
    }

    #[test]
    fn templates_carry_fixed_temperatures_within_unit_range() {
        let request = PromptRequest::SummarizeInternal { data: "x" };
        assert_eq!(request.template(), PromptTemplate::SummarizeInternal);
        assert!((request.temperature() - 0.3).abs() < f32::EPSILON);
        let proposals = PromptRequest::GenerateProposals {
            issues: "x",
            category: ProposalCategory::Auto,
        };
        assert!((proposals.temperature() - 0.6).abs() < f32::EPSILON);
    }

    #[test]
    fn document_prompt_reports_clipped_length() {
        let prompt = PromptRequest::SummarizeDocument { text: "abcde" }.render();
        assert!(prompt.contains("first 5 characters"));
    }
}
