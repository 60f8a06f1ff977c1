use pulldown_cmark::{Event, Parser, Tag, TagEnd};
use serde::Serialize;

use crate::models::SlideHeading;

pub const SLIDES_FILENAME: &str = "slides.md";

/// Downloadable Markdown of the stored slide outline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SlideExport {
    pub filename: String,
    pub markdown: String,
}

impl SlideExport {
    #[must_use]
    pub fn new(markdown: &str) -> Self {
        Self {
            filename: SLIDES_FILENAME.to_string(),
            markdown: markdown.to_string(),
        }
    }

    #[must_use]
    pub fn headings(&self) -> Vec<SlideHeading> {
        let mut headings = Vec::new();
        let mut current: Option<(u8, String)> = None;
        for event in Parser::new(&self.markdown) {
            match event {
                Event::Start(Tag::Heading { level, .. }) => {
                    current = Some((level as u8, String::new()));
                }
                Event::Text(text) | Event::Code(text) => {
                    if let Some((_, title)) = current.as_mut() {
                        title.push_str(&text);
                    }
                }
                Event::End(TagEnd::Heading(_)) => {
                    if let Some((level, title)) = current.take() {
                        headings.push(SlideHeading {
                            level,
                            title: title.trim().to_string(),
                        });
                    }
                }
                _ => {}
            }
        }
        headings
    }

    #[cfg(feature = "markdown-preview")]
    #[must_use]
    pub fn to_html(&self) -> String {
        preview::render_markdown_html(&self.markdown)
    }
}

#[cfg(feature = "markdown-preview")]
mod preview {
    use pulldown_cmark::{CowStr, Event, Options, Parser, Tag, html};

    pub(super) fn render_markdown_html(content: &str) -> String {
        let mut options = Options::empty();
        options.insert(Options::ENABLE_TABLES);
        options.insert(Options::ENABLE_STRIKETHROUGH);

        let parser = Parser::new_ext(content, options).map(|event| match event {
            Event::Start(Tag::Link {
                link_type,
                dest_url,
                title,
                id,
            }) => Event::Start(Tag::Link {
                link_type,
                dest_url: sanitize_destination(dest_url),
                title,
                id,
            }),
            Event::Start(Tag::Image {
                link_type,
                title,
                id,
                ..
            }) => Event::Start(Tag::Image {
                link_type,
                dest_url: CowStr::from(""),
                title,
                id,
            }),
            Event::Html(raw) | Event::InlineHtml(raw) => {
                Event::Text(CowStr::from(raw.into_string()))
            }
            other => other,
        });

        let mut output = String::new();
        html::push_html(&mut output, parser);
        output
    }

    // Slides only ever link out to the web or to anchors.
    fn sanitize_destination(dest_url: CowStr<'_>) -> CowStr<'static> {
        let value = dest_url.into_string();
        let lower = value.trim().to_ascii_lowercase();
        let safe = lower.starts_with('#')
            || lower.starts_with("http://")
            || lower.starts_with("https://")
            || lower.starts_with("mailto:");
        if safe {
            CowStr::from(value)
        } else {
            CowStr::from("#")
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const OUTLINE: &str = "# Retail growth plan\n\n## Issue overview\n- Internal data\n\n## Proposed `initiatives`\n- Initiative 1\n";

    #[test]
    fn export_uses_fixed_filename_and_verbatim_markdown() {
        let export = SlideExport::new(OUTLINE);
        assert_eq!(export.filename, "slides.md");
        assert_eq!(export.markdown, OUTLINE);
    }

    #[test]
    fn headings_list_levels_and_titles_in_order() {
        let headings = SlideExport::new(OUTLINE).headings();
        assert_eq!(
            headings,
            vec![
                SlideHeading {
                    level: 1,
                    title: "Retail growth plan".to_string()
                },
                SlideHeading {
                    level: 2,
                    title: "Issue overview".to_string()
                },
                SlideHeading {
                    level: 2,
                    title: "Proposed initiatives".to_string()
                },
            ]
        );
    }

    #[cfg(feature = "markdown-preview")]
    #[test]
    fn html_preview_escapes_raw_html_and_neutralizes_script_links() {
        let export = SlideExport::new("# Plan\n<script>alert(1)</script>\n[bad](javascript:alert(1)) [ok](https://example.com)");
        let html = export.to_html();
        assert!(html.contains("<h1>Plan</h1>"));
        assert!(!html.contains("<script>"));
        assert!(html.contains("href=\"#\""));
        assert!(html.contains("href=\"https://example.com\""));
    }
}
