//! External research: query suggestion and multi-source search aggregation.
//!
//! Both entry points are tolerant by contract. `suggest_queries` always yields
//! three queries and `aggregate_search` always yields at least one card; every
//! degraded path logs a warning and substitutes a fixed fallback instead of
//! failing the caller.

mod fetch;
mod html;
mod search;

use std::sync::Arc;

use tracing::{info, warn};

use crate::config::ResearchConfig;
use crate::error::Result;
use crate::generation::{PromptRequest, TextGenerator, dispatch};
use crate::ingest::pdf_text;
use crate::models::{SearchBundle, SourceCard};
use crate::text::{clip_chars, strip_list_marker, truncate_text};

pub use fetch::{FetchedPage, HttpPageFetcher, PageFetcher};
pub use html::{ExtractedPage, decode_entities, extract_html};
pub use search::{HttpUrlResolver, UrlResolver};

pub const QUERY_COUNT: usize = 3;
pub const QUERY_PADDING: &str = "market trends";
pub const FALLBACK_QUERIES: [&str; QUERY_COUNT] =
    ["industry trends", "competitor analysis", "growth strategy"];

pub const NO_EXTERNAL_SUMMARY: &str = "No external summary";
pub const FALLBACK_SOURCE_LABEL: &str = "Fallback";
pub const FALLBACK_URL: &str = "https://www.wikipedia.org/";
pub const FALLBACK_SNIPPET: &str =
    "No search results were retrieved. Continuing with internal data only.";

const CARD_TITLE_MAX_CHARS: usize = 80;

pub struct ResearchAggregator {
    generator: Arc<dyn TextGenerator>,
    resolver: Arc<dyn UrlResolver>,
    fetcher: Arc<dyn PageFetcher>,
    source_label: String,
    max_results: usize,
    max_extract_chars: usize,
    fetch_parallelism: usize,
}

impl std::fmt::Debug for ResearchAggregator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResearchAggregator")
            .field("source_label", &self.source_label)
            .field("max_results", &self.max_results)
            .field("max_extract_chars", &self.max_extract_chars)
            .field("fetch_parallelism", &self.fetch_parallelism)
            .finish_non_exhaustive()
    }
}

impl ResearchAggregator {
    pub fn new(
        generator: Arc<dyn TextGenerator>,
        resolver: Arc<dyn UrlResolver>,
        fetcher: Arc<dyn PageFetcher>,
        config: &ResearchConfig,
    ) -> Self {
        Self {
            generator,
            resolver,
            fetcher,
            source_label: config.search_label.clone(),
            max_results: config.max_results.max(1),
            max_extract_chars: config.max_extract_chars.max(1),
            fetch_parallelism: config.fetch_parallelism.max(1),
        }
    }

    /// Aggregator backed by the HTTP search and fetch adapters.
    pub fn from_config(generator: Arc<dyn TextGenerator>, config: &ResearchConfig) -> Result<Self> {
        let resolver = HttpUrlResolver::new(config)?;
        let fetcher = HttpPageFetcher::new(config)?;
        Ok(Self::new(
            generator,
            Arc::new(resolver),
            Arc::new(fetcher),
            config,
        ))
    }

    /// Top-k used when the caller executes queries without an explicit cap.
    #[must_use]
    pub const fn max_results(&self) -> usize {
        self.max_results
    }

    #[must_use]
    pub fn suggest_queries(&self, summary: &str) -> Vec<String> {
        match dispatch(self.generator.as_ref(), &PromptRequest::SuggestQueries { summary }) {
            Ok(raw) => normalize_queries(&raw),
            Err(err) => {
                warn!(error = %err, "query suggestion failed; using fallback queries");
                fallback_queries()
            }
        }
    }

    #[must_use]
    pub fn aggregate_search(&self, query: &str, max_results: usize) -> SearchBundle {
        self.aggregate_search_with_context(query, max_results, None)
    }

    #[must_use]
    pub fn aggregate_search_with_context(
        &self,
        query: &str,
        max_results: usize,
        internal_summary: Option<&str>,
    ) -> SearchBundle {
        let urls = search::dedupe_capped(self.resolver.resolve_urls(query, max_results), max_results);
        if urls.is_empty() {
            warn!(query, "search resolved no sources; using fallback card");
            return fallback_bundle(query);
        }

        let cards = self.collect_cards(&urls);
        let synopses = cards
            .iter()
            .map(|card| card.synopsis.clone())
            .collect::<Vec<_>>();
        let synthesis = self.synthesize(&synopses, internal_summary);
        info!(query, cards = cards.len(), "search aggregated");
        SearchBundle { cards, synthesis }
    }

    // Per-URL work runs in scoped batches; every batch is joined before synthesis.
    fn collect_cards(&self, urls: &[String]) -> Vec<SourceCard> {
        let parallelism = self.fetch_parallelism.clamp(1, urls.len().max(1));
        if parallelism <= 1 {
            return urls.iter().map(|url| self.build_card(url)).collect();
        }

        let mut indexed = Vec::<(usize, SourceCard)>::with_capacity(urls.len());
        for (batch_idx, batch) in urls.chunks(parallelism).enumerate() {
            let base = batch_idx * parallelism;
            let mut batch_cards = std::thread::scope(|scope| {
                let handles = batch
                    .iter()
                    .enumerate()
                    .map(|(offset, url)| {
                        (base + offset, url, scope.spawn(move || self.build_card(url)))
                    })
                    .collect::<Vec<_>>();
                handles
                    .into_iter()
                    .map(|(index, url, handle)| {
                        let card = handle.join().unwrap_or_else(|_| {
                            warn!(url = %url, "source worker panicked");
                            self.card(url, truncate_text(url, CARD_TITLE_MAX_CHARS), no_synopsis(url))
                        });
                        (index, card)
                    })
                    .collect::<Vec<_>>()
            });
            indexed.append(&mut batch_cards);
        }

        indexed.sort_by_key(|(index, _)| *index);
        indexed.into_iter().map(|(_, card)| card).collect()
    }

    fn build_card(&self, url: &str) -> SourceCard {
        let page = self.fetch_page(url);
        let title = page
            .as_ref()
            .and_then(|page| page.title.as_deref())
            .map_or_else(
                || truncate_text(url, CARD_TITLE_MAX_CHARS),
                |title| truncate_text(title, CARD_TITLE_MAX_CHARS),
            );
        let synopsis = match page.as_ref().map(|page| page.text.trim()) {
            Some(text) if !text.is_empty() => self.summarize_document(url, &title, text),
            _ => self.gloss(url, &title),
        };
        self.card(url, title, synopsis)
    }

    fn card(&self, url: &str, title: String, synopsis: String) -> SourceCard {
        SourceCard {
            title,
            source_label: self.source_label.clone(),
            url: url.to_string(),
            synopsis,
        }
    }

    fn fetch_page(&self, url: &str) -> Option<ExtractedPage> {
        let fetched = match self.fetcher.fetch(url) {
            Ok(fetched) => fetched,
            Err(err) => {
                warn!(url, error = %err, "fetch failed");
                return None;
            }
        };
        if !fetched.is_success() {
            warn!(url, status = fetched.status, "fetch returned non-success status");
            return None;
        }

        let page = if fetched.is_pdf(url) {
            match pdf_text(&fetched.body, None) {
                Ok(text) => ExtractedPage { title: None, text },
                Err(err) => {
                    warn!(url, error = %err, "pdf extraction failed");
                    return None;
                }
            }
        } else {
            extract_html(&String::from_utf8_lossy(&fetched.body))
        };
        if page.text.trim().is_empty() {
            warn!(url, "page yielded no extractable text");
        }
        Some(page)
    }

    fn summarize_document(&self, url: &str, title: &str, text: &str) -> String {
        let clipped = clip_chars(text, self.max_extract_chars);
        match dispatch(
            self.generator.as_ref(),
            &PromptRequest::SummarizeDocument { text: clipped },
        ) {
            Ok(summary) if !summary.trim().is_empty() => summary.trim().to_string(),
            Ok(_) => {
                warn!(url, "document summary was empty; falling back to title gloss");
                self.gloss(url, title)
            }
            Err(err) => {
                warn!(url, error = %err, "document summary failed; falling back to title gloss");
                self.gloss(url, title)
            }
        }
    }

    fn gloss(&self, url: &str, title: &str) -> String {
        match dispatch(self.generator.as_ref(), &PromptRequest::GlossTitle { title }) {
            Ok(gloss) if !gloss.trim().is_empty() => gloss.trim().to_string(),
            Ok(_) => no_synopsis(url),
            Err(err) => {
                warn!(url, error = %err, "title gloss failed");
                no_synopsis(url)
            }
        }
    }

    fn synthesize(&self, synopses: &[String], internal_summary: Option<&str>) -> String {
        let request = PromptRequest::SynthesizeBrief {
            internal_summary,
            document_summaries: synopses,
        };
        match dispatch(self.generator.as_ref(), &request) {
            Ok(brief) if !brief.trim().is_empty() => brief.trim().to_string(),
            Ok(_) => {
                warn!("synthesis was empty; listing source synopses");
                bullet_list(synopses)
            }
            Err(err) => {
                warn!(error = %err, "synthesis failed; listing source synopses");
                bullet_list(synopses)
            }
        }
    }
}

/// Exactly three queries from raw generator output.
#[must_use]
pub fn normalize_queries(raw: &str) -> Vec<String> {
    let mut queries = raw
        .lines()
        .map(strip_list_marker)
        .filter(|line| !line.is_empty())
        .map(ToString::to_string)
        .take(QUERY_COUNT)
        .collect::<Vec<_>>();
    if queries.is_empty() {
        warn!("query suggestion returned nothing usable; using fallback queries");
        return fallback_queries();
    }
    queries.resize(QUERY_COUNT, QUERY_PADDING.to_string());
    queries
}

#[must_use]
pub fn fallback_queries() -> Vec<String> {
    FALLBACK_QUERIES.iter().map(ToString::to_string).collect()
}

#[must_use]
pub fn fallback_bundle(query: &str) -> SearchBundle {
    SearchBundle {
        cards: vec![SourceCard {
            title: format!("Reference ({query})"),
            source_label: FALLBACK_SOURCE_LABEL.to_string(),
            url: FALLBACK_URL.to_string(),
            synopsis: FALLBACK_SNIPPET.to_string(),
        }],
        synthesis: NO_EXTERNAL_SUMMARY.to_string(),
    }
}

/// True for the bundle produced when a query resolved no source at all.
#[must_use]
pub fn is_fallback_bundle(bundle: &SearchBundle) -> bool {
    bundle.synthesis == NO_EXTERNAL_SUMMARY
        && matches!(
            bundle.cards.as_slice(),
            [card] if card.source_label == FALLBACK_SOURCE_LABEL && card.url == FALLBACK_URL
        )
}

fn no_synopsis(url: &str) -> String {
    format!("No synopsis available for {url}")
}

fn bullet_list(items: &[String]) -> String {
    items
        .iter()
        .map(|item| item.trim())
        .filter(|item| !item.is_empty())
        .map(|item| format!("- {item}"))
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests;
