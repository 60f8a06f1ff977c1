use std::sync::Arc;

use super::*;
use crate::config::ResearchConfig;
use crate::test_support::{ScriptedGenerator, StaticFetcher, StaticResolver, transient};

fn config(parallelism: usize) -> ResearchConfig {
    ResearchConfig {
        search_label: "Test search".to_string(),
        fetch_parallelism: parallelism,
        ..ResearchConfig::default()
    }
}

fn aggregator(
    generator: Arc<ScriptedGenerator>,
    resolver: StaticResolver,
    fetcher: StaticFetcher,
    parallelism: usize,
) -> ResearchAggregator {
    ResearchAggregator::new(
        generator,
        Arc::new(resolver),
        Arc::new(fetcher),
        &config(parallelism),
    )
}

// Answers by template so the same generator serves every aggregation step.
fn by_template(prompt: &str) -> crate::error::Result<String> {
    if prompt.starts_with("Summarize the following document body") {
        let body = prompt.rsplit("characters)]\n").next().unwrap_or_default();
        Ok(format!("Synopsis of {}", body.trim()))
    } else if prompt.starts_with("Infer what the page") {
        Ok("Gloss from title".to_string())
    } else if prompt.starts_with("Combine the internal summary") {
        Ok("Combined brief".to_string())
    } else {
        Err(transient("unexpected prompt"))
    }
}

#[test]
fn suggest_queries_always_returns_exactly_three() {
    let cases = [
        ("", fallback_queries()),
        (
            "EV battery supply",
            vec![
                "EV battery supply".to_string(),
                QUERY_PADDING.to_string(),
                QUERY_PADDING.to_string(),
            ],
        ),
        (
            "1. retail demand\n2. churn benchmarks\n\n- saas pricing\n4. extra one\n5. extra two",
            vec![
                "retail demand".to_string(),
                "churn benchmarks".to_string(),
                "saas pricing".to_string(),
            ],
        ),
    ];
    for (reply, expected) in cases {
        let generator = Arc::new(ScriptedGenerator::fixed(reply));
        let research = aggregator(
            generator,
            StaticResolver::default(),
            StaticFetcher::default(),
            1,
        );
        let queries = research.suggest_queries("Q1 revenue up 5%");
        assert_eq!(queries, expected, "reply {reply:?}");
        assert!(queries.iter().all(|query| !query.trim().is_empty()));
    }
}

#[test]
fn suggest_queries_falls_back_when_generation_fails() {
    let research = aggregator(
        Arc::new(ScriptedGenerator::failing()),
        StaticResolver::default(),
        StaticFetcher::default(),
        1,
    );
    assert_eq!(research.suggest_queries("anything"), fallback_queries());
}

#[test]
fn zero_urls_yield_single_fallback_card_and_marker() {
    let generator = Arc::new(ScriptedGenerator::new(by_template));
    let research = aggregator(
        Arc::clone(&generator),
        StaticResolver::default(),
        StaticFetcher::default(),
        2,
    );
    let bundle = research.aggregate_search("retail demand", 5);
    assert_eq!(bundle.cards.len(), 1);
    assert_eq!(bundle.cards[0].source_label, FALLBACK_SOURCE_LABEL);
    assert_eq!(bundle.cards[0].title, "Reference (retail demand)");
    assert_eq!(bundle.synthesis, NO_EXTERNAL_SUMMARY);
    assert_eq!(generator.call_count(), 0);
}

#[test]
fn cards_follow_resolver_order_across_parallel_batches() {
    let urls = [
        "https://a.example/1",
        "https://b.example/2",
        "https://c.example/3",
        "https://d.example/4",
        "https://e.example/5",
    ];
    let mut fetcher = StaticFetcher::default();
    for (idx, url) in urls.iter().enumerate() {
        fetcher = fetcher.html(
            url,
            &format!("<title>Page {idx}</title><p>Body {idx}</p>"),
        );
    }
    let generator = Arc::new(ScriptedGenerator::new(by_template));
    let research = aggregator(
        Arc::clone(&generator),
        StaticResolver::default().with("retail", &urls),
        fetcher,
        2,
    );

    let bundle = research.aggregate_search_with_context("retail", 5, Some("Q1 revenue up 5%"));
    let titles = bundle
        .cards
        .iter()
        .map(|card| card.title.as_str())
        .collect::<Vec<_>>();
    assert_eq!(titles, ["Page 0", "Page 1", "Page 2", "Page 3", "Page 4"]);
    assert!(bundle.cards.iter().all(|card| card.source_label == "Test search"));
    assert_eq!(bundle.cards[3].synopsis, "Synopsis of Page 3\nBody 3");
    assert_eq!(bundle.synthesis, "Combined brief");

    // Synthesis is the last call and sees every synopsis plus the internal summary.
    let prompts = generator.prompts();
    let last = prompts.last().expect("synthesis prompt");
    assert!(last.starts_with("Combine the internal summary"));
    assert!(last.contains("Q1 revenue up 5%"));
    for idx in 0..5 {
        assert!(last.contains(&format!("- Synopsis of Page {idx}")));
    }
}

#[test]
fn max_results_caps_resolved_urls() {
    let generator = Arc::new(ScriptedGenerator::new(by_template));
    let research = aggregator(
        generator,
        StaticResolver::default().with(
            "q",
            &["https://a.example", "https://b.example", "https://c.example"],
        ),
        StaticFetcher::default(),
        1,
    );
    assert_eq!(research.aggregate_search("q", 2).cards.len(), 2);
}

#[test]
fn unreachable_or_empty_pages_fall_back_to_title_gloss() {
    let generator = Arc::new(ScriptedGenerator::new(by_template));
    let research = aggregator(
        generator,
        StaticResolver::default().with(
            "q",
            &[
                "https://down.example/report",
                "https://missing.example/404",
                "https://empty.example/",
            ],
        ),
        StaticFetcher::default()
            .status("https://missing.example/404", 404)
            .html("https://empty.example/", "<html><body><div>nav only</div></body></html>"),
        3,
    );
    let bundle = research.aggregate_search("q", 5);
    assert_eq!(bundle.cards.len(), 3);
    assert!(bundle.cards.iter().all(|card| card.synopsis == "Gloss from title"));
    assert_eq!(bundle.cards[0].title, "https://down.example/report");
    assert_eq!(bundle.cards[2].title, "https://empty.example/");
}

#[test]
fn failing_generator_degrades_every_step_without_erroring() {
    let generator = Arc::new(ScriptedGenerator::failing());
    let research = aggregator(
        generator,
        StaticResolver::default().with("q", &["https://a.example/x"]),
        StaticFetcher::default().html("https://a.example/x", "<p>Body</p>"),
        1,
    );
    let bundle = research.aggregate_search("q", 5);
    assert_eq!(bundle.cards.len(), 1);
    assert_eq!(
        bundle.cards[0].synopsis,
        "No synopsis available for https://a.example/x"
    );
    assert_eq!(
        bundle.synthesis,
        "- No synopsis available for https://a.example/x"
    );
}

#[test]
fn long_documents_are_clipped_before_summary() {
    let generator = Arc::new(ScriptedGenerator::new(by_template));
    let body = "x".repeat(20_000);
    let research = ResearchAggregator::new(
        Arc::clone(&generator) as Arc<dyn crate::generation::TextGenerator>,
        Arc::new(StaticResolver::default().with("q", &["https://long.example/"])),
        Arc::new(
            StaticFetcher::default().html("https://long.example/", &format!("<p>{body}</p>")),
        ),
        &ResearchConfig {
            max_extract_chars: 100,
            fetch_parallelism: 1,
            ..ResearchConfig::default()
        },
    );
    let _ = research.aggregate_search("q", 1);
    let summary_prompt = generator
        .prompts()
        .into_iter()
        .find(|prompt| prompt.starts_with("Summarize the following document body"))
        .expect("summary prompt");
    assert!(summary_prompt.contains("first 100 characters"));
    assert!(!summary_prompt.contains(&"x".repeat(101)));
}

#[test]
fn fallback_bundle_is_recognizable() {
    assert!(is_fallback_bundle(&fallback_bundle("q")));
    let mut real = fallback_bundle("q");
    real.synthesis = "Combined brief".to_string();
    assert!(!is_fallback_bundle(&real));
}
