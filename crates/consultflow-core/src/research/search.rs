use std::collections::HashSet;
use std::time::Duration;

use reqwest::Url;
use reqwest::blocking::Client;
use serde_json::Value;
use tracing::warn;

use crate::config::ResearchConfig;
use crate::error::{ConsultError, Result};
use crate::llm_io::{extract_result_urls, parse_http_endpoint};

/// Resolves a query to at most `max_results` source URLs.
///
/// Failures are absorbed: an unreachable or misbehaving search backend yields
/// an empty list, never an error.
pub trait UrlResolver: Send + Sync {
    fn resolve_urls(&self, query: &str, max_results: usize) -> Vec<String>;
}

/// JSON web-search backend queried with `?q=&format=json&count=`.
#[derive(Clone)]
pub struct HttpUrlResolver {
    client: Client,
    endpoint: Option<Url>,
    api_key: Option<String>,
}

impl std::fmt::Debug for HttpUrlResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpUrlResolver")
            .field("endpoint", &self.endpoint.as_ref().map(Url::as_str))
            .finish_non_exhaustive()
    }
}

impl HttpUrlResolver {
    pub fn new(config: &ResearchConfig) -> Result<Self> {
        let endpoint = config
            .search_endpoint
            .as_deref()
            .map(|raw| parse_http_endpoint(raw, "search endpoint"))
            .transpose()
            .map_err(ConsultError::Validation)?;
        let client = Client::builder()
            .timeout(Duration::from_millis(config.fetch_timeout_ms))
            .build()?;
        Ok(Self {
            client,
            endpoint,
            api_key: config.search_api_key.clone(),
        })
    }

    fn search_url(endpoint: &Url, query: &str, max_results: usize) -> Url {
        let mut url = endpoint.clone();
        url.query_pairs_mut()
            .append_pair("q", query)
            .append_pair("format", "json")
            .append_pair("count", &max_results.to_string());
        url
    }

    fn try_resolve(&self, endpoint: &Url, query: &str, max_results: usize) -> Result<Vec<String>> {
        let mut request = self
            .client
            .get(Self::search_url(endpoint, query, max_results))
            .header(reqwest::header::ACCEPT, "application/json");
        if let Some(api_key) = &self.api_key {
            request = request.bearer_auth(api_key);
        }
        let value = request.send()?.error_for_status()?.json::<Value>()?;
        Ok(dedupe_capped(extract_result_urls(&value), max_results))
    }
}

impl UrlResolver for HttpUrlResolver {
    fn resolve_urls(&self, query: &str, max_results: usize) -> Vec<String> {
        let Some(endpoint) = &self.endpoint else {
            warn!(query, "no search endpoint configured; resolving no sources");
            return Vec::new();
        };
        match self.try_resolve(endpoint, query, max_results) {
            Ok(urls) => urls,
            Err(err) => {
                warn!(query, error = %err, "search failed; continuing without sources");
                Vec::new()
            }
        }
    }
}

pub(crate) fn dedupe_capped(urls: Vec<String>, max_results: usize) -> Vec<String> {
    let mut seen = HashSet::new();
    urls.into_iter()
        .filter(|url| seen.insert(url.clone()))
        .take(max_results)
        .collect()
}
