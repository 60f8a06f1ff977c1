use super::env::{read_env_u64, read_env_usize, read_non_empty_env};

const ENV_SEARCH_ENDPOINT: &str = "CONSULTFLOW_SEARCH_ENDPOINT";
const ENV_SEARCH_API_KEY: &str = "CONSULTFLOW_SEARCH_API_KEY";
const ENV_SEARCH_LABEL: &str = "CONSULTFLOW_SEARCH_LABEL";
const ENV_FETCH_TIMEOUT_MS: &str = "CONSULTFLOW_FETCH_TIMEOUT_MS";
const ENV_SEARCH_MAX_RESULTS: &str = "CONSULTFLOW_SEARCH_MAX_RESULTS";
const ENV_FETCH_PARALLELISM: &str = "CONSULTFLOW_FETCH_PARALLELISM";
const ENV_MAX_EXTRACT_CHARS: &str = "CONSULTFLOW_MAX_EXTRACT_CHARS";
const ENV_FETCH_MAX_BYTES: &str = "CONSULTFLOW_FETCH_MAX_BYTES";

pub const DEFAULT_SEARCH_LABEL: &str = "Web search";
pub const DEFAULT_FETCH_TIMEOUT_MS: u64 = 15_000;
pub const DEFAULT_SEARCH_MAX_RESULTS: usize = 5;
pub const DEFAULT_MAX_EXTRACT_CHARS: usize = 8_000;
pub const MAX_FETCH_PARALLELISM: usize = 4;
pub const DEFAULT_FETCH_MAX_BYTES: usize = 8 * 1024 * 1024;
const MIN_FETCH_MAX_BYTES: usize = 64 * 1024;
const MIN_TIMEOUT_MS: u64 = 200;

#[derive(Clone)]
pub struct ResearchConfig {
    pub search_endpoint: Option<String>,
    pub search_api_key: Option<String>,
    pub search_label: String,
    pub fetch_timeout_ms: u64,
    pub max_results: usize,
    pub fetch_parallelism: usize,
    pub max_extract_chars: usize,
    /// Response bodies are read up to this many bytes; the rest is dropped.
    pub fetch_max_bytes: usize,
}

impl std::fmt::Debug for ResearchConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResearchConfig")
            .field("search_endpoint", &self.search_endpoint)
            .field(
                "search_api_key",
                &self.search_api_key.as_ref().map(|_| "<redacted>"),
            )
            .field("search_label", &self.search_label)
            .field("fetch_timeout_ms", &self.fetch_timeout_ms)
            .field("max_results", &self.max_results)
            .field("fetch_parallelism", &self.fetch_parallelism)
            .field("max_extract_chars", &self.max_extract_chars)
            .field("fetch_max_bytes", &self.fetch_max_bytes)
            .finish()
    }
}

impl Default for ResearchConfig {
    fn default() -> Self {
        Self {
            search_endpoint: None,
            search_api_key: None,
            search_label: DEFAULT_SEARCH_LABEL.to_string(),
            fetch_timeout_ms: DEFAULT_FETCH_TIMEOUT_MS,
            max_results: DEFAULT_SEARCH_MAX_RESULTS,
            fetch_parallelism: default_fetch_parallelism(),
            max_extract_chars: DEFAULT_MAX_EXTRACT_CHARS,
            fetch_max_bytes: DEFAULT_FETCH_MAX_BYTES,
        }
    }
}

impl ResearchConfig {
    #[must_use]
    pub(super) fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            search_endpoint: read_non_empty_env(ENV_SEARCH_ENDPOINT),
            search_api_key: read_non_empty_env(ENV_SEARCH_API_KEY),
            search_label: read_non_empty_env(ENV_SEARCH_LABEL).unwrap_or(defaults.search_label),
            fetch_timeout_ms: read_env_u64(ENV_FETCH_TIMEOUT_MS)
                .filter(|value| *value >= MIN_TIMEOUT_MS)
                .unwrap_or(defaults.fetch_timeout_ms),
            max_results: read_env_usize(ENV_SEARCH_MAX_RESULTS, defaults.max_results, 1),
            fetch_parallelism: read_env_usize(
                ENV_FETCH_PARALLELISM,
                defaults.fetch_parallelism,
                1,
            ),
            max_extract_chars: read_env_usize(
                ENV_MAX_EXTRACT_CHARS,
                defaults.max_extract_chars,
                1,
            ),
            fetch_max_bytes: read_env_usize(
                ENV_FETCH_MAX_BYTES,
                defaults.fetch_max_bytes,
                MIN_FETCH_MAX_BYTES,
            ),
        }
    }
}

fn default_fetch_parallelism() -> usize {
    std::thread::available_parallelism()
        .map(|value| value.get())
        .unwrap_or(MAX_FETCH_PARALLELISM)
        .clamp(1, MAX_FETCH_PARALLELISM)
}
