mod env;
mod generation;
mod research;

pub use generation::{
    DEFAULT_LLM_ENDPOINT, DEFAULT_LLM_MODEL, DEFAULT_LLM_TIMEOUT_MS, GenerationConfig,
};
pub use research::{
    DEFAULT_FETCH_TIMEOUT_MS, DEFAULT_MAX_EXTRACT_CHARS, DEFAULT_SEARCH_LABEL,
    DEFAULT_SEARCH_MAX_RESULTS, MAX_FETCH_PARALLELISM, ResearchConfig,
};

#[derive(Debug, Clone, Default)]
pub struct AppConfig {
    pub generation: GenerationConfig,
    pub research: ResearchConfig,
}

impl AppConfig {
    #[must_use]
    pub fn from_env() -> Self {
        Self {
            generation: GenerationConfig::from_env(),
            research: ResearchConfig::from_env(),
        }
    }
}
