use super::env::{read_env_u32, read_env_u64, read_non_empty_env};

const ENV_LLM_ENDPOINT: &str = "CONSULTFLOW_LLM_ENDPOINT";
const ENV_LLM_MODEL: &str = "CONSULTFLOW_LLM_MODEL";
const ENV_LLM_API_KEY: &str = "CONSULTFLOW_LLM_API_KEY";
const ENV_OPENAI_API_KEY: &str = "OPENAI_API_KEY";
const ENV_LLM_TIMEOUT_MS: &str = "CONSULTFLOW_LLM_TIMEOUT_MS";
const ENV_LLM_MAX_OUTPUT_TOKENS: &str = "CONSULTFLOW_LLM_MAX_OUTPUT_TOKENS";

pub const DEFAULT_LLM_ENDPOINT: &str = "https://api.openai.com/v1/chat/completions";
pub const DEFAULT_LLM_MODEL: &str = "gpt-4o-mini";
pub const DEFAULT_LLM_TIMEOUT_MS: u64 = 60_000;
const MIN_TIMEOUT_MS: u64 = 200;

#[derive(Clone)]
pub struct GenerationConfig {
    pub endpoint: String,
    pub model: String,
    pub api_key: Option<String>,
    pub timeout_ms: u64,
    pub max_output_tokens: Option<u32>,
}

impl std::fmt::Debug for GenerationConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GenerationConfig")
            .field("endpoint", &self.endpoint)
            .field("model", &self.model)
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("timeout_ms", &self.timeout_ms)
            .field("max_output_tokens", &self.max_output_tokens)
            .finish()
    }
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_LLM_ENDPOINT.to_string(),
            model: DEFAULT_LLM_MODEL.to_string(),
            api_key: None,
            timeout_ms: DEFAULT_LLM_TIMEOUT_MS,
            max_output_tokens: None,
        }
    }
}

impl GenerationConfig {
    #[must_use]
    pub(super) fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            endpoint: read_non_empty_env(ENV_LLM_ENDPOINT).unwrap_or(defaults.endpoint),
            model: read_non_empty_env(ENV_LLM_MODEL).unwrap_or(defaults.model),
            api_key: read_non_empty_env(ENV_LLM_API_KEY)
                .or_else(|| read_non_empty_env(ENV_OPENAI_API_KEY)),
            timeout_ms: read_env_u64(ENV_LLM_TIMEOUT_MS)
                .filter(|value| *value >= MIN_TIMEOUT_MS)
                .unwrap_or(defaults.timeout_ms),
            max_output_tokens: read_env_u32(ENV_LLM_MAX_OUTPUT_TOKENS).filter(|value| *value > 0),
        }
    }
}
