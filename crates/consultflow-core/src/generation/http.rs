use std::time::Duration;

use reqwest::Url;
use reqwest::blocking::Client;
use serde_json::Value;

use crate::config::GenerationConfig;
use crate::error::{ConsultError, GenerationFailureKind, Result, generation_status_kind};
use crate::llm_io::{extract_llm_content, parse_http_endpoint};

use super::{TextGenerator, validate_temperature};

/// OpenAI-compatible chat completion client.
#[derive(Clone)]
pub struct HttpTextGenerator {
    client: Client,
    endpoint: Url,
    model: String,
    api_key: Option<String>,
    max_output_tokens: Option<u32>,
}

impl std::fmt::Debug for HttpTextGenerator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpTextGenerator")
            .field("endpoint", &self.endpoint.as_str())
            .field("model", &self.model)
            .finish_non_exhaustive()
    }
}

impl HttpTextGenerator {
    pub fn new(config: &GenerationConfig) -> Result<Self> {
        let endpoint =
            parse_http_endpoint(&config.endpoint, "llm endpoint").map_err(ConsultError::Validation)?;
        let client = Client::builder()
            .timeout(Duration::from_millis(config.timeout_ms))
            .build()
            .map_err(|err| {
                ConsultError::generation(
                    GenerationFailureKind::Fatal,
                    format!("client build failed: {err}"),
                )
            })?;
        Ok(Self {
            client,
            endpoint,
            model: config.model.clone(),
            api_key: config.api_key.clone(),
            max_output_tokens: config.max_output_tokens,
        })
    }

    fn build_payload(&self, prompt: &str, temperature: f32) -> Value {
        let mut payload = serde_json::json!({
            "model": self.model,
            "messages": [
                {"role": "user", "content": prompt}
            ],
            "temperature": f64::from(temperature),
            "stream": false
        });
        if let Some(max_tokens) = self.max_output_tokens {
            payload["max_tokens"] = serde_json::json!(max_tokens);
        }
        payload
    }
}

impl TextGenerator for HttpTextGenerator {
    fn generate(&self, prompt: &str, temperature: f32) -> Result<String> {
        validate_temperature(temperature)?;
        let mut request = self
            .client
            .post(self.endpoint.clone())
            .json(&self.build_payload(prompt, temperature));
        if let Some(api_key) = &self.api_key {
            request = request.bearer_auth(api_key);
        }

        let response = request.send().map_err(transport_error)?;
        if !response.status().is_success() {
            let status = response.status();
            return Err(ConsultError::generation(
                generation_status_kind(status),
                format!("non-success status: {status}"),
            ));
        }
        let value = response.json::<Value>().map_err(|err| {
            ConsultError::generation(
                GenerationFailureKind::Schema,
                format!("invalid json response: {err}"),
            )
        })?;
        let content = extract_llm_content(&value).ok_or_else(|| {
            ConsultError::generation(
                GenerationFailureKind::Schema,
                "response carries no message content",
            )
        })?;
        Ok(content.trim().to_string())
    }
}

fn transport_error(err: reqwest::Error) -> ConsultError {
    if err.is_timeout() {
        ConsultError::generation(
            GenerationFailureKind::Transient,
            format!("request timed out: {err}"),
        )
    } else {
        ConsultError::generation(
            GenerationFailureKind::Transient,
            format!("request failed: {err}"),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> GenerationConfig {
        GenerationConfig {
            endpoint: "http://127.0.0.1:9/v1/chat/completions".to_string(),
            model: "test-model".to_string(),
            api_key: Some("secret".to_string()),
            timeout_ms: 500,
            max_output_tokens: Some(256),
        }
    }

    #[test]
    fn payload_carries_model_temperature_and_token_cap() {
        let generator = HttpTextGenerator::new(&config()).expect("generator");
        let payload = generator.build_payload("hello", 0.5);
        assert_eq!(payload["model"], "test-model");
        assert_eq!(payload["messages"][0]["content"], "hello");
        assert_eq!(payload["max_tokens"], 256);
        assert!((payload["temperature"].as_f64().expect("temperature") - 0.5).abs() < 1e-6);
    }

    #[test]
    fn new_rejects_non_http_endpoint() {
        let mut config = config();
        config.endpoint = "file:///etc/passwd".to_string();
        let err = HttpTextGenerator::new(&config).expect_err("must reject");
        assert!(matches!(err, ConsultError::Validation(_)));
    }

    #[test]
    fn generate_rejects_invalid_temperature_before_any_request() {
        let generator = HttpTextGenerator::new(&config()).expect("generator");
        let err = generator.generate("hello", 3.0).expect_err("must reject");
        assert!(matches!(err, ConsultError::Validation(_)));
    }

    #[test]
    fn debug_output_does_not_leak_api_key() {
        let generator = HttpTextGenerator::new(&config()).expect("generator");
        assert!(!format!("{generator:?}").contains("secret"));
    }
}
