//! Scripted collaborators shared by the unit suites.

use std::collections::HashMap;
use std::sync::Mutex;

use crate::error::{ConsultError, GenerationFailureKind, Result};
use crate::generation::TextGenerator;
use crate::research::{FetchedPage, PageFetcher, UrlResolver};

type Script = Box<dyn Fn(&str) -> Result<String> + Send + Sync>;

/// Generator answering each prompt through a closure and recording every call.
pub(crate) struct ScriptedGenerator {
    script: Script,
    calls: Mutex<Vec<(String, f32)>>,
}

impl ScriptedGenerator {
    pub(crate) fn new(script: impl Fn(&str) -> Result<String> + Send + Sync + 'static) -> Self {
        Self {
            script: Box::new(script),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub(crate) fn fixed(reply: &str) -> Self {
        let reply = reply.to_string();
        Self::new(move |_| Ok(reply.clone()))
    }

    pub(crate) fn failing() -> Self {
        Self::new(|_| Err(transient("upstream unavailable")))
    }

    pub(crate) fn prompts(&self) -> Vec<String> {
        self.calls
            .lock()
            .expect("calls lock")
            .iter()
            .map(|(prompt, _)| prompt.clone())
            .collect()
    }

    pub(crate) fn call_count(&self) -> usize {
        self.calls.lock().expect("calls lock").len()
    }
}

impl TextGenerator for ScriptedGenerator {
    fn generate(&self, prompt: &str, temperature: f32) -> Result<String> {
        self.calls
            .lock()
            .expect("calls lock")
            .push((prompt.to_string(), temperature));
        (self.script)(prompt)
    }
}

pub(crate) fn transient(message: &str) -> ConsultError {
    ConsultError::generation(GenerationFailureKind::Transient, message)
}

#[derive(Default)]
pub(crate) struct StaticResolver {
    results: HashMap<String, Vec<String>>,
}

impl StaticResolver {
    pub(crate) fn with(mut self, query: &str, urls: &[&str]) -> Self {
        self.results.insert(
            query.to_string(),
            urls.iter().map(ToString::to_string).collect(),
        );
        self
    }
}

impl UrlResolver for StaticResolver {
    fn resolve_urls(&self, query: &str, max_results: usize) -> Vec<String> {
        self.results
            .get(query)
            .map(|urls| urls.iter().take(max_results).cloned().collect())
            .unwrap_or_default()
    }
}

#[derive(Default)]
pub(crate) struct StaticFetcher {
    pages: HashMap<String, FetchedPage>,
}

impl StaticFetcher {
    pub(crate) fn html(mut self, url: &str, body: &str) -> Self {
        self.pages.insert(
            url.to_string(),
            FetchedPage {
                status: 200,
                content_type: Some("text/html; charset=utf-8".to_string()),
                body: body.as_bytes().to_vec(),
            },
        );
        self
    }

    pub(crate) fn status(mut self, url: &str, status: u16) -> Self {
        self.pages.insert(
            url.to_string(),
            FetchedPage {
                status,
                content_type: Some("text/html".to_string()),
                body: Vec::new(),
            },
        );
        self
    }
}

impl PageFetcher for StaticFetcher {
    fn fetch(&self, url: &str) -> Result<FetchedPage> {
        self.pages
            .get(url)
            .cloned()
            .ok_or_else(|| ConsultError::Internal(format!("connection refused: {url}")))
    }
}
