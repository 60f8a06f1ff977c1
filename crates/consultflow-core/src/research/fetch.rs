use std::io::{self, Read};
use std::time::Duration;

use reqwest::blocking::Client;
use reqwest::header::{CONTENT_TYPE, USER_AGENT};
use tracing::debug;

use crate::config::ResearchConfig;
use crate::error::Result;

const BROWSER_USER_AGENT: &str =
    "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0 Safari/537.36";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchedPage {
    pub status: u16,
    pub content_type: Option<String>,
    pub body: Vec<u8>,
}

impl FetchedPage {
    #[must_use]
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// PDF by URL suffix or by declared content type.
    #[must_use]
    pub fn is_pdf(&self, url: &str) -> bool {
        let path = url.split(['?', '#']).next().unwrap_or(url);
        path.to_ascii_lowercase().ends_with(".pdf")
            || self
                .content_type
                .as_deref()
                .is_some_and(|value| value.to_ascii_lowercase().contains("pdf"))
    }
}

pub trait PageFetcher: Send + Sync {
    fn fetch(&self, url: &str) -> Result<FetchedPage>;
}

#[derive(Debug, Clone)]
pub struct HttpPageFetcher {
    client: Client,
    max_body_bytes: usize,
}

impl HttpPageFetcher {
    pub fn new(config: &ResearchConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_millis(config.fetch_timeout_ms))
            .build()?;
        Ok(Self {
            client,
            max_body_bytes: config.fetch_max_bytes.max(1),
        })
    }
}

impl PageFetcher for HttpPageFetcher {
    fn fetch(&self, url: &str) -> Result<FetchedPage> {
        let response = self
            .client
            .get(url)
            .header(USER_AGENT, BROWSER_USER_AGENT)
            .send()?;
        let status = response.status().as_u16();
        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .map(ToString::to_string);
        let body = read_capped(response, self.max_body_bytes)?;
        if body.len() == self.max_body_bytes {
            debug!(url, limit = self.max_body_bytes, "response body capped");
        }
        Ok(FetchedPage {
            status,
            content_type,
            body,
        })
    }
}

/// Reads at most `limit` bytes and drops the remainder of the stream.
fn read_capped<R: Read>(reader: R, limit: usize) -> io::Result<Vec<u8>> {
    let mut body = Vec::new();
    reader
        .take(u64::try_from(limit).unwrap_or(u64::MAX))
        .read_to_end(&mut body)?;
    Ok(body)
}
