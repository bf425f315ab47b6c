/*
[INPUT]:  HTTP configuration (timeouts), host base URLs, LogQuery
[OUTPUT]: Configured reqwest client and backlog extraction results
[POS]:    HTTP layer - backlog fetcher
[UPDATE]: When adding connection options or changing the extract call
*/

use reqwest::{Client, Url};
use std::time::Duration;
use tracing::debug;

use crate::endpoint::{EndpointKind, build_endpoint};
use crate::error::{ClientError, Result};
use crate::types::{LogEntry, LogQuery};

/// Largest error body kept in a status error
const ERROR_BODY_MAX_BYTES: usize = 512;

/// HTTP client configuration
#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub timeout: Duration,
    pub connect_timeout: Duration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(30),
            connect_timeout: Duration::from_secs(10),
        }
    }
}

/// One-shot backlog retrieval from minink agents.
///
/// A single instance is shared across hosts; every call targets the host it
/// is given.
#[derive(Debug, Clone)]
pub struct BacklogClient {
    http_client: Client,
}

impl BacklogClient {
    /// Create a new client with default configuration
    pub fn new() -> Result<Self> {
        Self::with_config(ClientConfig::default())
    }

    /// Create a new client with custom configuration
    pub fn with_config(config: ClientConfig) -> Result<Self> {
        let http_client = Client::builder()
            .timeout(config.timeout)
            .connect_timeout(config.connect_timeout)
            .build()?;

        Ok(Self { http_client })
    }

    /// Fetch the current backlog of `host` matching `query`.
    ///
    /// GET {host}/api/extract?services=..&message_keywords=..
    pub async fn fetch_backlog(&self, host: &str, query: &LogQuery) -> Result<Vec<LogEntry>> {
        let url = build_endpoint(host, EndpointKind::Backlog, query)?;
        self.fetch_url(url).await
    }

    /// Fetch a backlog from an already built extract URL
    pub async fn fetch_url(&self, url: Url) -> Result<Vec<LogEntry>> {
        debug!(url = %url, "fetching backlog");
        let response = self.http_client.get(url).send().await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ClientError::status_error(
                status,
                truncate_body(&body, ERROR_BODY_MAX_BYTES),
            ));
        }

        let bytes = response.bytes().await?;
        let entries: Vec<LogEntry> = serde_json::from_slice(&bytes)?;
        debug!(count = entries.len(), "backlog received");
        Ok(entries)
    }
}

fn truncate_body(body: &str, max_len: usize) -> String {
    if body.len() <= max_len {
        return body.to_string();
    }
    let mut end = max_len;
    while !body.is_char_boundary(end) {
        end -= 1;
    }
    let mut out = String::with_capacity(end + 3);
    out.push_str(&body[..end]);
    out.push_str("...");
    out
}
