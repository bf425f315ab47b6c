/*
[INPUT]:  YAML configuration file
[OUTPUT]: Parsed viewer configuration
[POS]:    Configuration layer - defaults under CLI overrides
[UPDATE]: When adding new configuration options
*/

use std::path::Path;
use std::time::Duration;

use anyhow::Context;
use minink_client::ClientConfig;
use serde::{Deserialize, Serialize};

/// Top-level configuration for the viewer
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct ViewerConfig {
    /// Agent base URLs, e.g. "https://host1:8080"
    #[serde(default)]
    pub hosts: Vec<String>,
    /// Comma separated service names
    #[serde(default)]
    pub services: String,
    #[serde(default)]
    pub message_keywords: String,
    /// Follow the tail when the view is at the bottom
    #[serde(default = "default_autoscroll")]
    pub autoscroll: bool,
    /// Quiet period before filter edits restart the session
    #[serde(default = "default_filter_debounce_ms")]
    pub filter_debounce_ms: u64,
    #[serde(default)]
    pub http: HttpConfig,
}

/// Backlog request timeouts
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct HttpConfig {
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default = "default_connect_timeout_secs")]
    pub connect_timeout_secs: u64,
}

impl Default for ViewerConfig {
    fn default() -> Self {
        Self {
            hosts: Vec::new(),
            services: String::new(),
            message_keywords: String::new(),
            autoscroll: default_autoscroll(),
            filter_debounce_ms: default_filter_debounce_ms(),
            http: HttpConfig::default(),
        }
    }
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            timeout_secs: default_timeout_secs(),
            connect_timeout_secs: default_connect_timeout_secs(),
        }
    }
}

fn default_autoscroll() -> bool {
    true
}

fn default_filter_debounce_ms() -> u64 {
    250
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_connect_timeout_secs() -> u64 {
    10
}

impl ViewerConfig {
    /// Load configuration from YAML file
    pub fn from_file(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config {}", path.display()))?;
        Self::from_yaml(&content)
            .with_context(|| format!("failed to parse config {}", path.display()))
    }

    pub fn from_yaml(content: &str) -> anyhow::Result<Self> {
        let config: Self = serde_yaml::from_str(content)?;
        Ok(config)
    }

    pub fn filter_debounce(&self) -> Duration {
        Duration::from_millis(self.filter_debounce_ms)
    }

    pub fn client_config(&self) -> ClientConfig {
        ClientConfig {
            timeout: Duration::from_secs(self.http.timeout_secs),
            connect_timeout: Duration::from_secs(self.http.connect_timeout_secs),
        }
    }
}
