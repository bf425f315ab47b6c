/*
[INPUT]:  JSON payloads produced by minink agents
[OUTPUT]: Log entry model and query parameters shared by HTTP and WebSocket layers
[POS]:    Data layer - wire types
[UPDATE]: When the agent changes its entry format or query parameters
*/

use serde::{Deserialize, Serialize};

/// One log line as served by an agent.
///
/// Fields are kept as the agent sent them; the viewer never rewrites them.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct LogEntry {
    pub timestamp: String,
    pub hostname: String,
    pub service: String,
    pub message: String,
}

/// Backlog window in microseconds since the Unix epoch, both bounds exclusive
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct TimeRange {
    #[serde(default)]
    pub start: Option<i64>,
    #[serde(default)]
    pub end: Option<i64>,
}

impl TimeRange {
    pub fn is_unbounded(&self) -> bool {
        self.start.is_none() && self.end.is_none()
    }
}

/// Filter values forwarded to the agent as query parameters.
///
/// `services` and `message_keywords` are comma separated lists interpreted
/// by the agent; they are passed through verbatim.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct LogQuery {
    #[serde(default)]
    pub services: String,
    #[serde(default)]
    pub message_keywords: String,
    #[serde(default)]
    pub time_range: TimeRange,
}

impl LogQuery {
    pub fn new(services: impl Into<String>, message_keywords: impl Into<String>) -> Self {
        Self {
            services: services.into(),
            message_keywords: message_keywords.into(),
            time_range: TimeRange::default(),
        }
    }

    pub fn with_time_range(mut self, time_range: TimeRange) -> Self {
        self.time_range = time_range;
        self
    }
}
