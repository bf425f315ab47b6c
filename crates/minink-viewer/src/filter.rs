/*
[INPUT]:  Host list and filter text from CLI, config file, or TUI inputs
[OUTPUT]: FilterState snapshots and per-host endpoint URLs
[POS]:    Data layer - filter state read by the session manager
[UPDATE]: When adding filter fields or changing host normalization
*/

use minink_client::{EndpointKind, LogQuery, TimeRange, build_endpoint, normalize_host};
use url::Url;

use crate::error::SessionError;

/// Current filter values and target hosts.
///
/// Hosts keep their order and have trailing slashes stripped. The session
/// manager takes a clone of this for every session it starts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterState {
    hosts: Vec<String>,
    query: LogQuery,
}

impl FilterState {
    pub fn new<I, S>(hosts: I) -> Result<Self, SessionError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let hosts: Vec<String> = hosts
            .into_iter()
            .map(|host| normalize_host(host.as_ref()).to_string())
            .filter(|host| !host.is_empty())
            .collect();
        if hosts.is_empty() {
            return Err(SessionError::NoHosts);
        }
        Ok(Self {
            hosts,
            query: LogQuery::default(),
        })
    }

    pub fn with_services(mut self, services: impl Into<String>) -> Self {
        self.query.services = services.into();
        self
    }

    pub fn with_message_keywords(mut self, message_keywords: impl Into<String>) -> Self {
        self.query.message_keywords = message_keywords.into();
        self
    }

    pub fn with_time_range(mut self, time_range: TimeRange) -> Self {
        self.query.time_range = time_range;
        self
    }

    pub fn hosts(&self) -> &[String] {
        &self.hosts
    }

    pub fn services(&self) -> &str {
        &self.query.services
    }

    pub fn message_keywords(&self) -> &str {
        &self.query.message_keywords
    }

    pub fn query(&self) -> &LogQuery {
        &self.query
    }

    pub fn set_services(&mut self, services: impl Into<String>) {
        self.query.services = services.into();
    }

    pub fn set_message_keywords(&mut self, message_keywords: impl Into<String>) {
        self.query.message_keywords = message_keywords.into();
    }

    /// Endpoint of `kind` on `host` for the current filter values
    pub fn endpoint(&self, host: &str, kind: EndpointKind) -> Result<Url, SessionError> {
        build_endpoint(host, kind, &self.query).map_err(|source| SessionError::Configuration {
            host: host.to_string(),
            source,
        })
    }
}

/// Split a comma separated host list, as typed into the hosts field
pub fn parse_host_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|host| !host.is_empty())
        .map(str::to_string)
        .collect()
}

/// Parse an RFC 3339 timestamp into a backlog bound (microseconds since epoch)
pub fn parse_time_bound(raw: &str) -> Result<i64, String> {
    chrono::DateTime::parse_from_rfc3339(raw.trim())
        .map(|time| time.timestamp_micros())
        .map_err(|err| format!("invalid RFC 3339 timestamp {raw:?}: {err}"))
}
