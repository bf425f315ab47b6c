/*
[INPUT]:  Host base URL, endpoint kind, LogQuery filter values
[OUTPUT]: Fully qualified backlog (http/https) or stream (ws/wss) URLs
[POS]:    Endpoint layer - query building shared by HTTP and WebSocket clients
[UPDATE]: When agent routes or query parameters change
*/

use url::Url;

use crate::error::{ClientError, Result};
use crate::types::LogQuery;

pub const BACKLOG_PATH: &str = "/api/extract";
pub const STREAM_PATH: &str = "/ws/live";

/// Which agent endpoint to address
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EndpointKind {
    Backlog,
    Stream,
}

impl EndpointKind {
    pub fn path(self) -> &'static str {
        match self {
            EndpointKind::Backlog => BACKLOG_PATH,
            EndpointKind::Stream => STREAM_PATH,
        }
    }
}

/// Strip surrounding whitespace and every trailing slash so that
/// `host + "/path"` never produces a double slash.
pub fn normalize_host(host: &str) -> &str {
    host.trim().trim_end_matches('/')
}

/// Build the URL of `kind` on `host` for the given filter values.
///
/// Stream URLs use the WebSocket variant of the host scheme (`http -> ws`,
/// `https -> wss`). Filter parameters are only appended when non-empty.
pub fn build_endpoint(host: &str, kind: EndpointKind, query: &LogQuery) -> Result<Url> {
    let base = normalize_host(host);
    if base.is_empty() {
        return Err(ClientError::InvalidHost(host.to_string()));
    }

    let mut url = Url::parse(&format!("{base}{}", kind.path()))?;
    if url.cannot_be_a_base() || url.host_str().is_none() {
        return Err(ClientError::InvalidHost(host.to_string()));
    }

    let scheme = match kind {
        EndpointKind::Backlog => http_scheme(url.scheme()),
        EndpointKind::Stream => stream_scheme(url.scheme()),
    }
    .ok_or_else(|| ClientError::InvalidHost(host.to_string()))?;
    if url.scheme() != scheme {
        url.set_scheme(scheme)
            .map_err(|()| ClientError::InvalidHost(host.to_string()))?;
    }

    let params = query_params(kind, query);
    if !params.is_empty() {
        let mut pairs = url.query_pairs_mut();
        for (key, value) in &params {
            pairs.append_pair(key, value);
        }
    }

    Ok(url)
}

fn stream_scheme(scheme: &str) -> Option<&'static str> {
    match scheme {
        "http" | "ws" => Some("ws"),
        "https" | "wss" => Some("wss"),
        _ => None,
    }
}

fn http_scheme(scheme: &str) -> Option<&'static str> {
    match scheme {
        "http" | "ws" => Some("http"),
        "https" | "wss" => Some("https"),
        _ => None,
    }
}

fn query_params(kind: EndpointKind, query: &LogQuery) -> Vec<(&'static str, String)> {
    let mut params = Vec::new();
    if !query.services.is_empty() {
        params.push(("services", query.services.clone()));
    }
    if !query.message_keywords.is_empty() {
        params.push(("message_keywords", query.message_keywords.clone()));
    }
    // the agent only honours the time window on the backlog route
    if kind == EndpointKind::Backlog {
        if let Some(start) = query.time_range.start {
            params.push(("start", start.to_string()));
        }
        if let Some(end) = query.time_range.end {
            params.push(("end", end.to_string()));
        }
    }
    params
}
