/*
[INPUT]:  Client errors raised inside a host pipeline (endpoint building, backlog, stream)
[OUTPUT]: Per-host session error taxonomy
[POS]:    Error handling layer - session errors never cross host boundaries
[UPDATE]: When adding new failure classes to the session pipeline
*/

use minink_client::ClientError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SessionError {
    /// Host string cannot be turned into endpoints; only this host is skipped
    #[error("host {host}: invalid configuration: {source}")]
    Configuration {
        host: String,
        #[source]
        source: ClientError,
    },

    /// Backlog request failed; other hosts and this host's stream continue
    #[error("host {host}: backlog fetch failed: {source}")]
    BacklogFetch {
        host: String,
        #[source]
        source: ClientError,
    },

    /// Stream failed to open or ended with a transport error
    #[error("host {host}: stream connection lost: {message}")]
    StreamConnection { host: String, message: String },

    /// Stream payload that is not a log entry; dropped
    #[error("host {host}: malformed entry ({bytes} bytes): {message}")]
    MalformedEntry {
        host: String,
        bytes: usize,
        message: String,
    },

    /// Filter state without any host
    #[error("no hosts configured")]
    NoHosts,
}

impl SessionError {
    pub fn host(&self) -> Option<&str> {
        match self {
            SessionError::Configuration { host, .. }
            | SessionError::BacklogFetch { host, .. }
            | SessionError::StreamConnection { host, .. }
            | SessionError::MalformedEntry { host, .. } => Some(host),
            SessionError::NoHosts => None,
        }
    }

    /// Whether the error should be shown to the user; malformed entries are
    /// diagnostics only.
    pub fn is_user_visible(&self) -> bool {
        !matches!(self, SessionError::MalformedEntry { .. })
    }
}
