/*
[INPUT]:  Per-host backlog/stream URLs, the session cancellation token, the event sender
[OUTPUT]: Host task loops, per-host status rows, aggregate liveness
[POS]:    Session layer - host pipelines that never touch the render sink
[UPDATE]: When changing host task lifecycles or status reporting
*/

use std::fmt;
use std::sync::Arc;

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};
use url::Url;

use super::event::{EventKind, SessionEvent};
use crate::transport::LogTransport;

/// Lifecycle of one streaming connection
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Connecting,
    Open,
    Closed,
    ErrorClosed,
}

impl ConnectionState {
    pub fn is_terminal(self) -> bool {
        matches!(self, ConnectionState::Closed | ConnectionState::ErrorClosed)
    }
}

impl fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            ConnectionState::Connecting => "connecting",
            ConnectionState::Open => "open",
            ConnectionState::Closed => "closed",
            ConnectionState::ErrorClosed => "error",
        };
        f.write_str(label)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BacklogStatus {
    Pending,
    Loaded(usize),
    Failed,
    /// Cancelled with its session before a response arrived
    Cancelled,
}

impl fmt::Display for BacklogStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BacklogStatus::Pending => f.write_str("pending"),
            BacklogStatus::Loaded(count) => write!(f, "loaded {count}"),
            BacklogStatus::Failed => f.write_str("failed"),
            BacklogStatus::Cancelled => f.write_str("cancelled"),
        }
    }
}

/// Status row for one host of the current session
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostStatus {
    pub host: String,
    /// `None` when the host endpoints could not be built
    pub connection: Option<ConnectionState>,
    pub backlog: BacklogStatus,
    /// Entries rendered from this host, backlog and stream combined
    pub received: u64,
    pub last_error: Option<String>,
}

impl HostStatus {
    pub(crate) fn new(host: &str) -> Self {
        Self {
            host: host.to_string(),
            connection: None,
            backlog: BacklogStatus::Pending,
            received: 0,
            last_error: None,
        }
    }
}

/// Liveness of the whole session, derived from its connections
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Liveness {
    /// No session, or no connection is open or pending
    Down,
    /// Session active, no connection open yet
    Connecting,
    Partial { open: usize, total: usize },
    Live { total: usize },
}

impl Liveness {
    pub(crate) fn from_connections<I>(connections: I) -> Self
    where
        I: IntoIterator<Item = ConnectionState>,
    {
        let mut total = 0;
        let mut open = 0;
        let mut connecting = 0;
        for state in connections {
            total += 1;
            match state {
                ConnectionState::Open => open += 1,
                ConnectionState::Connecting => connecting += 1,
                ConnectionState::Closed | ConnectionState::ErrorClosed => {}
            }
        }

        match (open, connecting) {
            (0, 0) => Liveness::Down,
            (0, _) => Liveness::Connecting,
            (open, _) if open == total => Liveness::Live { total },
            (open, _) => Liveness::Partial { open, total },
        }
    }

    pub fn is_live(self) -> bool {
        matches!(self, Liveness::Live { .. } | Liveness::Partial { .. })
    }
}

impl fmt::Display for Liveness {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Liveness::Down => f.write_str("down"),
            Liveness::Connecting => f.write_str("connecting"),
            Liveness::Partial { open, total } => write!(f, "partial {open}/{total}"),
            Liveness::Live { total } => write!(f, "live {total}/{total}"),
        }
    }
}

/// Shared inputs of one host's tasks
#[derive(Clone)]
pub(crate) struct HostTask {
    pub transport: Arc<dyn LogTransport>,
    pub events: mpsc::UnboundedSender<SessionEvent>,
    pub cancel: CancellationToken,
    pub generation: u64,
    pub host: usize,
    pub label: String,
}

impl HostTask {
    fn emit(&self, kind: EventKind) {
        let _ = self
            .events
            .send(SessionEvent::new(self.generation, self.host, kind));
    }

    /// Fetch the backlog once; cancellation drops the in-flight request
    pub(crate) async fn run_backlog(self, url: Url) {
        debug!(host = %self.label, generation = self.generation, url = %url, "fetching backlog");

        let result = tokio::select! {
            biased;
            _ = self.cancel.cancelled() => {
                debug!(host = %self.label, generation = self.generation, "backlog fetch cancelled");
                return;
            }
            result = self.transport.fetch_backlog(url) => result,
        };

        match result {
            Ok(entries) => self.emit(EventKind::BacklogLoaded(entries)),
            Err(err) => self.emit(EventKind::BacklogFailed(err)),
        }
    }

    /// Open the stream and forward frames until it ends or the session is cancelled
    pub(crate) async fn run_stream(self, url: Url) {
        let opened = tokio::select! {
            biased;
            _ = self.cancel.cancelled() => return,
            opened = self.transport.open_stream(url) => opened,
        };

        let mut stream = match opened {
            Ok(stream) => stream,
            Err(err) => {
                self.emit(EventKind::StreamClosed { error: Some(err) });
                return;
            }
        };
        self.emit(EventKind::StreamOpened);

        loop {
            let frame = tokio::select! {
                biased;
                _ = self.cancel.cancelled() => break,
                frame = stream.next_frame() => frame,
            };

            match frame {
                Some(Ok(frame)) => self.emit(EventKind::Frame(frame)),
                Some(Err(err)) => {
                    self.emit(EventKind::StreamClosed { error: Some(err) });
                    return;
                }
                None => {
                    self.emit(EventKind::StreamClosed { error: None });
                    return;
                }
            }
        }

        if let Err(err) = stream.close().await {
            debug!(host = %self.label, error = %err, "stream close failed");
        }
        info!(host = %self.label, generation = self.generation, "live stream closed");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn liveness_aggregates_connections() {
        use ConnectionState::*;

        assert_eq!(Liveness::from_connections(Vec::new()), Liveness::Down);
        assert_eq!(
            Liveness::from_connections([Connecting, Connecting]),
            Liveness::Connecting
        );
        assert_eq!(
            Liveness::from_connections([Open, Connecting, ErrorClosed]),
            Liveness::Partial { open: 1, total: 3 }
        );
        assert_eq!(
            Liveness::from_connections([Open, Open]),
            Liveness::Live { total: 2 }
        );
        assert_eq!(
            Liveness::from_connections([Closed, ErrorClosed]),
            Liveness::Down
        );
    }

    #[test]
    fn status_labels() {
        assert_eq!(Liveness::Partial { open: 1, total: 2 }.to_string(), "partial 1/2");
        assert_eq!(BacklogStatus::Loaded(3).to_string(), "loaded 3");
        assert_eq!(ConnectionState::ErrorClosed.to_string(), "error");
        assert!(ConnectionState::Closed.is_terminal());
        assert!(!ConnectionState::Open.is_terminal());
    }
}
