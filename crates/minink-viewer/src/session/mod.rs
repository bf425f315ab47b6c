/*
[INPUT]:  Filter snapshots from the front end, events from per-host tasks
[OUTPUT]: Entries on the render sink, session state, liveness, host status, diagnostics
[POS]:    Core layer - multi-host live tail session manager
[UPDATE]: When changing session transitions, teardown order, or the stale event guard
*/

pub mod connection;
pub mod event;

use std::sync::Arc;
use std::time::Duration;

use minink_client::{EndpointKind, StreamFrame};
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

pub use connection::{BacklogStatus, ConnectionState, HostStatus, Liveness};
pub use event::SessionEvent;

use crate::error::SessionError;
use crate::filter::FilterState;
use crate::render::{RenderSink, deliver_entry};
use crate::transport::LogTransport;
use connection::HostTask;
use event::EventKind;

/// How long a restart waits, in total, for old stream tasks to finish closing
const DEFAULT_CLOSE_TIMEOUT: Duration = Duration::from_secs(2);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Idle,
    Starting,
    Live,
    Restarting,
}

/// Counters for events that never reach the render sink
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Diagnostics {
    pub malformed_entries: u64,
    pub stale_events: u64,
    pub backlog_failures: u64,
    pub stream_errors: u64,
    pub configuration_errors: u64,
}

struct HostSlot {
    status: HostStatus,
    backlog_task: Option<JoinHandle<()>>,
    stream_task: Option<JoinHandle<()>>,
}

struct Session {
    generation: u64,
    filter: FilterState,
    cancel: CancellationToken,
    hosts: Vec<HostSlot>,
    closed: bool,
}

impl Session {
    fn liveness(&self) -> Liveness {
        if self.closed {
            return Liveness::Down;
        }
        Liveness::from_connections(self.hosts.iter().filter_map(|slot| slot.status.connection))
    }
}

/// Owns the render sink and at most one active session.
///
/// Driven from a single task: host tasks only send events, and the owner
/// feeds them back through [`handle_event`](Self::handle_event). Events
/// tagged with a superseded generation are dropped.
pub struct LiveSessionManager<S> {
    transport: Arc<dyn LogTransport>,
    sink: S,
    autoscroll: bool,
    state: SessionState,
    generation: u64,
    session: Option<Session>,
    events_tx: mpsc::UnboundedSender<SessionEvent>,
    events_rx: mpsc::UnboundedReceiver<SessionEvent>,
    liveness: watch::Sender<Liveness>,
    diagnostics: Diagnostics,
    close_timeout: Duration,
}

impl<S: RenderSink> LiveSessionManager<S> {
    pub fn new(transport: Arc<dyn LogTransport>, sink: S) -> Self {
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        let (liveness, _rx) = watch::channel(Liveness::Down);

        Self {
            transport,
            sink,
            autoscroll: true,
            state: SessionState::Idle,
            generation: 0,
            session: None,
            events_tx,
            events_rx,
            liveness,
            diagnostics: Diagnostics::default(),
            close_timeout: DEFAULT_CLOSE_TIMEOUT,
        }
    }

    pub fn with_autoscroll(mut self, autoscroll: bool) -> Self {
        self.autoscroll = autoscroll;
        self
    }

    pub fn with_close_timeout(mut self, close_timeout: Duration) -> Self {
        self.close_timeout = close_timeout;
        self
    }

    /// Start a session for `filter`; an active session is restarted instead.
    ///
    /// Returns the number of hosts whose connections were registered.
    pub async fn start(&mut self, filter: FilterState) -> usize {
        if self.session_active() {
            return self.restart(filter).await;
        }
        self.begin(filter)
    }

    /// Close every connection of the current session, then start `filter`
    pub async fn restart(&mut self, filter: FilterState) -> usize {
        self.state = SessionState::Restarting;
        info!(generation = self.generation, "restarting live session");
        self.close_session().await;
        self.begin(filter)
    }

    /// Close every connection and go idle. The rendered log is kept.
    pub async fn stop(&mut self) {
        self.close_session().await;
        self.state = SessionState::Idle;
        self.publish_liveness();
        info!(generation = self.generation, "live session stopped");
    }

    /// Stop when live, otherwise start with `filter`
    pub async fn toggle_live(&mut self, filter: FilterState) {
        if self.session_active() {
            self.stop().await;
        } else {
            self.start(filter).await;
        }
    }

    /// Wait for the next event from a host task
    pub async fn next_event(&mut self) -> Option<SessionEvent> {
        self.events_rx.recv().await
    }

    /// Wait for one event and apply it
    pub async fn process_next(&mut self) -> bool {
        match self.events_rx.recv().await {
            Some(event) => {
                self.handle_event(event);
                true
            }
            None => false,
        }
    }

    /// Apply every event that is already queued
    pub fn drain_ready(&mut self) -> usize {
        let mut handled = 0;
        while let Ok(event) = self.events_rx.try_recv() {
            self.handle_event(event);
            handled += 1;
        }
        handled
    }

    /// Apply one host task event to the sink and the session bookkeeping
    pub fn handle_event(&mut self, event: SessionEvent) {
        let Some(session) = self
            .session
            .as_mut()
            .filter(|session| !session.closed && session.generation == event.generation)
        else {
            self.diagnostics.stale_events += 1;
            debug!(
                event_generation = event.generation,
                current_generation = self.generation,
                host = event.host,
                "dropping stale session event"
            );
            return;
        };
        let Some(slot) = session.hosts.get_mut(event.host) else {
            warn!(host = event.host, "event for unknown host index");
            return;
        };
        let host = &mut slot.status;

        let connection_changed = match event.kind {
            EventKind::BacklogLoaded(entries) => {
                debug!(host = %host.host, count = entries.len(), "backlog loaded");
                host.backlog = BacklogStatus::Loaded(entries.len());
                host.received += entries.len() as u64;
                for entry in entries {
                    deliver_entry(&mut self.sink, entry, self.autoscroll);
                }
                false
            }
            EventKind::BacklogFailed(source) => {
                let err = SessionError::BacklogFetch {
                    host: host.host.clone(),
                    source,
                };
                warn!(host = %host.host, error = %err, "backlog fetch failed");
                host.backlog = BacklogStatus::Failed;
                host.last_error = Some(err.to_string());
                self.diagnostics.backlog_failures += 1;
                false
            }
            EventKind::StreamOpened => {
                info!(host = %host.host, generation = event.generation, "live stream open");
                host.connection = Some(ConnectionState::Open);
                true
            }
            EventKind::Frame(StreamFrame::Entry(entry)) => {
                host.received += 1;
                deliver_entry(&mut self.sink, entry, self.autoscroll);
                false
            }
            EventKind::Frame(StreamFrame::Malformed { error, bytes }) => {
                let err = SessionError::MalformedEntry {
                    host: host.host.clone(),
                    bytes,
                    message: error,
                };
                debug!(error = %err, "dropping malformed stream entry");
                self.diagnostics.malformed_entries += 1;
                false
            }
            EventKind::StreamClosed { error: None } => {
                info!(host = %host.host, "live stream closed by agent");
                host.connection = Some(ConnectionState::Closed);
                true
            }
            EventKind::StreamClosed { error: Some(source) } => {
                let err = SessionError::StreamConnection {
                    host: host.host.clone(),
                    message: source.to_string(),
                };
                warn!(host = %host.host, error = %err, "live stream failed");
                host.connection = Some(ConnectionState::ErrorClosed);
                host.last_error = Some(err.to_string());
                self.diagnostics.stream_errors += 1;
                true
            }
        };

        if connection_changed {
            self.publish_liveness();
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Generation of the most recently started session (0 before the first)
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn liveness(&self) -> Liveness {
        *self.liveness.borrow()
    }

    pub fn subscribe_liveness(&self) -> watch::Receiver<Liveness> {
        self.liveness.subscribe()
    }

    /// Status rows of the current (or last stopped) session, in host order
    pub fn host_statuses(&self) -> impl Iterator<Item = &HostStatus> {
        self.session
            .iter()
            .flat_map(|session| session.hosts.iter().map(|slot| &slot.status))
    }

    pub fn diagnostics(&self) -> Diagnostics {
        self.diagnostics
    }

    /// True once no host of the current session can deliver another entry
    pub fn is_exhausted(&self) -> bool {
        self.session.as_ref().is_none_or(|session| {
            session.closed
                || session.hosts.iter().all(|slot| {
                    slot.status.backlog != BacklogStatus::Pending
                        && slot.status.connection.is_none_or(ConnectionState::is_terminal)
                })
        })
    }

    /// Filter snapshot the current session was started with
    pub fn filter(&self) -> Option<&FilterState> {
        self.session.as_ref().map(|session| &session.filter)
    }

    pub fn autoscroll(&self) -> bool {
        self.autoscroll
    }

    pub fn set_autoscroll(&mut self, autoscroll: bool) {
        self.autoscroll = autoscroll;
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    pub fn sink_mut(&mut self) -> &mut S {
        &mut self.sink
    }

    /// Clear the rendered log without touching the session
    pub fn clear_view(&mut self) {
        self.sink.clear();
    }

    fn session_active(&self) -> bool {
        self.session.as_ref().is_some_and(|session| !session.closed)
    }

    fn begin(&mut self, filter: FilterState) -> usize {
        self.state = SessionState::Starting;
        self.generation += 1;
        let generation = self.generation;
        let cancel = CancellationToken::new();

        self.sink.clear();

        let mut hosts = Vec::with_capacity(filter.hosts().len());
        for (index, host) in filter.hosts().iter().enumerate() {
            let mut status = HostStatus::new(host);
            let urls = filter
                .endpoint(host, EndpointKind::Backlog)
                .and_then(|backlog| Ok((backlog, filter.endpoint(host, EndpointKind::Stream)?)));

            let (backlog_url, stream_url) = match urls {
                Ok(urls) => urls,
                Err(err) => {
                    warn!(host = %host, error = %err, "skipping host");
                    status.backlog = BacklogStatus::Failed;
                    status.last_error = Some(err.to_string());
                    self.diagnostics.configuration_errors += 1;
                    hosts.push(HostSlot {
                        status,
                        backlog_task: None,
                        stream_task: None,
                    });
                    continue;
                }
            };

            let task = HostTask {
                transport: Arc::clone(&self.transport),
                events: self.events_tx.clone(),
                cancel: cancel.clone(),
                generation,
                host: index,
                label: host.clone(),
            };
            status.connection = Some(ConnectionState::Connecting);
            hosts.push(HostSlot {
                status,
                backlog_task: Some(tokio::spawn(task.clone().run_backlog(backlog_url))),
                stream_task: Some(tokio::spawn(task.run_stream(stream_url))),
            });
        }

        let registered = hosts
            .iter()
            .filter(|slot| slot.status.connection.is_some())
            .count();
        info!(
            generation,
            hosts = hosts.len(),
            registered,
            services = %filter.services(),
            message_keywords = %filter.message_keywords(),
            "live session started"
        );

        self.session = Some(Session {
            generation,
            filter,
            cancel,
            hosts,
            closed: false,
        });
        self.state = SessionState::Live;
        self.publish_liveness();
        registered
    }

    /// Cancel the current session and wait for its streams to close
    async fn close_session(&mut self) {
        let Some(session) = self.session.as_mut().filter(|session| !session.closed) else {
            return;
        };
        session.closed = true;
        session.cancel.cancel();

        for slot in &mut session.hosts {
            if let Some(task) = slot.backlog_task.take() {
                task.abort();
                if slot.status.backlog == BacklogStatus::Pending {
                    slot.status.backlog = BacklogStatus::Cancelled;
                }
            }
        }

        // one deadline shared by every host
        let deadline = tokio::time::Instant::now() + self.close_timeout;
        for slot in &mut session.hosts {
            let Some(mut task) = slot.stream_task.take() else {
                continue;
            };
            if tokio::time::timeout_at(deadline, &mut task)
                .await
                .is_err()
            {
                warn!(host = %slot.status.host, "stream did not close in time; aborting");
                task.abort();
            }
            if let Some(state) = slot.status.connection.as_mut()
                && !state.is_terminal()
            {
                *state = ConnectionState::Closed;
            }
        }

        debug!(generation = session.generation, "session closed");
        self.publish_liveness();
    }

    fn publish_liveness(&self) {
        let next = self
            .session
            .as_ref()
            .map_or(Liveness::Down, Session::liveness);
        self.liveness.send_if_modified(|current| {
            if *current == next {
                return false;
            }
            *current = next;
            true
        });
    }
}

impl<S> Drop for LiveSessionManager<S> {
    fn drop(&mut self) {
        if let Some(session) = &self.session {
            session.cancel.cancel();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::EntryStream;
    use crate::view::LogView;
    use async_trait::async_trait;
    use minink_client::{ClientError, LogEntry};
    use url::Url;

    struct PendingStream;

    #[async_trait]
    impl EntryStream for PendingStream {
        async fn next_frame(&mut self) -> Option<Result<StreamFrame, ClientError>> {
            std::future::pending().await
        }

        async fn close(&mut self) -> Result<(), ClientError> {
            Ok(())
        }
    }

    struct StaticTransport;

    #[async_trait]
    impl LogTransport for StaticTransport {
        async fn fetch_backlog(&self, url: Url) -> Result<Vec<LogEntry>, ClientError> {
            Ok(vec![entry(url.host_str().unwrap_or_default(), "backlog")])
        }

        async fn open_stream(&self, _url: Url) -> Result<Box<dyn EntryStream>, ClientError> {
            Ok(Box::new(PendingStream))
        }
    }

    fn entry(hostname: &str, message: &str) -> LogEntry {
        LogEntry {
            timestamp: "2023-03-01T10:00:00".to_string(),
            hostname: hostname.to_string(),
            service: "auth".to_string(),
            message: message.to_string(),
        }
    }

    fn manager() -> LiveSessionManager<LogView> {
        LiveSessionManager::new(Arc::new(StaticTransport), LogView::new(10))
    }

    fn filter(hosts: &[&str]) -> FilterState {
        FilterState::new(hosts.iter().copied()).expect("filter")
    }

    #[tokio::test]
    async fn start_registers_every_host_and_goes_live() {
        let mut manager = manager();
        assert_eq!(manager.state(), SessionState::Idle);
        assert_eq!(manager.liveness(), Liveness::Down);

        let registered = manager.start(filter(&["http://h1", "http://h2"])).await;
        assert_eq!(registered, 2);
        assert_eq!(manager.state(), SessionState::Live);
        assert_eq!(manager.generation(), 1);
        assert_eq!(manager.liveness(), Liveness::Connecting);
        assert_eq!(manager.host_statuses().count(), 2);
    }

    #[tokio::test]
    async fn stale_generation_never_reaches_sink() {
        let mut manager = manager();
        manager.start(filter(&["http://h1"])).await;
        manager.restart(filter(&["http://h1"])).await;
        assert_eq!(manager.generation(), 2);

        manager.handle_event(SessionEvent::new(
            1,
            0,
            EventKind::Frame(StreamFrame::Entry(entry("h1", "old"))),
        ));
        assert!(manager.sink().is_empty());
        assert_eq!(manager.diagnostics().stale_events, 1);

        manager.handle_event(SessionEvent::new(
            2,
            0,
            EventKind::Frame(StreamFrame::Entry(entry("h1", "new"))),
        ));
        assert_eq!(manager.sink().len(), 1);
        assert_eq!(manager.sink().rows()[0].message, "new");
    }

    #[tokio::test]
    async fn stop_keeps_log_and_drops_late_events() {
        let mut manager = manager();
        manager.start(filter(&["http://h1"])).await;
        manager.handle_event(SessionEvent::new(1, 0, EventKind::StreamOpened));
        assert_eq!(manager.liveness(), Liveness::Live { total: 1 });
        manager.handle_event(SessionEvent::new(
            1,
            0,
            EventKind::Frame(StreamFrame::Entry(entry("h1", "kept"))),
        ));

        manager.stop().await;
        assert_eq!(manager.state(), SessionState::Idle);
        assert_eq!(manager.liveness(), Liveness::Down);
        assert_eq!(manager.sink().len(), 1);

        manager.handle_event(SessionEvent::new(
            1,
            0,
            EventKind::Frame(StreamFrame::Entry(entry("h1", "late"))),
        ));
        assert_eq!(manager.sink().len(), 1);
        assert_eq!(manager.diagnostics().stale_events, 1);
        let status = manager.host_statuses().next().expect("status");
        assert_eq!(status.connection, Some(ConnectionState::Closed));
    }

    #[tokio::test]
    async fn malformed_frames_are_counted_not_rendered() {
        let mut manager = manager();
        manager.start(filter(&["http://h1"])).await;
        manager.handle_event(SessionEvent::new(1, 0, EventKind::StreamOpened));
        manager.handle_event(SessionEvent::new(
            1,
            0,
            EventKind::Frame(StreamFrame::Malformed {
                error: "expected value".to_string(),
                bytes: 8,
            }),
        ));

        assert!(manager.sink().is_empty());
        assert_eq!(manager.diagnostics().malformed_entries, 1);
        assert_eq!(manager.liveness(), Liveness::Live { total: 1 });
    }

    #[tokio::test]
    async fn invalid_host_is_skipped() {
        let mut manager = manager();
        let registered = manager
            .start(filter(&["ftp://h0", "http://h1"]))
            .await;
        assert_eq!(registered, 1);
        assert_eq!(manager.diagnostics().configuration_errors, 1);

        let statuses: Vec<_> = manager.host_statuses().collect();
        assert_eq!(statuses[0].connection, None);
        assert_eq!(statuses[0].backlog, BacklogStatus::Failed);
        assert!(statuses[0].last_error.is_some());
        assert_eq!(statuses[1].connection, Some(ConnectionState::Connecting));
    }

    #[tokio::test]
    async fn toggle_live_stops_then_starts() {
        let mut manager = manager();
        manager.toggle_live(filter(&["http://h1"])).await;
        assert_eq!(manager.state(), SessionState::Live);
        manager.toggle_live(filter(&["http://h1"])).await;
        assert_eq!(manager.state(), SessionState::Idle);
        manager.toggle_live(filter(&["http://h1"])).await;
        assert_eq!(manager.state(), SessionState::Live);
        assert_eq!(manager.generation(), 2);
    }

    #[tokio::test]
    async fn liveness_changes_are_published() {
        let mut manager = manager();
        let mut rx = manager.subscribe_liveness();
        manager.start(filter(&["http://h1", "http://h2"])).await;
        assert!(rx.has_changed().expect("sender alive"));
        assert_eq!(*rx.borrow_and_update(), Liveness::Connecting);

        manager.handle_event(SessionEvent::new(1, 0, EventKind::StreamOpened));
        assert_eq!(*rx.borrow_and_update(), Liveness::Partial { open: 1, total: 2 });

        manager.handle_event(SessionEvent::new(
            1,
            1,
            EventKind::StreamClosed {
                error: Some(ClientError::WebSocket("reset".to_string())),
            },
        ));
        assert_eq!(*rx.borrow_and_update(), Liveness::Partial { open: 1, total: 2 });
        assert_eq!(manager.diagnostics().stream_errors, 1);
    }
}
