/*
[INPUT]:  Scripted backlog responses, stream frames, and local agent scenarios
[OUTPUT]: Fake transport, counting sink, event pump helpers, in-process agent
[POS]:    Test infrastructure - shared across viewer integration tests
[UPDATE]: When adding new session scenarios or fixtures
*/

//! Common test utilities for minink-viewer tests

#![allow(dead_code)]

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use futures_util::{SinkExt, StreamExt};
use minink_client::{ClientError, LogEntry, StreamFrame};
use minink_viewer::{EntryStream, LiveSessionManager, LogTransport, LogView, RenderSink, ScrollMetrics};
use tokio::io::AsyncWriteExt;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::mpsc;
use tokio_tungstenite::tungstenite::Message as WsMessage;
use tokio_tungstenite::tungstenite::handshake::server::{ErrorResponse, Request, Response};
use url::Url;

pub fn sample_entry(hostname: &str, message: &str) -> LogEntry {
    LogEntry {
        timestamp: "2023-03-01T10:00:00.000001".to_string(),
        hostname: hostname.to_string(),
        service: "auth".to_string(),
        message: message.to_string(),
    }
}

/// Transport call, in the order the session made it
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    /// Full backlog URL
    Backlog(String),
    /// Host of the opened stream
    Open(String),
    /// Host of the closed stream
    Close(String),
}

/// In-memory transport keyed by URL host name ("h1" for "http://h1")
#[derive(Default)]
pub struct FakeTransport {
    calls: Arc<Mutex<Vec<Call>>>,
    backlogs: Mutex<HashMap<String, Vec<LogEntry>>>,
    failing_backlogs: Mutex<HashSet<String>>,
    failing_streams: Mutex<HashSet<String>>,
    slow_backlogs: Mutex<HashMap<String, Duration>>,
    hanging_closes: Mutex<HashSet<String>>,
    scripts: Mutex<HashMap<String, Vec<StreamFrame>>>,
    feeds: Mutex<HashMap<String, mpsc::UnboundedSender<StreamFrame>>>,
}

impl FakeTransport {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn set_backlog(&self, host: &str, entries: Vec<LogEntry>) {
        self.backlogs
            .lock()
            .unwrap()
            .insert(host.to_string(), entries);
    }

    pub fn fail_backlog(&self, host: &str) {
        self.failing_backlogs.lock().unwrap().insert(host.to_string());
    }

    pub fn fail_stream(&self, host: &str) {
        self.failing_streams.lock().unwrap().insert(host.to_string());
    }

    /// Delay every backlog response of `host`
    pub fn delay_backlog(&self, host: &str, delay: Duration) {
        self.slow_backlogs
            .lock()
            .unwrap()
            .insert(host.to_string(), delay);
    }

    /// Streams of `host` never finish closing
    pub fn hang_on_close(&self, host: &str) {
        self.hanging_closes.lock().unwrap().insert(host.to_string());
    }

    /// Frames the next stream to `host` yields before the agent closes it
    pub fn script_stream(&self, host: &str, frames: Vec<StreamFrame>) {
        self.scripts
            .lock()
            .unwrap()
            .insert(host.to_string(), frames);
    }

    /// Send a frame on the currently open stream of `host`
    pub fn push(&self, host: &str, frame: StreamFrame) {
        let feeds = self.feeds.lock().unwrap();
        let feed = feeds.get(host).expect("stream for host is open");
        feed.send(frame).expect("stream reader alive");
    }

    pub fn push_entry(&self, host: &str, entry: LogEntry) {
        self.push(host, StreamFrame::Entry(entry));
    }

    /// Close the stream of `host` from the agent side
    pub fn end_stream(&self, host: &str) {
        self.feeds.lock().unwrap().remove(host);
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub fn count(&self, matches: impl Fn(&Call) -> bool) -> usize {
        self.calls().iter().filter(|call| matches(call)).count()
    }
}

fn host_key(url: &Url) -> String {
    url.host_str().unwrap_or_default().to_string()
}

#[async_trait]
impl LogTransport for FakeTransport {
    async fn fetch_backlog(&self, url: Url) -> Result<Vec<LogEntry>, ClientError> {
        self.calls
            .lock()
            .unwrap()
            .push(Call::Backlog(url.to_string()));
        let host = host_key(&url);
        let delay = self.slow_backlogs.lock().unwrap().get(&host).copied();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        if self.failing_backlogs.lock().unwrap().contains(&host) {
            return Err(ClientError::Status {
                status: 500,
                body: "boom".to_string(),
            });
        }
        Ok(self
            .backlogs
            .lock()
            .unwrap()
            .get(&host)
            .cloned()
            .unwrap_or_default())
    }

    async fn open_stream(&self, url: Url) -> Result<Box<dyn EntryStream>, ClientError> {
        let host = host_key(&url);
        self.calls.lock().unwrap().push(Call::Open(host.clone()));
        if self.failing_streams.lock().unwrap().contains(&host) {
            return Err(ClientError::WebSocket("connection refused".to_string()));
        }

        let (tx, rx) = mpsc::unbounded_channel();
        match self.scripts.lock().unwrap().remove(&host) {
            Some(frames) => {
                for frame in frames {
                    let _ = tx.send(frame);
                }
            }
            None => {
                self.feeds.lock().unwrap().insert(host.clone(), tx);
            }
        }

        let hang_on_close = self.hanging_closes.lock().unwrap().contains(&host);
        Ok(Box::new(FakeStream {
            host,
            rx,
            calls: Arc::clone(&self.calls),
            closed: false,
            hang_on_close,
        }))
    }
}

struct FakeStream {
    host: String,
    rx: mpsc::UnboundedReceiver<StreamFrame>,
    calls: Arc<Mutex<Vec<Call>>>,
    closed: bool,
    hang_on_close: bool,
}

#[async_trait]
impl EntryStream for FakeStream {
    async fn next_frame(&mut self) -> Option<Result<StreamFrame, ClientError>> {
        self.rx.recv().await.map(Ok)
    }

    async fn close(&mut self) -> Result<(), ClientError> {
        if !self.closed {
            self.closed = true;
            self.calls.lock().unwrap().push(Call::Close(self.host.clone()));
        }
        if self.hang_on_close {
            std::future::pending::<()>().await;
        }
        Ok(())
    }
}

/// LogView that counts full clears
#[derive(Debug, Default)]
pub struct CountingSink {
    pub view: LogView,
    pub clears: usize,
}

impl RenderSink for CountingSink {
    fn append(&mut self, entry: LogEntry) {
        self.view.append(entry);
    }

    fn clear(&mut self) {
        self.clears += 1;
        self.view.clear();
    }

    fn scroll_metrics(&self) -> ScrollMetrics {
        self.view.scroll_metrics()
    }

    fn scroll_to_bottom(&mut self) {
        self.view.scroll_to_bottom();
    }
}

/// Writer whose reader went away, like stdout piped into `head`
#[derive(Debug, Default)]
pub struct ClosedOutput;

impl std::io::Write for ClosedOutput {
    fn write(&mut self, _buf: &[u8]) -> std::io::Result<usize> {
        Err(std::io::Error::from(std::io::ErrorKind::BrokenPipe))
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

/// Process session events until `done` holds, failing after five seconds
pub async fn pump_until<S, F>(manager: &mut LiveSessionManager<S>, mut done: F)
where
    S: RenderSink,
    F: FnMut(&LiveSessionManager<S>) -> bool,
{
    tokio::time::timeout(Duration::from_secs(5), async {
        while !done(manager) {
            manager.process_next().await;
        }
    })
    .await
    .expect("session condition not reached in time");
}

/// Scripted behavior of one in-process agent
#[derive(Debug, Clone, Default)]
pub struct AgentScript {
    pub backlog: Vec<LogEntry>,
    pub stream: Vec<LogEntry>,
    /// Raw text frames sent before the entries
    pub raw_frames: Vec<String>,
}

/// Serve `/api/extract` and `/ws/live` on a random local port.
///
/// Returns the `http://` host and a channel of request URIs in arrival order.
pub async fn spawn_agent(script: AgentScript) -> (String, mpsc::UnboundedReceiver<String>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let addr = listener.local_addr().expect("local addr");
    let (uri_tx, uri_rx) = mpsc::unbounded_channel();

    tokio::spawn(async move {
        loop {
            let Ok((socket, _)) = listener.accept().await else {
                return;
            };
            let script = script.clone();
            let uri_tx = uri_tx.clone();
            tokio::spawn(async move {
                serve_connection(socket, script, uri_tx).await;
            });
        }
    });

    (format!("http://{addr}"), uri_rx)
}

async fn serve_connection(
    mut socket: TcpStream,
    script: AgentScript,
    uri_tx: mpsc::UnboundedSender<String>,
) {
    let Some(request_line) = peek_request_line(&socket).await else {
        return;
    };

    if request_line.contains(" /api/extract") {
        let uri = request_line
            .split_whitespace()
            .nth(1)
            .unwrap_or_default()
            .to_string();
        let _ = uri_tx.send(uri);
        drain_request_head(&mut socket).await;

        let body = serde_json::to_string(&script.backlog).expect("serialize backlog");
        let response = format!(
            "HTTP/1.1 200 OK\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
            body.len()
        );
        let _ = socket.write_all(response.as_bytes()).await;
        let _ = socket.shutdown().await;
        return;
    }

    let callback = move |request: &Request, response: Response| -> Result<Response, ErrorResponse> {
        let _ = uri_tx.send(request.uri().to_string());
        Ok(response)
    };
    let Ok(mut ws) = tokio_tungstenite::accept_hdr_async(socket, callback).await else {
        return;
    };
    for raw in script.raw_frames {
        if ws.send(WsMessage::Text(raw.into())).await.is_err() {
            return;
        }
    }
    for entry in &script.stream {
        let text = serde_json::to_string(entry).expect("serialize entry");
        if ws.send(WsMessage::Text(text.into())).await.is_err() {
            return;
        }
    }
    let _ = ws.close(None).await;
    while let Some(Ok(_)) = ws.next().await {}
}

async fn peek_request_line(socket: &TcpStream) -> Option<String> {
    let mut buf = [0u8; 1024];
    for _ in 0..100 {
        let n = socket.peek(&mut buf).await.ok()?;
        if n == 0 {
            return None;
        }
        let head = String::from_utf8_lossy(&buf[..n]);
        if let Some(end) = head.find("\r\n") {
            return Some(head[..end].to_string());
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    None
}

async fn drain_request_head(socket: &mut TcpStream) {
    use tokio::io::AsyncReadExt;

    let mut head = Vec::new();
    let mut byte = [0u8; 1];
    while !head.ends_with(b"\r\n\r\n") {
        match socket.read(&mut byte).await {
            Ok(1) => head.push(byte[0]),
            _ => return,
        }
    }
}
