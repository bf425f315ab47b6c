/*
[INPUT]:  Stream URL (or host + LogQuery) for an agent's /ws/live route
[OUTPUT]: Parsed stream frames until the agent closes the connection
[POS]:    WebSocket layer - live tail connection handling
[UPDATE]: When adding new frame handling or changing close semantics
*/

use futures_util::StreamExt;
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::Error as WsError;
use tokio_tungstenite::tungstenite::Message as WsMessage;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async};
use tracing::{debug, info};
use url::Url;

use crate::endpoint::{EndpointKind, build_endpoint};
use crate::error::Result;
use crate::types::{LogEntry, LogQuery};
use crate::ws::message::{frame_text, parse_entry};

/// One data frame read from a live stream
#[derive(Debug, Clone, PartialEq)]
pub enum StreamFrame {
    Entry(LogEntry),
    /// Payload that is not a log entry; the connection stays usable
    Malformed { error: String, bytes: usize },
}

/// Live tail connection to a single agent
#[derive(Debug)]
pub struct LiveStream {
    url: Url,
    inner: WebSocketStream<MaybeTlsStream<TcpStream>>,
    closed: bool,
}

impl LiveStream {
    /// Open the stream endpoint of `host` for the given filter values
    pub async fn connect_host(host: &str, query: &LogQuery) -> Result<Self> {
        let url = build_endpoint(host, EndpointKind::Stream, query)?;
        Self::connect(url).await
    }

    /// Open an already built stream URL
    pub async fn connect(url: Url) -> Result<Self> {
        info!(url = %url, "connecting live stream");
        let (inner, _response) = connect_async(url.as_str()).await?;
        debug!(url = %url, "live stream open");
        Ok(Self {
            url,
            inner,
            closed: false,
        })
    }

    pub fn url(&self) -> &Url {
        &self.url
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    /// Wait for the next data frame.
    ///
    /// Returns `None` once the agent closed the connection normally, and an
    /// error when the transport failed. Ping/pong frames are skipped.
    pub async fn next_frame(&mut self) -> Option<Result<StreamFrame>> {
        if self.closed {
            return None;
        }

        loop {
            match self.inner.next().await {
                Some(Ok(WsMessage::Close(frame))) => {
                    debug!(url = %self.url, ?frame, "live stream closed by agent");
                    self.closed = true;
                    return None;
                }
                Some(Ok(message)) => match frame_text(&message) {
                    None => continue,
                    Some(Ok(text)) => {
                        let frame = match parse_entry(&text) {
                            Ok(entry) => StreamFrame::Entry(entry),
                            Err(err) => StreamFrame::Malformed {
                                error: err.to_string(),
                                bytes: text.len(),
                            },
                        };
                        return Some(Ok(frame));
                    }
                    Some(Err(error)) => {
                        return Some(Ok(StreamFrame::Malformed {
                            error,
                            bytes: message.len(),
                        }));
                    }
                },
                Some(Err(err)) => {
                    self.closed = true;
                    return Some(Err(err.into()));
                }
                None => {
                    self.closed = true;
                    return None;
                }
            }
        }
    }

    /// Close the connection. Closing an already closed stream is a no-op.
    pub async fn close(&mut self) -> Result<()> {
        if self.closed {
            return Ok(());
        }
        self.closed = true;
        match self.inner.close(None).await {
            Ok(()) | Err(WsError::ConnectionClosed) | Err(WsError::AlreadyClosed) => Ok(()),
            Err(err) => Err(err.into()),
        }
    }
}
