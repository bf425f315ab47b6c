/*
[INPUT]:  Test configuration and mock agent requirements
[OUTPUT]: Shared fixtures, wiremock setup, in-process WebSocket agent
[POS]:    Test infrastructure - shared across all test modules
[UPDATE]: When adding new test patterns or fixtures
*/

//! Common test utilities for minink-client tests

use futures_util::{SinkExt, StreamExt};
use minink_client::LogEntry;
use tokio::net::TcpListener;
use tokio::sync::oneshot;
use tokio_tungstenite::tungstenite::Message as WsMessage;
use tokio_tungstenite::tungstenite::handshake::server::{ErrorResponse, Request, Response};
use wiremock::MockServer;

/// Setup a mock HTTP agent for backlog tests
#[allow(dead_code)]
pub async fn setup_mock_server() -> MockServer {
    MockServer::start().await
}

pub fn sample_entry(hostname: &str, message: &str) -> LogEntry {
    LogEntry {
        timestamp: "2023-03-01T10:00:00.000001".to_string(),
        hostname: hostname.to_string(),
        service: "sshd.service".to_string(),
        message: message.to_string(),
    }
}

#[allow(dead_code)]
pub fn entry_frame(entry: &LogEntry) -> WsMessage {
    WsMessage::Text(serde_json::to_string(entry).expect("serialize entry").into())
}

/// Accept one WebSocket client on a random local port, send `frames`, then
/// close. Returns the `http://` host to connect to and the request URI the
/// client used.
#[allow(dead_code)]
pub async fn spawn_stream_agent(frames: Vec<WsMessage>) -> (String, oneshot::Receiver<String>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let addr = listener.local_addr().expect("local addr");
    let (uri_tx, uri_rx) = oneshot::channel();

    tokio::spawn(async move {
        let (socket, _) = listener.accept().await.expect("accept");
        let callback =
            move |request: &Request, response: Response| -> Result<Response, ErrorResponse> {
                let _ = uri_tx.send(request.uri().to_string());
                Ok(response)
            };
        let mut ws = tokio_tungstenite::accept_hdr_async(socket, callback)
            .await
            .expect("handshake");
        for frame in frames {
            if ws.send(frame).await.is_err() {
                return;
            }
        }
        let _ = ws.close(None).await;
        while let Some(Ok(_)) = ws.next().await {}
    });

    (format!("http://{addr}"), uri_rx)
}
