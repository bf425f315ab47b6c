/*
[INPUT]:  Raw WebSocket frames from an agent
[OUTPUT]: Parsed LogEntry values or parse errors
[POS]:    WebSocket layer - payload parsing and sampled diagnostics
[UPDATE]: When adding new frame types or changing the payload format
*/

use std::sync::atomic::{AtomicUsize, Ordering};

use tokio_tungstenite::tungstenite::Message as WsMessage;
use tracing::{debug, info};

use crate::types::LogEntry;

const PARSE_FAIL_LOG_LIMIT: usize = 3;
const RAW_LOG_MAX_BYTES: usize = 1024;

static PARSE_FAIL_LOG_COUNT: AtomicUsize = AtomicUsize::new(0);

/// Parse one stream payload as a log entry
pub fn parse_entry(text: &str) -> Result<LogEntry, serde_json::Error> {
    match serde_json::from_str::<LogEntry>(text) {
        Ok(entry) => Ok(entry),
        Err(err) => {
            log_parse_fail_once(&err, text);
            Err(err)
        }
    }
}

/// Text carried by a data frame; `None` for control frames.
///
/// Binary frames are accepted when they hold UTF-8 text.
pub(crate) fn frame_text(message: &WsMessage) -> Option<Result<String, String>> {
    match message {
        WsMessage::Text(text) => Some(Ok(text.to_string())),
        WsMessage::Binary(bytes) => Some(
            String::from_utf8(bytes.to_vec()).map_err(|err| format!("binary frame: {err}")),
        ),
        _ => None,
    }
}

fn log_parse_fail_once(err: &serde_json::Error, raw: &str) {
    let count = PARSE_FAIL_LOG_COUNT.fetch_add(1, Ordering::Relaxed);
    if count < PARSE_FAIL_LOG_LIMIT {
        info!(
            sample_index = count + 1,
            sample_limit = PARSE_FAIL_LOG_LIMIT,
            error = %err,
            bytes = raw.len(),
            "stream payload parse failed"
        );
        let preview = truncate_for_log(raw, RAW_LOG_MAX_BYTES);
        debug!(
            sample_index = count + 1,
            sample_limit = PARSE_FAIL_LOG_LIMIT,
            bytes = raw.len(),
            message = %preview,
            "stream payload parse failed"
        );
    }
}

fn truncate_for_log(value: &str, max_len: usize) -> String {
    if value.len() <= max_len {
        return value.to_string();
    }
    let mut end = max_len;
    while !value.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}...", &value[..end])
}
