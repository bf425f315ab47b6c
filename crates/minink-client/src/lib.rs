/*
[INPUT]:  Crate modules and public type definitions
[OUTPUT]: Public minink agent client surface
[POS]:    Crate root - module wiring
[UPDATE]: When public modules or exports change
*/

pub mod endpoint;
pub mod error;
pub mod http;
pub mod types;
pub mod ws;

pub use endpoint::{BACKLOG_PATH, EndpointKind, STREAM_PATH, build_endpoint, normalize_host};
pub use error::{ClientError, Result};
pub use http::{BacklogClient, ClientConfig};
pub use types::{LogEntry, LogQuery, TimeRange};
pub use ws::{LiveStream, StreamFrame, parse_entry};
