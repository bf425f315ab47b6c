/*
[INPUT]:  Stream URL built from host and filter values
[OUTPUT]: Live log entries read from an agent WebSocket
[POS]:    WebSocket layer - live tail stream
[UPDATE]: When changing connection handling or frame parsing
*/

pub mod client;
pub mod message;

pub use client::{LiveStream, StreamFrame};
pub use message::parse_entry;
