/*
[INPUT]:  HTTP client configuration and agent hosts
[OUTPUT]: Backlog responses as typed log entries
[POS]:    HTTP layer - one-shot backlog retrieval
[UPDATE]: When adding new endpoints or changing client behavior
*/

pub mod client;

pub use client::{BacklogClient, ClientConfig};
