/*
[INPUT]:  Public API exports for minink-viewer crate
[OUTPUT]: Module declarations and public re-exports
[POS]:    Crate root - library entry point
[UPDATE]: When adding new modules or public exports
*/

pub mod config;
pub mod debounce;
pub mod error;
pub mod filter;
pub mod history;
pub mod plain;
pub mod render;
pub mod session;
pub mod tail;
pub mod transport;
pub mod tui;
pub mod view;

// Re-export main types for convenience
pub use config::ViewerConfig;
pub use debounce::Debouncer;
pub use error::SessionError;
pub use filter::FilterState;
pub use plain::PlainSink;
pub use render::{RenderSink, ScrollMetrics, deliver_entry};
pub use session::{
    BacklogStatus, ConnectionState, Diagnostics, HostStatus, LiveSessionManager, Liveness,
    SessionState,
};
pub use transport::{EntryStream, LogTransport, NetworkTransport};
pub use view::LogView;
