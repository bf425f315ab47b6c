/*
[INPUT]:  Results of per-host backlog and stream tasks
[OUTPUT]: Generation-tagged events consumed by the session manager
[POS]:    Session layer - the only channel from host tasks back to the manager
[UPDATE]: When host tasks report new kinds of progress
*/

use minink_client::{ClientError, LogEntry, StreamFrame};

/// Progress report from one host task of one session
#[derive(Debug)]
pub struct SessionEvent {
    pub(crate) generation: u64,
    pub(crate) host: usize,
    pub(crate) kind: EventKind,
}

#[derive(Debug)]
pub(crate) enum EventKind {
    BacklogLoaded(Vec<LogEntry>),
    BacklogFailed(ClientError),
    StreamOpened,
    Frame(StreamFrame),
    /// Stream ended; `error` is set for handshake and transport failures
    StreamClosed { error: Option<ClientError> },
}

impl SessionEvent {
    pub(crate) fn new(generation: u64, host: usize, kind: EventKind) -> Self {
        Self {
            generation,
            host,
            kind,
        }
    }

    /// Session generation the event was produced for
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Position of the host in the session's host list
    pub fn host_index(&self) -> usize {
        self.host
    }
}
