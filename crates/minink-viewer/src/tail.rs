/*
[INPUT]:  Session manager over any sink, filter state, shutdown token
[OUTPUT]: Event pump that runs one session until shutdown, until every host is done, or until the output closes
[POS]:    Front end - non-interactive follow mode
[UPDATE]: When changing tail mode termination rules
*/

use tokio_util::sync::CancellationToken;
use tracing::info;

use crate::filter::FilterState;
use crate::render::RenderSink;
use crate::session::LiveSessionManager;

/// Why a tail run ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TailExit {
    Shutdown,
    /// Every backlog settled and every stream closed
    Exhausted,
    /// The sink lost its output (stdout closed by the reader)
    OutputClosed,
}

/// Start a session for `filter` and feed its events to the sink.
pub async fn follow<S: RenderSink>(
    manager: &mut LiveSessionManager<S>,
    filter: FilterState,
    shutdown: &CancellationToken,
) -> TailExit {
    let registered = manager.start(filter).await;
    info!(registered, "following live streams");

    let exit = loop {
        if manager.sink().output_closed() {
            break TailExit::OutputClosed;
        }
        if manager.is_exhausted() {
            break TailExit::Exhausted;
        }
        tokio::select! {
            biased;
            _ = shutdown.cancelled() => break TailExit::Shutdown,
            Some(event) = manager.next_event() => {
                manager.handle_event(event);
            }
        }
    };

    manager.stop().await;
    info!(?exit, diagnostics = ?manager.diagnostics(), "tail finished");
    exit
}
