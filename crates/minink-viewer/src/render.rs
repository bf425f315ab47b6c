/*
[INPUT]:  Log entries arriving from backlog responses and live streams
[OUTPUT]: Appends on a RenderSink with the autoscroll policy applied
[POS]:    Presentation seam - the session manager never touches a concrete view
[UPDATE]: When changing scroll semantics or the sink capabilities
*/

use minink_client::LogEntry;

/// Scroll position of a rendered log, in rows
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScrollMetrics {
    /// Offset of the last visible row boundary (scroll top + viewport height)
    pub viewport_bottom_offset: usize,
    /// Total content height, never smaller than the viewport
    pub content_height: usize,
}

impl ScrollMetrics {
    pub fn is_at_bottom(&self) -> bool {
        self.viewport_bottom_offset == self.content_height
    }
}

/// Target that displays log entries.
pub trait RenderSink {
    /// Append one entry at the end of the log
    fn append(&mut self, entry: LogEntry);

    /// Remove every entry
    fn clear(&mut self);

    fn scroll_metrics(&self) -> ScrollMetrics;

    fn scroll_to_bottom(&mut self);

    /// True once the sink can no longer show anything (its output went away)
    fn output_closed(&self) -> bool {
        false
    }
}

/// Append `entry`, following the tail only if the viewport was already at
/// the bottom before the append.
pub fn deliver_entry<S>(sink: &mut S, entry: LogEntry, autoscroll: bool)
where
    S: RenderSink + ?Sized,
{
    let was_at_bottom = autoscroll && sink.scroll_metrics().is_at_bottom();
    sink.append(entry);
    if was_at_bottom {
        sink.scroll_to_bottom();
    }
}
