/*
[INPUT]:  Entries appended by the session manager, scroll commands from the TUI
[OUTPUT]: In-memory log rows with a row-based viewport
[POS]:    Presentation layer - RenderSink backing the TUI table
[UPDATE]: When changing scrolling behavior or row storage
*/

use minink_client::LogEntry;

use crate::render::{RenderSink, ScrollMetrics};

/// Ordered rows plus a viewport over them.
///
/// The log only grows until `clear`; there is no capacity limit.
#[derive(Debug, Default, Clone)]
pub struct LogView {
    rows: Vec<LogEntry>,
    scroll_top: usize,
    viewport_height: usize,
}

impl LogView {
    pub fn new(viewport_height: usize) -> Self {
        Self {
            rows: Vec::new(),
            scroll_top: 0,
            viewport_height,
        }
    }

    pub fn rows(&self) -> &[LogEntry] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn scroll_top(&self) -> usize {
        self.scroll_top
    }

    pub fn viewport_height(&self) -> usize {
        self.viewport_height
    }

    /// Rows currently inside the viewport
    pub fn visible(&self) -> &[LogEntry] {
        let start = self.scroll_top.min(self.rows.len());
        let end = (start + self.viewport_height).min(self.rows.len());
        &self.rows[start..end]
    }

    /// Resize the viewport; a view pinned to the bottom stays pinned
    pub fn set_viewport_height(&mut self, height: usize) {
        if height == self.viewport_height {
            return;
        }
        let pinned = self.scroll_metrics().is_at_bottom();
        self.viewport_height = height;
        if pinned {
            self.scroll_to_bottom();
        } else {
            self.scroll_top = self.scroll_top.min(self.max_scroll_top());
        }
    }

    pub fn scroll_by(&mut self, delta: isize) {
        let target = if delta.is_negative() {
            self.scroll_top.saturating_sub(delta.unsigned_abs())
        } else {
            self.scroll_top.saturating_add(delta.unsigned_abs())
        };
        self.scroll_top = target.min(self.max_scroll_top());
    }

    pub fn page_up(&mut self) {
        self.scroll_by(-(self.page_size() as isize));
    }

    pub fn page_down(&mut self) {
        self.scroll_by(self.page_size() as isize);
    }

    pub fn scroll_to_top(&mut self) {
        self.scroll_top = 0;
    }

    fn page_size(&self) -> usize {
        self.viewport_height.saturating_sub(1).max(1)
    }

    fn max_scroll_top(&self) -> usize {
        self.rows.len().saturating_sub(self.viewport_height)
    }
}

impl RenderSink for LogView {
    fn append(&mut self, entry: LogEntry) {
        self.rows.push(entry);
    }

    fn clear(&mut self) {
        self.rows.clear();
        self.scroll_top = 0;
    }

    fn scroll_metrics(&self) -> ScrollMetrics {
        ScrollMetrics {
            viewport_bottom_offset: self.scroll_top + self.viewport_height,
            content_height: self.rows.len().max(self.viewport_height),
        }
    }

    fn scroll_to_bottom(&mut self) {
        self.scroll_top = self.max_scroll_top();
    }
}
