/*
[INPUT]:  Log entries from the session manager
[OUTPUT]: One text line per entry on a writer (stdout in tail mode)
[POS]:    Presentation layer - RenderSink for non-interactive output
[UPDATE]: When changing the line format or write failure handling
*/

use std::io::Write;

use minink_client::LogEntry;
use tracing::warn;

use crate::render::{RenderSink, ScrollMetrics};

/// Format used by tail mode: `timestamp hostname service message`
pub fn format_line(entry: &LogEntry) -> String {
    format!(
        "{} {} {} {}",
        entry.timestamp, entry.hostname, entry.service, entry.message
    )
}

/// Writes entries as lines; output cannot scroll, so it is always at the bottom
#[derive(Debug)]
pub struct PlainSink<W> {
    writer: W,
    lines: usize,
    write_failed: bool,
}

impl<W: Write> PlainSink<W> {
    pub fn new(writer: W) -> Self {
        Self {
            writer,
            lines: 0,
            write_failed: false,
        }
    }

    /// Lines written so far
    pub fn lines(&self) -> usize {
        self.lines
    }

    /// True after a write or flush failed; later entries are discarded
    pub fn write_failed(&self) -> bool {
        self.write_failed
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl<W: Write> RenderSink for PlainSink<W> {
    fn append(&mut self, entry: LogEntry) {
        if self.write_failed {
            return;
        }
        let result = writeln!(self.writer, "{}", format_line(&entry)).and_then(|_| self.writer.flush());
        match result {
            Ok(()) => self.lines += 1,
            Err(err) => {
                warn!(error = %err, "failed to write log line; output closed");
                self.write_failed = true;
            }
        }
    }

    fn clear(&mut self) {}

    fn scroll_metrics(&self) -> ScrollMetrics {
        ScrollMetrics {
            viewport_bottom_offset: self.lines,
            content_height: self.lines,
        }
    }

    fn scroll_to_bottom(&mut self) {}

    fn output_closed(&self) -> bool {
        self.write_failed
    }
}
