/*
[INPUT]:  LogView rows inside the viewport, autoscroll flag
[OUTPUT]: Log entries table rendered into Ratatui frame
[POS]:    TUI UI main log table
[UPDATE]: When changing table columns or cell formatting
*/

use ratatui::layout::{Constraint, Rect};
use ratatui::widgets::{Block, Borders, Cell, Row, Table};
use unicode_width::UnicodeWidthChar;

use crate::render::RenderSink;
use crate::tui::app::{AppState, Focus};
use crate::tui::runtime::{border_style, focused_border_style, header_style};

const DATE_WIDTH: u16 = 24;
const HOST_WIDTH: u16 = 16;
const SERVICE_WIDTH: u16 = 12;

/// Rows that fit into the table body of `area` (borders and header excluded)
pub(in crate::tui) fn entries_viewport_height(area: Rect) -> usize {
    area.height.saturating_sub(3) as usize
}

pub(in crate::tui) fn draw_entries(frame: &mut ratatui::Frame, area: Rect, app: &AppState) {
    let view = app.manager.sink();
    let message_width = area
        .width
        .saturating_sub(2 + DATE_WIDTH + HOST_WIDTH + SERVICE_WIDTH + 3) as usize;

    let rows = view.visible().iter().map(|entry| {
        Row::new(vec![
            Cell::from(truncate_to_width(&entry.timestamp, DATE_WIDTH as usize)),
            Cell::from(truncate_to_width(&entry.hostname, HOST_WIDTH as usize)),
            Cell::from(truncate_to_width(&entry.service, SERVICE_WIDTH as usize)),
            Cell::from(truncate_to_width(&entry.message, message_width)),
        ])
    });

    let header = Row::new(vec![
        Cell::from("Date"),
        Cell::from("Hostname"),
        Cell::from("Service"),
        Cell::from("Message"),
    ])
    .style(header_style());

    let position = if view.scroll_metrics().is_at_bottom() {
        "tail".to_string()
    } else {
        format!("row {}", view.scroll_top() + 1)
    };
    let title = format!(
        "Logs ({} rows, {position}, autoscroll {})",
        view.len(),
        if app.manager.autoscroll() { "on" } else { "off" }
    );

    let block_style = if app.focus == Focus::Table {
        focused_border_style()
    } else {
        border_style()
    };
    let table = Table::new(
        rows,
        [
            Constraint::Length(DATE_WIDTH),
            Constraint::Length(HOST_WIDTH),
            Constraint::Length(SERVICE_WIDTH),
            Constraint::Min(12),
        ],
    )
    .header(header)
    .block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(block_style)
            .title(title),
    );
    frame.render_widget(table, area);
}

/// Cut `text` to at most `width` terminal columns on one line, marking cuts with `…`
fn truncate_to_width(text: &str, width: usize) -> String {
    let flat: String = text
        .chars()
        .map(|c| if c.is_control() { ' ' } else { c })
        .collect();

    let mut used = 0;
    let mut out = String::with_capacity(flat.len().min(width * 4));
    for c in flat.chars() {
        let w = c.width().unwrap_or(0);
        if used + w > width {
            // keep one column for the marker
            while used + 1 > width {
                match out.pop() {
                    Some(last) => used -= last.width().unwrap_or(0),
                    None => return out,
                }
            }
            out.push('…');
            return out;
        }
        used += w;
        out.push(c);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_text_is_untouched() {
        assert_eq!(truncate_to_width("auth", 12), "auth");
        assert_eq!(truncate_to_width("", 3), "");
    }

    #[test]
    fn long_text_gets_marker() {
        assert_eq!(truncate_to_width("connection reset", 8), "connect…");
    }

    #[test]
    fn wide_chars_count_double() {
        assert_eq!(truncate_to_width("日本語テキスト", 6), "日本…");
    }

    #[test]
    fn newlines_are_flattened() {
        assert_eq!(truncate_to_width("a\nb", 10), "a b");
    }

    #[test]
    fn zero_width_yields_empty() {
        assert_eq!(truncate_to_width("abc", 0), "");
    }
}
