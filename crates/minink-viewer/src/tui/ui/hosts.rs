/*
[INPUT]:  Host status rows of the current session
[OUTPUT]: Hosts table rendered into Ratatui frame
[POS]:    TUI UI hosts panel rendering
[UPDATE]: When changing per-host status columns
*/

use ratatui::layout::Constraint;
use ratatui::style::{Color, Style};
use ratatui::text::Span;
use ratatui::widgets::{Block, Borders, Cell, Row, Table};

use crate::session::{BacklogStatus, ConnectionState, HostStatus};
use crate::tui::app::AppState;
use crate::tui::runtime::{border_style, header_style};

pub(in crate::tui) fn draw_hosts(
    frame: &mut ratatui::Frame,
    area: ratatui::layout::Rect,
    app: &AppState,
) {
    let mut rows: Vec<Row> = app.manager.host_statuses().map(host_row).collect();

    if rows.is_empty() {
        rows.push(Row::new(vec![
            Cell::from("No session"),
            Cell::from(""),
            Cell::from(""),
            Cell::from(""),
        ]));
    }

    let header = Row::new(vec![
        Cell::from("Host"),
        Cell::from("Stream"),
        Cell::from("Backlog"),
        Cell::from("Rows"),
    ])
    .style(header_style());

    let diagnostics = app.manager.diagnostics();
    let title = format!(
        "Hosts (malformed {}, stale {})",
        diagnostics.malformed_entries, diagnostics.stale_events
    );
    let table = Table::new(
        rows,
        [
            Constraint::Min(12),
            Constraint::Length(10),
            Constraint::Length(10),
            Constraint::Length(7),
        ],
    )
    .header(header)
    .block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(border_style())
            .title(title),
    );
    frame.render_widget(table, area);
}

fn host_row(status: &HostStatus) -> Row<'static> {
    let (stream_label, stream_style) = match status.connection {
        Some(ConnectionState::Open) => ("open".to_string(), Style::default().fg(Color::LightGreen)),
        Some(ConnectionState::Connecting) => {
            ("connecting".to_string(), Style::default().fg(Color::Yellow))
        }
        Some(state @ ConnectionState::Closed) => (state.to_string(), Style::default()),
        Some(state @ ConnectionState::ErrorClosed) => {
            (state.to_string(), Style::default().fg(Color::LightRed))
        }
        None => ("invalid".to_string(), Style::default().fg(Color::LightRed)),
    };
    let backlog_style = match status.backlog {
        BacklogStatus::Failed => Style::default().fg(Color::LightRed),
        _ => Style::default(),
    };

    Row::new(vec![
        Cell::from(status.host.clone()),
        Cell::from(Span::styled(stream_label, stream_style)),
        Cell::from(Span::styled(status.backlog.to_string(), backlog_style)),
        Cell::from(status.received.to_string()),
    ])
}
