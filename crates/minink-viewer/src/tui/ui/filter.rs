/*
[INPUT]:  Filter inputs, focus, session state and liveness
[OUTPUT]: Filter bar with services/keywords inputs and the LIVE indicator
[POS]:    TUI UI filter bar rendering
[UPDATE]: When adding filter fields or changing the live indicator
*/

use ratatui::layout::{Constraint, Direction, Layout, Position, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Paragraph};
use tui_input::Input;

use crate::session::{Liveness, SessionState};
use crate::tui::app::{AppState, Focus};
use crate::tui::runtime::{border_style, focused_border_style};

pub(in crate::tui) fn draw_filter_bar(frame: &mut ratatui::Frame, area: Rect, app: &AppState) {
    let columns = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage(40),
            Constraint::Percentage(40),
            Constraint::Percentage(20),
        ])
        .split(area);

    draw_input(
        frame,
        columns[0],
        "Services [s]",
        &app.services,
        app.focus == Focus::Services,
    );
    draw_input(
        frame,
        columns[1],
        "Message keywords [k]",
        &app.keywords,
        app.focus == Focus::Keywords,
    );
    draw_live_indicator(frame, columns[2], app);
}

fn draw_input(frame: &mut ratatui::Frame, area: Rect, title: &str, input: &Input, focused: bool) {
    let inner_width = area.width.saturating_sub(2) as usize;
    let scroll = input.visual_scroll(inner_width.saturating_sub(1));
    let style = if focused {
        focused_border_style()
    } else {
        border_style()
    };

    let widget = Paragraph::new(input.value())
        .scroll((0, scroll as u16))
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(style)
                .title(title),
        );
    frame.render_widget(widget, area);

    if focused {
        let cursor = input.visual_cursor().saturating_sub(scroll) as u16;
        frame.set_cursor_position(Position::new(area.x + 1 + cursor, area.y + 1));
    }
}

fn draw_live_indicator(frame: &mut ratatui::Frame, area: Rect, app: &AppState) {
    let (label, label_style) = match app.manager.state() {
        SessionState::Idle => (
            "○ PAUSED",
            Style::default().fg(Color::DarkGray).add_modifier(Modifier::BOLD),
        ),
        _ => (
            "● LIVE",
            Style::default()
                .fg(Color::LightGreen)
                .add_modifier(Modifier::BOLD),
        ),
    };
    let liveness = app.manager.liveness();
    let liveness_style = match liveness {
        Liveness::Live { .. } => Style::default().fg(Color::LightGreen),
        Liveness::Partial { .. } | Liveness::Connecting => Style::default().fg(Color::Yellow),
        Liveness::Down => Style::default().fg(Color::LightRed),
    };

    let line = Line::from(vec![
        Span::styled(label, label_style),
        Span::raw(" "),
        Span::styled(liveness.to_string(), liveness_style),
    ]);
    let widget = Paragraph::new(line).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(border_style())
            .title("[space]"),
    );
    frame.render_widget(widget, area);
}
