/*
[INPUT]:  Session manager, initial filter state, log buffer, shutdown token
[OUTPUT]: Ratatui-based TUI run loop and shared styles
[POS]:    TUI runtime loop and shared helpers
[UPDATE]: When changing TUI layout, keybindings, or the event loop
*/

use std::time::Duration;

use anyhow::Result;
use ratatui::crossterm::event::{self, Event as CrosstermEvent, KeyEventKind};
use ratatui::layout::{Constraint, Direction, Layout};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span, Text};
use ratatui::widgets::{Block, Borders, Paragraph, Wrap};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::info;

use super::LogBufferHandle;
use super::app::AppState;
use super::events::handle_key_event;
use super::terminal::TerminalGuard;
use super::ui::*;
use crate::debounce::FILTER_DEBOUNCE;
use crate::filter::FilterState;
use crate::session::LiveSessionManager;
use crate::view::LogView;

const UI_TICK_INTERVAL: Duration = Duration::from_millis(250);
const INPUT_POLL_INTERVAL: Duration = Duration::from_millis(200);

enum UiEvent {
    Input(CrosstermEvent),
}

/// Startup options for the TUI
#[derive(Debug, Clone)]
pub struct TuiOptions {
    pub filter_debounce: Duration,
}

impl Default for TuiOptions {
    fn default() -> Self {
        Self {
            filter_debounce: FILTER_DEBOUNCE,
        }
    }
}

pub async fn run_tui(
    manager: LiveSessionManager<LogView>,
    filter: FilterState,
    options: TuiOptions,
    log_buffer: LogBufferHandle,
    shutdown: CancellationToken,
) -> Result<()> {
    let mut terminal = TerminalGuard::new()?;
    let (event_tx, mut event_rx) = mpsc::unbounded_channel();
    let input_shutdown = CancellationToken::new();
    let input_shutdown_clone = input_shutdown.clone();

    tokio::task::spawn_blocking(move || {
        while !input_shutdown_clone.is_cancelled() {
            if event::poll(INPUT_POLL_INTERVAL).unwrap_or(false)
                && let Ok(event) = event::read()
                && event_tx.send(UiEvent::Input(event)).is_err()
            {
                break;
            }
        }
    });

    let (filter_tx, mut filter_rx) = mpsc::unbounded_channel();
    let mut app = AppState::new(
        manager,
        filter,
        filter_tx,
        options.filter_debounce,
        log_buffer,
    );
    app.start_session().await;

    let mut tick = tokio::time::interval(UI_TICK_INTERVAL);
    let mut should_quit = false;

    while !should_quit {
        tokio::select! {
            _ = shutdown.cancelled() => {
                should_quit = true;
            }
            _ = tick.tick() => {}
            Some(event) = app.manager.next_event() => {
                app.manager.handle_event(event);
                app.manager.drain_ready();
            }
            Some(change) = filter_rx.recv() => {
                app.apply_filters(change).await;
            }
            maybe_event = event_rx.recv() => {
                match maybe_event {
                    Some(UiEvent::Input(CrosstermEvent::Key(key))) if key.kind == KeyEventKind::Press => {
                        if handle_key_event(&mut app, key).await {
                            should_quit = true;
                        }
                    }
                    Some(UiEvent::Input(_)) => {}
                    None => should_quit = true,
                }
            }
        }

        terminal.draw(|frame| draw_ui(frame, &mut app))?;
    }

    input_shutdown.cancel();
    app.shutdown().await;
    info!("tui closed");
    Ok(())
}

fn draw_ui(frame: &mut ratatui::Frame, app: &mut AppState) {
    let area = frame.area();
    let layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Min(8),
            Constraint::Length(4),
        ])
        .split(area);

    draw_filter_bar(frame, layout[0], app);

    let middle = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(72), Constraint::Percentage(28)])
        .split(layout[1]);

    app.manager
        .sink_mut()
        .set_viewport_height(entries_viewport_height(middle[0]));
    draw_entries(frame, middle[0], app);

    let side = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Percentage(40), Constraint::Percentage(60)])
        .split(middle[1]);
    draw_hosts(frame, side[0], app);
    draw_logs(frame, side[1], &app.log_buffer);

    draw_footer(frame, layout[2], app);
}

fn draw_footer(frame: &mut ratatui::Frame, area: ratatui::layout::Rect, app: &AppState) {
    let key_style = Style::default()
        .fg(Color::Black)
        .bg(Color::Yellow)
        .add_modifier(Modifier::BOLD);
    let line1 = Line::from(vec![
        Span::styled("[space]", key_style),
        Span::raw(" Live  "),
        Span::styled("[s/k]", key_style),
        Span::raw(" Filters  "),
        Span::styled("[Esc]", key_style),
        Span::raw(" Done  "),
        Span::styled("[r]", key_style),
        Span::raw(" Restart  "),
        Span::styled("[c]", key_style),
        Span::raw(" Clear  "),
        Span::styled("[q]", key_style),
        Span::raw(" Quit"),
    ]);
    let pending = if app.filter_change_pending() {
        " (filter change pending)"
    } else {
        ""
    };
    let line2 = Line::from(vec![
        Span::styled("[Up/Down/PgUp/PgDn]", key_style),
        Span::raw(" Scroll  "),
        Span::styled("[End/G]", key_style),
        Span::raw(" Tail  "),
        Span::styled("[a]", key_style),
        Span::raw(" Autoscroll  "),
        Span::raw(format!("Status: {}{pending}", app.status_message)),
    ]);

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(border_style())
        .title("Hotkeys");
    let text = Text::from(vec![line1, line2]);
    let widget = Paragraph::new(text).block(block).wrap(Wrap { trim: true });
    frame.render_widget(widget, area);
}

pub(crate) fn border_style() -> Style {
    Style::default().fg(Color::Magenta)
}

pub(crate) fn focused_border_style() -> Style {
    Style::default()
        .fg(Color::LightCyan)
        .add_modifier(Modifier::BOLD)
}

pub(crate) fn header_style() -> Style {
    Style::default()
        .fg(Color::Yellow)
        .add_modifier(Modifier::BOLD)
}
