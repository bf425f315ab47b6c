/*
[INPUT]:  Crossterm key events
[OUTPUT]: TUI key routing to filter inputs, scrolling, and session controls
[POS]:    TUI event handling
[UPDATE]: When changing keybindings
*/

use ratatui::crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use tui_input::InputRequest;

use super::app::{AppState, Focus};

/// Handles key events for the TUI.
///
/// Returns `true` if quit is requested, `false` otherwise.
pub(super) async fn handle_key_event(app: &mut AppState, key: KeyEvent) -> bool {
    if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
        return true;
    }

    if app.focus != Focus::Table {
        handle_input_key(app, key);
        return false;
    }

    match key.code {
        KeyCode::Char('q') => return true,
        KeyCode::Char(' ') => app.toggle_live().await,
        KeyCode::Char('r') => app.restart().await,
        KeyCode::Char('s') => app.focus(Focus::Services),
        KeyCode::Char('k') => app.focus(Focus::Keywords),
        KeyCode::Char('c') => app.clear_view(),
        KeyCode::Char('a') => app.toggle_autoscroll(),
        KeyCode::Up => app.scroll_by(-1),
        KeyCode::Down => app.scroll_by(1),
        KeyCode::PageUp => app.page_up(),
        KeyCode::PageDown => app.page_down(),
        KeyCode::End | KeyCode::Char('G') => app.scroll_to_bottom(),
        KeyCode::Home | KeyCode::Char('g') => app.scroll_to_top(),
        _ => {}
    }
    false
}

fn handle_input_key(app: &mut AppState, key: KeyEvent) {
    let request = match key.code {
        KeyCode::Esc | KeyCode::Enter => {
            app.focus(Focus::Table);
            return;
        }
        KeyCode::Tab => {
            let next = if app.focus == Focus::Services {
                Focus::Keywords
            } else {
                Focus::Services
            };
            app.focus(next);
            return;
        }
        KeyCode::Char('u') if key.modifiers.contains(KeyModifiers::CONTROL) => {
            InputRequest::DeleteLine
        }
        KeyCode::Char(c) => InputRequest::InsertChar(c),
        KeyCode::Backspace => InputRequest::DeletePrevChar,
        KeyCode::Delete => InputRequest::DeleteNextChar,
        KeyCode::Left => InputRequest::GoToPrevChar,
        KeyCode::Right => InputRequest::GoToNextChar,
        KeyCode::Home => InputRequest::GoToStart,
        KeyCode::End => InputRequest::GoToEnd,
        _ => return,
    };
    app.edit_focused(request);
}
