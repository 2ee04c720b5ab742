//! Keyboard input handling for the TUI.

use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers};

use super::runtime::App;
use crate::view::View;

/// Maps a key event to an application action.
///
/// Guards on [`KeyEventKind::Press`] to avoid double-fire on some terminals.
pub fn handle_key(app: &mut App, key: KeyEvent) {
    if key.kind != KeyEventKind::Press {
        return;
    }
    match key.code {
        KeyCode::Char('q') => app.quit = true,
        KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => app.quit = true,
        KeyCode::Char(' ') => app.toggle_pause(),
        code if matches!(app.view, View::Dashboard(_)) => dashboard_key(app, code),
        code => landing_key(app, code),
    }
}

fn landing_key(app: &mut App, code: KeyCode) {
    match code {
        KeyCode::Up | KeyCode::Char('k') => app.select_prev(),
        KeyCode::Down | KeyCode::Char('j') => app.select_next(),
        KeyCode::Enter => app.open_selected(),
        KeyCode::Esc => app.quit = true,
        _ => {}
    }
}

fn dashboard_key(app: &mut App, code: KeyCode) {
    match code {
        KeyCode::Char('h') | KeyCode::Esc => app.go_home(),
        KeyCode::Char('a') => app.request_advisory(),
        KeyCode::Char('e') => app.export_report(),
        _ => {}
    }
}
