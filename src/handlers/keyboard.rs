use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

use crate::app::{App, ViewMode};

#[derive(Debug, PartialEq, Eq)]
pub enum KeyAction {
    Continue,
    Quit,
}

pub async fn handle_key_event(app: &mut App, key: KeyEvent) -> KeyAction {
    if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
        return KeyAction::Quit;
    }

    // A pending delete takes every key until answered
    if app.pending_delete.is_some() {
        match key.code {
            KeyCode::Char('y') | KeyCode::Char('Y') => app.confirm_delete().await,
            KeyCode::Char('n') | KeyCode::Char('N') | KeyCode::Esc => app.cancel_delete(),
            _ => {}
        }
        return KeyAction::Continue;
    }

    match key.code {
        KeyCode::Char('q') => return KeyAction::Quit,
        KeyCode::Char('D') => app.show_debug = !app.show_debug,
        KeyCode::Char('o') => app.toggle_outage(),
        KeyCode::Char('d') | KeyCode::Delete => app.request_delete(),
        _ => match app.view_mode {
            ViewMode::List => handle_list_key(app, key).await,
            ViewMode::Details => handle_details_key(app, key).await,
        },
    }

    KeyAction::Continue
}

async fn handle_list_key(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Char('j') | KeyCode::Down => app.select_next(),
        KeyCode::Char('k') | KeyCode::Up => app.select_previous(),
        KeyCode::Enter | KeyCode::Char('l') => app.open_selected().await,
        KeyCode::Char('f') => app.cycle_status_filter(),
        KeyCode::Char('r') => app.refresh(),
        _ => {}
    }
}

async fn handle_details_key(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Esc | KeyCode::Char('h') | KeyCode::Backspace => app.close_details(),
        KeyCode::Char('r') => app.reload_details().await,
        _ => {}
    }
}
