//! Key binding dispatch for the TUI.

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

use super::app::{EntryKind, InputMode, TuiApp};

/// Handle a key event, mutating app state.
pub fn handle_key(app: &mut TuiApp, key: KeyEvent) {
    // Global bindings
    if let KeyCode::Char('c') = key.code {
        if key.modifiers.contains(KeyModifiers::CONTROL) {
            app.should_quit = true;
            return;
        }
    }

    if matches!(app.input_mode, InputMode::Entry { .. }) {
        handle_entry_key(app, key);
        return;
    }

    match key.code {
        KeyCode::Char('q') | KeyCode::Esc => app.should_quit = true,
        KeyCode::Char('j') | KeyCode::Down => app.move_down(),
        KeyCode::Char('k') | KeyCode::Up => app.move_up(),
        KeyCode::Enter => app.select_current(),
        KeyCode::Char('c') => app.begin_entry(EntryKind::Thought),
        KeyCode::Char('p') => app.begin_entry(EntryKind::Project),
        KeyCode::Char('a') => app.begin_entry(EntryKind::Action),
        KeyCode::Char('m') => app.move_oldest_thought(),
        KeyCode::Char('x') => app.archive_oldest_thought(),
        KeyCode::Char('M') => app.move_whole_inbox(),
        KeyCode::Char('X') => app.archive_whole_inbox(),
        KeyCode::Char('d') => app.complete_next_action(),
        KeyCode::Char('f') => app.cycle_filter(),
        _ => {}
    }
}

fn handle_entry_key(app: &mut TuiApp, key: KeyEvent) {
    match key.code {
        KeyCode::Esc => app.cancel_entry(),
        KeyCode::Enter => app.submit_entry(),
        KeyCode::Backspace => app.pop_char(),
        KeyCode::Char(c) => app.push_char(c),
        _ => {}
    }
}
