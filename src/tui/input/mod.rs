mod edit;
mod navigate;

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

use super::app::{App, Editor};

use edit::handle_edit;
use navigate::handle_navigate;

/// Handle a key event in the current mode
pub fn handle_key(app: &mut App, key: KeyEvent) {
    // Ignore bare modifier key presses (Shift, Ctrl, Alt, etc.)
    if matches!(key.code, KeyCode::Modifier(_)) {
        return;
    }
    app.status = None;

    // Help overlay intercepts everything until dismissed
    if app.show_help {
        if matches!(key.code, KeyCode::Char('?' | 'q') | KeyCode::Esc) {
            app.show_help = false;
        }
        return;
    }

    let key = normalize_key(key);
    match app.editor {
        Editor::Idle => handle_navigate(app, key),
        Editor::Editing(_) => handle_edit(app, key),
    }
}

/// Handle a bracketed paste. Only the editor accepts text; newlines are
/// flattened since both fields are single-line inputs.
pub fn handle_paste(app: &mut App, text: &str) {
    let Some(draft) = app.draft_mut() else {
        return;
    };
    let clean = text.replace("\r\n", " ").replace(['\n', '\r'], " ");
    if !clean.is_empty() {
        draft.insert_str(&clean);
    }
}

/// Terminals disagree on whether Shift+letter arrives as an uppercase char
/// with or without the SHIFT modifier. Normalize to uppercase without it.
fn normalize_key(mut key: KeyEvent) -> KeyEvent {
    if let KeyCode::Char(c) = key.code
        && key.modifiers.contains(KeyModifiers::SHIFT)
    {
        key.code = KeyCode::Char(c.to_ascii_uppercase());
        key.modifiers.remove(KeyModifiers::SHIFT);
    }
    key
}
