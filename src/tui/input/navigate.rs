use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

use crate::tui::app::App;

pub(super) fn handle_navigate(app: &mut App, key: KeyEvent) {
    match (key.modifiers, key.code) {
        (KeyModifiers::NONE, KeyCode::Char('q')) | (KeyModifiers::CONTROL, KeyCode::Char('c')) => {
            app.should_quit = true;
        }
        (KeyModifiers::NONE, KeyCode::Char('?')) => app.show_help = true,

        (KeyModifiers::NONE, KeyCode::Char('j') | KeyCode::Down) => app.move_cursor(1),
        (KeyModifiers::NONE, KeyCode::Char('k') | KeyCode::Up) => app.move_cursor(-1),
        (KeyModifiers::NONE, KeyCode::PageDown) => app.move_cursor(10),
        (KeyModifiers::NONE, KeyCode::PageUp) => app.move_cursor(-10),
        (KeyModifiers::NONE, KeyCode::Char('g') | KeyCode::Home) => app.cursor = 0,
        (KeyModifiers::NONE, KeyCode::Char('G') | KeyCode::End) => app.cursor_to_end(),

        (KeyModifiers::NONE, KeyCode::Enter | KeyCode::Char('e')) => {
            app.open_editor(app.cursor);
        }
        (KeyModifiers::NONE, KeyCode::Char('a' | '+')) => app.add_item(),
        (KeyModifiers::NONE, KeyCode::Char('R')) => app.reset_list(),
        _ => {}
    }
}
