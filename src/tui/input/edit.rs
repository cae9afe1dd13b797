use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

use crate::tui::app::App;

pub(super) fn handle_edit(app: &mut App, key: KeyEvent) {
    match (key.modifiers, key.code) {
        (_, KeyCode::Esc) => app.cancel_edit(),
        (KeyModifiers::NONE, KeyCode::Enter) | (KeyModifiers::CONTROL, KeyCode::Char('s')) => {
            app.save_edit()
        }
        (KeyModifiers::CONTROL, KeyCode::Char('d')) => app.delete_edited(),
        _ => edit_text(app, key),
    }
}

fn edit_text(app: &mut App, key: KeyEvent) {
    let Some(draft) = app.draft_mut() else {
        return;
    };
    match (key.modifiers, key.code) {
        (_, KeyCode::Tab | KeyCode::BackTab | KeyCode::Up | KeyCode::Down) => {
            draft.switch_field()
        }
        (_, KeyCode::Left) => draft.move_left(),
        (_, KeyCode::Right) => draft.move_right(),
        (_, KeyCode::Home) | (KeyModifiers::CONTROL, KeyCode::Char('a')) => draft.move_home(),
        (_, KeyCode::End) | (KeyModifiers::CONTROL, KeyCode::Char('e')) => draft.move_end(),
        (_, KeyCode::Backspace) => draft.backspace(),
        (_, KeyCode::Delete) => draft.delete_forward(),
        (KeyModifiers::NONE, KeyCode::Char(c)) => {
            let mut buf = [0u8; 4];
            draft.insert_str(c.encode_utf8(&mut buf));
        }
        _ => {}
    }
}
