pub mod editor_overlay;
pub mod header;
pub mod help_overlay;
pub mod list_view;
pub mod status_row;
#[cfg(test)]
pub mod test_helpers;

use ratatui::Frame;
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::Style;
use ratatui::widgets::Block;

use super::app::{App, Editor};

/// Main render function: dispatches to sub-renderers
pub fn render(frame: &mut Frame, app: &mut App) {
    let area = frame.area();

    let bg_style = Style::default().bg(app.theme.background);
    frame.render_widget(Block::default().style(bg_style), area);

    // Layout: header (1 row) | list | status row (1 row)
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1),
            Constraint::Min(1),
            Constraint::Length(1),
        ])
        .split(area);

    header::render_header(frame, app, chunks[0]);
    list_view::render_list_view(frame, app, chunks[1]);
    status_row::render_status_row(frame, app, chunks[2]);

    if let Editor::Editing(_) = app.editor {
        editor_overlay::render_editor_overlay(frame, app, area);
    }
    if app.show_help {
        help_overlay::render_help_overlay(frame, app, area);
    }
}

/// A `width` x `height` rect centered in `area`, clipped to it.
pub(super) fn centered_rect_fixed(width: u16, height: u16, area: Rect) -> Rect {
    let width = width.min(area.width);
    let height = height.min(area.height);
    let x = area.x + (area.width - width) / 2;
    let y = area.y + (area.height - height) / 2;
    Rect::new(x, y, width, height)
}

#[cfg(test)]
mod tests {
    use super::test_helpers::*;
    use super::*;

    #[test]
    fn centered_rect_clips_to_area() {
        let area = Rect::new(0, 0, 20, 10);
        assert_eq!(centered_rect_fixed(10, 4, area), Rect::new(5, 3, 10, 4));
        assert_eq!(centered_rect_fixed(50, 50, area), area);
    }

    #[test]
    fn full_screen_shows_header_rows_and_hints() {
        let mut app = app_with_items(&["Groceries", "Call mum"]);
        let output = render_to_string(TERM_W, TERM_H, |frame, _area| {
            render(frame, &mut app);
        });
        let lines: Vec<&str> = output.lines().collect();
        assert!(lines[0].starts_with(" listkeep"));
        assert!(lines[0].ends_with("2 items"));
        assert!(lines[1].contains("1  Groceries"));
        assert!(lines[2].contains("2  Call mum"));
        assert!(output.contains("a add"));
    }

    #[test]
    fn editor_overlay_drawn_over_list() {
        let mut app = app_with_items(&["Groceries"]);
        app.open_editor(0);
        let output = render_to_string(TERM_W, TERM_H, |frame, _area| {
            render(frame, &mut app);
        });
        assert!(output.contains("Edit item 1"));
        assert!(output.contains("Description"));
    }

    #[test]
    fn help_overlay_drawn_when_toggled() {
        let mut app = app_with_items(&[]);
        app.show_help = true;
        let output = render_to_string(TERM_W, TERM_H, |frame, _area| {
            render(frame, &mut app);
        });
        assert!(output.contains("Key Bindings"));
    }
}
