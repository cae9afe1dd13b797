use ratatui::Frame;
use ratatui::layout::Rect;
use ratatui::style::Style;
use ratatui::text::{Line, Span};
use ratatui::widgets::Paragraph;

use crate::tui::app::{App, Editor, StatusKind};
use crate::util::unicode::{display_width, truncate_to_width};

const SAVING: &str = "saving\u{2026} ";

/// Render the status row (bottom of screen)
pub fn render_status_row(frame: &mut Frame, app: &App, area: Rect) {
    let bg = app.theme.background;
    let width = area.width as usize;

    let right = if app.pending_writes > 0 { SAVING } else { "" };
    let room = width.saturating_sub(display_width(right));

    // Recomputed every frame so typing in the editor does not hide it
    let stale = app.stale_draft_index();

    let mut spans = match (&app.status, stale) {
        (Some(status), _) => {
            let fg = match status.kind {
                StatusKind::Info => app.theme.text,
                StatusKind::Warning => app.theme.yellow,
                StatusKind::Error => app.theme.red,
            };
            vec![Span::styled(
                truncate_to_width(&format!(" {}", status.text), room),
                Style::default().fg(fg).bg(bg),
            )]
        }
        (None, Some(index)) => {
            vec![Span::styled(
                truncate_to_width(
                    &format!(
                        " Item {} changed elsewhere; saving will discard your edit",
                        index + 1
                    ),
                    room,
                ),
                Style::default().fg(app.theme.yellow).bg(bg),
            )]
        }
        (None, None) if app.show_key_hints && matches!(app.editor, Editor::Idle) => {
            let hints = if app.corrupt.is_some() {
                " R reset  ? help  q quit"
            } else {
                " a add  enter edit  ? help  q quit"
            };
            vec![Span::styled(
                truncate_to_width(hints, room),
                Style::default().fg(app.theme.dim).bg(bg),
            )]
        }
        (None, None) => Vec::new(),
    };

    if !right.is_empty() {
        let content_width: usize = spans.iter().map(|s| display_width(&s.content)).sum();
        if content_width < room {
            spans.push(Span::styled(
                " ".repeat(room - content_width),
                Style::default().bg(bg),
            ));
        }
        spans.push(Span::styled(
            right,
            Style::default().fg(app.theme.dim).bg(bg),
        ));
    }

    let paragraph = Paragraph::new(Line::from(spans)).style(Style::default().bg(bg));
    frame.render_widget(paragraph, area);
}
