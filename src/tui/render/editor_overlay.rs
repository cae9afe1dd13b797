use ratatui::Frame;
use ratatui::layout::Rect;
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Clear, Paragraph};
use unicode_segmentation::UnicodeSegmentation;

use crate::tui::app::{App, EditField};
use crate::util::unicode::{display_width, offset_to_column, truncate_to_width};

use super::centered_rect_fixed;

const OVERLAY_WIDTH: u16 = 60;
const OVERLAY_HEIGHT: u16 = 9;

/// Render the item editor popup (title and description inputs)
pub fn render_editor_overlay(frame: &mut Frame, app: &App, area: Rect) {
    let Some(draft) = app.draft() else {
        return;
    };

    let width = OVERLAY_WIDTH.min(area.width.saturating_sub(4));
    let overlay_area = centered_rect_fixed(width, OVERLAY_HEIGHT, area);
    frame.render_widget(Clear, overlay_area);

    let bg = app.theme.background;
    let block = Block::default()
        .title(format!(" Edit item {} ", draft.index + 1))
        .title_style(
            Style::default()
                .fg(app.theme.text_bright)
                .bg(bg)
                .add_modifier(Modifier::BOLD),
        )
        .borders(Borders::ALL)
        .border_style(Style::default().fg(app.theme.highlight).bg(bg))
        .style(Style::default().bg(bg));
    let inner = block.inner(overlay_area);
    frame.render_widget(block, overlay_area);

    // One leading space of padding on each input
    let avail = (inner.width as usize).saturating_sub(1);

    let mut lines: Vec<Line> = Vec::new();
    for (field, label, text) in [
        (EditField::Title, " Title", draft.draft.title.as_str()),
        (
            EditField::Description,
            " Description",
            draft.draft.description.as_str(),
        ),
    ] {
        let focused = draft.field == field;
        let label_style = if focused {
            Style::default()
                .fg(app.theme.highlight)
                .bg(bg)
                .add_modifier(Modifier::BOLD)
        } else {
            Style::default().fg(app.theme.dim).bg(bg)
        };
        lines.push(Line::from(Span::styled(label, label_style)));

        let text_style = Style::default().fg(app.theme.text_bright).bg(bg);
        let mut spans = vec![Span::styled(" ", Style::default().bg(bg))];
        if focused {
            let (before, after) = input_window(text, draft.cursor, avail);
            spans.push(Span::styled(before, text_style));
            spans.push(Span::styled(
                "\u{258C}",
                Style::default().fg(app.theme.highlight).bg(bg),
            )); // ▌ cursor
            spans.push(Span::styled(after, text_style));
        } else if text.is_empty() {
            spans.push(Span::styled("empty", Style::default().fg(app.theme.dim).bg(bg)));
        } else {
            spans.push(Span::styled(truncate_to_width(text, avail), text_style));
        }
        lines.push(Line::from(spans));
        lines.push(Line::from(""));
    }

    lines.push(Line::from(Span::styled(
        truncate_to_width(" esc cancel  enter save  tab switch  ctrl+d delete", inner.width as usize),
        Style::default().fg(app.theme.dim).bg(bg),
    )));

    frame.render_widget(Paragraph::new(lines).style(Style::default().bg(bg)), inner);
}

/// Split `text` around the cursor into the parts that fit in `avail` cells,
/// leaving one cell for the cursor. Scrolls horizontally so the cursor is
/// always visible.
fn input_window(text: &str, cursor: usize, avail: usize) -> (String, String) {
    let room = avail.saturating_sub(1);
    let (before, after) = text.split_at(cursor.min(text.len()));

    let shown_before = if offset_to_column(text, cursor) <= room {
        before.to_string()
    } else {
        let mut start = before.len();
        let mut used = 0;
        for (i, g) in before.grapheme_indices(true).rev() {
            let gw = display_width(g);
            if used + gw > room {
                break;
            }
            used += gw;
            start = i;
        }
        before[start..].to_string()
    };

    let left = room.saturating_sub(display_width(&shown_before));
    (shown_before, truncate_to_width(after, left))
}
