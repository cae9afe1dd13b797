use ratatui::Frame;
use ratatui::layout::Rect;
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::Paragraph;

use crate::tui::app::App;
use crate::util::unicode::{display_width, truncate_to_width};

/// Render the item list, or the corruption banner when the stored list
/// could not be read.
pub fn render_list_view(frame: &mut Frame, app: &mut App, area: Rect) {
    let bg = app.theme.background;
    let width = area.width as usize;

    if let Some(corrupt) = &app.corrupt {
        let red = Style::default()
            .fg(app.theme.red)
            .bg(bg)
            .add_modifier(Modifier::BOLD);
        let dim = Style::default().fg(app.theme.dim).bg(bg);
        let lines = vec![
            Line::from(Span::styled(
                truncate_to_width(
                    &format!(" Stored list is unreadable: {}", corrupt.error),
                    width,
                ),
                red,
            )),
            Line::from(Span::styled(
                truncate_to_width(
                    " Press R to reset it. The unreadable text was saved to .recovery.log",
                    width,
                ),
                dim,
            )),
        ];
        frame.render_widget(Paragraph::new(lines).style(Style::default().bg(bg)), area);
        return;
    }

    if app.items.is_empty() {
        let line = Line::from(Span::styled(
            " No items yet. Press a to add one.",
            Style::default().fg(app.theme.dim).bg(bg),
        ));
        frame.render_widget(Paragraph::new(line).style(Style::default().bg(bg)), area);
        return;
    }

    let height = area.height as usize;
    app.scroll_to_cursor(height);

    let mut lines: Vec<Line> = Vec::with_capacity(height);
    for (i, item) in app
        .items
        .iter()
        .enumerate()
        .skip(app.scroll_offset)
        .take(height)
    {
        let selected = i == app.cursor;
        let row_bg = if selected { app.theme.selection_bg } else { bg };
        let title_fg = if selected {
            app.theme.text_bright
        } else {
            app.theme.text
        };

        let number = format!(" {:>2}  ", i + 1);
        let mut used = display_width(&number);
        let mut spans = vec![Span::styled(
            number,
            Style::default().fg(app.theme.dim).bg(row_bg),
        )];

        let title = truncate_to_width(&item.title, width.saturating_sub(used));
        used += display_width(&title);
        spans.push(Span::styled(title, Style::default().fg(title_fg).bg(row_bg)));

        // Description preview: first line only, after a gap
        let first_line = item.description.lines().next().unwrap_or("");
        if !first_line.is_empty() && used + 3 < width {
            let preview = truncate_to_width(first_line, width - used - 2);
            used += 2 + display_width(&preview);
            spans.push(Span::styled("  ", Style::default().bg(row_bg)));
            spans.push(Span::styled(
                preview,
                Style::default().fg(app.theme.dim).bg(row_bg),
            ));
        }

        if selected && used < width {
            spans.push(Span::styled(
                " ".repeat(width - used),
                Style::default().bg(row_bg),
            ));
        }
        lines.push(Line::from(spans));
    }

    frame.render_widget(Paragraph::new(lines).style(Style::default().bg(bg)), area);
}
