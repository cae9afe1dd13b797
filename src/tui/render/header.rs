use ratatui::Frame;
use ratatui::layout::Rect;
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::Paragraph;

use crate::tui::app::App;
use crate::util::unicode::display_width;

/// Render the title row: app name on the left, item count on the right
pub fn render_header(frame: &mut Frame, app: &App, area: Rect) {
    let bg = app.theme.background;
    let title = " listkeep";
    let count = match app.items.len() {
        1 => "1 item".to_string(),
        n => format!("{} items", n),
    };

    let mut spans = vec![Span::styled(
        title,
        Style::default()
            .fg(app.theme.highlight)
            .bg(bg)
            .add_modifier(Modifier::BOLD),
    )];
    let used = display_width(title) + display_width(&count);
    let width = area.width as usize;
    if used < width {
        spans.push(Span::styled(" ".repeat(width - used), Style::default().bg(bg)));
        spans.push(Span::styled(count, Style::default().fg(app.theme.dim).bg(bg)));
    }

    frame.render_widget(
        Paragraph::new(Line::from(spans)).style(Style::default().bg(bg)),
        area,
    );
}
