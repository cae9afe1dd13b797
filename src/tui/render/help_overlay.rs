use ratatui::Frame;
use ratatui::layout::Rect;
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Clear, Paragraph};

use crate::tui::app::App;

use super::centered_rect_fixed;

const LIST_BINDINGS: &[(&str, &str)] = &[
    ("\u{2191}\u{2193}/jk", "Move cursor up/down"),
    ("g/G", "Jump to top/bottom"),
    ("Enter/e", "Edit item"),
    ("a/+", "Add item"),
    ("R", "Reset an unreadable list"),
    ("?", "Toggle help"),
    ("q", "Quit"),
];

const EDITOR_BINDINGS: &[(&str, &str)] = &[
    ("Tab", "Switch field"),
    ("Enter/^S", "Save"),
    ("^D", "Delete item"),
    ("Esc", "Cancel"),
];

/// Render the help overlay (toggled with ?)
pub fn render_help_overlay(frame: &mut Frame, app: &App, area: Rect) {
    let height = (LIST_BINDINGS.len() + EDITOR_BINDINGS.len() + 7) as u16;
    let overlay_area = centered_rect_fixed(44, height, area);
    frame.render_widget(Clear, overlay_area);

    let bg = app.theme.background;
    let key_style = Style::default()
        .fg(app.theme.highlight)
        .bg(bg)
        .add_modifier(Modifier::BOLD);
    let desc_style = Style::default().fg(app.theme.text).bg(bg);
    let header_style = Style::default()
        .fg(app.theme.text_bright)
        .bg(bg)
        .add_modifier(Modifier::BOLD);

    let mut lines: Vec<Line> = Vec::new();
    lines.push(Line::from(Span::styled(" Key Bindings", header_style)));
    lines.push(Line::from(""));
    lines.push(Line::from(Span::styled(" List", header_style)));
    for (key, desc) in LIST_BINDINGS {
        add_binding(&mut lines, key, desc, key_style, desc_style);
    }
    lines.push(Line::from(""));
    lines.push(Line::from(Span::styled(" Editor", header_style)));
    for (key, desc) in EDITOR_BINDINGS {
        add_binding(&mut lines, key, desc, key_style, desc_style);
    }

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(app.theme.dim).bg(bg))
        .style(Style::default().bg(bg));
    frame.render_widget(Paragraph::new(lines).block(block), overlay_area);
}

fn add_binding<'a>(
    lines: &mut Vec<Line<'a>>,
    key: &'a str,
    desc: &'a str,
    key_style: Style,
    desc_style: Style,
) {
    lines.push(Line::from(vec![
        Span::styled(format!(" {:<12}", key), key_style),
        Span::styled(desc, desc_style),
    ]));
}
