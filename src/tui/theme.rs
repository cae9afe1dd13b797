use ratatui::style::Color;

use crate::model::UiConfig;

/// Parsed color theme for the TUI
#[derive(Debug, Clone)]
pub struct Theme {
    pub background: Color,
    pub text: Color,
    pub text_bright: Color,
    pub highlight: Color,
    pub dim: Color,
    pub red: Color,
    pub yellow: Color,
    pub selection_bg: Color,
}

impl Default for Theme {
    fn default() -> Self {
        Theme {
            background: Color::Rgb(0x0C, 0x00, 0x1B),
            text: Color::Rgb(0xB0, 0xAA, 0xFF),
            text_bright: Color::Rgb(0xFF, 0xFF, 0xFF),
            highlight: Color::Rgb(0xFB, 0x41, 0x96),
            dim: Color::Rgb(0x7D, 0x78, 0xBF),
            red: Color::Rgb(0xFF, 0x44, 0x44),
            yellow: Color::Rgb(0xFF, 0xD7, 0x00),
            selection_bg: Color::Rgb(0x3D, 0x14, 0x38),
        }
    }
}

/// Parse a hex color string like "#FF4444" into an RGB Color
fn parse_hex_color(hex: &str) -> Option<Color> {
    let hex = hex.strip_prefix('#')?;
    if hex.len() != 6 || !hex.is_ascii() {
        return None;
    }
    let channel = |range: std::ops::Range<usize>| u8::from_str_radix(&hex[range], 16).ok();
    Some(Color::Rgb(channel(0..2)?, channel(2..4)?, channel(4..6)?))
}

impl Theme {
    /// Create a theme from the `[ui.colors]` table, falling back to defaults
    /// for unknown slots and unparseable values.
    pub fn from_config(ui: &UiConfig) -> Self {
        let mut theme = Theme::default();
        for (key, value) in &ui.colors {
            let Some(color) = parse_hex_color(value) else {
                continue;
            };
            let slot = match key.as_str() {
                "background" => &mut theme.background,
                "text" => &mut theme.text,
                "text_bright" => &mut theme.text_bright,
                "highlight" => &mut theme.highlight,
                "dim" => &mut theme.dim,
                "red" => &mut theme.red,
                "yellow" => &mut theme.yellow,
                "selection_bg" => &mut theme.selection_bg,
                _ => continue,
            };
            *slot = color;
        }
        theme
    }
}
