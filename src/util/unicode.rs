use unicode_segmentation::UnicodeSegmentation;
use unicode_width::UnicodeWidthStr;

/// Display width in terminal cells. Tabs count as 4 cells.
pub fn display_width(s: &str) -> usize {
    s.graphemes(true).map(grapheme_width).sum()
}

/// Truncate to fit within `max_cells` terminal cells, ending in `…` if cut.
pub fn truncate_to_width(s: &str, max_cells: usize) -> String {
    if display_width(s) <= max_cells {
        return s.to_string();
    }
    if max_cells == 0 {
        return String::new();
    }
    let budget = max_cells - 1;
    let mut width = 0;
    let mut out = String::new();
    for g in s.graphemes(true) {
        let gw = grapheme_width(g);
        if width + gw > budget {
            break;
        }
        width += gw;
        out.push_str(g);
    }
    out.push('\u{2026}');
    out
}

/// Byte offset of the grapheme boundary after `offset`, or None at the end.
pub fn next_grapheme_boundary(s: &str, offset: usize) -> Option<usize> {
    let rest = s.get(offset..)?;
    let g = rest.graphemes(true).next()?;
    Some(offset + g.len())
}

/// Byte offset of the grapheme boundary before `offset`, or None at the start.
pub fn prev_grapheme_boundary(s: &str, offset: usize) -> Option<usize> {
    let head = s.get(..offset)?;
    let g = head.graphemes(true).next_back()?;
    Some(offset - g.len())
}

/// Display column of byte `offset`.
pub fn offset_to_column(s: &str, offset: usize) -> usize {
    display_width(&s[..offset.min(s.len())])
}

fn grapheme_width(g: &str) -> usize {
    if g == "\t" { 4 } else { UnicodeWidthStr::width(g) }
}
