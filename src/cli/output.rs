use serde::Serialize;

use crate::io::recovery::RecoveryEntry;
use crate::model::Item;

// ---------------------------------------------------------------------------
// JSON output structs
// ---------------------------------------------------------------------------

#[derive(Serialize)]
pub struct ItemJson {
    /// 1-based, matching the numbers in text output
    pub index: usize,
    pub title: String,
    pub description: String,
}

pub fn item_to_json(index: usize, item: &Item) -> ItemJson {
    ItemJson {
        index: index + 1,
        title: item.title.clone(),
        description: item.description.clone(),
    }
}

pub fn items_to_json(items: &[Item]) -> Vec<ItemJson> {
    items
        .iter()
        .enumerate()
        .map(|(i, item)| item_to_json(i, item))
        .collect()
}

// ---------------------------------------------------------------------------
// Text formatting
// ---------------------------------------------------------------------------

/// One line per item, descriptions indented beneath.
pub fn format_item_list(items: &[Item]) -> Vec<String> {
    let width = items.len().to_string().len();
    let mut lines = Vec::new();
    for (i, item) in items.iter().enumerate() {
        lines.push(format!("{:>width$}. {}", i + 1, item.title, width = width));
        for desc_line in item.description.lines() {
            lines.push(format!("{:width$}  {}", "", desc_line, width = width));
        }
    }
    lines
}

pub fn format_item_detail(index: usize, item: &Item) -> Vec<String> {
    let mut lines = vec![format!("{}. {}", index + 1, item.title)];
    if !item.description.is_empty() {
        lines.push(String::new());
        lines.extend(item.description.lines().map(str::to_string));
    }
    lines
}

pub fn format_recovery_entry(entry: &RecoveryEntry) -> Vec<String> {
    let mut lines = vec![format!(
        "{}  {}: {}",
        entry
            .timestamp
            .to_rfc3339_opts(chrono::SecondsFormat::Secs, true),
        entry.category,
        entry.description
    )];
    for (key, value) in &entry.fields {
        lines.push(format!("  {}: {}", key, value));
    }
    for body_line in entry.body.lines() {
        lines.push(format!("  | {}", body_line));
    }
    lines
}
