use std::fmt;
use std::fs::OpenOptions;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use tempfile::NamedTempFile;

use crate::model::item::Item;

/// Header written at the top of a new recovery log.
const FILE_HEADER: &str = "\
<!-- listkeep recovery log: append-only error recovery data
     This file captures list data that could not be saved or read normally.
     If an item went missing, check here.
     View with: lk recovery
     Safe to delete if empty or stale. -->

---
";

/// Separator between timestamp and category in an entry header
const HEADER_SEP: &str = " - ";

/// Category of a recovery entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecoveryCategory {
    /// Stored text that could not be decoded
    Decode,
    /// A list write that failed
    Write,
    /// An edit discarded because the list changed underneath it
    Conflict,
    /// An item removed by the user
    Delete,
}

impl fmt::Display for RecoveryCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RecoveryCategory::Decode => write!(f, "decode"),
            RecoveryCategory::Write => write!(f, "write"),
            RecoveryCategory::Conflict => write!(f, "conflict"),
            RecoveryCategory::Delete => write!(f, "delete"),
        }
    }
}

impl RecoveryCategory {
    pub fn parse_category(s: &str) -> Option<Self> {
        match s {
            "decode" => Some(RecoveryCategory::Decode),
            "write" => Some(RecoveryCategory::Write),
            "conflict" => Some(RecoveryCategory::Conflict),
            "delete" => Some(RecoveryCategory::Delete),
            _ => None,
        }
    }
}

/// A single entry in the recovery log.
#[derive(Debug, Clone)]
pub struct RecoveryEntry {
    pub timestamp: DateTime<Utc>,
    pub category: RecoveryCategory,
    pub description: String,
    pub fields: Vec<(String, String)>,
    pub body: String,
}

/// Return the path to the recovery log file.
pub fn recovery_log_path(data_dir: &Path) -> PathBuf {
    data_dir.join(".recovery.log")
}

/// Write `content` to `path` atomically using a temp file + rename.
pub fn atomic_write(path: &Path, content: &[u8]) -> io::Result<()> {
    let dir = path.parent().unwrap_or(Path::new("."));
    let mut tmp = NamedTempFile::new_in(dir)?;
    tmp.write_all(content)?;
    tmp.flush()?;
    tmp.persist(path).map_err(|e| e.error)?;
    Ok(())
}

impl RecoveryEntry {
    fn new(category: RecoveryCategory, description: impl Into<String>) -> Self {
        RecoveryEntry {
            timestamp: Utc::now(),
            category,
            description: description.into(),
            fields: Vec::new(),
            body: String::new(),
        }
    }

    fn field(mut self, key: &str, value: impl Into<String>) -> Self {
        self.fields.push((key.to_string(), value.into()));
        self
    }

    fn body(mut self, body: impl Into<String>) -> Self {
        self.body = body.into();
        self
    }

    /// Format this entry as a markdown block for the recovery log.
    pub fn to_markdown(&self) -> String {
        let mut out = format!(
            "## {}{}{}: {}\n\n",
            self.timestamp
                .to_rfc3339_opts(chrono::SecondsFormat::Secs, true),
            HEADER_SEP,
            self.category,
            self.description,
        );

        for (key, value) in &self.fields {
            out.push_str(&format!("{}: {}\n", key, value));
        }

        if !self.body.is_empty() {
            let fence = fence_for(&self.body);
            out.push_str(&format!("\n{}text\n", fence));
            out.push_str(&self.body);
            if !self.body.ends_with('\n') {
                out.push('\n');
            }
            out.push_str(&fence);
            out.push('\n');
        }

        out.push_str("\n---\n");
        out
    }

    /// Serialize to a JSON value for `lk recovery --json`.
    pub fn to_json(&self) -> serde_json::Value {
        let fields: serde_json::Map<String, serde_json::Value> = self
            .fields
            .iter()
            .map(|(k, v)| (k.clone(), serde_json::Value::String(v.clone())))
            .collect();

        serde_json::json!({
            "timestamp": self.timestamp.to_rfc3339_opts(chrono::SecondsFormat::Secs, true),
            "category": self.category.to_string(),
            "description": self.description,
            "fields": fields,
            "body": self.body,
        })
    }
}

/// A backtick fence longer than any backtick run in `body`, so the body
/// cannot close it early.
fn fence_for(body: &str) -> String {
    let longest = body
        .split(|c| c != '`')
        .map(str::len)
        .max()
        .unwrap_or(0);
    "`".repeat(longest.max(2) + 1)
}

/// Append a recovery entry to the log. Errors are swallowed and printed to stderr.
pub fn log_recovery(data_dir: &Path, entry: RecoveryEntry) {
    if let Err(e) = log_recovery_inner(data_dir, entry) {
        eprintln!("warning: could not write to recovery log: {}", e);
    }
}

fn log_recovery_inner(data_dir: &Path, entry: RecoveryEntry) -> io::Result<()> {
    let path = recovery_log_path(data_dir);
    let needs_header = std::fs::metadata(&path).map_or(true, |m| m.len() == 0);

    let mut file = OpenOptions::new().create(true).append(true).open(&path)?;
    if needs_header {
        file.write_all(FILE_HEADER.as_bytes())?;
    }
    file.write_all(entry.to_markdown().as_bytes())?;
    Ok(())
}

/// Log stored text that could not be decoded, before it gets overwritten.
pub fn log_decode_failure(data_dir: &Path, key: &str, raw: &str, error: &str) {
    log_recovery(
        data_dir,
        RecoveryEntry::new(RecoveryCategory::Decode, "stored list unreadable")
            .field("Key", key)
            .field("Error", error)
            .body(raw),
    );
}

/// Log a write that did not reach the store, with the item text it carried.
pub fn log_write_failure(data_dir: &Path, action: &str, item: Option<&Item>, error: &str) {
    log_recovery(
        data_dir,
        RecoveryEntry::new(RecoveryCategory::Write, format!("{} failed", action))
            .field("Error", error)
            .body(item.map(Item::to_text).unwrap_or_default()),
    );
}

/// Log an edit that was discarded because its target moved or changed.
pub fn log_conflict(data_dir: &Path, index: usize, draft: &Item, reason: &str) {
    log_recovery(
        data_dir,
        RecoveryEntry::new(
            RecoveryCategory::Conflict,
            format!("edit of item {} discarded", index + 1),
        )
        .field("Reason", reason)
        .body(draft.to_text()),
    );
}

/// Log an item deletion so the text can be recovered.
pub fn log_item_deletion(data_dir: &Path, index: usize, item: &Item) {
    log_recovery(
        data_dir,
        RecoveryEntry::new(
            RecoveryCategory::Delete,
            format!("item {} deleted", index + 1),
        )
        .field("Title", item.title.clone())
        .body(item.to_text()),
    );
}

/// Read recovery entries from the log file, most recent first.
pub fn read_recovery_entries(data_dir: &Path, limit: Option<usize>) -> Vec<RecoveryEntry> {
    let content = match std::fs::read_to_string(recovery_log_path(data_dir)) {
        Ok(c) => c,
        Err(_) => return Vec::new(),
    };

    let mut entries = parse_entries(&content);
    if let Some(n) = limit {
        let skip = entries.len().saturating_sub(n);
        entries.drain(..skip);
    }
    entries.reverse();
    entries
}

/// Parse all entries from the log content, oldest first.
fn parse_entries(content: &str) -> Vec<RecoveryEntry> {
    let mut entries = Vec::new();
    let mut lines = content.lines();

    while let Some(line) = lines.next() {
        let Some(header) = line.strip_prefix("## ") else {
            continue;
        };
        let Some((timestamp, category, description)) = parse_entry_header(header) else {
            continue;
        };

        let mut fields = Vec::new();
        let mut body = String::new();
        // Closing fence of the body block we are inside, if any
        let mut fence: Option<&str> = None;

        for line in lines.by_ref() {
            if let Some(close) = fence {
                if line == close {
                    fence = None;
                } else {
                    if !body.is_empty() {
                        body.push('\n');
                    }
                    body.push_str(line);
                }
                continue;
            }
            if line == "---" {
                break;
            }
            if line.starts_with("```") {
                let ticks = line.len() - line.trim_start_matches('`').len();
                fence = Some(&line[..ticks]);
                continue;
            }
            if let Some((key, value)) = line.trim().split_once(": ") {
                fields.push((key.to_string(), value.to_string()));
            }
        }

        entries.push(RecoveryEntry {
            timestamp,
            category,
            description,
            fields,
            body,
        });
    }

    entries
}

/// Parse an entry header: `<timestamp> - <category>: <description>`
fn parse_entry_header(header: &str) -> Option<(DateTime<Utc>, RecoveryCategory, String)> {
    let (timestamp_str, rest) = header.split_once(HEADER_SEP)?;
    let timestamp = DateTime::parse_from_rfc3339(timestamp_str)
        .ok()?
        .with_timezone(&Utc);
    let (category_str, description) = rest.split_once(": ")?;
    let category = RecoveryCategory::parse_category(category_str)?;
    Some((timestamp, category, description.to_string()))
}
