use std::io;
use std::mem;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use crossterm::event::{self, DisableBracketedPaste, EnableBracketedPaste, Event, KeyEventKind};
use crossterm::execute;
use crossterm::terminal::{
    EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode,
};
use ratatui::Terminal;
use ratatui::backend::CrosstermBackend;

use crate::io::config_io::{read_config, resolve_data_dir};
use crate::io::recovery;
use crate::io::repository::{ItemStream, ListRepository, RepositoryError};
use crate::io::store::FileStore;
use crate::io::watcher::StoreWatcher;
use crate::io::writer::{WriteOutcome, Writer};
use crate::model::{Config, Item};
use crate::ops::list_ops::WriteOp;
use crate::parse::DecodeError;
use crate::util::unicode;

use super::input;
use super::render;
use super::theme::Theme;

/// Which field of the editor has focus
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditField {
    Title,
    Description,
}

/// An item being edited in the overlay.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EditDraft {
    /// Position of the item when the editor was opened
    pub index: usize,
    /// The item as it was when the editor was opened
    pub original: Item,
    /// The candidate replacement
    pub draft: Item,
    pub field: EditField,
    /// Byte offset into the focused field's text
    pub cursor: usize,
}

impl EditDraft {
    pub fn new(index: usize, item: Item) -> Self {
        EditDraft {
            index,
            cursor: item.title.len(),
            original: item.clone(),
            draft: item,
            field: EditField::Title,
        }
    }

    /// Text of the focused field
    pub fn active_text(&self) -> &str {
        match self.field {
            EditField::Title => &self.draft.title,
            EditField::Description => &self.draft.description,
        }
    }

    fn replace_active_text(&mut self, text: String) {
        self.draft = match self.field {
            EditField::Title => self.draft.with_title(text),
            EditField::Description => self.draft.with_description(text),
        };
    }

    pub fn insert_str(&mut self, s: &str) {
        let mut text = self.active_text().to_string();
        text.insert_str(self.cursor, s);
        self.cursor += s.len();
        self.replace_active_text(text);
    }

    pub fn backspace(&mut self) {
        let Some(start) = unicode::prev_grapheme_boundary(self.active_text(), self.cursor) else {
            return;
        };
        let mut text = self.active_text().to_string();
        text.replace_range(start..self.cursor, "");
        self.cursor = start;
        self.replace_active_text(text);
    }

    pub fn delete_forward(&mut self) {
        let Some(end) = unicode::next_grapheme_boundary(self.active_text(), self.cursor) else {
            return;
        };
        let mut text = self.active_text().to_string();
        text.replace_range(self.cursor..end, "");
        self.replace_active_text(text);
    }

    pub fn move_left(&mut self) {
        if let Some(pos) = unicode::prev_grapheme_boundary(self.active_text(), self.cursor) {
            self.cursor = pos;
        }
    }

    pub fn move_right(&mut self) {
        if let Some(pos) = unicode::next_grapheme_boundary(self.active_text(), self.cursor) {
            self.cursor = pos;
        }
    }

    pub fn move_home(&mut self) {
        self.cursor = 0;
    }

    pub fn move_end(&mut self) {
        self.cursor = self.active_text().len();
    }

    /// Move focus to the other field, cursor at its end.
    pub fn switch_field(&mut self) {
        self.field = match self.field {
            EditField::Title => EditField::Description,
            EditField::Description => EditField::Title,
        };
        self.move_end();
    }
}

/// Editor state: either nothing open, or one item being edited.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Editor {
    Idle,
    Editing(EditDraft),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusKind {
    Info,
    Warning,
    Error,
}

/// One-line message shown in the status row until the next key press
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusMessage {
    pub text: String,
    pub kind: StatusKind,
}

/// The stored list could not be decoded
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CorruptList {
    pub raw: String,
    pub error: String,
}

/// Main application state
pub struct App {
    /// Latest list snapshot from the store
    pub items: Vec<Item>,
    /// Set while the stored value is unreadable; `items` is then empty
    pub corrupt: Option<CorruptList>,
    pub editor: Editor,
    pub cursor: usize,
    pub scroll_offset: usize,
    pub theme: Theme,
    pub show_help: bool,
    pub show_key_hints: bool,
    pub status: Option<StatusMessage>,
    pub should_quit: bool,
    /// Writes submitted and not yet reported back
    pub pending_writes: usize,
    /// Writes requested since the event loop last flushed them
    outbox: Vec<WriteOp>,
    data_dir: PathBuf,
    store_key: String,
}

impl App {
    pub fn new(data_dir: PathBuf, config: &Config) -> Self {
        App {
            items: Vec::new(),
            corrupt: None,
            editor: Editor::Idle,
            cursor: 0,
            scroll_offset: 0,
            theme: Theme::from_config(&config.ui),
            show_help: false,
            show_key_hints: config.ui.show_key_hints,
            status: None,
            should_quit: false,
            pending_writes: 0,
            outbox: Vec::new(),
            data_dir,
            store_key: config.store.key.clone(),
        }
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    pub fn set_status(&mut self, kind: StatusKind, text: impl Into<String>) {
        self.status = Some(StatusMessage {
            text: text.into(),
            kind,
        });
    }

    /// The draft being edited, if any
    pub fn draft(&self) -> Option<&EditDraft> {
        match &self.editor {
            Editor::Editing(draft) => Some(draft),
            Editor::Idle => None,
        }
    }

    pub fn draft_mut(&mut self) -> Option<&mut EditDraft> {
        match &mut self.editor {
            Editor::Editing(draft) => Some(draft),
            Editor::Idle => None,
        }
    }

    /// Hand queued writes to the event loop.
    pub fn take_outbox(&mut self) -> Vec<WriteOp> {
        let ops = mem::take(&mut self.outbox);
        self.pending_writes += ops.len();
        ops
    }

    fn dispatch(&mut self, op: WriteOp) {
        self.outbox.push(op);
    }

    // -----------------------------------------------------------------------
    // Store events
    // -----------------------------------------------------------------------

    /// Replace the displayed list with a new snapshot from the store.
    pub fn apply_snapshot(&mut self, snapshot: Result<Vec<Item>, DecodeError>) {
        match snapshot {
            Ok(items) => {
                self.items = items;
                self.corrupt = None;
            }
            Err(err) => {
                let already_logged = self.corrupt.as_ref().is_some_and(|c| c.raw == err.raw);
                if !already_logged {
                    recovery::log_decode_failure(
                        &self.data_dir,
                        &self.store_key,
                        &err.raw,
                        &err.source.to_string(),
                    );
                }
                self.items.clear();
                self.corrupt = Some(CorruptList {
                    raw: err.raw,
                    error: err.source.to_string(),
                });
            }
        }
        self.clamp_cursor();
    }

    /// Index of the item being edited if the latest snapshot no longer
    /// holds it unchanged at that position.
    pub fn stale_draft_index(&self) -> Option<usize> {
        self.draft()
            .filter(|d| self.items.get(d.index) != Some(&d.original))
            .map(|d| d.index)
    }

    /// Report the result of a queued write.
    pub fn apply_outcome(&mut self, outcome: WriteOutcome) {
        self.pending_writes = self.pending_writes.saturating_sub(1);
        match outcome {
            WriteOutcome::Applied { op, .. } => match op {
                WriteOp::Remove {
                    index,
                    expected: Some(item),
                } => {
                    recovery::log_item_deletion(&self.data_dir, index, &item);
                    self.set_status(StatusKind::Info, format!("Deleted \"{}\"", item.title));
                }
                WriteOp::Reset => self.set_status(StatusKind::Info, "List reset"),
                _ => {}
            },
            WriteOutcome::Discarded { op, reason } => {
                if let WriteOp::Replace { index, item, .. } = &op {
                    recovery::log_conflict(&self.data_dir, *index, item, &reason.to_string());
                }
                self.set_status(
                    StatusKind::Warning,
                    format!("Could not {}: {} (nothing was changed)", op, reason),
                );
            }
            WriteOutcome::Failed { op, error } => {
                let item = match &op {
                    WriteOp::Append(item) | WriteOp::Replace { item, .. } => Some(item),
                    _ => None,
                };
                recovery::log_write_failure(&self.data_dir, &op.to_string(), item, &error.to_string());
                let hint = if matches!(error, RepositoryError::Decode(_)) {
                    " (press R to reset the list)"
                } else {
                    ""
                };
                self.set_status(
                    StatusKind::Error,
                    format!("Could not {}: {}{}", op, error, hint),
                );
            }
        }
    }

    // -----------------------------------------------------------------------
    // User actions
    // -----------------------------------------------------------------------

    /// Append a new default item. Does not open the editor.
    pub fn add_item(&mut self) {
        self.dispatch(WriteOp::AppendDefault);
    }

    /// Open the editor on the item at `index`.
    pub fn open_editor(&mut self, index: usize) -> bool {
        let Some(item) = self.items.get(index) else {
            return false;
        };
        self.editor = Editor::Editing(EditDraft::new(index, item.clone()));
        self.cursor = index;
        true
    }

    /// Close the editor without writing.
    pub fn cancel_edit(&mut self) {
        self.editor = Editor::Idle;
    }

    /// Write the draft over the item it was opened on, then close the editor.
    pub fn save_edit(&mut self) {
        let Editor::Editing(d) = mem::replace(&mut self.editor, Editor::Idle) else {
            return;
        };
        if !self.guard_index(&d) {
            return;
        }
        self.dispatch(WriteOp::Replace {
            index: d.index,
            expected: Some(d.original),
            item: d.draft,
        });
    }

    /// Remove the item being edited, then close the editor.
    pub fn delete_edited(&mut self) {
        let Editor::Editing(d) = mem::replace(&mut self.editor, Editor::Idle) else {
            return;
        };
        if !self.guard_index(&d) {
            return;
        }
        self.dispatch(WriteOp::Remove {
            index: d.index,
            expected: Some(d.original),
        });
    }

    /// Check the draft's index against the current snapshot before issuing
    /// a write. The writer checks again against the stored list.
    fn guard_index(&mut self, d: &EditDraft) -> bool {
        if d.index < self.items.len() {
            return true;
        }
        let reason = format!("item {} no longer exists", d.index + 1);
        recovery::log_conflict(&self.data_dir, d.index, &d.draft, &reason);
        self.set_status(StatusKind::Warning, format!("Edit discarded: {}", reason));
        false
    }

    /// Wait for every submitted write to report back, so failures are
    /// logged before the app exits. Gives up after `timeout` without news.
    pub fn finish_writes(&mut self, writer: &Writer, timeout: Duration) {
        while self.pending_writes > 0 {
            let Some(outcome) = writer.wait(timeout) else {
                break;
            };
            self.apply_outcome(outcome);
        }
    }

    /// Replace an unreadable stored list with an empty one.
    pub fn reset_list(&mut self) {
        if self.corrupt.is_some() {
            self.dispatch(WriteOp::Reset);
        }
    }

    // -----------------------------------------------------------------------
    // Cursor
    // -----------------------------------------------------------------------

    pub fn move_cursor(&mut self, delta: isize) {
        if self.items.is_empty() {
            self.cursor = 0;
            return;
        }
        let max = self.items.len() - 1;
        self.cursor = self.cursor.saturating_add_signed(delta).min(max);
    }

    pub fn cursor_to_end(&mut self) {
        self.cursor = self.items.len().saturating_sub(1);
    }

    fn clamp_cursor(&mut self) {
        self.cursor = self.cursor.min(self.items.len().saturating_sub(1));
    }

    /// Adjust scroll so the cursor row is inside a window of `height` rows.
    pub fn scroll_to_cursor(&mut self, height: usize) {
        if height == 0 {
            return;
        }
        if self.cursor < self.scroll_offset {
            self.scroll_offset = self.cursor;
        } else if self.cursor >= self.scroll_offset + height {
            self.scroll_offset = self.cursor + 1 - height;
        }
        let max_offset = self.items.len().saturating_sub(height);
        self.scroll_offset = self.scroll_offset.min(max_offset);
    }
}

// ---------------------------------------------------------------------------
// Terminal lifecycle
// ---------------------------------------------------------------------------

/// Run the TUI application
pub fn run(data_dir: Option<&Path>) -> Result<(), Box<dyn std::error::Error>> {
    let data_dir = resolve_data_dir(data_dir);
    let config = read_config(&data_dir)?;
    let store = Arc::new(FileStore::open(&data_dir, &config.store.file)?);
    let repo = ListRepository::with_key(Arc::clone(&store), config.store.key.clone());
    let stream = repo.items()?;
    let writer = Writer::spawn(repo)?;
    // Without a watcher the TUI still works; it just misses external edits
    let watcher = StoreWatcher::start(store.path()).ok();

    let mut app = App::new(data_dir, &config);

    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableBracketedPaste)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;
    terminal.clear()?;

    let original_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |panic_info| {
        let _ = disable_raw_mode();
        let _ = execute!(io::stdout(), DisableBracketedPaste, LeaveAlternateScreen);
        original_hook(panic_info);
    }));

    let loop_ctx = EventLoop {
        store: &store,
        stream: &stream,
        writer: &writer,
        watcher: watcher.as_ref(),
    };
    let result = loop_ctx.run(&mut terminal, &mut app);

    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        DisableBracketedPaste,
        LeaveAlternateScreen
    )?;
    terminal.show_cursor()?;

    drop(writer);
    if let Some(status) = app.status.as_ref().filter(|s| s.kind == StatusKind::Error) {
        eprintln!("warning: {} (see .recovery.log)", status.text);
    }
    result
}

/// Longer than the store's lock timeout, so a contended final write can
/// still report back.
const QUIT_WRITE_TIMEOUT: Duration = Duration::from_secs(10);

struct EventLoop<'a> {
    store: &'a FileStore,
    stream: &'a ItemStream,
    writer: &'a Writer,
    watcher: Option<&'a StoreWatcher>,
}

impl EventLoop<'_> {
    fn run(
        &self,
        terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
        app: &mut App,
    ) -> Result<(), Box<dyn std::error::Error>> {
        loop {
            self.sync(app);
            terminal.draw(|frame| render::render(frame, app))?;

            if event::poll(Duration::from_millis(250))? {
                match event::read()? {
                    Event::Key(key) if key.kind == KeyEventKind::Press => {
                        input::handle_key(app, key)
                    }
                    Event::Paste(text) => input::handle_paste(app, &text),
                    _ => {}
                }
            }

            if app.should_quit {
                self.sync(app);
                app.finish_writes(self.writer, QUIT_WRITE_TIMEOUT);
                return Ok(());
            }
        }
    }

    /// Exchange state with the store: external changes, new snapshots,
    /// finished writes, and newly requested writes.
    fn sync(&self, app: &mut App) {
        if self.watcher.is_some_and(StoreWatcher::poll_changed)
            && let Err(e) = self.store.reload()
        {
            app.set_status(StatusKind::Error, format!("Could not reload list: {}", e));
        }
        if let Some(snapshot) = self.stream.poll_latest() {
            app.apply_snapshot(snapshot);
        }
        for outcome in self.writer.poll() {
            app.apply_outcome(outcome);
        }
        for op in app.take_outbox() {
            if !self.writer.submit(op) {
                app.pending_writes = app.pending_writes.saturating_sub(1);
                app.set_status(StatusKind::Error, "Writer stopped; changes are not being saved");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::recovery::{RecoveryCategory, read_recovery_entries};
    use crate::ops::list_ops::ListError;
    use crate::tui::render::test_helpers::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn add_queues_append_without_opening_editor() {
        let mut app = app_with_items(&["A"]);
        app.add_item();
        assert_eq!(app.editor, Editor::Idle);
        assert_eq!(app.take_outbox(), vec![WriteOp::AppendDefault]);
        assert_eq!(app.pending_writes, 1);
        assert!(app.take_outbox().is_empty());
    }

    #[test]
    fn edit_then_save_replaces_item() {
        let mut app = app_with_items(&["A", "B"]);
        assert!(app.open_editor(1));
        let d = app.draft_mut().unwrap();
        d.insert_str("2");
        app.save_edit();

        assert_eq!(app.editor, Editor::Idle);
        let ops = app.take_outbox();
        assert_eq!(
            ops,
            vec![WriteOp::Replace {
                index: 1,
                expected: Some(Item::new("B")),
                item: Item::new("B2"),
            }]
        );
        let after = ops[0].apply(app.items.clone()).unwrap();
        assert_eq!(after, vec![Item::new("A"), Item::new("B2")]);
    }

    #[test]
    fn delete_removes_item() {
        let mut app = app_with_items(&["A", "B"]);
        app.open_editor(0);
        app.delete_edited();
        let ops = app.take_outbox();
        assert_eq!(ops[0].apply(app.items.clone()).unwrap(), vec![Item::new("B")]);
        assert_eq!(app.editor, Editor::Idle);
    }

    #[test]
    fn cancel_issues_no_write() {
        let mut app = app_with_items(&["A", "B"]);
        app.open_editor(0);
        let d = app.draft_mut().unwrap();
        d.insert_str("xyz");
        d.switch_field();
        d.insert_str("notes");
        app.cancel_edit();
        assert_eq!(app.editor, Editor::Idle);
        assert!(app.take_outbox().is_empty());
        assert_eq!(app.items, vec![Item::new("A"), Item::new("B")]);
    }

    #[test]
    fn open_editor_out_of_range_stays_idle() {
        let mut app = app_with_items(&["A"]);
        assert!(!app.open_editor(3));
        assert_eq!(app.editor, Editor::Idle);
    }

    #[test]
    fn save_after_list_shrank_is_discarded() {
        let mut app = app_with_items(&["A", "B"]);
        app.open_editor(1);
        app.apply_snapshot(Ok(vec![Item::new("A")]));
        assert_eq!(app.stale_draft_index(), Some(1));

        app.save_edit();
        assert_eq!(app.editor, Editor::Idle);
        assert!(app.take_outbox().is_empty());
        let entries = read_recovery_entries(app.data_dir(), None);
        assert_eq!(entries[0].category, RecoveryCategory::Conflict);
    }

    #[test]
    fn draft_field_edits_are_grapheme_aware() {
        let mut d = EditDraft::new(0, Item::new("cafe\u{0301}"));
        d.backspace();
        assert_eq!(d.draft.title, "caf");
        d.move_home();
        d.delete_forward();
        assert_eq!(d.draft.title, "af");
        d.move_right();
        d.insert_str("é");
        assert_eq!(d.draft.title, "aéf");
        d.move_end();
        d.move_left();
        d.move_left();
        assert_eq!(d.cursor, 1);
    }

    #[test]
    fn switch_field_edits_description() {
        let mut d = EditDraft::new(0, Item::new("T").with_description("d"));
        d.switch_field();
        assert_eq!(d.field, EditField::Description);
        assert_eq!(d.cursor, 1);
        d.insert_str("!");
        assert_eq!(d.draft, Item::new("T").with_description("d!"));
        assert_eq!(d.original, Item::new("T").with_description("d"));
    }

    #[test]
    fn corrupt_snapshot_shows_empty_list_and_logs_once() {
        let mut app = app_with_items(&["A"]);
        let bad = || crate::parse::decode_items("{oops").unwrap_err();
        app.apply_snapshot(Err(bad()));
        app.apply_snapshot(Err(bad()));

        assert!(app.items.is_empty());
        assert_eq!(app.corrupt.as_ref().unwrap().raw, "{oops");
        let entries = read_recovery_entries(app.data_dir(), None);
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].category, RecoveryCategory::Decode);
        assert_eq!(entries[0].body, "{oops");

        app.reset_list();
        assert_eq!(app.take_outbox(), vec![WriteOp::Reset]);

        app.apply_snapshot(Ok(Vec::new()));
        assert!(app.corrupt.is_none());
    }

    #[test]
    fn reset_is_ignored_when_list_is_readable() {
        let mut app = app_with_items(&["A"]);
        app.reset_list();
        assert!(app.take_outbox().is_empty());
    }

    #[test]
    fn snapshot_clamps_cursor() {
        let mut app = app_with_items(&["A", "B", "C"]);
        app.cursor = 2;
        app.apply_snapshot(Ok(vec![Item::new("A")]));
        assert_eq!(app.cursor, 0);
    }

    #[test]
    fn discarded_outcome_warns_and_logs_draft() {
        let mut app = app_with_items(&["A"]);
        app.pending_writes = 1;
        app.apply_outcome(WriteOutcome::Discarded {
            op: WriteOp::Replace {
                index: 0,
                expected: Some(Item::new("A")),
                item: Item::new("A2"),
            },
            reason: ListError::Changed { index: 0 },
        });
        assert_eq!(app.pending_writes, 0);
        let status = app.status.clone().unwrap();
        assert_eq!(status.kind, StatusKind::Warning);
        assert!(status.text.contains("save item 1"));
        let entries = read_recovery_entries(app.data_dir(), None);
        assert_eq!(entries[0].body, "A2");
    }

    #[test]
    fn failed_outcome_is_an_error_status() {
        let mut app = app_with_items(&[]);
        app.apply_outcome(WriteOutcome::Failed {
            op: WriteOp::AppendDefault,
            error: RepositoryError::Store(crate::io::store::StoreError::Unavailable),
        });
        let status = app.status.clone().unwrap();
        assert_eq!(status.kind, StatusKind::Error);
        assert_eq!(status.text, "Could not add: store is unavailable");
        let entries = read_recovery_entries(app.data_dir(), None);
        assert_eq!(entries[0].category, RecoveryCategory::Write);
    }

    #[test]
    fn applied_delete_is_logged() {
        let mut app = app_with_items(&["A"]);
        app.apply_outcome(WriteOutcome::Applied {
            op: WriteOp::Remove {
                index: 0,
                expected: Some(Item::new("A")),
            },
            items: Vec::new(),
        });
        let entries = read_recovery_entries(app.data_dir(), None);
        assert_eq!(entries[0].category, RecoveryCategory::Delete);
        assert_eq!(app.status.as_ref().unwrap().text, "Deleted \"A\"");
    }

    #[test]
    fn scroll_follows_cursor() {
        let names: Vec<String> = (0..20).map(|i| format!("I{}", i)).collect();
        let refs: Vec<&str> = names.iter().map(String::as_str).collect();
        let mut app = app_with_items(&refs);
        app.cursor = 15;
        app.scroll_to_cursor(5);
        assert_eq!(app.scroll_offset, 11);
        app.cursor = 3;
        app.scroll_to_cursor(5);
        assert_eq!(app.scroll_offset, 3);
        app.move_cursor(100);
        assert_eq!(app.cursor, 19);
        app.move_cursor(-100);
        assert_eq!(app.cursor, 0);
    }
}
