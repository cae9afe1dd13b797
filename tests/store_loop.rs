//! End-to-end tests of the store -> repository -> UI -> writer loop, driven
//! by key presses the way the terminal event loop drives it.

use std::sync::Arc;
use std::time::Duration;

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use pretty_assertions::assert_eq;

use listkeep::io::recovery::{RecoveryCategory, read_recovery_entries};
use listkeep::io::repository::{ItemStream, ListRepository};
use listkeep::io::store::{FileStore, MemoryStore, Store};
use listkeep::io::writer::{WriteOutcome, Writer};
use listkeep::model::{Config, Item};
use listkeep::ops::list_ops::WriteOp;
use listkeep::tui::app::{App, Editor, StatusKind};
use listkeep::tui::input::handle_key;

const WAIT: Duration = Duration::from_secs(5);

struct Harness<S: Store + 'static> {
    repo: ListRepository<S>,
    stream: ItemStream,
    writer: Writer,
    app: App,
    _dir: tempfile::TempDir,
}

impl<S: Store + 'static> Harness<S> {
    fn new(store: Arc<S>) -> Self {
        let dir = tempfile::tempdir().unwrap();
        let repo = ListRepository::new(store);
        let stream = repo.items().unwrap();
        let writer = Writer::spawn(repo.clone()).unwrap();
        let mut app = App::new(dir.path().to_path_buf(), &Config::default());
        let first = stream.next_timeout(WAIT).expect("initial snapshot");
        app.apply_snapshot(first);
        Harness {
            repo,
            stream,
            writer,
            app,
            _dir: dir,
        }
    }

    fn press(&mut self, code: KeyCode) {
        handle_key(&mut self.app, KeyEvent::new(code, KeyModifiers::NONE));
    }

    fn ctrl(&mut self, c: char) {
        handle_key(
            &mut self.app,
            KeyEvent::new(KeyCode::Char(c), KeyModifiers::CONTROL),
        );
    }

    fn type_text(&mut self, text: &str) {
        for c in text.chars() {
            self.press(KeyCode::Char(c));
        }
    }

    /// Submit queued writes, wait for each outcome, then show the latest
    /// snapshot. Returns the outcome kinds in order.
    fn sync(&mut self) -> Vec<&'static str> {
        let ops = self.app.take_outbox();
        let count = ops.len();
        for op in ops {
            assert!(self.writer.submit(op));
        }
        let mut kinds = Vec::new();
        for _ in 0..count {
            let outcome = self.writer.wait(WAIT).expect("write outcome");
            kinds.push(match outcome {
                WriteOutcome::Applied { .. } => "applied",
                WriteOutcome::Discarded { .. } => "discarded",
                WriteOutcome::Failed { .. } => "failed",
            });
            self.app.apply_outcome(outcome);
        }
        if let Some(snapshot) = self.stream.poll_latest() {
            self.app.apply_snapshot(snapshot);
        }
        kinds
    }

    fn titles(&self) -> Vec<&str> {
        self.app.items.iter().map(|i| i.title.as_str()).collect()
    }
}

fn memory() -> Harness<MemoryStore> {
    Harness::new(Arc::new(MemoryStore::new()))
}

#[test]
fn empty_store_bootstraps_to_empty_list() {
    let h = memory();
    assert!(h.app.items.is_empty());
    assert!(h.app.corrupt.is_none());
}

#[test]
fn two_reads_without_writes_are_equal() {
    let store = Arc::new(MemoryStore::with_value(
        "list_items",
        r#"[{"title":"A","description":"a"}]"#,
    ));
    let repo = ListRepository::new(store);
    let first = repo.items().unwrap().next_timeout(WAIT).unwrap().unwrap();
    let second = repo.items().unwrap().next_timeout(WAIT).unwrap().unwrap();
    assert_eq!(first, second);
    assert_eq!(repo.load().unwrap(), first);
}

#[test]
fn add_edit_delete_cancel_through_keys() {
    let mut h = memory();

    // Add twice: default titles follow the length at apply time
    h.press(KeyCode::Char('a'));
    h.press(KeyCode::Char('+'));
    assert_eq!(h.sync(), vec!["applied", "applied"]);
    assert_eq!(h.titles(), vec!["Item 1", "Item 2"]);
    assert_eq!(h.app.editor, Editor::Idle);

    // Edit the second title
    h.press(KeyCode::Char('j'));
    h.press(KeyCode::Enter);
    h.press(KeyCode::Backspace);
    h.type_text("2b");
    h.press(KeyCode::Tab);
    h.type_text("notes");
    h.press(KeyCode::Enter);
    h.sync();
    assert_eq!(
        h.app.items,
        vec![
            Item::new("Item 1"),
            Item::new("Item 2b").with_description("notes")
        ]
    );

    // Cancel leaves everything as it was
    h.press(KeyCode::Enter);
    h.type_text("zzz");
    h.press(KeyCode::Esc);
    assert!(h.sync().is_empty());
    assert_eq!(h.titles(), vec!["Item 1", "Item 2b"]);

    // Delete the first item
    h.press(KeyCode::Char('g'));
    h.press(KeyCode::Enter);
    h.ctrl('d');
    h.sync();
    assert_eq!(h.titles(), vec!["Item 2b"]);
    assert_eq!(h.repo.load().unwrap(), h.app.items);

    let entries = read_recovery_entries(h.app.data_dir(), None);
    assert_eq!(entries[0].category, RecoveryCategory::Delete);
    assert_eq!(entries[0].body, "Item 1");
}

#[test]
fn storage_failure_reports_and_keeps_list() {
    let store = Arc::new(MemoryStore::new());
    let mut h = Harness::new(Arc::clone(&store));
    h.press(KeyCode::Char('a'));
    h.sync();

    store.set_fail_writes(true);
    h.press(KeyCode::Char('a'));
    assert_eq!(h.sync(), vec!["failed"]);

    assert_eq!(h.titles(), vec!["Item 1"]);
    let status = h.app.status.clone().unwrap();
    assert_eq!(status.kind, StatusKind::Error);
    assert_eq!(status.text, "Could not add: store is unavailable");
    assert_eq!(h.app.pending_writes, 0);
}

#[test]
fn failed_save_on_quit_is_logged() {
    let store = Arc::new(MemoryStore::with_value(
        "list_items",
        r#"[{"title":"Draft"}]"#,
    ));
    let mut h = Harness::new(Arc::clone(&store));
    store.set_fail_writes(true);

    h.press(KeyCode::Enter);
    h.type_text("!");
    h.press(KeyCode::Enter);
    for op in h.app.take_outbox() {
        assert!(h.writer.submit(op));
    }
    h.press(KeyCode::Char('q'));
    assert!(h.app.should_quit);

    h.app.finish_writes(&h.writer, WAIT);
    assert_eq!(h.app.pending_writes, 0);
    assert_eq!(h.app.status.as_ref().unwrap().kind, StatusKind::Error);
    let entries = read_recovery_entries(h.app.data_dir(), None);
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].category, RecoveryCategory::Write);
    assert_eq!(entries[0].body, "Draft!");
}

#[test]
fn malformed_value_shows_banner_until_reset() {
    let store = Arc::new(MemoryStore::with_value("list_items", "{not json"));
    let mut h = Harness::new(store);
    assert!(h.app.items.is_empty());
    assert_eq!(h.app.corrupt.as_ref().unwrap().raw, "{not json");

    // Adding must not overwrite the unreadable value
    h.press(KeyCode::Char('a'));
    h.sync();
    assert!(h.app.corrupt.is_some());
    assert_eq!(h.app.status.as_ref().unwrap().kind, StatusKind::Error);

    h.press(KeyCode::Char('R'));
    h.sync();
    assert!(h.app.corrupt.is_none());
    assert!(h.app.items.is_empty());
    assert_eq!(h.repo.load().unwrap(), Vec::<Item>::new());

    let entries = read_recovery_entries(h.app.data_dir(), None);
    assert!(
        entries
            .iter()
            .any(|e| e.category == RecoveryCategory::Decode && e.body == "{not json")
    );
}

#[test]
fn stale_save_is_discarded_after_external_delete() {
    let data = tempfile::tempdir().unwrap();
    let ours = Arc::new(FileStore::open(data.path(), "list_items.json").unwrap());
    ListRepository::new(Arc::clone(&ours))
        .set_data(&[Item::new("A"), Item::new("B")])
        .unwrap();
    let mut h = Harness::new(Arc::clone(&ours));
    assert_eq!(h.titles(), vec!["A", "B"]);

    // Open B, then another process deletes A before we save
    h.press(KeyCode::Char('G'));
    h.press(KeyCode::Enter);
    h.type_text("2");
    let theirs = Arc::new(FileStore::open(data.path(), "list_items.json").unwrap());
    ListRepository::new(theirs)
        .modify(&WriteOp::Remove {
            index: 0,
            expected: None,
        })
        .unwrap();

    h.press(KeyCode::Enter);
    assert_eq!(h.sync(), vec!["discarded"]);
    assert!(ours.reload().unwrap());
    if let Some(snapshot) = h.stream.poll_latest() {
        h.app.apply_snapshot(snapshot);
    }

    assert_eq!(h.titles(), vec!["B"]);
    assert_eq!(h.app.status.as_ref().unwrap().kind, StatusKind::Warning);
    let entries = read_recovery_entries(h.app.data_dir(), None);
    assert_eq!(entries[0].category, RecoveryCategory::Conflict);
    assert_eq!(entries[0].body, "B2");
}
