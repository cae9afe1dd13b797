use std::path::{Path, PathBuf};
use std::sync::mpsc;

use notify::{Config, Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};

/// Watches the store file for writes made by other processes (e.g. `lk add`
/// while the TUI is open).
pub struct StoreWatcher {
    _watcher: RecommendedWatcher,
    rx: mpsc::Receiver<()>,
}

impl StoreWatcher {
    /// Start watching `store_path`. The parent directory is watched because
    /// atomic writes replace the file rather than modify it in place.
    pub fn start(store_path: &Path) -> Result<Self, notify::Error> {
        let (tx, rx) = mpsc::channel();
        let target: PathBuf = store_path.to_path_buf();
        let dir = store_path.parent().unwrap_or(Path::new(".")).to_path_buf();

        let mut watcher = RecommendedWatcher::new(
            move |result: Result<Event, notify::Error>| {
                let Ok(event) = result else {
                    return;
                };
                if !matches!(
                    event.kind,
                    EventKind::Create(_) | EventKind::Modify(_) | EventKind::Remove(_)
                ) {
                    return;
                }
                if event.paths.iter().any(|p| is_store_file(p, &target)) {
                    let _ = tx.send(());
                }
            },
            Config::default(),
        )?;

        watcher.watch(&dir, RecursiveMode::NonRecursive)?;
        Ok(StoreWatcher {
            _watcher: watcher,
            rx,
        })
    }

    /// Non-blocking: true if the store file changed since the last call.
    pub fn poll_changed(&self) -> bool {
        let mut changed = false;
        while self.rx.try_recv().is_ok() {
            changed = true;
        }
        changed
    }
}

/// Event paths may be reported relative to a canonicalized directory, so
/// compare by file name within the watched directory.
fn is_store_file(path: &Path, target: &Path) -> bool {
    path == target || (path.file_name().is_some() && path.file_name() == target.file_name())
}
