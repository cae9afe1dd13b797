//! Durable, observable string key-value storage.
//!
//! A [`Store`] holds a flat map of string keys to string values. Readers
//! [`observe`](Store::observe) it to get the current snapshot followed by a
//! new snapshot after every successful write. Writers go through
//! [`edit`](Store::edit), an atomic read-modify-write.

use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError, mpsc};
use std::time::Duration;

use crate::io::lock::{FileLock, LockError};
use crate::io::recovery::atomic_write;

/// A full snapshot of the store
pub type Preferences = BTreeMap<String, String>;

/// Error type for store operations
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("could not read {path}: {source}")]
    Read {
        path: PathBuf,
        source: io::Error,
    },
    #[error("could not write {path}: {source}")]
    Write {
        path: PathBuf,
        source: io::Error,
    },
    #[error("{path} is not a valid store file: {source}")]
    Corrupt {
        path: PathBuf,
        source: serde_json::Error,
    },
    #[error("could not encode store contents: {0}")]
    Encode(#[source] serde_json::Error),
    #[error(transparent)]
    Lock(#[from] LockError),
    #[error("store is unavailable")]
    Unavailable,
}

/// Observable key-value storage.
pub trait Store: Send + Sync {
    /// Read the current contents.
    fn snapshot(&self) -> Result<Preferences, StoreError>;

    /// Subscribe to snapshots. The subscription yields the current contents
    /// first, then one snapshot per successful write until it is dropped.
    fn observe(&self) -> Result<Subscription, StoreError>;

    /// Apply `mutator` to the current contents and commit the result. If the
    /// mutator fails nothing is written. Returns the committed snapshot.
    fn edit<F, E>(&self, mutator: F) -> Result<Preferences, E>
    where
        F: FnOnce(&mut Preferences) -> Result<(), E>,
        E: From<StoreError>;
}

/// Receiving end of [`Store::observe`].
///
/// Iterating blocks for the next snapshot and ends once the store is gone.
/// The event loop uses the non-blocking [`poll`](Subscription::poll) instead.
pub struct Subscription {
    rx: mpsc::Receiver<Preferences>,
}

impl Subscription {
    /// All snapshots queued since the last call, oldest first.
    pub fn poll(&self) -> Vec<Preferences> {
        let mut snapshots = Vec::new();
        while let Ok(snapshot) = self.rx.try_recv() {
            snapshots.push(snapshot);
        }
        snapshots
    }

    /// Wait up to `timeout` for the next snapshot.
    pub fn next_timeout(&self, timeout: Duration) -> Option<Preferences> {
        self.rx.recv_timeout(timeout).ok()
    }
}

impl Iterator for Subscription {
    type Item = Preferences;

    fn next(&mut self) -> Option<Preferences> {
        self.rx.recv().ok()
    }
}

/// Senders for live subscriptions. Dead ones are pruned on notify.
#[derive(Default)]
struct Observers {
    senders: Vec<mpsc::Sender<Preferences>>,
}

impl Observers {
    fn subscribe(&mut self, current: Preferences) -> Subscription {
        let (tx, rx) = mpsc::channel();
        // rx is alive, send cannot fail
        let _ = tx.send(current);
        self.senders.push(tx);
        Subscription { rx }
    }

    fn notify(&mut self, snapshot: &Preferences) {
        self.senders.retain(|tx| tx.send(snapshot.clone()).is_ok());
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

// ---------------------------------------------------------------------------
// File-backed store
// ---------------------------------------------------------------------------

struct FileShared {
    observers: Observers,
    /// Last snapshot handed to observers, for change detection in `reload`
    last: Option<Preferences>,
}

/// Store persisted as a single JSON object file.
///
/// Writes are serialized in-process by a mutex and across processes by a
/// [`FileLock`] in the same directory, then committed with an atomic rename.
pub struct FileStore {
    dir: PathBuf,
    path: PathBuf,
    shared: Mutex<FileShared>,
}

impl FileStore {
    /// Open (or lazily create) `file_name` inside `dir`.
    pub fn open(dir: &Path, file_name: &str) -> Result<Self, StoreError> {
        fs::create_dir_all(dir).map_err(|source| StoreError::Write {
            path: dir.to_path_buf(),
            source,
        })?;
        let path = dir.join(file_name);
        let last = read_preferences(&path).ok();
        Ok(FileStore {
            dir: dir.to_path_buf(),
            path,
            shared: Mutex::new(FileShared {
                observers: Observers::default(),
                last,
            }),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Re-read the file after an external change. Observers are notified
    /// only if the contents differ from the last snapshot they saw.
    pub fn reload(&self) -> Result<bool, StoreError> {
        let mut shared = lock(&self.shared);
        let current = read_preferences(&self.path)?;
        if shared.last.as_ref() == Some(&current) {
            return Ok(false);
        }
        shared.observers.notify(&current);
        shared.last = Some(current);
        Ok(true)
    }
}

impl Store for FileStore {
    fn snapshot(&self) -> Result<Preferences, StoreError> {
        read_preferences(&self.path)
    }

    fn observe(&self) -> Result<Subscription, StoreError> {
        let mut shared = lock(&self.shared);
        let current = read_preferences(&self.path)?;
        shared.last = Some(current.clone());
        Ok(shared.observers.subscribe(current))
    }

    fn edit<F, E>(&self, mutator: F) -> Result<Preferences, E>
    where
        F: FnOnce(&mut Preferences) -> Result<(), E>,
        E: From<StoreError>,
    {
        let mut shared = lock(&self.shared);
        let _file_lock = FileLock::acquire_default(&self.dir).map_err(StoreError::from)?;

        let mut prefs = read_preferences(&self.path)?;
        mutator(&mut prefs)?;

        let content = serde_json::to_string_pretty(&prefs).map_err(StoreError::Encode)?;
        atomic_write(&self.path, content.as_bytes()).map_err(|source| StoreError::Write {
            path: self.path.clone(),
            source,
        })?;

        shared.observers.notify(&prefs);
        shared.last = Some(prefs.clone());
        Ok(prefs)
    }
}

/// Read the store file. A missing or blank file is an empty store.
fn read_preferences(path: &Path) -> Result<Preferences, StoreError> {
    let content = match fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Preferences::new()),
        Err(source) => {
            return Err(StoreError::Read {
                path: path.to_path_buf(),
                source,
            });
        }
    };
    if content.trim().is_empty() {
        return Ok(Preferences::new());
    }
    serde_json::from_str(&content).map_err(|source| StoreError::Corrupt {
        path: path.to_path_buf(),
        source,
    })
}

// ---------------------------------------------------------------------------
// In-memory store
// ---------------------------------------------------------------------------

#[derive(Default)]
struct MemoryShared {
    prefs: Preferences,
    observers: Observers,
}

/// Process-local store with the same observation semantics as [`FileStore`].
/// Writes can be switched to fail to simulate an unavailable medium.
#[derive(Default)]
pub struct MemoryStore {
    shared: Mutex<MemoryShared>,
    fail_writes: AtomicBool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// A store that starts with `key` set to `value`.
    pub fn with_value(key: &str, value: &str) -> Self {
        let store = Self::default();
        lock(&store.shared)
            .prefs
            .insert(key.to_string(), value.to_string());
        store
    }

    /// Make every subsequent `edit` fail with [`StoreError::Unavailable`].
    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }
}

impl Store for MemoryStore {
    fn snapshot(&self) -> Result<Preferences, StoreError> {
        Ok(lock(&self.shared).prefs.clone())
    }

    fn observe(&self) -> Result<Subscription, StoreError> {
        let mut shared = lock(&self.shared);
        let current = shared.prefs.clone();
        Ok(shared.observers.subscribe(current))
    }

    fn edit<F, E>(&self, mutator: F) -> Result<Preferences, E>
    where
        F: FnOnce(&mut Preferences) -> Result<(), E>,
        E: From<StoreError>,
    {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable.into());
        }
        let mut shared = lock(&self.shared);
        let mut prefs = shared.prefs.clone();
        mutator(&mut prefs)?;
        shared.prefs = prefs.clone();
        shared.observers.notify(&prefs);
        Ok(prefs)
    }
}
