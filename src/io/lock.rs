use std::fs::{File, OpenOptions};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

/// Name of the lock file inside the data directory
pub const LOCK_FILE: &str = ".lock";

/// How long a writer waits for another process before giving up
pub const DEFAULT_LOCK_TIMEOUT: Duration = Duration::from_secs(5);

/// Advisory lock serializing read-modify-write cycles on the store file.
///
/// Held by the TUI's writer thread and by CLI commands for the duration of a
/// single write. The lock file itself is left in place: unlinking it on
/// release would let a waiter and a newcomer lock different inodes.
#[derive(Debug)]
pub struct FileLock {
    _file: File,
}

/// Error type for lock operations
#[derive(Debug, thiserror::Error)]
pub enum LockError {
    #[error("could not open lock file at {path}: {source}")]
    Open {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("could not acquire lock on {path}: another lk process is writing")]
    Timeout { path: PathBuf },
}

impl FileLock {
    /// Acquire the lock in `dir`, waiting up to `timeout`.
    pub fn acquire(dir: &Path, timeout: Duration) -> Result<Self, LockError> {
        let path = dir.join(LOCK_FILE);
        let file = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(false)
            .open(&path)
            .map_err(|source| LockError::Open {
                path: path.clone(),
                source,
            })?;

        let start = Instant::now();
        while try_lock(&file).is_err() {
            if start.elapsed() >= timeout {
                return Err(LockError::Timeout { path });
            }
            std::thread::sleep(Duration::from_millis(10));
        }
        Ok(FileLock { _file: file })
    }

    pub fn acquire_default(dir: &Path) -> Result<Self, LockError> {
        Self::acquire(dir, DEFAULT_LOCK_TIMEOUT)
    }
}

/// Try to take an exclusive flock on the file without blocking.
/// Released when the file is closed.
#[cfg(unix)]
fn try_lock(file: &File) -> Result<(), std::io::Error> {
    use std::os::unix::io::AsRawFd;
    let result = unsafe { libc::flock(file.as_raw_fd(), libc::LOCK_EX | libc::LOCK_NB) };
    if result == 0 {
        Ok(())
    } else {
        Err(std::io::Error::last_os_error())
    }
}

#[cfg(not(unix))]
fn try_lock(_file: &File) -> Result<(), std::io::Error> {
    Ok(())
}
