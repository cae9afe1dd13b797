use std::io;
use std::sync::mpsc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crate::io::repository::{ListRepository, RepositoryError};
use crate::io::store::Store;
use crate::model::item::Item;
use crate::ops::list_ops::{ListError, WriteOp};

/// Result of one queued write, reported back to the UI.
#[derive(Debug)]
pub enum WriteOutcome {
    /// Written; `items` is the list now stored
    Applied { op: WriteOp, items: Vec<Item> },
    /// Not written because the target item moved or changed
    Discarded { op: WriteOp, reason: ListError },
    /// Not written because the store or the stored value failed
    Failed { op: WriteOp, error: RepositoryError },
}

/// Single background thread applying list writes one at a time, in
/// submission order. Dropping the writer drains the queue before returning.
pub struct Writer {
    tx: Option<mpsc::Sender<WriteOp>>,
    outcomes: mpsc::Receiver<WriteOutcome>,
    handle: Option<JoinHandle<()>>,
}

impl Writer {
    pub fn spawn<S: Store + 'static>(repo: ListRepository<S>) -> io::Result<Self> {
        let (tx, rx) = mpsc::channel::<WriteOp>();
        let (outcome_tx, outcomes) = mpsc::channel();

        let handle = thread::Builder::new()
            .name("lk-writer".into())
            .spawn(move || {
                for op in rx {
                    let outcome = match repo.modify(&op) {
                        Ok(items) => WriteOutcome::Applied { op, items },
                        Err(RepositoryError::List(reason)) => WriteOutcome::Discarded { op, reason },
                        Err(error) => WriteOutcome::Failed { op, error },
                    };
                    // Nobody listening any more; keep draining the queue
                    let _ = outcome_tx.send(outcome);
                }
            })?;

        Ok(Writer {
            tx: Some(tx),
            outcomes,
            handle: Some(handle),
        })
    }

    /// Queue `op`. Returns false if the writer thread has gone away.
    pub fn submit(&self, op: WriteOp) -> bool {
        self.tx.as_ref().is_some_and(|tx| tx.send(op).is_ok())
    }

    /// All outcomes reported since the last call.
    pub fn poll(&self) -> Vec<WriteOutcome> {
        let mut outcomes = Vec::new();
        while let Ok(outcome) = self.outcomes.try_recv() {
            outcomes.push(outcome);
        }
        outcomes
    }

    /// Wait up to `timeout` for the next outcome.
    pub fn wait(&self, timeout: Duration) -> Option<WriteOutcome> {
        self.outcomes.recv_timeout(timeout).ok()
    }
}

impl Drop for Writer {
    fn drop(&mut self) {
        // Closing the channel ends the thread's loop once the queue is empty
        self.tx.take();
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}
