use std::sync::Arc;
use std::time::Duration;

use crate::io::store::{Preferences, Store, StoreError, Subscription};
use crate::model::item::Item;
use crate::ops::list_ops::{ListError, WriteOp};
use crate::parse::{DecodeError, EMPTY_LIST, decode_items, encode_items};

/// Key the list is stored under unless configured otherwise
pub const LIST_ITEMS_KEY: &str = "list_items";

/// Error type for repository operations
#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error(transparent)]
    Decode(#[from] DecodeError),
    #[error("could not encode list: {0}")]
    Encode(#[source] serde_json::Error),
    #[error(transparent)]
    List(#[from] ListError),
}

/// Typed view of the list stored under one key of a [`Store`].
///
/// Every write replaces the whole encoded list.
pub struct ListRepository<S> {
    store: Arc<S>,
    key: String,
}

impl<S> Clone for ListRepository<S> {
    fn clone(&self) -> Self {
        ListRepository {
            store: Arc::clone(&self.store),
            key: self.key.clone(),
        }
    }
}

impl<S: Store> ListRepository<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self::with_key(store, LIST_ITEMS_KEY)
    }

    pub fn with_key(store: Arc<S>, key: impl Into<String>) -> Self {
        ListRepository {
            store,
            key: key.into(),
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    /// Stream of decoded lists: the current one, then one per store write.
    pub fn items(&self) -> Result<ItemStream, StoreError> {
        Ok(ItemStream {
            subscription: self.store.observe()?,
            key: self.key.clone(),
        })
    }

    /// Decode the list as currently stored.
    pub fn load(&self) -> Result<Vec<Item>, RepositoryError> {
        let prefs = self.store.snapshot()?;
        Ok(decode_snapshot(&prefs, &self.key)?)
    }

    /// Replace the stored list with `items`.
    pub fn set_data(&self, items: &[Item]) -> Result<(), RepositoryError> {
        let text = encode_items(items).map_err(RepositoryError::Encode)?;
        self.store
            .edit(|prefs: &mut Preferences| -> Result<(), RepositoryError> {
                prefs.insert(self.key.clone(), text);
                Ok(())
            })?;
        Ok(())
    }

    /// Apply `op` to the list as stored right now and write the result, in
    /// one atomic store edit. Returns the list that was written.
    ///
    /// Fails without writing if the stored list is unreadable, except for
    /// [`WriteOp::Reset`] which replaces it regardless.
    pub fn modify(&self, op: &WriteOp) -> Result<Vec<Item>, RepositoryError> {
        let mut written = Vec::new();
        self.store
            .edit(|prefs: &mut Preferences| -> Result<(), RepositoryError> {
                let current = match op {
                    WriteOp::Reset => Vec::new(),
                    _ => decode_snapshot(prefs, &self.key)?,
                };
                let items = op.apply(current)?;
                let text = encode_items(&items).map_err(RepositoryError::Encode)?;
                prefs.insert(self.key.clone(), text);
                written = items;
                Ok(())
            })?;
        Ok(written)
    }

    /// Overwrite the stored value with an empty list.
    pub fn reset(&self) -> Result<(), RepositoryError> {
        self.modify(&WriteOp::Reset).map(|_| ())
    }
}

fn decode_snapshot(prefs: &Preferences, key: &str) -> Result<Vec<Item>, DecodeError> {
    decode_items(prefs.get(key).map_or(EMPTY_LIST, String::as_str))
}

/// Decoded view of a store [`Subscription`].
pub struct ItemStream {
    subscription: Subscription,
    key: String,
}

impl ItemStream {
    /// All lists queued since the last call, oldest first.
    pub fn poll(&self) -> Vec<Result<Vec<Item>, DecodeError>> {
        self.subscription
            .poll()
            .iter()
            .map(|prefs| decode_snapshot(prefs, &self.key))
            .collect()
    }

    /// The most recent queued list, dropping older ones.
    pub fn poll_latest(&self) -> Option<Result<Vec<Item>, DecodeError>> {
        self.subscription
            .poll()
            .last()
            .map(|prefs| decode_snapshot(prefs, &self.key))
    }

    /// Wait up to `timeout` for the next list.
    pub fn next_timeout(&self, timeout: Duration) -> Option<Result<Vec<Item>, DecodeError>> {
        self.subscription
            .next_timeout(timeout)
            .map(|prefs| decode_snapshot(&prefs, &self.key))
    }
}

impl Iterator for ItemStream {
    type Item = Result<Vec<Item>, DecodeError>;

    fn next(&mut self) -> Option<Self::Item> {
        let prefs = self.subscription.next()?;
        Some(decode_snapshot(&prefs, &self.key))
    }
}
