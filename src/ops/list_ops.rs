use std::fmt;

use crate::model::item::Item;

/// Error type for positional list edits
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ListError {
    #[error("item index out of range: {index} (list has {len} items)")]
    IndexOutOfRange { index: usize, len: usize },
    #[error("item {index} changed since it was opened")]
    Changed { index: usize },
}

/// Title given to an item appended without one: "Item {len + 1}".
pub fn default_title(len: usize) -> String {
    format!("Item {}", len + 1)
}

/// Append a new item with the default title. Returns the new item's index.
pub fn append_default(items: &mut Vec<Item>) -> usize {
    let item = Item::new(default_title(items.len()));
    items.push(item);
    items.len() - 1
}

/// Check that `index` is in range and, when `expected` is given, that the
/// item there still equals it.
fn check_index(items: &[Item], index: usize, expected: Option<&Item>) -> Result<(), ListError> {
    let current = items.get(index).ok_or(ListError::IndexOutOfRange {
        index,
        len: items.len(),
    })?;
    match expected {
        Some(expected) if expected != current => Err(ListError::Changed { index }),
        _ => Ok(()),
    }
}

/// Replace the item at `index`.
pub fn replace_item(
    items: &mut [Item],
    index: usize,
    expected: Option<&Item>,
    item: Item,
) -> Result<(), ListError> {
    check_index(items, index, expected)?;
    items[index] = item;
    Ok(())
}

/// Remove the item at `index`, returning it.
pub fn remove_item(
    items: &mut Vec<Item>,
    index: usize,
    expected: Option<&Item>,
) -> Result<Item, ListError> {
    check_index(items, index, expected)?;
    Ok(items.remove(index))
}

/// A whole-list mutation queued for the writer. Operations are applied to
/// the list as it is at apply time, not as it was when the user acted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WriteOp {
    /// Append an item titled "Item {len + 1}"
    AppendDefault,
    /// Append a given item; an empty title gets the default title
    Append(Item),
    /// Replace the item at `index`, provided it still equals `expected`
    Replace {
        index: usize,
        expected: Option<Item>,
        item: Item,
    },
    /// Remove the item at `index`, provided it still equals `expected`
    Remove {
        index: usize,
        expected: Option<Item>,
    },
    /// Drop everything, including an unreadable stored value
    Reset,
}

impl WriteOp {
    /// Apply this operation to `items`, producing the list to store.
    pub fn apply(&self, mut items: Vec<Item>) -> Result<Vec<Item>, ListError> {
        match self {
            WriteOp::AppendDefault => {
                append_default(&mut items);
            }
            WriteOp::Append(item) => {
                let mut item = item.clone();
                if item.title.is_empty() {
                    item.title = default_title(items.len());
                }
                items.push(item);
            }
            WriteOp::Replace {
                index,
                expected,
                item,
            } => replace_item(&mut items, *index, expected.as_ref(), item.clone())?,
            WriteOp::Remove { index, expected } => {
                remove_item(&mut items, *index, expected.as_ref())?;
            }
            WriteOp::Reset => items.clear(),
        }
        Ok(items)
    }
}

impl fmt::Display for WriteOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WriteOp::AppendDefault | WriteOp::Append(_) => write!(f, "add"),
            WriteOp::Replace { index, .. } => write!(f, "save item {}", index + 1),
            WriteOp::Remove { index, .. } => write!(f, "delete item {}", index + 1),
            WriteOp::Reset => write!(f, "reset"),
        }
    }
}
