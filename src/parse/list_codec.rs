use crate::model::item::Item;

/// Stored text equivalent to "no value under the key"
pub const EMPTY_LIST: &str = "[]";

/// The stored text could not be turned back into a list.
#[derive(Debug, thiserror::Error)]
#[error("stored list is unreadable: {source}")]
pub struct DecodeError {
    /// The text exactly as it was stored
    pub raw: String,
    pub source: serde_json::Error,
}

/// Encode a list as a JSON array of `{title, description}` records.
pub fn encode_items(items: &[Item]) -> Result<String, serde_json::Error> {
    serde_json::to_string(items)
}

/// Decode stored text into a list. Never returns a partial list: any
/// malformed record fails the whole decode.
pub fn decode_items(text: &str) -> Result<Vec<Item>, DecodeError> {
    serde_json::from_str(text).map_err(|source| DecodeError {
        raw: text.to_string(),
        source,
    })
}
