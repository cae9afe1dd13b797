pub mod list_codec;

pub use list_codec::{DecodeError, EMPTY_LIST, decode_items, encode_items};
