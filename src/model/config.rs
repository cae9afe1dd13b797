use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Configuration from `<data dir>/config.toml`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub store: StoreConfig,
    #[serde(default)]
    pub ui: UiConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Store file name inside the data directory
    #[serde(default = "default_store_file")]
    pub file: String,
    /// Preference key holding the encoded list
    #[serde(default = "default_store_key")]
    pub key: String,
}

impl Default for StoreConfig {
    fn default() -> Self {
        StoreConfig {
            file: default_store_file(),
            key: default_store_key(),
        }
    }
}

fn default_store_file() -> String {
    "list_items.json".to_string()
}

fn default_store_key() -> String {
    "list_items".to_string()
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UiConfig {
    #[serde(default = "default_true")]
    pub show_key_hints: bool,
    /// Hex color overrides keyed by theme slot name
    #[serde(default)]
    pub colors: HashMap<String, String>,
}

impl Default for UiConfig {
    fn default() -> Self {
        UiConfig {
            show_key_hints: true,
            colors: HashMap::new(),
        }
    }
}
