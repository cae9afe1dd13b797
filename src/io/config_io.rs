use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use crate::model::config::Config;

/// Environment variable overriding the data directory
pub const DATA_DIR_ENV: &str = "LISTKEEP_DIR";

/// Config file name inside the data directory
pub const CONFIG_FILE: &str = "config.toml";

/// Error type for config loading
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("could not read {path}: {source}")]
    ReadError { path: PathBuf, source: io::Error },
    #[error("could not parse {path}: {source}")]
    ParseError {
        path: PathBuf,
        source: toml::de::Error,
    },
}

/// Resolve the data directory: explicit override, then `$LISTKEEP_DIR`,
/// then `$XDG_DATA_HOME/listkeep`, then `~/.local/share/listkeep`.
pub fn resolve_data_dir(explicit: Option<&Path>) -> PathBuf {
    if let Some(dir) = explicit {
        return dir.to_path_buf();
    }
    data_dir_from(
        std::env::var_os(DATA_DIR_ENV).map(PathBuf::from),
        std::env::var_os("XDG_DATA_HOME").map(PathBuf::from),
        std::env::var_os("HOME").map(PathBuf::from),
    )
}

fn data_dir_from(
    override_dir: Option<PathBuf>,
    xdg_data_home: Option<PathBuf>,
    home: Option<PathBuf>,
) -> PathBuf {
    if let Some(dir) = override_dir.filter(|d| !d.as_os_str().is_empty()) {
        return dir;
    }
    let data_home = xdg_data_home
        .filter(|d| !d.as_os_str().is_empty())
        .unwrap_or_else(|| {
            home.unwrap_or_else(|| PathBuf::from("/"))
                .join(".local")
                .join("share")
        });
    data_home.join("listkeep")
}

/// Read `config.toml` from the data directory. A missing file yields the
/// defaults.
pub fn read_config(data_dir: &Path) -> Result<Config, ConfigError> {
    let path = data_dir.join(CONFIG_FILE);
    let text = match fs::read_to_string(&path) {
        Ok(text) => text,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Config::default()),
        Err(source) => return Err(ConfigError::ReadError { path, source }),
    };
    toml::from_str(&text).map_err(|source| ConfigError::ParseError { path, source })
}
