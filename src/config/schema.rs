use std::env;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Upper bound for `library.cache_ttl_minutes` (one day).
pub const MAX_CACHE_TTL_MINUTES: i64 = 1440;

/// Top-level settings loaded from `config.toml`.
///
/// File format: TOML
/// Default path (Linux/XDG): `$XDG_CONFIG_HOME/songshelf/config.toml` or `~/.config/songshelf/config.toml`
///
/// Precedence (highest wins):
/// 1) Environment variables (prefix `SONGSHELF__`, `__` as nested separator)
/// 2) Config file (if present)
/// 3) Struct defaults
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct Settings {
    pub library: LibrarySettings,
    pub logging: LoggingSettings,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct LibrarySettings {
    /// Root of the music tree. Relative paths resolve against the working
    /// directory.
    pub directory: PathBuf,
    /// File extensions to index (case-insensitive, leading dot optional).
    /// An empty list indexes `.mp3` only.
    pub extensions: Vec<String>,
    /// Maximum age of the cached catalog. Values <= 0 mean 5 minutes.
    pub cache_ttl_minutes: i64,
    /// Whether to follow symlinks during scanning.
    pub follow_links: bool,
    /// Whether to include hidden files/directories (dotfiles).
    pub include_hidden: bool,
    /// Optional cap on directory recursion depth.
    pub max_depth: Option<usize>,
}

impl Default for LibrarySettings {
    fn default() -> Self {
        Self {
            directory: default_music_directory(),
            extensions: vec![
                ".mp3".into(),
                ".flac".into(),
                ".wav".into(),
                ".m4a".into(),
                ".ogg".into(),
            ],
            cache_ttl_minutes: 5,
            follow_links: false,
            include_hidden: true,
            max_depth: None,
        }
    }
}

/// `$HOME/Music`, or `./music` when `HOME` is not set.
fn default_music_directory() -> PathBuf {
    env::var_os("HOME")
        .map(|home| PathBuf::from(home).join("Music"))
        .unwrap_or_else(|| PathBuf::from("music"))
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct LoggingSettings {
    /// Default `tracing` filter directive, e.g. `info` or `songshelf=debug`.
    /// `LOG_LEVEL` in the environment takes precedence.
    pub level: String,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}
