//! Loading songshelf settings.
//!
//! The config file is optional. `SONGSHELF__LIBRARY__DIRECTORY=/srv/music`
//! style variables override single keys, and `library.extensions` also takes
//! a comma-separated list (`SONGSHELF__LIBRARY__EXTENSIONS=mp3,flac`). Loading
//! does not validate; callers run [`Settings::validate`] and decide what to do
//! with a bad TTL or an empty directory.

use std::{env, path::PathBuf};

use ::config::{Config, ConfigError, Environment, File};

use super::schema::{MAX_CACHE_TTL_MINUTES, Settings};

/// Explicit config file location, checked before the XDG default.
pub const CONFIG_PATH_ENV: &str = "SONGSHELF_CONFIG_PATH";
const ENV_PREFIX: &str = "SONGSHELF";

impl Settings {
    /// Defaults, then the config file if one exists, then the environment.
    pub fn load() -> Result<Self, ConfigError> {
        let mut builder = Config::builder();
        if let Some(path) = resolve_config_path() {
            builder = builder.add_source(File::from(path.as_path()).required(false));
        }

        builder
            .add_source(
                Environment::with_prefix(ENV_PREFIX)
                    .separator("__")
                    .list_separator(",")
                    .with_list_parse_key("library.extensions")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize()
    }

    /// Reject settings the index cannot work with.
    pub fn validate(&self) -> Result<(), String> {
        if self.library.directory.as_os_str().is_empty() {
            return Err("library.directory must not be empty".to_string());
        }
        if self.library.cache_ttl_minutes > MAX_CACHE_TTL_MINUTES {
            return Err(format!(
                "library.cache_ttl_minutes must be <= {MAX_CACHE_TTL_MINUTES}, got {}",
                self.library.cache_ttl_minutes
            ));
        }
        Ok(())
    }
}

/// `$SONGSHELF_CONFIG_PATH` if set, otherwise [`default_config_path`].
pub fn resolve_config_path() -> Option<PathBuf> {
    env::var_os(CONFIG_PATH_ENV)
        .map(PathBuf::from)
        .or_else(default_config_path)
}

/// `$XDG_CONFIG_HOME/songshelf/config.toml`, or
/// `$HOME/.config/songshelf/config.toml` without `XDG_CONFIG_HOME`.
pub fn default_config_path() -> Option<PathBuf> {
    env::var_os("XDG_CONFIG_HOME")
        .map(PathBuf::from)
        .or_else(|| env::var_os("HOME").map(|home| PathBuf::from(home).join(".config")))
        .map(|dir| dir.join("songshelf").join("config.toml"))
}
