//! Settings schema and loader.
//!
//! This module exposes the settings consumed by the library index and the
//! logging setup, plus helpers to load them from disk and the environment.

mod load;
mod schema;

pub use load::{CONFIG_PATH_ENV, default_config_path, resolve_config_path};
pub use schema::*;
