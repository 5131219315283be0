use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::LoggingSettings;

/// Environment variable that overrides the configured log filter.
pub const LOG_LEVEL_ENV: &str = "LOG_LEVEL";

/// Filter string for `settings`, falling back to `info` when it is unusable.
///
/// A bare word must be a level (`debug`, `warn`, ...). Anything with a target
/// or several directives (`songshelf=debug,warn`) must parse as a whole.
pub fn default_filter(settings: &LoggingSettings) -> String {
    let level = settings.level.trim();
    let usable = if level.contains(['=', ',', '[']) {
        EnvFilter::try_new(level).is_ok()
    } else {
        level.parse::<LevelFilter>().is_ok()
    };

    if usable {
        level.to_string()
    } else {
        LevelFilter::INFO.to_string()
    }
}

/// Install the global `tracing` subscriber.
///
/// Returns an error if a subscriber is already installed.
pub fn init(settings: &LoggingSettings) -> Result<(), tracing_subscriber::util::TryInitError> {
    let filter = EnvFilter::builder()
        .with_env_var(LOG_LEVEL_ENV)
        .try_from_env()
        .unwrap_or_else(|_| EnvFilter::new(default_filter(settings)));

    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .try_init()
}
