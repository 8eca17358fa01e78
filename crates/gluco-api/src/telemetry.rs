//! Tracing subscriber setup

use gluco_core::LoggingConfig;
use tracing_subscriber::EnvFilter;

/// Install the global subscriber
///
/// `RUST_LOG` wins over the configured level when set.
pub fn init_tracing(config: &LoggingConfig) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!(
            "{level},gluco_api={level},tower_http=debug",
            level = config.level
        ))
    });

    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    let result = if config.json_format {
        builder.json().try_init()
    } else {
        builder.try_init()
    };

    if let Err(e) = result {
        eprintln!("Tracing already initialized: {e}");
    }
}
