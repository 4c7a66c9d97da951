use crate::config::AppConfig;
use tracing_subscriber::EnvFilter;

/// Initializes the global tracing subscriber from configuration.
///
/// `RUST_LOG` wins over the configured level so operators can raise
/// verbosity without touching config files. Safe to call more than once;
/// subsequent calls are no-ops.
pub fn init_tracing(config: &AppConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.log_level.clone()));

    if config.log_json {
        let _ = tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .try_init();
    } else {
        let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
    }
}
