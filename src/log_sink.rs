// log_sink.rs
// Purpose: install the process-wide tracing subscriber

use tracing_subscriber::{fmt, EnvFilter};

/// Build the filter: `RUST_LOG` wins, otherwise the configured directive.
pub fn env_filter(configured: &str) -> EnvFilter {
    EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(configured))
        .unwrap_or_else(|_| EnvFilter::new("info"))
}

/// Install a compact fmt subscriber. Safe to call more than once; later
/// calls are ignored.
pub fn init_tracing(configured: &str) {
    let _ = fmt()
        .with_env_filter(env_filter(configured))
        .with_target(false)
        .compact()
        .try_init();
}
