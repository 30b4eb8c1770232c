//! Logging initialization
//!
//! `RUST_LOG` wins when set; otherwise the configured level applies to
//! the whole service.

use tracing_subscriber::EnvFilter;

pub fn init(level: &str) {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level)),
        )
        .with_target(false)
        .init();
}
