//! Tracing subscriber setup for the binary.
//!
//! The library itself only emits `tracing` events; installing a subscriber is
//! the application's job. `RUST_LOG` overrides the configured level.

use tracing_subscriber::{fmt, EnvFilter};

use crate::config::Settings;

/// Initialize the global subscriber from settings.
///
/// Returns an error if a subscriber is already installed.
pub fn init(settings: &Settings) -> Result<(), tracing_subscriber::util::TryInitError> {
    use tracing_subscriber::util::SubscriberInitExt;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(settings.log_level.clone()));

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .finish()
        .try_init()
}
