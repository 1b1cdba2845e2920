//! Structured logging setup for services embedding Bastion.
//!
//! Bastion components only emit `tracing` events; installing a subscriber is
//! the embedding process's job. These helpers cover the two common setups.

use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Filter used when `RUST_LOG` is unset.
pub const DEFAULT_FILTER: &str = "info";

fn env_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER))
}

/// Initialize human-readable logging.
///
/// Log level can be configured via the `RUST_LOG` environment variable.
///
/// # Example
/// ```no_run
/// use bastion_core::logging;
///
/// logging::init();
/// tracing::info!("Authentication core started");
/// ```
pub fn init() {
    tracing_subscriber::registry()
        .with(env_filter())
        .with(fmt::layer().with_target(true).with_thread_ids(true))
        .init();
}

/// Initialize JSON logging for log aggregation.
///
/// # Example
/// ```no_run
/// use bastion_core::logging;
///
/// logging::init_json();
/// tracing::info!(component = "session", "Session store ready");
/// ```
pub fn init_json() {
    tracing_subscriber::registry()
        .with(env_filter())
        .with(fmt::layer().json().with_target(true).with_thread_ids(true))
        .init();
}

/// Like [`init`], but returns quietly when a global subscriber is already set.
/// Test harnesses call this from many tests in one process.
pub fn try_init() -> bool {
    tracing_subscriber::registry()
        .with(env_filter())
        .with(fmt::layer().with_target(true).with_test_writer())
        .try_init()
        .is_ok()
}
