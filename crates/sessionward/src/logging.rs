//! Logging initialization.
//!
//! Library crates only emit `tracing` events; installing a subscriber is
//! left to the application, which may call one of these.

use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

/// Filter used when `RUST_LOG` is unset. Matches every `sessionward*`
/// crate, since targets are matched by prefix.
pub const DEFAULT_FILTER: &str = "sessionward=info";

fn filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER))
}

/// Installs a compact `fmt` subscriber filtered by `RUST_LOG`.
///
/// # Panics
///
/// Panics if a global subscriber is already set.
pub fn init() {
    tracing_subscriber::registry()
        .with(filter())
        .with(tracing_subscriber::fmt::layer().compact())
        .init();
}

/// Like [`init`], but returns an error instead of panicking when a
/// subscriber is already set.
pub fn try_init() -> Result<(), tracing_subscriber::util::TryInitError> {
    tracing_subscriber::registry()
        .with(filter())
        .with(tracing_subscriber::fmt::layer().compact())
        .try_init()
}
