//! Logging initialization for hosts embedding the core.

use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Initialize tracing with `RUST_LOG`-style env filtering. Safe to call
/// more than once; later calls are no-ops.
pub fn init_logging() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info,cast_core=debug"));

    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(true))
        .try_init();
}
