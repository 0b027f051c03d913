//! Diagnostics for sync runs.
//!
//! Diagnostics go through `tracing` to stderr so scheduler logs capture them;
//! each command prints its one-line summary on stdout.

use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Initialize the tracing subscriber.
///
/// Reads `RUST_LOG`. Defaults to `info` so degraded remote calls show up in
/// scheduled-job output.
///
/// # Example
/// ```bash
/// RUST_LOG=tasksync=debug tasksync sync
/// ```
pub fn init() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr).compact())
        .init();
}
