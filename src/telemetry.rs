//! Development-time tracing, separate from the rendered reports on stdout.
//!
//! Reads `RUST_LOG`, defaults to `warn`, writes to stderr so machine and
//! human consumers of stdout never see log lines mixed into reports.

use tracing_subscriber::{EnvFilter, fmt};

/// Initialize the tracing subscriber. Safe to call once at startup.
pub fn init() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

    fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .compact()
        .init();
}
