//! Diagnostic logging to stderr.

use std::io::{self, IsTerminal};

use tracing_subscriber::EnvFilter;

/// Filter directives, e.g. `RELAY_LOG=relay_chat=debug`.
pub const LOG_ENV: &str = "RELAY_LOG";
pub const DEFAULT_LOG_FILTER: &str = "warn";

/// Installs the global subscriber. A second call is a no-op.
pub fn init() {
    let filter = EnvFilter::try_from_env(LOG_ENV)
        .unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_ansi(io::stderr().is_terminal())
        .with_target(false)
        .try_init();
}
