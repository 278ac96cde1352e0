//! Diagnostics for buddyctl
//!
//! Log events go to stderr so stdout stays clean for `--json` output.
//! `RUST_LOG` wins over the configured level.

use tracing_subscriber::EnvFilter;

const FALLBACK_LEVEL: &str = "info";

/// Filter from `RUST_LOG`, else from the configured level. An unparseable
/// level falls back to `info`.
pub fn env_filter(level: &str) -> EnvFilter {
    EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(level))
        .unwrap_or_else(|_| EnvFilter::new(FALLBACK_LEVEL))
}

/// Install the global subscriber. Calling it twice is harmless.
pub fn init(level: &str) {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter(level))
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}
