//! Log subscriber setup for binaries embedding this crate.

use tracing_subscriber::EnvFilter;

/// Installs a global `fmt` subscriber. `RUST_LOG` takes precedence over
/// `default_filter` when set. Returns `false` if a subscriber was already set.
pub fn init(default_filter: &str) -> bool {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));
    tracing_subscriber::fmt().with_env_filter(filter).try_init().is_ok()
}
