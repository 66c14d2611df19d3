//! Console logging setup.

use tracing_subscriber::filter::EnvFilter;
use tracing_subscriber::fmt::fmt;

/// Initializes console logging with the given env-filter directives.
///
/// Subsequent calls are no-ops, so embedding applications and tests can both
/// call this unconditionally.
pub fn init(env_filter: &str) {
    fmt()
        .with_env_filter(EnvFilter::new(env_filter))
        .with_target(true)
        .try_init()
        .ok();
}
