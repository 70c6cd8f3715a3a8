//! Tracing initialisation.

use tracing_subscriber::EnvFilter;

/// Install a `fmt` subscriber filtered at `level`. `RUST_LOG`, when set,
/// overrides the level.
///
/// Returns `false` if a global subscriber was already installed; calling
/// this more than once is harmless.
pub fn init(level: &str) -> bool {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .try_init()
        .is_ok()
}
