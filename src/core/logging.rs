//! Logging setup shared by the CLI and the proxy

use tracing_subscriber::EnvFilter;

/// Default filter when `RUST_LOG` is unset
pub const DEFAULT_FILTER: &str = "info";

/// Install the global `tracing` subscriber on stderr
///
/// Honours `RUST_LOG`. Stdout stays free for the CLI board. Calling it twice is harmless: the second install fails
/// quietly and the first subscriber stays in place.
pub fn init() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
}
