//! Subscriber bootstrap for binaries.

use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use crate::VerbosityConfig;

/// Prefix shared by every target emitted through the workspace macros.
pub const TARGET_PREFIX: &str = "backtrack";

/// Installs the global subscriber.
///
/// `RUST_LOG` takes precedence over `config` when it is set and parses.
/// Returns `false` when a global subscriber was already installed, which
/// happens when the CLI entry point runs more than once in a process.
///
/// ```rust,ignore
/// use logging::{VerbosityConfig, init_tracing};
///
/// init_tracing(VerbosityConfig::from_verbose_level(1));
/// logging::trace_store!("store opened");
/// ```
pub fn init_tracing(config: VerbosityConfig) -> bool {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.directive()));

    let layer = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(true)
        .without_time();

    tracing_subscriber::registry()
        .with(filter)
        .with(layer)
        .try_init()
        .is_ok()
}
