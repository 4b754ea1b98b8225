//! Logging setup
//!
//! Structured logging via `tracing`. The filter comes from the
//! `LINKENV_LOG` environment variable when set, otherwise from the level
//! passed in; output is a compact text layer on stderr so it never mixes
//! with tool output.

use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Registry};

/// Environment variable holding a tracing filter directive.
pub const LOG_ENV_VAR: &str = "LINKENV_LOG";

/// Initialize the global subscriber. `level` is a default directive such
/// as "info" or "off"; `LINKENV_LOG` overrides it when present.
///
/// Safe to call once per process; later calls are ignored.
pub fn init_logging(level: &str) {
    let filter = EnvFilter::try_from_env(LOG_ENV_VAR)
        .unwrap_or_else(|_| EnvFilter::new(level));

    let _ = Registry::default()
        .with(filter)
        .with(
            fmt::layer()
                .with_target(true)
                .with_writer(std::io::stderr),
        )
        .try_init();
}
