//! Structured Logging
//!
//! Sets up `tracing` output for applications embedding the audit layer:
//! - JSON output for log aggregation (`format = "json"`)
//! - Human-readable output otherwise
//!
//! `RUST_LOG` takes precedence over the configured level, e.g.
//! `RUST_LOG=auditable=debug` to see every rule registration and skipped
//! condition.

use auditable_config::LoggingConfig;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Install the global subscriber.
///
/// Returns `false` when a subscriber was already installed, which happens
/// when several tests or embedders initialise logging.
pub fn init_logging(config: &LoggingConfig) -> bool {
    let env_filter = filter_for(config);

    if config.format.eq_ignore_ascii_case("json") {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(
                fmt::layer()
                    .json()
                    .with_current_span(true)
                    .with_target(true)
                    .flatten_event(true),
            )
            .try_init()
            .is_ok()
    } else {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(fmt::layer().with_target(true).with_ansi(true))
            .try_init()
            .is_ok()
    }
}

fn filter_for(config: &LoggingConfig) -> EnvFilter {
    EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.level))
        .unwrap_or_else(|_| EnvFilter::new("info"))
}
