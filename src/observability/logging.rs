//! Structured logging.
//!
//! # Responsibilities
//! - Initialize the tracing subscriber
//! - Pick the filter: `RUST_LOG` if set, else the configured level
//!
//! # Design Decisions
//! - Uses tracing crate for structured logging
//! - Writes to stderr; timestamps can be dropped when journald adds its own

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::ObservabilityConfig;

/// Filter used when `RUST_LOG` is not set.
pub fn default_filter(level: &str) -> String {
    format!("distriproxy={level},tower_http={level},warn")
}

/// Install the global subscriber.
pub fn init(config: &ObservabilityConfig) -> Result<(), tracing_subscriber::util::TryInitError> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_filter(&config.log_level)));

    let fmt = tracing_subscriber::fmt::layer().with_writer(std::io::stderr);

    if config.log_timestamps {
        tracing_subscriber::registry().with(filter).with(fmt).try_init()
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt.without_time())
            .try_init()
    }
}
