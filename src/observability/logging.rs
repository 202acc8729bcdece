//! Structured logging.
//!
//! `RUST_LOG` takes precedence over the configured level; JSON output is
//! opt-in for machine parsing.

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::schema::ObservabilityConfig;

/// Default filter when neither `RUST_LOG` nor the config narrows it.
pub fn default_filter(log_level: &str) -> String {
    format!("stablecoin_sale={log_level},warn")
}

/// Install the global tracing subscriber.
pub fn init_logging(config: &ObservabilityConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| default_filter(&config.log_level).into());

    let registry = tracing_subscriber::registry().with(filter);
    if config.json {
        registry.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_filter() {
        assert_eq!(default_filter("debug"), "stablecoin_sale=debug,warn");
        assert!(EnvFilter::try_new(default_filter("info")).is_ok());
    }
}
