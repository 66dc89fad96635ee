//! Structured logging.
//!
//! # Responsibilities
//! - Initialize the global `tracing` subscriber for the binary
//! - Honour `RUST_LOG` over the configured level

use tracing_subscriber::util::TryInitError;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Filter used when `RUST_LOG` is unset: `level` for this crate, warn elsewhere.
pub fn default_filter(level: &str) -> EnvFilter {
    EnvFilter::try_new(format!("warn,esr_wallet={level},esr={level}"))
        .unwrap_or_else(|_| EnvFilter::new("warn,esr_wallet=info,esr=info"))
}

/// Install the global subscriber. Fails if one is already set.
pub fn init_logging(level: &str) -> Result<(), TryInitError> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| default_filter(level));
    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr))
        .try_init()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_filter_accepts_levels() {
        for level in ["trace", "debug", "info", "warn", "error"] {
            assert!(default_filter(level).to_string().contains(level));
        }
    }

    #[test]
    fn test_default_filter_falls_back() {
        assert!(default_filter("not a level!").to_string().contains("esr_wallet=info"));
    }
}
