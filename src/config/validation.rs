//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (lifetimes and timeouts > 0)
//! - Check node URLs and reject duplicate chain entries
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: EsrConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::collections::HashSet;
use std::fmt;

use url::Url;

use crate::config::schema::EsrConfig;

const LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

/// A single semantic problem, located by its config path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    pub field: String,
    pub message: String,
}

impl ValidationError {
    fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

impl std::error::Error for ValidationError {}

pub fn validate_config(config: &EsrConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.connection.expire_in_seconds == 0 {
        errors.push(ValidationError::new(
            "connection.expire_in_seconds",
            "must be greater than 0",
        ));
    }
    if config.connection.request_timeout_secs == 0 {
        errors.push(ValidationError::new(
            "connection.request_timeout_secs",
            "must be greater than 0",
        ));
    }

    let mut seen = HashSet::new();
    for (i, chain) in config.blockchains.iter().enumerate() {
        let field = format!("blockchains[{i}]");
        if !seen.insert(chain.chain_id) {
            errors.push(ValidationError::new(
                format!("{field}.chain_id"),
                format!("duplicate chain id {}", chain.chain_id),
            ));
        }
        match Url::parse(&chain.node) {
            Ok(url) if matches!(url.scheme(), "http" | "https") => {}
            Ok(url) => errors.push(ValidationError::new(
                format!("{field}.node"),
                format!("unsupported scheme '{}'", url.scheme()),
            )),
            Err(e) => errors.push(ValidationError::new(format!("{field}.node"), e.to_string())),
        }
    }

    let level = config.observability.log_level.to_ascii_lowercase();
    if !LOG_LEVELS.contains(&level.as_str()) {
        errors.push(ValidationError::new(
            "observability.log_level",
            format!("unknown level '{}'", config.observability.log_level),
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
