//! Callback delivery results and errors.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// JSON body POSTed to foreground callbacks.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CallbackBody {
    pub bn: u32,
    pub tx: String,
    /// First signature only.
    pub sig: String,
}

/// A delivered callback.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotifyResult {
    /// URL after placeholder substitution.
    pub url: String,
    pub status: u16,
}

#[derive(Debug, Error)]
pub enum NotifyError {
    #[error("invalid callback url '{url}': {reason}")]
    InvalidUrl { url: String, reason: String },

    #[error("callback to {url} failed: {source}")]
    Http {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("callback to {url} returned HTTP {status}")]
    Status { url: String, status: u16 },
}

impl NotifyError {
    /// Substituted URL the delivery was attempted against.
    pub fn url(&self) -> &str {
        match self {
            NotifyError::InvalidUrl { url, .. }
            | NotifyError::Http { url, .. }
            | NotifyError::Status { url, .. } => url,
        }
    }
}
