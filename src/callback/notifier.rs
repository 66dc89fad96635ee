//! Delivers broadcast results to the issuer's callback URL.
//!
//! # Responsibilities
//! - Substitute `{{bn}}`, `{{tx}}`, `{{sig}}`, `{{sig[0]}}` into the URL,
//!   first occurrence of each, in that order
//! - POST to the rendered URL; foreground callbacks carry `{bn, tx, sig}`
//!   as JSON, background ones an empty body
//!
//! Delivery is attempted once. Failures are returned, never retried.

use std::time::Duration;

use url::Url;

use crate::broadcast::types::BroadcastResult;
use crate::callback::types::{CallbackBody, NotifyError, NotifyResult};
use crate::request::types::CallbackSpec;

/// Apply placeholder substitution to `template`.
pub fn render_url(template: &str, result: &BroadcastResult) -> String {
    let sig = result.first_signature().unwrap_or_default();
    template
        .replacen("{{bn}}", &result.block_num.to_string(), 1)
        .replacen("{{tx}}", &result.transaction_id, 1)
        .replacen("{{sig}}", sig, 1)
        .replacen("{{sig[0]}}", sig, 1)
}

pub fn callback_body(result: &BroadcastResult) -> CallbackBody {
    CallbackBody {
        bn: result.block_num,
        tx: result.transaction_id.clone(),
        sig: result.first_signature().unwrap_or_default().to_string(),
    }
}

/// HTTP client for callback delivery.
#[derive(Debug, Clone)]
pub struct Notifier {
    http: reqwest::Client,
}

impl Notifier {
    pub fn new(timeout: Duration) -> Result<Self, NotifyError> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|source| NotifyError::Http {
                url: String::new(),
                source,
            })?;
        Ok(Self { http })
    }

    pub fn with_client(http: reqwest::Client) -> Self {
        Self { http }
    }

    pub async fn notify(
        &self,
        callback: &CallbackSpec,
        result: &BroadcastResult,
    ) -> Result<NotifyResult, NotifyError> {
        let rendered = render_url(&callback.url, result);
        let url: Url = rendered.parse().map_err(|e: url::ParseError| NotifyError::InvalidUrl {
            url: rendered.clone(),
            reason: e.to_string(),
        })?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(NotifyError::InvalidUrl {
                url: rendered,
                reason: format!("unsupported scheme '{}'", url.scheme()),
            });
        }

        let request = self.http.post(url);
        let request = if callback.background {
            request
        } else {
            request.json(&callback_body(result))
        };
        let response = request.send().await.map_err(|source| NotifyError::Http {
            url: rendered.clone(),
            source,
        })?;

        let status = response.status().as_u16();
        if !response.status().is_success() {
            tracing::warn!(url = %rendered, status, "callback rejected");
            return Err(NotifyError::Status {
                url: rendered,
                status,
            });
        }

        tracing::info!(url = %rendered, status, background = callback.background, "callback delivered");
        Ok(NotifyResult {
            url: rendered,
            status,
        })
    }
}
