//! Chain endpoint RPC client.
//!
//! # Responsibilities
//! - Issue the four `/v1/chain/*` calls the lifecycle needs
//! - Bound every call with the configured transport timeout
//! - Turn node error bodies into [`ChainError::Api`]
//!
//! No retries happen here; a failed call surfaces unchanged.

use std::time::Duration;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::json;
use url::Url;

use crate::chain::types::{
    Block, ChainError, ChainResult, GetAbiResponse, GetInfo, NodeErrorBody,
    PushTransactionResponse,
};
use crate::eosio::name::Name;
use crate::eosio::transaction::PackedTransaction;

/// The chain RPC surface consumed by the lifecycle.
#[async_trait]
pub trait ChainApi: Send + Sync {
    async fn get_info(&self) -> ChainResult<GetInfo>;

    async fn get_block(&self, block_num: u32) -> ChainResult<Block>;

    async fn get_abi(&self, account: Name) -> ChainResult<GetAbiResponse>;

    async fn push_transaction(
        &self,
        transaction: &PackedTransaction,
    ) -> ChainResult<PushTransactionResponse>;
}

/// HTTP client for a single chain node.
#[derive(Debug, Clone)]
pub struct ChainClient {
    http: reqwest::Client,
    base: Url,
}

impl ChainClient {
    /// Create a client for `node` (e.g. `https://eos.greymass.com`).
    pub fn new(node: &str, timeout: Duration) -> ChainResult<Self> {
        let mut base: Url = node.parse().map_err(|e: url::ParseError| ChainError::InvalidEndpoint {
            url: node.to_string(),
            reason: e.to_string(),
        })?;
        if !matches!(base.scheme(), "http" | "https") {
            return Err(ChainError::InvalidEndpoint {
                url: node.to_string(),
                reason: format!("unsupported scheme '{}'", base.scheme()),
            });
        }
        // join() replaces the last path segment unless it ends in '/'
        if !base.path().ends_with('/') {
            let path = format!("{}/", base.path());
            base.set_path(&path);
        }
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ChainError::InvalidEndpoint {
                url: node.to_string(),
                reason: e.to_string(),
            })?;

        tracing::debug!(node = %base, timeout_secs = timeout.as_secs(), "chain client created");
        Ok(Self { http, base })
    }

    pub fn endpoint(&self) -> &Url {
        &self.base
    }

    fn url(&self, method: &str) -> ChainResult<Url> {
        self.base
            .join(&format!("v1/chain/{method}"))
            .map_err(|e| ChainError::InvalidEndpoint {
                url: self.base.to_string(),
                reason: e.to_string(),
            })
    }

    async fn call<B, R>(&self, method: &str, body: &B) -> ChainResult<R>
    where
        B: Serialize + ?Sized + Sync,
        R: DeserializeOwned,
    {
        let url = self.url(method)?;
        let endpoint = url.to_string();

        let response = self
            .http
            .post(url)
            .json(body)
            .send()
            .await
            .map_err(|source| ChainError::Http {
                endpoint: endpoint.clone(),
                source,
            })?;

        let status = response.status();
        let text = response.text().await.map_err(|source| ChainError::Http {
            endpoint: endpoint.clone(),
            source,
        })?;

        if !status.is_success() {
            tracing::warn!(endpoint = %endpoint, status = status.as_u16(), "chain call failed");
            return Err(match serde_json::from_str::<NodeErrorBody>(&text) {
                Ok(node_error) => node_error.into_error(endpoint),
                Err(_) => ChainError::Status {
                    endpoint,
                    status: status.as_u16(),
                    body: text,
                },
            });
        }

        serde_json::from_str(&text).map_err(|source| ChainError::Decode { endpoint, source })
    }
}

#[async_trait]
impl ChainApi for ChainClient {
    async fn get_info(&self) -> ChainResult<GetInfo> {
        self.call("get_info", &json!({})).await
    }

    async fn get_block(&self, block_num: u32) -> ChainResult<Block> {
        self.call("get_block", &json!({ "block_num_or_id": block_num }))
            .await
    }

    async fn get_abi(&self, account: Name) -> ChainResult<GetAbiResponse> {
        self.call("get_abi", &json!({ "account_name": account })).await
    }

    async fn push_transaction(
        &self,
        transaction: &PackedTransaction,
    ) -> ChainResult<PushTransactionResponse> {
        self.call("push_transaction", transaction).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_url_join() {
        let client = ChainClient::new("http://127.0.0.1:8888", Duration::from_secs(5)).unwrap();
        assert_eq!(
            client.url("get_info").unwrap().as_str(),
            "http://127.0.0.1:8888/v1/chain/get_info"
        );
    }

    #[test]
    fn test_url_join_keeps_base_path() {
        for node in ["https://node.example/eos", "https://node.example/eos/"] {
            let client = ChainClient::new(node, Duration::from_secs(5)).unwrap();
            assert_eq!(
                client.url("get_info").unwrap().as_str(),
                "https://node.example/eos/v1/chain/get_info"
            );
        }
    }

    #[test]
    fn test_invalid_endpoint() {
        let err = ChainClient::new("not a url", Duration::from_secs(5)).unwrap_err();
        assert!(matches!(err, ChainError::InvalidEndpoint { .. }));

        let err = ChainClient::new("ftp://node.example", Duration::from_secs(5)).unwrap_err();
        assert!(err.to_string().contains("unsupported scheme"));
    }

    #[tokio::test]
    async fn test_unreachable_node() {
        // port 9 (discard) is closed on test hosts
        let client = ChainClient::new("http://127.0.0.1:9", Duration::from_secs(2)).unwrap();
        let err = client.get_info().await.unwrap_err();
        assert!(matches!(err, ChainError::Http { .. }));
    }
}
