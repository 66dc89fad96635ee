//! Chain endpoint response types and error definitions.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::abi::AbiDef;
use crate::eosio::chain_id::ChainId;
use crate::eosio::name::Name;
use crate::eosio::time::BlockTimestamp;

/// Errors that can occur while talking to a chain endpoint.
#[derive(Debug, Error)]
pub enum ChainError {
    /// Node URL could not be parsed or the HTTP client could not be built.
    #[error("invalid endpoint '{url}': {reason}")]
    InvalidEndpoint { url: String, reason: String },

    /// Transport failure (connect, timeout, body read).
    #[error("request to {endpoint} failed: {source}")]
    Http {
        endpoint: String,
        #[source]
        source: reqwest::Error,
    },

    /// Non-success status without a recognisable node error body.
    #[error("{endpoint} returned HTTP {status}: {body}")]
    Status {
        endpoint: String,
        status: u16,
        body: String,
    },

    /// The node rejected the call with a structured error.
    #[error("{endpoint} rejected the call: {message} ({what})")]
    Api {
        endpoint: String,
        code: i64,
        message: String,
        what: String,
    },

    /// Success status, but the body did not match the expected shape.
    #[error("unexpected response from {endpoint}: {source}")]
    Decode {
        endpoint: String,
        #[source]
        source: serde_json::Error,
    },

    /// The node serves a different chain than the one requested.
    #[error("chain id mismatch: expected {expected}, node reports {actual}")]
    ChainMismatch { expected: ChainId, actual: ChainId },
}

/// Read-side network failures go by this name at the stage boundary.
pub type NetworkError = ChainError;

/// Result type for chain operations.
pub type ChainResult<T> = Result<T, ChainError>;

/// Failure to obtain the ABI of one referenced account.
#[derive(Debug, Error)]
pub enum AbiLookupError {
    #[error("no ABI published for account '{0}'")]
    Missing(Name),

    #[error("failed to fetch ABI for '{account}': {source}")]
    Fetch {
        account: Name,
        #[source]
        source: ChainError,
    },
}

/// `/v1/chain/get_info`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GetInfo {
    pub chain_id: ChainId,
    pub head_block_num: u32,
    #[serde(default)]
    pub head_block_id: String,
    #[serde(default)]
    pub last_irreversible_block_num: u32,
    #[serde(default)]
    pub server_version: String,
}

/// `/v1/chain/get_block`, reduced to the fields used for TAPOS.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Block {
    pub block_num: u32,
    pub id: String,
    pub timestamp: BlockTimestamp,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ref_block_prefix: Option<u32>,
}

impl Block {
    /// Low 16 bits of the block number.
    pub fn ref_block_num(&self) -> u16 {
        (self.block_num & 0xffff) as u16
    }

    /// Prefix reported by the node, or bytes 8..12 of the block id read
    /// little-endian. `None` if neither is usable.
    pub fn ref_block_prefix(&self) -> Option<u32> {
        if let Some(prefix) = self.ref_block_prefix {
            return Some(prefix);
        }
        let id = hex::decode(&self.id).ok()?;
        let bytes: [u8; 4] = id.get(8..12)?.try_into().ok()?;
        Some(u32::from_le_bytes(bytes))
    }
}

/// `/v1/chain/get_abi`. Accounts without a contract have no `abi`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GetAbiResponse {
    pub account_name: Name,
    #[serde(default)]
    pub abi: Option<AbiDef>,
}

/// `/v1/chain/push_transaction`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PushTransactionResponse {
    pub transaction_id: String,
    pub processed: ProcessedTransaction,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProcessedTransaction {
    pub id: String,
    pub block_num: u32,
    #[serde(default)]
    pub block_time: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub receipt: Option<serde_json::Value>,
}

/// Error body returned by nodes on failed calls.
#[derive(Debug, Deserialize)]
pub(crate) struct NodeErrorBody {
    pub code: i64,
    pub message: String,
    #[serde(default)]
    pub error: Option<NodeErrorDetail>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct NodeErrorDetail {
    #[serde(default)]
    pub what: String,
    #[serde(default)]
    pub details: Vec<NodeErrorMessage>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct NodeErrorMessage {
    pub message: String,
}

impl NodeErrorBody {
    pub(crate) fn into_error(self, endpoint: String) -> ChainError {
        let (what, detail) = match self.error {
            Some(detail) => {
                let first = detail.details.into_iter().next().map(|d| d.message);
                (detail.what, first)
            }
            None => (String::new(), None),
        };
        ChainError::Api {
            endpoint,
            code: self.code,
            message: detail.unwrap_or(self.message),
            what,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ref_block_fields() {
        let block = Block {
            block_num: 0x0001_2345,
            id: "00012345aabbccdd0102030405060708090a0b0c0d0e0f101112131415161718".into(),
            timestamp: BlockTimestamp(0),
            ref_block_prefix: None,
        };
        assert_eq!(block.ref_block_num(), 0x2345);
        assert_eq!(block.ref_block_prefix(), Some(0x0403_0201));

        let explicit = Block {
            ref_block_prefix: Some(42),
            ..block
        };
        assert_eq!(explicit.ref_block_prefix(), Some(42));
    }

    #[test]
    fn test_ref_block_prefix_bad_id() {
        let block = Block {
            block_num: 1,
            id: "zz".into(),
            timestamp: BlockTimestamp(0),
            ref_block_prefix: None,
        };
        assert_eq!(block.ref_block_prefix(), None);
    }

    #[test]
    fn test_get_abi_without_contract() {
        let resp: GetAbiResponse =
            serde_json::from_str(r#"{"account_name":"alice"}"#).unwrap();
        assert_eq!(resp.account_name.to_string(), "alice");
        assert!(resp.abi.is_none());
    }

    #[test]
    fn test_node_error_body() {
        let body: NodeErrorBody = serde_json::from_str(
            r#"{"code":500,"message":"Internal Service Error","error":{"code":3050003,
                "name":"eosio_assert_message_exception","what":"eosio_assert_message assertion failure",
                "details":[{"message":"assertion failure with message: overdrawn balance"}]}}"#,
        )
        .unwrap();
        let err = body.into_error("http://node/v1/chain/push_transaction".into());
        assert!(err.to_string().contains("overdrawn balance"));
        assert!(matches!(err, ChainError::Api { code: 500, .. }));
    }

    #[test]
    fn test_block_from_node_json() {
        let block: Block = serde_json::from_str(
            r#"{"timestamp":"2019-01-01T00:00:00.500","producer":"eosio","block_num":100,
                "id":"00000064f5b4d4f3cd0ba93c4d2cb2ba1ab9a3c6a5a3e7f2c8b1e4c1d9d2b3a4",
                "ref_block_prefix":1023232973}"#,
        )
        .unwrap();
        assert_eq!(block.block_num, 100);
        assert_eq!(block.ref_block_prefix(), Some(1_023_232_973));
        assert_eq!(block.timestamp.to_time_point_sec().seconds(), 1_546_300_800);
    }
}
