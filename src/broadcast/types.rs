//! Broadcast results and errors.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::callback::types::{NotifyError, NotifyResult};
use crate::chain::types::{ChainError, PushTransactionResponse};
use crate::eosio::transaction::SignedTransaction;

/// What the chain reported for an accepted transaction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BroadcastResult {
    pub block_id: String,
    pub block_num: u32,
    pub transaction_id: String,
    /// Signatures as submitted, in order.
    pub signatures: Vec<String>,
}

impl BroadcastResult {
    pub fn from_response(response: &PushTransactionResponse, signed: &SignedTransaction) -> Self {
        Self {
            block_id: response.processed.id.clone(),
            block_num: response.processed.block_num,
            transaction_id: response.transaction_id.clone(),
            signatures: signed.signatures.iter().map(ToString::to_string).collect(),
        }
    }

    pub fn first_signature(&self) -> Option<&str> {
        self.signatures.first().map(String::as_str)
    }
}

/// A successful broadcast and, separately, what happened to its callback.
#[derive(Debug)]
pub struct BroadcastOutcome {
    pub result: BroadcastResult,
    /// `None` when the request had no callback.
    pub callback: Option<Result<NotifyResult, NotifyError>>,
}

#[derive(Debug, Error)]
#[error("broadcast of transaction {transaction_id} failed: {source}")]
pub struct BroadcastError {
    pub transaction_id: String,
    #[source]
    pub source: ChainError,
}
