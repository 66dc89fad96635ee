//! Resolved transaction and templating errors.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::abi::{AbiDef, AbiError};
use crate::chain::types::AbiLookupError;
use crate::eosio::name::Name;
use crate::eosio::transaction::Transaction;
use crate::request::builder::JsonAction;

/// A concrete transaction ready for signing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResolvedTransaction {
    /// Account of the first action; its ABI is the one shown to the user.
    pub contract_name: Name,
    pub abi: AbiDef,
    pub transaction: Transaction,
    /// Every action with its data decoded, placeholders filled in.
    pub actions: Vec<JsonAction>,
}

#[derive(Debug, Error)]
pub enum TemplateError {
    #[error("request contains no actions")]
    EmptyActions,

    #[error(transparent)]
    Abi(#[from] AbiLookupError),

    #[error("data of {account}::{action} does not match the contract ABI: {source}")]
    ActionData {
        account: Name,
        action: Name,
        #[source]
        source: AbiError,
    },

    #[error("reference block {block_num} has no usable ref_block_prefix")]
    InvalidReferenceBlock { block_num: u32 },

    #[error("expiration overflows the reference block time")]
    ExpirationOverflow,
}

pub type TemplateResult<T> = Result<T, TemplateError>;
