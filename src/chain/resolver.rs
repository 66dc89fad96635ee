//! Chain state lookups used to template a request.
//!
//! # Responsibilities
//! - Fetch the head block as the reference for expiration and TAPOS
//! - Fetch contract ABIs, one per distinct account, concurrently
//!
//! Snapshots are never cached; every templating call fetches its own.

use std::collections::HashMap;

use async_trait::async_trait;
use futures_util::future::try_join_all;

use crate::abi::AbiDef;
use crate::chain::client::ChainApi;
use crate::chain::types::{AbiLookupError, Block, ChainError, ChainResult, GetInfo};
use crate::eosio::chain_id::ChainId;
use crate::eosio::name::Name;

/// Transactions expire this many seconds after the reference block.
pub const EXPIRE_SECONDS: u32 = 60 * 60 * 2;

/// Chain state captured for one templating call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChainSnapshot {
    pub head_info: GetInfo,
    pub reference_block: Block,
}

/// Head info, then the head block itself.
///
/// Fails with [`ChainError::ChainMismatch`] if the node serves a chain other
/// than `chain_id`.
pub async fn fetch_snapshot<C>(client: &C, chain_id: &ChainId) -> ChainResult<ChainSnapshot>
where
    C: ChainApi + ?Sized,
{
    let head_info = client.get_info().await?;
    if head_info.chain_id != *chain_id {
        return Err(ChainError::ChainMismatch {
            expected: *chain_id,
            actual: head_info.chain_id,
        });
    }
    let reference_block = client.get_block(head_info.head_block_num).await?;

    tracing::info!(
        chain_id = %chain_id,
        head_block_num = head_info.head_block_num,
        block_time = %reference_block.timestamp,
        "chain snapshot fetched"
    );

    Ok(ChainSnapshot {
        head_info,
        reference_block,
    })
}

/// ABI published by `account`, or `None` if it has no contract.
pub async fn fetch_abi<C>(client: &C, account: Name) -> ChainResult<Option<AbiDef>>
where
    C: ChainApi + ?Sized,
{
    let response = client.get_abi(account).await?;
    tracing::debug!(account = %account, found = response.abi.is_some(), "abi fetched");
    Ok(response.abi)
}

/// Source of contract ABIs.
#[async_trait]
pub trait AbiProvider: Send + Sync {
    async fn abi_for(&self, account: Name) -> ChainResult<Option<AbiDef>>;
}

#[async_trait]
impl<C> AbiProvider for C
where
    C: ChainApi + ?Sized,
{
    async fn abi_for(&self, account: Name) -> ChainResult<Option<AbiDef>> {
        fetch_abi(self, account).await
    }
}

/// Fixed set of ABIs, for offline encoding and tests.
#[derive(Debug, Clone, Default)]
pub struct StaticAbis {
    abis: HashMap<Name, AbiDef>,
}

impl StaticAbis {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, account: Name, abi: AbiDef) -> Self {
        self.abis.insert(account, abi);
        self
    }

    pub fn insert(&mut self, account: Name, abi: AbiDef) {
        self.abis.insert(account, abi);
    }
}

#[async_trait]
impl AbiProvider for StaticAbis {
    async fn abi_for(&self, account: Name) -> ChainResult<Option<AbiDef>> {
        Ok(self.abis.get(&account).cloned())
    }
}

/// Distinct accounts in first-seen order.
pub fn distinct_accounts(accounts: impl IntoIterator<Item = Name>) -> Vec<Name> {
    let mut seen = Vec::new();
    for account in accounts {
        if !seen.contains(&account) {
            seen.push(account);
        }
    }
    seen
}

/// Fetch the ABI of every account concurrently. All must succeed.
pub async fn fetch_abis<P>(
    provider: &P,
    accounts: &[Name],
) -> Result<HashMap<Name, AbiDef>, AbiLookupError>
where
    P: AbiProvider + ?Sized,
{
    let lookups = accounts.iter().map(|&account| async move {
        match provider.abi_for(account).await {
            Ok(Some(abi)) => Ok((account, abi)),
            Ok(None) => Err(AbiLookupError::Missing(account)),
            Err(source) => Err(AbiLookupError::Fetch { account, source }),
        }
    });
    let abis = try_join_all(lookups).await?;
    Ok(abis.into_iter().collect())
}
