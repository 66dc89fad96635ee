//! Wallet context, signing parameters and signing errors.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::eosio::chain_id::ChainId;
use crate::eosio::keys::{KeyError, PublicKey};
use crate::eosio::name::{Name, ACTIVE_PERMISSION};
use crate::eosio::time::TimePointSec;
use crate::eosio::transaction::{PermissionLevel, Transaction};

/// How the wallet holds its key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WalletMode {
    /// Key material is unlocked in memory.
    #[default]
    Hot,
    /// Key lives on an external hardware device.
    Ledger,
    /// Public key only; cannot sign.
    Watch,
}

impl fmt::Display for WalletMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            WalletMode::Hot => "hot",
            WalletMode::Ledger => "ledger",
            WalletMode::Watch => "watch",
        })
    }
}

/// The account a request is signed for.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WalletContext {
    pub account: Name,
    #[serde(default = "default_authorization")]
    pub authorization: Name,
    pub pubkey: PublicKey,
    #[serde(default)]
    pub mode: WalletMode,
}

fn default_authorization() -> Name {
    ACTIVE_PERMISSION
}

impl WalletContext {
    /// `account@authorization`, used to fill request placeholders.
    pub fn permission_level(&self) -> PermissionLevel {
        PermissionLevel::new(self.account, self.authorization)
    }
}

/// Chain parameters for one signing call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NetworkConfig {
    pub chain_id: ChainId,
    /// Lifetime given to transactions that arrive without an expiration.
    pub expire_in_seconds: u32,
}

/// What a key provider is asked to sign.
#[derive(Debug, Clone, Copy)]
pub struct SigningPayload<'a> {
    pub chain_id: &'a ChainId,
    pub packed_trx: &'a [u8],
    pub digest: &'a [u8; 32],
    /// Distinct permission levels authorizing the transaction.
    pub authorization: &'a [PermissionLevel],
}

/// Failure reported by a hardware signing device.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DeviceError {
    #[error("device not connected")]
    NotConnected,

    #[error("signing rejected on device: {0}")]
    Rejected(String),

    #[error("device transport error: {0}")]
    Transport(String),
}

/// Reason signing did not produce a transaction.
#[derive(Debug, Error)]
pub enum SignErrorKind {
    #[error("watch-only wallet cannot sign")]
    WatchOnly,

    #[error("no unlocked key for {0}")]
    KeyNotFound(PublicKey),

    #[error("no hardware device available")]
    DeviceUnavailable,

    #[error(transparent)]
    Device(#[from] DeviceError),

    #[error(transparent)]
    Key(#[from] KeyError),

    #[error("signature recovers to {actual}, expected {expected}")]
    KeyMismatch {
        expected: PublicKey,
        actual: PublicKey,
    },

    #[error("key provider returned no signatures")]
    NoSignatures,

    #[error("transaction expired at {expiration} (now {now})")]
    Expired {
        expiration: TimePointSec,
        now: TimePointSec,
    },
}

/// Signing failure, carrying the transaction that was attempted.
#[derive(Debug, Error)]
#[error("failed to sign transaction {transaction_id}: {kind}")]
pub struct SignError {
    pub transaction: Box<Transaction>,
    pub transaction_id: String,
    #[source]
    pub kind: SignErrorKind,
}

impl SignError {
    pub fn new(transaction: Transaction, kind: impl Into<SignErrorKind>) -> Self {
        Self {
            transaction_id: transaction.id(),
            transaction: Box::new(transaction),
            kind: kind.into(),
        }
    }
}

pub type SignResult<T> = Result<T, SignError>;
