//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the wallet.
//! All types derive Serde traits for deserialization from config files.
//! Private keys never appear here; the software signer reads its key from
//! the environment.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::eosio::chain_id::ChainId;
use crate::signing::types::{NetworkConfig, WalletContext};

/// Root configuration for the `esr` wallet.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct EsrConfig {
    /// Signing and broadcast behaviour.
    pub connection: ConnectionConfig,

    /// Chain endpoints, one per chain id.
    pub blockchains: Vec<Blockchain>,

    /// The signing account. Absent means requests can be decoded and
    /// resolved but not signed.
    pub wallet: Option<WalletContext>,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

impl EsrConfig {
    /// Endpoint configured for `chain_id`, if any.
    pub fn blockchain(&self, chain_id: &ChainId) -> Option<&Blockchain> {
        self.blockchains.iter().find(|b| b.chain_id == *chain_id)
    }
}

/// Connection settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ConnectionConfig {
    /// Broadcast after signing when the request asks for it.
    pub broadcast: bool,

    /// Allow signing at all.
    pub sign: bool,

    /// Lifetime given to transactions that arrive without an expiration.
    pub expire_in_seconds: u32,

    /// Transport timeout for chain and callback requests, in seconds.
    pub request_timeout_secs: u64,
}

impl ConnectionConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// Signing parameters for `chain_id`.
    pub fn network(&self, chain_id: ChainId) -> NetworkConfig {
        NetworkConfig {
            chain_id,
            expire_in_seconds: self.expire_in_seconds,
        }
    }
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        Self {
            broadcast: true,
            sign: true,
            expire_in_seconds: 120,
            request_timeout_secs: 10,
        }
    }
}

/// A chain and the node used to reach it.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Blockchain {
    pub chain_id: ChainId,

    /// Node base URL (e.g., "https://eos.greymass.com").
    pub node: String,

    /// Display name for logs.
    #[serde(default)]
    pub name: String,
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error). `RUST_LOG` wins.
    pub log_level: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
        }
    }
}
