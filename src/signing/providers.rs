//! Key providers: software keys and hardware devices.
//!
//! # Security
//! - Private keys are held in memory only while unlocked
//! - Keys are never logged or serialized; only public keys appear in events

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;

use crate::eosio::chain_id::ChainId;
use crate::eosio::keys::{PrivateKey, PublicKey, Signature};
use crate::signing::types::{DeviceError, SignErrorKind, SigningPayload, WalletContext, WalletMode};

/// Environment variable holding the hot wallet's private key.
pub const PRIVATE_KEY_ENV_VAR: &str = "ESR_WALLET_PRIVATE_KEY";

/// Produces signatures for a transaction digest.
#[async_trait]
pub trait KeyProvider: Send + Sync {
    async fn sign(&self, payload: SigningPayload<'_>) -> Result<Vec<Signature>, SignErrorKind>;
}

/// An in-memory K1 key.
#[derive(Clone)]
pub struct SoftwareKey {
    key: PrivateKey,
}

impl SoftwareKey {
    pub fn new(key: PrivateKey) -> Self {
        Self { key }
    }

    /// Parse a WIF or `PVT_K1_` string.
    pub fn from_private_key(private_key: &str) -> Result<Self, SignErrorKind> {
        let key: PrivateKey = private_key.trim().parse()?;
        tracing::info!(public_key = %key.public_key(), "software key loaded");
        Ok(Self { key })
    }

    /// Load from [`PRIVATE_KEY_ENV_VAR`]. `Ok(None)` if it is unset.
    pub fn from_env() -> Result<Option<Self>, SignErrorKind> {
        match std::env::var(PRIVATE_KEY_ENV_VAR) {
            Ok(value) => Self::from_private_key(&value).map(Some),
            Err(_) => Ok(None),
        }
    }

    pub fn public_key(&self) -> PublicKey {
        self.key.public_key()
    }
}

impl std::fmt::Debug for SoftwareKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SoftwareKey")
            .field("public_key", &self.public_key())
            .finish()
    }
}

#[async_trait]
impl KeyProvider for SoftwareKey {
    async fn sign(&self, payload: SigningPayload<'_>) -> Result<Vec<Signature>, SignErrorKind> {
        Ok(vec![self.key.sign_digest(payload.digest)?])
    }
}

/// Channel to an external signing device.
#[async_trait]
pub trait SigningDevice: Send + Sync {
    async fn is_connected(&self) -> bool;

    /// Sign the packed transaction for `chain_id`. The device computes the
    /// digest itself so the user can review the transaction on screen.
    async fn sign_transaction(
        &self,
        chain_id: &ChainId,
        packed_trx: &[u8],
    ) -> Result<Signature, DeviceError>;
}

/// [`KeyProvider`] backed by a [`SigningDevice`].
#[derive(Clone)]
pub struct HardwareDevice {
    device: Arc<dyn SigningDevice>,
}

impl HardwareDevice {
    pub fn new(device: Arc<dyn SigningDevice>) -> Self {
        Self { device }
    }
}

#[async_trait]
impl KeyProvider for HardwareDevice {
    async fn sign(&self, payload: SigningPayload<'_>) -> Result<Vec<Signature>, SignErrorKind> {
        if !self.device.is_connected().await {
            return Err(DeviceError::NotConnected.into());
        }
        tracing::info!("awaiting confirmation on hardware device");
        let signature = self
            .device
            .sign_transaction(payload.chain_id, payload.packed_trx)
            .await?;
        Ok(vec![signature])
    }
}

/// Software keys unlocked for this session, by public key.
#[derive(Default, Clone)]
pub struct UnlockedKeys {
    keys: HashMap<PublicKey, SoftwareKey>,
}

impl UnlockedKeys {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, key: SoftwareKey) {
        self.keys.insert(key.public_key(), key);
    }

    pub fn get(&self, pubkey: &PublicKey) -> Option<&SoftwareKey> {
        self.keys.get(pubkey)
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }
}

impl std::fmt::Debug for UnlockedKeys {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_set().entries(self.keys.keys()).finish()
    }
}

/// Pick the provider matching the wallet's mode.
pub fn select_key_provider(
    wallet: &WalletContext,
    keys: &UnlockedKeys,
    device: Option<Arc<dyn SigningDevice>>,
) -> Result<Box<dyn KeyProvider>, SignErrorKind> {
    match wallet.mode {
        WalletMode::Hot => keys
            .get(&wallet.pubkey)
            .cloned()
            .map(|key| Box::new(key) as Box<dyn KeyProvider>)
            .ok_or(SignErrorKind::KeyNotFound(wallet.pubkey)),
        WalletMode::Ledger => device
            .map(|d| Box::new(HardwareDevice::new(d)) as Box<dyn KeyProvider>)
            .ok_or(SignErrorKind::DeviceUnavailable),
        WalletMode::Watch => Err(SignErrorKind::WatchOnly),
    }
}
