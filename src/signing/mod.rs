//! Transaction signing subsystem.
//!
//! # Data Flow
//! ```text
//! WalletContext (mode, pubkey) + UnlockedKeys / SigningDevice
//!     → providers.rs (select_key_provider → Box<dyn KeyProvider>)
//!     → signer.rs (expiry check, digest, signature verification)
//!     → SignedTransaction
//! ```
//!
//! # Security Constraints
//! - Private keys ONLY from the environment or an explicit unlock
//! - Never log private keys
//! - The signer holds no chain client, so it cannot broadcast

pub mod providers;
pub mod signer;
pub mod types;

pub use providers::{
    select_key_provider, HardwareDevice, KeyProvider, SigningDevice, SoftwareKey, UnlockedKeys,
    PRIVATE_KEY_ENV_VAR,
};
pub use signer::{sign_transaction, sign_transaction_at};
pub use types::{
    DeviceError, NetworkConfig, SignError, SignErrorKind, SignResult, SigningPayload,
    WalletContext, WalletMode,
};
