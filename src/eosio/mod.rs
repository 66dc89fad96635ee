//! Chain primitives.
//!
//! # Data Flow
//! ```text
//! bytes.rs       (varints, little-endian integers, length-prefixed data)
//!     → name.rs, asset.rs, time.rs, keys.rs, chain_id.rs (typed values)
//!     → transaction.rs (actions, transactions, signing digest)
//! ```
//!
//! # Design Decisions
//! - Every value has one binary form and one string form; serde uses the
//!   string form so JSON output matches what chain nodes accept
//! - Reading never panics on truncated input; it returns `BinaryError`

pub mod asset;
pub mod bytes;
pub mod chain_id;
pub mod keys;
pub mod name;
pub mod time;
pub mod transaction;

pub use asset::{Asset, Symbol, SymbolCode};
pub use bytes::{BinaryError, ByteReader, ByteWriter};
pub use chain_id::ChainId;
pub use keys::{PrivateKey, PublicKey, Signature};
pub use name::{Name, ACTIVE_PERMISSION, PLACEHOLDER_ACTOR, PLACEHOLDER_PERMISSION};
pub use time::{BlockTimestamp, TimePoint, TimePointSec};
pub use transaction::{
    Action, PackedTransaction, PermissionLevel, SignedTransaction, Transaction,
    TransactionExtension, TransactionHeader,
};
