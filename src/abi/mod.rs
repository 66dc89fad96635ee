//! Contract ABIs and the action data serializer.
//!
//! # Data Flow
//! ```text
//! get_abi JSON → types.rs (AbiDef)
//!     → serializer.rs (AbiSerializer: JSON ⇄ packed action data)
//! ```
//!
//! # Design Decisions
//! - The serializer borrows the ABI; building one is cheap, so callers
//!   create it per account rather than caching it
//! - Decoding rejects trailing bytes so a decode/encode cycle is lossless

pub mod serializer;
pub mod types;

pub use serializer::AbiSerializer;
pub use types::{AbiDef, AbiError, AbiResult};
