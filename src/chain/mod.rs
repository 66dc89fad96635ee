//! Chain endpoint subsystem.
//!
//! # Data Flow
//! ```text
//! node URL + timeout
//!     → client.rs (ChainApi over HTTP: get_info, get_block, get_abi, push_transaction)
//!     → resolver.rs (ChainSnapshot, per-account ABI lookups)
//! ```
//!
//! # Design Decisions
//! - Endpoints are passed explicitly; nothing here reads configuration
//! - No retry logic; callers decide what to do with a `ChainError`
//! - Every call has a transport timeout

pub mod client;
pub mod resolver;
pub mod types;

pub use client::{ChainApi, ChainClient};
pub use resolver::{fetch_abi, fetch_snapshot, AbiProvider, ChainSnapshot, StaticAbis};
pub use types::{AbiLookupError, ChainError, ChainResult, NetworkError};
