//! Broadcast subsystem.
//!
//! # Data Flow
//! ```text
//! SignedTransaction
//!     → broadcaster.rs (push_transaction via ChainApi)
//!     → BroadcastResult
//!     → callback::Notifier (if the request carried a callback)
//!     → BroadcastOutcome { result, callback }
//! ```

pub mod broadcaster;
pub mod types;

pub use broadcaster::{broadcast, submit};
pub use types::{BroadcastError, BroadcastOutcome, BroadcastResult};
