//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Session (session.rs):
//!     URI → decode → snapshot → template → sign
//!         → [broadcast → notify]
//! ```
//!
//! # Design Decisions
//! - Ordered stages: a stage never starts after an earlier one failed
//! - Every stage takes its chain client, wallet and network explicitly
//! - Callback outcome is reported next to, never instead of, the
//!   broadcast result

pub mod session;

pub use session::{SessionError, SessionOptions, SessionOutcome, SessionResult, SigningSession};
