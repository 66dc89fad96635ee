//! Callback notification subsystem.
//!
//! # Data Flow
//! ```text
//! CallbackSpec { url template, background } + BroadcastResult
//!     → notifier.rs (render URL, POST with or without body)
//!     → NotifyResult | NotifyError
//! ```
//!
//! A failed callback never changes the broadcast outcome it reports on.

pub mod notifier;
pub mod types;

pub use notifier::{callback_body, render_url, Notifier};
pub use types::{CallbackBody, NotifyError, NotifyResult};
