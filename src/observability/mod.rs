//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! Lifecycle stages produce:
//!     → logging.rs (structured log events via tracing)
//!     → metrics.rs (per-stage counters and latency histograms)
//!     → spans.rs (one span per signing session, keyed by a UUID)
//! ```
//!
//! # Design Decisions
//! - The library only emits; installing a subscriber or a metrics
//!   recorder is the binary's job
//! - Key material never appears in fields

pub mod logging;
pub mod metrics;
pub mod spans;
