//! Lifecycle metrics.
//!
//! # Metrics
//! - `esr_stage_total` (counter): stage runs by `stage`, `outcome`
//! - `esr_stage_duration_seconds` (histogram): stage latency by `stage`
//!
//! Recorded through the `metrics` facade; without an installed recorder
//! every call is a no-op.

use std::fmt;
use std::future::Future;
use std::time::Instant;

pub const STAGE_TOTAL: &str = "esr_stage_total";
pub const STAGE_DURATION_SECONDS: &str = "esr_stage_duration_seconds";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stage {
    Decode,
    Snapshot,
    Template,
    Sign,
    Broadcast,
    Notify,
}

impl Stage {
    pub fn as_str(self) -> &'static str {
        match self {
            Stage::Decode => "decode",
            Stage::Snapshot => "snapshot",
            Stage::Template => "template",
            Stage::Sign => "sign",
            Stage::Broadcast => "broadcast",
            Stage::Notify => "notify",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

pub fn record_stage(stage: Stage, success: bool, start: Instant) {
    let outcome = if success { "success" } else { "failure" };
    ::metrics::counter!(STAGE_TOTAL, "stage" => stage.as_str(), "outcome" => outcome).increment(1);
    ::metrics::histogram!(STAGE_DURATION_SECONDS, "stage" => stage.as_str())
        .record(start.elapsed().as_secs_f64());
}

/// Run a synchronous stage and record its outcome.
pub fn observe<T, E>(stage: Stage, f: impl FnOnce() -> Result<T, E>) -> Result<T, E> {
    let start = Instant::now();
    let result = f();
    record_stage(stage, result.is_ok(), start);
    result
}

/// Await a stage and record its outcome.
pub async fn observe_async<T, E, F>(stage: Stage, fut: F) -> Result<T, E>
where
    F: Future<Output = Result<T, E>>,
{
    let start = Instant::now();
    let result = fut.await;
    record_stage(stage, result.is_ok(), start);
    result
}
