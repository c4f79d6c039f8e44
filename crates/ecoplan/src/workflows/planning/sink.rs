use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::domain::{Attempt, RunId};

/// Append-only record of one finished attempt, keyed by run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttemptEvent {
    pub run_id: RunId,
    pub recorded_at: DateTime<Utc>,
    pub attempt: usize,
    pub accepted: bool,
    pub reason: String,
    pub selected: usize,
    pub total_cost: f64,
    pub patch_applied_next: bool,
}

impl AttemptEvent {
    pub fn from_attempt(run_id: &RunId, attempt: &Attempt) -> Self {
        Self {
            run_id: run_id.clone(),
            recorded_at: Utc::now(),
            attempt: attempt.attempt,
            accepted: attempt.accepted,
            reason: attempt.reason.clone(),
            selected: attempt.plan.actions.len(),
            total_cost: attempt.plan.totals.total_cost,
            patch_applied_next: attempt.patch_applied_next,
        }
    }
}

/// Outbound hook for attempt auditing. Failures never abort a run.
pub trait AttemptSink: Send + Sync {
    fn record(&self, event: &AttemptEvent) -> Result<(), SinkError>;
}

/// Attempt sink failure.
#[derive(Debug, thiserror::Error)]
pub enum SinkError {
    #[error("attempt sink unavailable: {0}")]
    Unavailable(String),
}
