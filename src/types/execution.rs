//! Result of answering one question
//!
//! Exhaustion is an outcome, not an error: callers can tell "no answer found"
//! apart from "the run crashed", which surfaces as `Err(AgentError)` instead.

use crate::types::trace::Trace;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use uuid::Uuid;

/// Terminal status of a run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum RunOutcome {
    /// A `finish` action was parsed
    Answered { answer: String },

    /// Iteration bound reached without an answer
    Exhausted,
}

/// Everything a finished run produced
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentRun {
    pub run_id: Uuid,
    pub question: String,
    pub trace: Trace,
    pub outcome: RunOutcome,
    /// Completed iterations (equals `trace.len()`)
    pub iterations: usize,
    pub started_at: DateTime<Utc>,
    pub duration: Duration,
}

impl AgentRun {
    pub fn final_answer(&self) -> Option<&str> {
        match &self.outcome {
            RunOutcome::Answered { answer } => Some(answer),
            RunOutcome::Exhausted => None,
        }
    }

    pub fn is_answered(&self) -> bool {
        matches!(self.outcome, RunOutcome::Answered { .. })
    }

    /// Get a human-readable summary of the run
    pub fn summary(&self) -> String {
        let status = if self.is_answered() {
            "Answered"
        } else {
            "Exhausted"
        };
        format!(
            "{} in {:.2}s ({} iterations)",
            status,
            self.duration.as_secs_f64(),
            self.iterations
        )
    }
}
