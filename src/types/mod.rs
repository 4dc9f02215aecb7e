//! Type definitions module
//!
//! Actions, reasoning traces and run results shared by the agent loop,
//! the prompt builder and the presentation layer.

pub mod action;
pub mod trace;

// Re-export commonly used types
pub use action::{is_identifier, Action, ANSWER_ARG, FINISH_ACTION};
pub use trace::{Trace, Turn};

// Run result types
pub mod execution;
pub use execution::{AgentRun, RunOutcome};
