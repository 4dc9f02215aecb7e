//! Agent module
//!
//! ReAct control loop: action parsing, prompt construction, the loop state
//! machine and the orchestrator tying them together.

pub mod orchestrator;
pub mod parser;
pub mod prompt;
pub mod state;

// Re-export commonly used types
pub use orchestrator::{AgentConfig, AgentLoop, DEFAULT_MAX_ITERATIONS, FORMAT_REMINDER};
pub use parser::{parse, parse_action, ParseFailure, ParseOutcome, ParsedStep};
pub use prompt::PromptBuilder;
pub use state::{AgentState, LoopEvent, LoopState};
