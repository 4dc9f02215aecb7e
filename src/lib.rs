//! docbuddy - ask a local Ollama model questions about a document corpus
//!
//! # Architecture
//!
//! - **Retrieval**: TF-IDF index with cosine-ranked search over a fixed corpus
//! - **Agent**: ReAct loop (Thought, Action, Observation) driven by a text
//!   generator, dispatching to a validated tool registry
//! - **Interface**: clap CLI, rustyline REPL and a colored event renderer

pub mod errors;
pub mod types;
pub mod corpus;
pub mod retrieval;
pub mod streaming;
pub mod tools;
pub mod agent;
pub mod repl;
pub mod cli;
pub mod doctor;

// Re-export commonly used types
pub use errors::{AgentError, Result, ToolError};
