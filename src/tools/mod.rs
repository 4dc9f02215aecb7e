//! Tools module
//!
//! Capability table and the built-in retrieval tools the agent can call.

pub mod implementations;
pub mod registry;
pub mod types;

// Re-export commonly used types
pub use implementations::{ExplainTermTool, Glossary, ListDocsTool, SearchTool};
pub use registry::ToolRegistry;
pub use types::{ParamKind, ParamSpec, Tool, ToolArgs, ToolSpec};
