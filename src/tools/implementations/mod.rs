//! Built-in tools

pub mod documents;
pub mod glossary;
pub mod search;

pub use documents::{ListDocsTool, LIST_DOCS_TOOL};
pub use glossary::{ExplainTermTool, Glossary, EXPLAIN_TERM_TOOL};
pub use search::{SearchTool, SEARCH_TOOL};
