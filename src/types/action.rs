//! Structured actions emitted by the model
//!
//! An action is a name plus an ordered list of string arguments. Its textual
//! form is the grammar the parser accepts:
//!
//! ```text
//! search[query="net income", k="2"]
//! finish[answer="About 10.9 billion CHF"]
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;

/// Reserved terminal action name
pub const FINISH_ACTION: &str = "finish";

/// Sole recognized argument of the terminal action
pub const ANSWER_ARG: &str = "answer";

/// Tool or terminal invocation
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Action {
    pub name: String,
    /// Arguments in the order they were written
    pub args: Vec<(String, String)>,
}

impl Action {
    /// Action without arguments
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            args: Vec::new(),
        }
    }

    /// Terminal action carrying the final answer
    pub fn finish(answer: impl Into<String>) -> Self {
        Self::new(FINISH_ACTION).with_arg(ANSWER_ARG, answer)
    }

    /// Append an argument
    pub fn with_arg(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.args.push((key.into(), value.into()));
        self
    }

    /// Value of the first argument named `key`
    pub fn arg(&self, key: &str) -> Option<&str> {
        self.args
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn is_finish(&self) -> bool {
        self.name == FINISH_ACTION
    }

    /// Final answer, if this is a terminal action
    pub fn answer(&self) -> Option<&str> {
        if self.is_finish() {
            self.arg(ANSWER_ARG)
        } else {
            None
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}[", self.name)?;
        for (i, (key, value)) in self.args.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}=\"{}\"", key, escape_value(value))?;
        }
        write!(f, "]")
    }
}

/// `[A-Za-z_][A-Za-z0-9_]*`, the shape of action and argument names
pub fn is_identifier(s: &str) -> bool {
    let mut chars = s.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {
            chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
        }
        _ => false,
    }
}

/// Escape a value so it fits inside a double-quoted argument on one line
pub fn escape_value(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for ch in value.chars() {
        match ch {
            '\\' => out.push_str("\\\\"),
            '"' => out.push_str("\\\""),
            '\n' => out.push_str("\\n"),
            '\t' => out.push_str("\\t"),
            '\r' => out.push_str("\\r"),
            other => out.push(other),
        }
    }
    out
}
