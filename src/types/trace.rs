//! Reasoning trace: the append-only history of one question

use crate::types::action::Action;
use serde::{Deserialize, Serialize};

/// Placeholder rendered when a step produced no action at all
pub const NO_ACTION_TEXT: &str = "(none)";

/// Result of one loop iteration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Turn {
    pub thought: String,
    /// Parsed action; `None` when the generation was malformed or had none
    pub action: Option<Action>,
    /// Offending `Action:` body when parsing failed
    pub raw_action: Option<String>,
    pub observation: String,
}

impl Turn {
    /// Turn for a successfully parsed action
    pub fn with_action(
        thought: impl Into<String>,
        action: Action,
        observation: impl Into<String>,
    ) -> Self {
        Self {
            thought: thought.into(),
            action: Some(action),
            raw_action: None,
            observation: observation.into(),
        }
    }

    /// Turn for a generation whose action could not be parsed
    pub fn malformed(
        thought: impl Into<String>,
        raw_action: impl Into<String>,
        observation: impl Into<String>,
    ) -> Self {
        Self {
            thought: thought.into(),
            action: None,
            raw_action: Some(raw_action.into()),
            observation: observation.into(),
        }
    }

    /// Turn for a generation without any action line
    pub fn without_action(thought: impl Into<String>, observation: impl Into<String>) -> Self {
        Self {
            thought: thought.into(),
            action: None,
            raw_action: None,
            observation: observation.into(),
        }
    }

    /// Action as it should be replayed in a prompt
    pub fn action_text(&self) -> String {
        match (&self.action, &self.raw_action) {
            (Some(action), _) => action.to_string(),
            (None, Some(raw)) => raw.clone(),
            (None, None) => NO_ACTION_TEXT.to_string(),
        }
    }
}

/// Ordered, append-only sequence of turns
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Trace {
    turns: Vec<Turn>,
}

impl Trace {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a turn; turns are never edited or removed
    pub fn push(&mut self, turn: Turn) {
        self.turns.push(turn);
    }

    pub fn turns(&self) -> &[Turn] {
        &self.turns
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Turn> {
        self.turns.iter()
    }

    pub fn last(&self) -> Option<&Turn> {
        self.turns.last()
    }

    pub fn len(&self) -> usize {
        self.turns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }
}

impl<'a> IntoIterator for &'a Trace {
    type Item = &'a Turn;
    type IntoIter = std::slice::Iter<'a, Turn>;

    fn into_iter(self) -> Self::IntoIter {
        self.turns.iter()
    }
}
