//! Canned generator
//!
//! Replays a fixed list of continuations, one per call. Used by tests and by
//! anyone who wants to drive the loop without a model server.

use crate::errors::{AgentError, Result};
use crate::streaming::generator::{StopScanner, TextGenerator, TokenSink};
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::Mutex;

#[derive(Debug, Clone)]
enum ScriptStep {
    Reply(String),
    Fail(String),
}

/// Generator that answers from a script
#[derive(Debug, Default)]
pub struct ScriptedGenerator {
    steps: Mutex<VecDeque<ScriptStep>>,
    /// Every prompt received, in call order
    prompts: Mutex<Vec<String>>,
}

impl ScriptedGenerator {
    pub fn new<I, S>(replies: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            steps: Mutex::new(
                replies
                    .into_iter()
                    .map(|r| ScriptStep::Reply(r.into()))
                    .collect(),
            ),
            prompts: Mutex::new(Vec::new()),
        }
    }

    /// Same reply `times` times
    pub fn repeating(reply: impl Into<String>, times: usize) -> Self {
        let reply = reply.into();
        Self::new(std::iter::repeat(reply).take(times))
    }

    /// Queue a failure after the replies queued so far
    pub fn then_fail(self, message: impl Into<String>) -> Self {
        if let Ok(mut steps) = self.steps.lock() {
            steps.push_back(ScriptStep::Fail(message.into()));
        }
        self
    }

    /// Prompts seen so far
    pub fn prompts(&self) -> Vec<String> {
        self.prompts
            .lock()
            .map(|p| p.clone())
            .unwrap_or_default()
    }

    /// Steps not yet consumed
    pub fn remaining(&self) -> usize {
        self.steps.lock().map(|s| s.len()).unwrap_or(0)
    }
}

#[async_trait]
impl TextGenerator for ScriptedGenerator {
    async fn generate(
        &self,
        prompt: &str,
        stop: &[&str],
        mut on_token: Option<TokenSink<'_>>,
    ) -> Result<String> {
        let step = {
            let mut prompts = self
                .prompts
                .lock()
                .map_err(|_| AgentError::Generation("script lock poisoned".to_string()))?;
            prompts.push(prompt.to_string());

            let mut steps = self
                .steps
                .lock()
                .map_err(|_| AgentError::Generation("script lock poisoned".to_string()))?;
            steps.pop_front()
        };

        match step {
            Some(ScriptStep::Reply(text)) => {
                // Stream word by word, the way a model server would
                let mut scanner = StopScanner::new(stop);
                for piece in text.split_inclusive(char::is_whitespace) {
                    if scanner.push(piece, &mut on_token) {
                        break;
                    }
                }
                Ok(scanner.finish(&mut on_token))
            }
            Some(ScriptStep::Fail(message)) => Err(AgentError::Generation(message)),
            None => Err(AgentError::Generation("script exhausted".to_string())),
        }
    }

    fn name(&self) -> &str {
        "scripted"
    }
}
