//! Prompt construction
//!
//! The prompt is a pure function of the registered tools, the question and
//! the trace so far. Nothing else (time, randomness, config) leaks in, which
//! keeps runs reproducible against a scripted generator.

use crate::agent::parser::{ACTION_LABEL, THOUGHT_LABEL};
use crate::streaming::generator::OBSERVATION_STOP;
use crate::tools::registry::ToolRegistry;
use crate::tools::types::ToolSpec;
use crate::types::action::{ANSWER_ARG, FINISH_ACTION};
use crate::types::trace::Trace;
use std::fmt::Write;

const INTRO: &str = "You are a careful research assistant. You answer questions using only \
the documents you can reach through the tools below. Work step by step and look \
things up before answering.";

const RULES: &str = "Rules:
- Respond with exactly two lines: a Thought line, then an Action line.
- Call exactly one tool per Action, or finish when you know the answer.
- Argument values are always double-quoted strings, for example k=\"3\".
- Inside a value, write a double quote as \\\" and a line break as \\n.
- Never write an Observation line. Observations are given to you.";

/// Builds the text sent to the generator for each step
#[derive(Debug, Clone)]
pub struct PromptBuilder {
    preamble: String,
}

impl PromptBuilder {
    /// Builder describing `specs` in the given order
    pub fn new<'a>(specs: impl IntoIterator<Item = &'a ToolSpec>) -> Self {
        Self {
            preamble: render_preamble(specs),
        }
    }

    pub fn from_registry(registry: &ToolRegistry) -> Self {
        Self::new(registry.specs())
    }

    /// The fixed part shared by every prompt
    pub fn preamble(&self) -> &str {
        &self.preamble
    }

    /// Full prompt for the next step
    pub fn build(&self, question: &str, trace: &Trace) -> String {
        let mut prompt = String::with_capacity(self.preamble.len() + 256 * (trace.len() + 1));
        prompt.push_str(&self.preamble);
        prompt.push_str("\n\nQuestion: ");
        prompt.push_str(question.trim());
        prompt.push('\n');

        for turn in trace {
            push_line(&mut prompt, THOUGHT_LABEL, &turn.thought);
            push_line(&mut prompt, ACTION_LABEL, &turn.action_text());
            push_line(&mut prompt, OBSERVATION_STOP, &turn.observation);
        }

        prompt.push_str(THOUGHT_LABEL);
        prompt
    }
}

fn push_line(prompt: &mut String, label: &str, body: &str) {
    prompt.push_str(label);
    let body = body.trim();
    if !body.is_empty() {
        prompt.push(' ');
        prompt.push_str(body);
    }
    prompt.push('\n');
}

fn render_preamble<'a>(specs: impl IntoIterator<Item = &'a ToolSpec>) -> String {
    let mut out = String::new();
    out.push_str(INTRO);
    out.push_str("\n\nAvailable tools:\n");

    for spec in specs {
        // Writing to a String cannot fail
        let _ = writeln!(out, "- {}", spec.call_syntax());
        let _ = writeln!(out, "  {}", spec.description);
        for param in &spec.params {
            let requirement = match (&param.default, param.required) {
                (Some(default), _) => format!("optional, default \"{}\"", default),
                (None, true) => "required".to_string(),
                (None, false) => "optional".to_string(),
            };
            let _ = writeln!(
                out,
                "  * {} ({}, {}): {}",
                param.name, param.kind, requirement, param.description
            );
        }
    }

    let _ = writeln!(out, "- {}[{}=\"...\"]", FINISH_ACTION, ANSWER_ARG);
    out.push_str("  Give the final answer to the question and stop.\n\n");

    out.push_str("Response format:\n");
    let _ = writeln!(out, "{} <one short sentence about what to do next>", THOUGHT_LABEL);
    let _ = writeln!(out, "{} <one tool call or {}>", ACTION_LABEL, FINISH_ACTION);
    out.push('\n');
    out.push_str(RULES);
    out
}
