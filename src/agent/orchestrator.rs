//! Agent control loop
//!
//! Coordinates one question from start to finish:
//! - Prompt construction from the question and the trace
//! - Generation through the `TextGenerator` seam
//! - Action parsing and state machine transitions
//! - Tool dispatch through the capability table
//!
//! A run is bounded by `max_iterations`. Running out of iterations is a normal
//! outcome; only generator failures and state machine violations are errors.

use crate::agent::parser::{self, ParseOutcome};
use crate::agent::prompt::PromptBuilder;
use crate::agent::state::{AgentState, LoopEvent};
use crate::errors::{AgentError, Result};
use crate::repl::events::{AgentEvent, EventBus};
use crate::streaming::generator::{TextGenerator, DEFAULT_STOP_SEQUENCES};
use crate::tools::registry::ToolRegistry;
use crate::types::action::Action;
use crate::types::execution::{AgentRun, RunOutcome};
use crate::types::trace::Turn;
use chrono::Utc;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Default iteration bound
pub const DEFAULT_MAX_ITERATIONS: usize = 6;

/// Appended to every corrective observation
pub const FORMAT_REMINDER: &str = "Respond with a Thought line followed by an Action line, \
for example Action: search[query=\"...\"] or Action: finish[answer=\"...\"].";

/// Control loop configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AgentConfig {
    /// Maximum iterations before giving up
    pub max_iterations: usize,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            max_iterations: DEFAULT_MAX_ITERATIONS,
        }
    }
}

/// ReAct control loop
///
/// `run` takes `&self` and keeps all per-question state local, so one loop can
/// serve several questions concurrently.
pub struct AgentLoop {
    generator: Arc<dyn TextGenerator>,
    tools: Arc<ToolRegistry>,
    prompt: PromptBuilder,
    config: AgentConfig,
    events: Option<EventBus>,
}

impl AgentLoop {
    /// Create a loop over a generator and a capability table
    pub fn new(
        generator: Arc<dyn TextGenerator>,
        tools: Arc<ToolRegistry>,
        config: AgentConfig,
    ) -> Result<Self> {
        if config.max_iterations == 0 {
            return Err(AgentError::ConfigError(
                "max_iterations must be at least 1".to_string(),
            ));
        }

        Ok(Self {
            prompt: PromptBuilder::from_registry(&tools),
            generator,
            tools,
            config,
            events: None,
        })
    }

    /// Publish progress on `bus`
    pub fn with_events(mut self, bus: EventBus) -> Self {
        self.events = Some(bus);
        self
    }

    pub fn config(&self) -> &AgentConfig {
        &self.config
    }

    pub fn tools(&self) -> &ToolRegistry {
        &self.tools
    }

    pub fn prompt_builder(&self) -> &PromptBuilder {
        &self.prompt
    }

    pub fn generator_name(&self) -> &str {
        self.generator.name()
    }

    /// Answer one question
    pub async fn run(&self, question: &str) -> Result<AgentRun> {
        let run_id = Uuid::new_v4();
        let started_at = Utc::now();
        let clock = Instant::now();
        let max = self.config.max_iterations;
        let mut state = AgentState::new(question);

        info!(%run_id, max_iterations = max, generator = self.generator.name(), "starting run");

        while state.iteration < max {
            let iteration = state.iteration + 1;
            let prompt = self.prompt.build(&state.question, &state.trace);
            self.emit(AgentEvent::IterationStarted { iteration, max }).await;
            debug!(%run_id, iteration, prompt_chars = prompt.len(), "iteration started");

            let text = self.generate(&prompt).await?;
            let step = parser::parse(&text);
            self.emit(AgentEvent::Thought {
                text: step.thought.clone(),
            })
            .await;

            match step.outcome {
                ParseOutcome::Action(action) if action.is_finish() => {
                    state.apply(LoopEvent::FinishParsed)?;
                    self.emit(AgentEvent::Action {
                        text: action.to_string(),
                    })
                    .await;
                    let answer = action.answer().map(str::to_string).unwrap_or_default();
                    state
                        .trace
                        .push(Turn::with_action(step.thought, action, answer.clone()));
                    state.final_answer = Some(answer.clone());
                    state.iteration += 1;
                    state.apply(LoopEvent::AnswerRecorded)?;

                    info!(%run_id, iterations = state.iteration, "run answered");
                    self.emit(AgentEvent::Answered {
                        answer: answer.clone(),
                    })
                    .await;
                    return Ok(finish_run(
                        run_id,
                        started_at,
                        clock,
                        state,
                        RunOutcome::Answered { answer },
                    ));
                }
                ParseOutcome::Action(action) => {
                    state.apply(LoopEvent::ToolActionParsed)?;
                    self.emit(AgentEvent::Action {
                        text: action.to_string(),
                    })
                    .await;
                    let observation = self.observe(&action).await;
                    self.emit(AgentEvent::Observation {
                        text: observation.clone(),
                    })
                    .await;
                    state
                        .trace
                        .push(Turn::with_action(step.thought, action, observation));
                }
                ParseOutcome::Failure(failure) => {
                    state.apply(LoopEvent::MalformedAction)?;
                    warn!(%run_id, iteration, reason = %failure.reason, "malformed action");
                    let observation = format!(
                        "Invalid action format: {}. {}",
                        failure.reason, FORMAT_REMINDER
                    );
                    self.emit(AgentEvent::Action {
                        text: failure.line.clone(),
                    })
                    .await;
                    self.emit(AgentEvent::Observation {
                        text: observation.clone(),
                    })
                    .await;
                    state
                        .trace
                        .push(Turn::malformed(step.thought, failure.line, observation));
                }
                ParseOutcome::NoActionFound => {
                    state.apply(LoopEvent::ActionMissing)?;
                    warn!(%run_id, iteration, "no action in generation");
                    let observation =
                        format!("No action found in the response. {}", FORMAT_REMINDER);
                    self.emit(AgentEvent::Observation {
                        text: observation.clone(),
                    })
                    .await;
                    state
                        .trace
                        .push(Turn::without_action(step.thought, observation));
                }
            }

            state.apply(LoopEvent::ObservationRecorded)?;
            state.iteration += 1;
        }

        state.apply(LoopEvent::BudgetExhausted)?;
        info!(%run_id, iterations = state.iteration, "run exhausted");
        self.emit(AgentEvent::Exhausted {
            iterations: state.iteration,
        })
        .await;

        Ok(finish_run(
            run_id,
            started_at,
            clock,
            state,
            RunOutcome::Exhausted,
        ))
    }

    /// Generate a continuation, forwarding tokens to the bus
    async fn generate(&self, prompt: &str) -> Result<String> {
        let result = match &self.events {
            Some(bus) => {
                let mut sink = |token: &str| {
                    bus.emit_now(AgentEvent::Token {
                        text: token.to_string(),
                    })
                };
                self.generator
                    .generate(prompt, DEFAULT_STOP_SEQUENCES, Some(&mut sink))
                    .await
            }
            None => {
                self.generator
                    .generate(prompt, DEFAULT_STOP_SEQUENCES, None)
                    .await
            }
        };

        result.map_err(|e| match e {
            AgentError::Generation(_) => e,
            other => AgentError::Generation(other.to_string()),
        })
    }

    /// Dispatch a tool action and render the result as an observation
    async fn observe(&self, action: &Action) -> String {
        match self.tools.dispatch(action).await {
            Ok(value) => serde_json::to_string(&value)
                .unwrap_or_else(|e| format!("Error: cannot encode tool result: {}", e)),
            Err(err) => {
                warn!(tool = %action.name, error = %err, "tool call failed");
                format!("Error: {}", err)
            }
        }
    }

    /// Publish a structural event; waits for the consumer when the bus is full
    async fn emit(&self, event: AgentEvent) {
        if let Some(bus) = &self.events {
            bus.emit(event).await;
        }
    }
}

fn finish_run(
    run_id: Uuid,
    started_at: chrono::DateTime<Utc>,
    clock: Instant,
    state: AgentState,
    outcome: RunOutcome,
) -> AgentRun {
    AgentRun {
        run_id,
        question: state.question,
        iterations: state.iteration,
        trace: state.trace,
        outcome,
        started_at,
        duration: clock.elapsed(),
    }
}
