//! Control loop state machine
//!
//! Deterministic finite state machine for one reasoning step:
//! - Safety: no transition out of a terminal state
//! - Determinism: unique next state per (state, event)
//! - Every non-terminal path returns to `AwaitingGeneration` or terminates

use crate::errors::{AgentError, Result};
use crate::types::trace::Trace;
use serde::{Deserialize, Serialize};

/// Loop states
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LoopState {
    /// Waiting for the next model continuation
    AwaitingGeneration,

    /// A `finish` action was parsed
    HasFinalAnswer,

    /// A tool action was parsed and must be dispatched
    HasToolAction,

    /// An `Action:` line was present but malformed
    ParseFailure,

    /// The continuation had no `Action:` line
    NoAction,

    /// Final answer recorded (terminal)
    Answered,

    /// Iteration bound reached without an answer (terminal)
    Exhausted,
}

/// Events that trigger state transitions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LoopEvent {
    FinishParsed,
    ToolActionParsed,
    MalformedAction,
    ActionMissing,
    BudgetExhausted,
    AnswerRecorded,
    ObservationRecorded,
}

impl LoopState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, LoopState::Answered | LoopState::Exhausted)
    }

    /// Attempt state transition with validation
    ///
    /// ```text
    /// AwaitingGeneration --FinishParsed--------> HasFinalAnswer
    /// AwaitingGeneration --ToolActionParsed----> HasToolAction
    /// AwaitingGeneration --MalformedAction-----> ParseFailure
    /// AwaitingGeneration --ActionMissing-------> NoAction
    /// AwaitingGeneration --BudgetExhausted-----> Exhausted
    /// HasFinalAnswer     --AnswerRecorded------> Answered
    /// HasToolAction      --ObservationRecorded-> AwaitingGeneration
    /// ParseFailure       --ObservationRecorded-> AwaitingGeneration
    /// NoAction           --ObservationRecorded-> AwaitingGeneration
    /// Answered / Exhausted --*--> self
    /// ```
    pub fn transition(&self, event: LoopEvent) -> Result<LoopState> {
        use LoopEvent::*;
        use LoopState::*;

        let next_state = match (self, event) {
            (AwaitingGeneration, FinishParsed) => HasFinalAnswer,
            (AwaitingGeneration, ToolActionParsed) => HasToolAction,
            (AwaitingGeneration, MalformedAction) => ParseFailure,
            (AwaitingGeneration, ActionMissing) => NoAction,
            (AwaitingGeneration, BudgetExhausted) => Exhausted,

            (HasFinalAnswer, AnswerRecorded) => Answered,

            (HasToolAction, ObservationRecorded)
            | (ParseFailure, ObservationRecorded)
            | (NoAction, ObservationRecorded) => AwaitingGeneration,

            // Terminal states (self-loops)
            (Answered, _) => Answered,
            (Exhausted, _) => Exhausted,

            (from, event) => {
                return Err(AgentError::InvalidTransition {
                    from: format!("{:?}", from),
                    to: format!("(via {:?})", event),
                    reason: format!("No valid transition from {:?} on {:?}", from, event),
                });
            }
        };

        Ok(next_state)
    }

    /// Human-readable state name
    pub fn display_name(&self) -> &'static str {
        match self {
            LoopState::AwaitingGeneration => "Thinking",
            LoopState::HasFinalAnswer => "Answer Found",
            LoopState::HasToolAction => "Calling Tool",
            LoopState::ParseFailure => "Malformed Action",
            LoopState::NoAction => "No Action",
            LoopState::Answered => "Answered",
            LoopState::Exhausted => "Out of Iterations",
        }
    }
}

/// Per-run mutable state, owned by a single `run` call
#[derive(Debug, Clone)]
pub struct AgentState {
    pub question: String,
    pub trace: Trace,
    pub final_answer: Option<String>,
    /// Completed iterations
    pub iteration: usize,
    loop_state: LoopState,
}

impl AgentState {
    pub fn new(question: impl Into<String>) -> Self {
        Self {
            question: question.into(),
            trace: Trace::new(),
            final_answer: None,
            iteration: 0,
            loop_state: LoopState::AwaitingGeneration,
        }
    }

    pub fn loop_state(&self) -> LoopState {
        self.loop_state
    }

    /// Apply an event, rejecting invalid transitions
    pub fn apply(&mut self, event: LoopEvent) -> Result<LoopState> {
        self.loop_state = self.loop_state.transition(event)?;
        Ok(self.loop_state)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use LoopEvent::*;
    use LoopState::*;

    const ALL_STATES: [LoopState; 7] = [
        AwaitingGeneration,
        HasFinalAnswer,
        HasToolAction,
        ParseFailure,
        NoAction,
        Answered,
        Exhausted,
    ];

    const ALL_EVENTS: [LoopEvent; 7] = [
        FinishParsed,
        ToolActionParsed,
        MalformedAction,
        ActionMissing,
        BudgetExhausted,
        AnswerRecorded,
        ObservationRecorded,
    ];

    #[test]
    fn test_valid_transitions() {
        assert_eq!(AwaitingGeneration.transition(FinishParsed).unwrap(), HasFinalAnswer);
        assert_eq!(AwaitingGeneration.transition(ToolActionParsed).unwrap(), HasToolAction);
        assert_eq!(AwaitingGeneration.transition(MalformedAction).unwrap(), ParseFailure);
        assert_eq!(AwaitingGeneration.transition(ActionMissing).unwrap(), NoAction);
        assert_eq!(AwaitingGeneration.transition(BudgetExhausted).unwrap(), Exhausted);
        assert_eq!(HasFinalAnswer.transition(AnswerRecorded).unwrap(), Answered);
        for state in [HasToolAction, ParseFailure, NoAction] {
            assert_eq!(state.transition(ObservationRecorded).unwrap(), AwaitingGeneration);
        }
    }

    #[test]
    fn test_terminal_states_self_loop() {
        for event in ALL_EVENTS {
            assert_eq!(Answered.transition(event).unwrap(), Answered);
            assert_eq!(Exhausted.transition(event).unwrap(), Exhausted);
        }
        assert!(Answered.is_terminal());
        assert!(Exhausted.is_terminal());
        assert!(!AwaitingGeneration.is_terminal());
    }

    #[test]
    fn test_invalid_transitions() {
        assert!(HasToolAction.transition(FinishParsed).is_err());
        assert!(HasFinalAnswer.transition(ObservationRecorded).is_err());
        assert!(AwaitingGeneration.transition(AnswerRecorded).is_err());

        let err = NoAction.transition(BudgetExhausted).unwrap_err();
        assert!(matches!(err, AgentError::InvalidTransition { .. }));
    }

    #[test]
    fn test_determinism() {
        for state in ALL_STATES {
            for event in ALL_EVENTS {
                let first = state.transition(event).ok();
                let second = state.transition(event).ok();
                assert_eq!(first, second);
            }
        }
    }

    #[test]
    fn test_agent_state_apply() {
        let mut state = AgentState::new("q");
        assert_eq!(state.loop_state(), AwaitingGeneration);
        state.apply(ToolActionParsed).unwrap();
        state.apply(ObservationRecorded).unwrap();
        state.apply(FinishParsed).unwrap();
        assert_eq!(state.apply(AnswerRecorded).unwrap(), Answered);

        let mut fresh = AgentState::new("q");
        assert!(fresh.apply(ObservationRecorded).is_err());
        assert_eq!(fresh.loop_state(), AwaitingGeneration);
    }
}
