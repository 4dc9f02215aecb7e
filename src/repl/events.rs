//! Event bus system for real-time progress updates
//!
//! The control loop publishes what it is doing; renderers subscribe through
//! the receiving half. Thought, action, observation and terminal events wait
//! for room in the bounded channel and always arrive in order. Token events
//! are best-effort and are dropped when the channel is full.

use std::fmt;
use tokio::sync::mpsc;

/// Channel capacity (prevents unbounded memory growth)
pub const EVENT_CHANNEL_CAPACITY: usize = 100;

/// Control loop progress events
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AgentEvent {
    /// A new iteration began (1-based)
    IterationStarted { iteration: usize, max: usize },

    /// Streamed generator output; informational only
    Token { text: String },

    Thought { text: String },
    Action { text: String },
    Observation { text: String },

    /// Run finished with an answer
    Answered { answer: String },

    /// Run hit the iteration bound
    Exhausted { iterations: usize },
}

impl AgentEvent {
    /// Whether the run is over after this event
    pub fn is_terminal(&self) -> bool {
        matches!(self, AgentEvent::Answered { .. } | AgentEvent::Exhausted { .. })
    }
}

impl fmt::Display for AgentEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AgentEvent::IterationStarted { iteration, max } => {
                write!(f, "Iteration {}/{}", iteration, max)
            }
            AgentEvent::Token { text } => write!(f, "{}", text),
            AgentEvent::Thought { text } => write!(f, "Thought: {}", text),
            AgentEvent::Action { text } => write!(f, "Action: {}", text),
            AgentEvent::Observation { text } => write!(f, "Observation: {}", text),
            AgentEvent::Answered { answer } => write!(f, "Answer: {}", answer),
            AgentEvent::Exhausted { iterations } => {
                write!(f, "No answer after {} iterations", iterations)
            }
        }
    }
}

/// Event bus for publishing agent events
#[derive(Debug, Clone)]
pub struct EventBus {
    sender: mpsc::Sender<AgentEvent>,
}

impl EventBus {
    /// Create new event bus with bounded channel
    pub fn new() -> (Self, mpsc::Receiver<AgentEvent>) {
        let (sender, receiver) = mpsc::channel(EVENT_CHANNEL_CAPACITY);
        (EventBus { sender }, receiver)
    }

    /// Emit an event, waiting for room in the channel
    ///
    /// Only a closed receiver loses the event.
    pub async fn emit(&self, event: AgentEvent) {
        let _ = self.sender.send(event).await;
    }

    /// Non-blocking emit usable from synchronous callbacks
    ///
    /// Events are dropped when the channel is full or closed, so this is
    /// meant for `Token` events only.
    pub fn emit_now(&self, event: AgentEvent) {
        let _ = self.sender.try_send(event);
    }

    /// Whether the receiving half is gone
    pub fn is_closed(&self) -> bool {
        self.sender.is_closed()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new().0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::time::{timeout, Duration};

    #[tokio::test]
    async fn test_event_emission() {
        let (bus, mut receiver) = EventBus::new();

        bus.emit(AgentEvent::Thought {
            text: "look it up".to_string(),
        })
        .await;

        let event = timeout(Duration::from_millis(100), receiver.recv())
            .await
            .expect("Timeout waiting for event")
            .expect("Channel closed");

        assert_eq!(
            event,
            AgentEvent::Thought {
                text: "look it up".to_string()
            }
        );
    }

    #[tokio::test]
    async fn test_events_keep_order() {
        let (bus, mut receiver) = EventBus::new();

        bus.emit(AgentEvent::IterationStarted { iteration: 1, max: 6 }).await;
        bus.emit_now(AgentEvent::Token { text: "a".to_string() });
        bus.emit(AgentEvent::Answered { answer: "x".to_string() }).await;

        assert!(matches!(receiver.recv().await, Some(AgentEvent::IterationStarted { .. })));
        assert!(matches!(receiver.recv().await, Some(AgentEvent::Token { .. })));
        assert!(receiver.recv().await.unwrap().is_terminal());
    }

    #[test]
    fn test_full_channel_drops_instead_of_blocking() {
        let (bus, mut receiver) = EventBus::new();
        for i in 0..(EVENT_CHANNEL_CAPACITY + 10) {
            bus.emit_now(AgentEvent::Token { text: i.to_string() });
        }

        let mut received = 0;
        while receiver.try_recv().is_ok() {
            received += 1;
        }
        assert_eq!(received, EVENT_CHANNEL_CAPACITY);
    }

    #[tokio::test]
    async fn test_emit_waits_behind_full_channel() {
        let (bus, mut receiver) = EventBus::new();
        for i in 0..EVENT_CHANNEL_CAPACITY {
            bus.emit_now(AgentEvent::Token { text: i.to_string() });
        }

        let sender = bus.clone();
        let pending = tokio::spawn(async move {
            sender
                .emit(AgentEvent::Answered {
                    answer: "kept".to_string(),
                })
                .await;
        });

        let mut last = None;
        for _ in 0..=EVENT_CHANNEL_CAPACITY {
            last = timeout(Duration::from_secs(1), receiver.recv())
                .await
                .expect("Timeout waiting for event");
        }
        pending.await.unwrap();
        assert_eq!(
            last,
            Some(AgentEvent::Answered {
                answer: "kept".to_string()
            })
        );
    }

    #[tokio::test]
    async fn test_emit_to_closed_receiver_returns() {
        let (bus, receiver) = EventBus::new();
        drop(receiver);
        bus.emit(AgentEvent::Exhausted { iterations: 1 }).await;
        assert!(bus.is_closed());
    }

    #[test]
    fn test_closed_receiver() {
        let (bus, receiver) = EventBus::new();
        drop(receiver);
        assert!(bus.is_closed());
        bus.emit_now(AgentEvent::Exhausted { iterations: 1 });
    }

    #[test]
    fn test_display() {
        let event = AgentEvent::IterationStarted { iteration: 2, max: 6 };
        assert_eq!(event.to_string(), "Iteration 2/6");
        assert_eq!(
            AgentEvent::Exhausted { iterations: 6 }.to_string(),
            "No answer after 6 iterations"
        );
    }
}
