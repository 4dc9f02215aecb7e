//! REPL (Read-Eval-Print Loop) module for interactive terminal experience
//!
//! Questions typed at the prompt are answered by the agent loop while its
//! events are rendered live; `/` commands inspect the corpus and session.

pub mod commands;
pub mod display;
pub mod events;
pub mod input;
pub mod session;

use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, warn};

use crate::agent::AgentLoop;
use crate::errors::Result;
use crate::repl::commands::{is_command, CommandContext};
use crate::repl::input::{InputHandler, InputLine};
use crate::retrieval::RetrievalEngine;
use crate::types::execution::AgentRun;

pub use crate::repl::display::DisplayManager;
pub use crate::repl::events::{AgentEvent, EventBus};
pub use crate::repl::session::{QuestionRecord, SessionHistory};

/// Run one question while rendering its events as they arrive
///
/// Events still queued when the run returns are drained before returning, so
/// the display is complete when the caller prints the result.
pub async fn run_with_display(
    agent: &AgentLoop,
    events: &mut mpsc::Receiver<AgentEvent>,
    display: &mut DisplayManager,
    question: &str,
) -> Result<AgentRun> {
    let run = agent.run(question);
    tokio::pin!(run);

    loop {
        tokio::select! {
            result = &mut run => {
                while let Ok(event) = events.try_recv() {
                    display.handle_event(&event);
                }
                display.stop_spinner();
                return result;
            }
            Some(event) = events.recv() => display.handle_event(&event),
        }
    }
}

/// REPL session coordinator
pub struct ReplSession {
    agent: AgentLoop,
    events: mpsc::Receiver<AgentEvent>,
    engine: Arc<RetrievalEngine>,
    input: InputHandler,
    display: DisplayManager,
    session: SessionHistory,
}

impl ReplSession {
    /// Create a session; the agent is wired to a fresh event bus
    pub fn new(
        agent: AgentLoop,
        engine: Arc<RetrievalEngine>,
        input: InputHandler,
        display: DisplayManager,
    ) -> Self {
        let (bus, events) = EventBus::new();
        ReplSession {
            agent: agent.with_events(bus),
            events,
            engine,
            input,
            display,
            session: SessionHistory::new(),
        }
    }

    /// Show welcome banner
    pub fn show_welcome(&self, version: &str, model: &str) {
        self.display
            .show_banner(version, model, self.engine.corpus().len());
    }

    /// Read and handle lines until `/exit` or Ctrl-D
    pub async fn run(&mut self) -> anyhow::Result<()> {
        loop {
            match self.input.read_line()? {
                InputLine::Line(line) => {
                    if !self.handle_line(&line).await {
                        break;
                    }
                }
                InputLine::Interrupted => {
                    self.display.show_info("Press Ctrl-D or type /exit to quit");
                }
                InputLine::Eof => break,
            }
        }

        if let Err(e) = self.input.save_history() {
            warn!("{:#}", e);
        }
        Ok(())
    }

    /// Handle one line of input
    ///
    /// Returns true if the session should continue, false to exit.
    pub async fn handle_line(&mut self, line: &str) -> bool {
        let line = line.trim();
        if line.is_empty() {
            return true;
        }

        if is_command(line) {
            let command = commands::parse(line);
            debug!(?command, "repl command");
            let mut ctx = CommandContext {
                engine: &self.engine,
                tools: self.agent.tools(),
                session: &mut self.session,
                display: &mut self.display,
            };
            return commands::execute(command, &mut ctx);
        }

        match run_with_display(&self.agent, &mut self.events, &mut self.display, line).await {
            Ok(run) => {
                self.display.show_run(&run);
                self.session.record(&run);
            }
            Err(e) => self.display.show_error(&e.to_string()),
        }
        true
    }

    pub fn session(&self) -> &SessionHistory {
        &self.session
    }

    pub fn display_mut(&mut self) -> &mut DisplayManager {
        &mut self.display
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agent::AgentConfig;
    use crate::cli::args::Verbosity;
    use crate::corpus::{Corpus, Document};
    use crate::streaming::ScriptedGenerator;
    use crate::tools::{Glossary, ToolRegistry};

    fn session(script: ScriptedGenerator) -> ReplSession {
        let corpus = Corpus::new(vec![
            Document::new("doc1", "Quarterly sales revenue grew"),
            Document::new("doc2", "Operating costs fell"),
        ]);
        let engine = Arc::new(RetrievalEngine::build(corpus).unwrap());
        let tools = Arc::new(
            ToolRegistry::standard(engine.clone(), Glossary::builtin().unwrap()).unwrap(),
        );
        let agent = AgentLoop::new(
            Arc::new(script),
            tools,
            AgentConfig { max_iterations: 2 },
        )
        .unwrap();
        ReplSession::new(
            agent,
            engine,
            InputHandler::new().unwrap(),
            DisplayManager::new(Verbosity::Quiet),
        )
    }

    #[tokio::test]
    async fn test_commands_and_empty_input() {
        let mut repl = session(ScriptedGenerator::new(Vec::<String>::new()));
        assert!(repl.handle_line("").await);
        assert!(repl.handle_line("   ").await);
        assert!(repl.handle_line("/docs").await);
        assert!(!repl.handle_line("/exit").await);
        assert!(repl.session().is_empty());
    }

    #[tokio::test]
    async fn test_question_is_answered_and_recorded() {
        let mut repl = session(ScriptedGenerator::new(vec![
            "Thought: easy\nAction: finish[answer=\"Revenue grew.\"]",
        ]));
        assert!(repl.handle_line("How did revenue do?").await);

        let recent = repl.session().recent(1);
        assert_eq!(recent[0].question, "How did revenue do?");
        assert_eq!(recent[0].answer.as_deref(), Some("Revenue grew."));
        assert_eq!(recent[0].iterations, 1);
    }

    #[tokio::test]
    async fn test_generator_failure_keeps_session_alive() {
        let mut repl = session(ScriptedGenerator::new(Vec::<String>::new()).then_fail("down"));
        assert!(repl.handle_line("anything?").await);
        assert!(repl.session().is_empty());
    }

    #[tokio::test]
    async fn test_run_with_display_drains_events() {
        let mut repl = session(ScriptedGenerator::new(vec![
            "Action: finish[answer=\"x\"]",
        ]));
        let run = run_with_display(&repl.agent, &mut repl.events, &mut repl.display, "q")
            .await
            .unwrap();
        assert!(run.is_answered());
        assert!(repl.events.try_recv().is_err());
    }
}
