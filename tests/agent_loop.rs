//! Integration tests for the ReAct control loop
//!
//! Runs the full loop (prompt, parser, registry, retrieval) against the
//! built-in corpus with scripted generators, so no Ollama server is needed.

use docbuddy::{
    agent::{AgentConfig, AgentLoop, LoopState},
    corpus::Corpus,
    repl::{AgentEvent, EventBus},
    retrieval::RetrievalEngine,
    streaming::ScriptedGenerator,
    tools::{Glossary, ToolRegistry},
    types::{Action, RunOutcome},
    AgentError,
};
use std::sync::Arc;

fn registry() -> Arc<ToolRegistry> {
    let engine = Arc::new(RetrievalEngine::build(Corpus::builtin().unwrap()).unwrap());
    Arc::new(ToolRegistry::standard(engine, Glossary::builtin().unwrap()).unwrap())
}

fn agent(script: Arc<ScriptedGenerator>, max_iterations: usize) -> AgentLoop {
    AgentLoop::new(script, registry(), AgentConfig { max_iterations }).unwrap()
}

#[tokio::test]
async fn test_finish_answers_in_one_iteration() {
    let script = Arc::new(ScriptedGenerator::new([
        "Thought: I know this.\nAction: finish[answer=\"42\"]",
    ]));
    let run = agent(script, 6).run("What is the answer?").await.unwrap();

    assert_eq!(run.outcome, RunOutcome::Answered { answer: "42".to_string() });
    assert_eq!(run.final_answer(), Some("42"));
    assert_eq!(run.iterations, 1);
    assert_eq!(run.trace.len(), 1);
    assert_eq!(run.trace.turns()[0].thought, "I know this.");
}

#[tokio::test]
async fn test_never_valid_exhausts_after_max_iterations() {
    let script = Arc::new(ScriptedGenerator::new([
        "Thought: hmm",
        "Action: search[query=unquoted]",
        "Thought: still thinking",
        "Action: finish[]",
    ]));
    let run = agent(script.clone(), 4).run("Anything?").await.unwrap();

    assert_eq!(run.outcome, RunOutcome::Exhausted);
    assert_eq!(run.final_answer(), None);
    assert_eq!(run.iterations, 4);
    assert_eq!(run.trace.len(), 4);
    assert_eq!(script.remaining(), 0);

    let observations: Vec<&str> = run.trace.iter().map(|t| t.observation.as_str()).collect();
    assert!(observations[0].starts_with("No action found"));
    assert!(observations[1].starts_with("Invalid action format"));
    assert!(observations[3].starts_with("Invalid action format"));
}

#[tokio::test]
async fn test_search_observation_feeds_next_prompt() {
    let script = Arc::new(ScriptedGenerator::new([
        "Thought: Look up sales.\nAction: search[query=\"sales revenue\", k=\"2\"]",
        "Thought: Found it.\nAction: finish[answer=\"Revenue grew.\"]",
    ]));
    let run = agent(script.clone(), 6).run("How were sales?").await.unwrap();

    assert!(run.is_answered());
    assert_eq!(run.iterations, 2);

    let first = &run.trace.turns()[0];
    assert_eq!(
        first.action,
        Some(
            Action::new("search")
                .with_arg("query", "sales revenue")
                .with_arg("k", "2")
        )
    );
    let observation: serde_json::Value = serde_json::from_str(&first.observation).unwrap();
    assert_eq!(observation["tool"], "search");
    assert_eq!(observation["results"].as_array().unwrap().len(), 2);

    let prompts = script.prompts();
    assert_eq!(prompts.len(), 2);
    assert!(prompts[1].contains("Observation: {"));
    assert!(prompts[1].ends_with("Thought:"));
}

#[tokio::test]
async fn test_tool_errors_become_observations() {
    let script = Arc::new(ScriptedGenerator::new([
        "Action: browse[url=\"http://example.com\"]",
        "Action: search[k=\"2\"]",
        "Action: search[query=\"cash\", k=\"many\"]",
        "Action: list_docs[verbose=\"yes\"]",
        "Action: finish[answer=\"done\"]",
    ]));
    let run = agent(script, 6).run("q").await.unwrap();

    assert!(run.is_answered());
    assert_eq!(run.iterations, 5);
    for turn in &run.trace.turns()[..4] {
        assert!(
            turn.observation.starts_with("Error:"),
            "expected error observation, got {}",
            turn.observation
        );
    }
    assert!(run.trace.turns()[0].observation.contains("browse"));
}

#[tokio::test]
async fn test_generator_failure_propagates() {
    let script = Arc::new(
        ScriptedGenerator::new(["Action: list_docs[]"]).then_fail("connection reset"),
    );
    let err = agent(script, 6).run("q").await.unwrap_err();

    match err {
        AgentError::Generation(msg) => assert!(msg.contains("connection reset")),
        other => panic!("expected Generation error, got {:?}", other),
    }
}

#[tokio::test]
async fn test_event_order_on_bus() {
    let script = Arc::new(ScriptedGenerator::new([
        "Thought: list\nAction: list_docs[]",
        "Action: finish[answer=\"five\"]",
    ]));
    let (bus, mut events) = EventBus::new();
    let agent = agent(script, 3).with_events(bus);

    let run = agent.run("How many documents?").await.unwrap();
    assert!(run.is_answered());
    drop(agent);

    let mut received = Vec::new();
    while let Some(event) = events.recv().await {
        if !matches!(event, AgentEvent::Token { .. }) {
            received.push(event);
        }
    }

    assert!(matches!(
        received[0],
        AgentEvent::IterationStarted { iteration: 1, max: 3 }
    ));
    assert_eq!(received[1], AgentEvent::Thought { text: "list".to_string() });
    assert_eq!(received[2], AgentEvent::Action { text: "list_docs[]".to_string() });
    assert!(matches!(received[3], AgentEvent::Observation { .. }));
    assert!(matches!(
        received[4],
        AgentEvent::IterationStarted { iteration: 2, max: 3 }
    ));
    assert_eq!(received[5], AgentEvent::Thought { text: String::new() });
    assert_eq!(
        received[6],
        AgentEvent::Action {
            text: "finish[answer=\"five\"]".to_string()
        }
    );
    assert_eq!(received[7], AgentEvent::Answered { answer: "five".to_string() });
    assert_eq!(received.len(), 8);
}

#[tokio::test]
async fn test_long_generation_keeps_structural_events() {
    let thought: Vec<String> = (0..150).map(|i| format!("word{}", i)).collect();
    let script = Arc::new(ScriptedGenerator::new([format!(
        "Thought: {}\nAction: finish[answer=\"done\"]",
        thought.join(" ")
    )]));
    let (bus, mut events) = EventBus::new();
    let agent = agent(script, 1).with_events(bus);

    let collector = tokio::spawn(async move {
        let mut received = Vec::new();
        while let Some(event) = events.recv().await {
            if !matches!(event, AgentEvent::Token { .. }) {
                received.push(event);
            }
        }
        received
    });

    let run = agent.run("Summarize").await.unwrap();
    assert!(run.is_answered());
    drop(agent);

    let received = collector.await.unwrap();
    assert_eq!(received.len(), 4);
    assert!(matches!(received[0], AgentEvent::IterationStarted { iteration: 1, max: 1 }));
    assert_eq!(received[1], AgentEvent::Thought { text: thought.join(" ") });
    assert!(matches!(received[2], AgentEvent::Action { .. }));
    assert_eq!(received[3], AgentEvent::Answered { answer: "done".to_string() });
}

#[tokio::test]
async fn test_quoted_observation_marker_stays_in_answer() {
    let script = Arc::new(ScriptedGenerator::new([
        "Thought: summarize\nAction: finish[answer=\"Key Observation: profit rose\"]",
    ]));
    let run = agent(script, 1).run("What stood out?").await.unwrap();

    assert_eq!(
        run.outcome,
        RunOutcome::Answered {
            answer: "Key Observation: profit rose".to_string()
        }
    );
}

#[tokio::test]
async fn test_concurrent_runs_share_one_loop() {
    let script = Arc::new(ScriptedGenerator::repeating(
        "Action: finish[answer=\"shared\"]",
        8,
    ));
    let agent = Arc::new(agent(script.clone(), 2));

    let handles: Vec<_> = (0..8)
        .map(|i| {
            let agent = agent.clone();
            tokio::spawn(async move { agent.run(&format!("question {}", i)).await })
        })
        .collect();

    for handle in handles {
        let run = handle.await.unwrap().unwrap();
        assert_eq!(run.final_answer(), Some("shared"));
        assert_eq!(run.iterations, 1);
    }
    assert_eq!(script.remaining(), 0);
}

#[test]
fn test_terminal_states_are_absorbing() {
    assert!(LoopState::Answered.is_terminal());
    assert!(LoopState::Exhausted.is_terminal());
    assert!(!LoopState::AwaitingGeneration.is_terminal());
}
