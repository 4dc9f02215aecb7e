//! Display manager for terminal output
//!
//! Renders agent events, answers and retrieval results with color, and shows
//! a spinner while the model is thinking.

use crate::cli::args::Verbosity;
use crate::repl::events::AgentEvent;
use crate::retrieval::{DocumentSummary, SearchHit};
use crate::types::execution::AgentRun;
use colored::*;
use indicatif::{ProgressBar, ProgressStyle};
use std::io::{self, Write};
use std::time::Duration;

/// Observations longer than this are shortened unless streaming tokens
pub const OBSERVATION_PREVIEW_CHARS: usize = 400;

/// Display manager for terminal UI
pub struct DisplayManager {
    verbosity: Verbosity,
    spinner: Option<ProgressBar>,
    show_spinner: bool,
    /// Tokens were printed since the last structured event
    mid_stream: bool,
    update_interval: Duration,
}

impl DisplayManager {
    /// Create new display manager
    pub fn new(verbosity: Verbosity) -> Self {
        DisplayManager {
            verbosity,
            spinner: None,
            show_spinner: true,
            mid_stream: false,
            update_interval: Duration::from_millis(100),
        }
    }

    /// Disable the spinner regardless of verbosity
    pub fn without_spinner(mut self) -> Self {
        self.show_spinner = false;
        self
    }

    pub fn verbosity(&self) -> Verbosity {
        self.verbosity
    }

    pub fn set_verbosity(&mut self, verbosity: Verbosity) {
        self.verbosity = verbosity;
        if !verbosity.show_progress() {
            self.stop_spinner();
        }
    }

    /// Show welcome banner
    pub fn show_banner(&self, version: &str, model: &str, documents: usize) {
        let width = 64;
        let rule = "=".repeat(width);
        let title = format!("  docbuddy {} - Ask Your Documents", version);
        let info = format!("  Model: {} | Documents: {} | Mode: REPL", model, documents);

        println!("\n{}", rule.cyan());
        println!("{}", title.bold().cyan());
        println!("{}", info.dimmed());
        println!("{}\n", rule.cyan());
        println!(
            "Ask a question (or {} for commands, {} to quit)\n",
            "/help".green(),
            "/exit".green()
        );
    }

    /// Render one agent event
    pub fn handle_event(&mut self, event: &AgentEvent) {
        match event {
            AgentEvent::IterationStarted { iteration, max } => {
                self.end_stream();
                self.stop_spinner();
                if self.verbosity.show_events() {
                    println!("{}", format!("Step {}/{}", iteration, max).bold().blue());
                }
                self.start_spinner("Thinking...");
            }
            AgentEvent::Token { text } => {
                if self.verbosity.show_tokens() {
                    self.stop_spinner();
                    print!("{}", text.dimmed());
                    let _ = io::stdout().flush();
                    self.mid_stream = true;
                }
            }
            AgentEvent::Thought { text } => {
                self.end_stream();
                self.stop_spinner();
                if self.verbosity.show_events() && !text.is_empty() {
                    println!("  {} {}", "Thought:".cyan().bold(), text);
                }
            }
            AgentEvent::Action { text } => {
                if self.verbosity.show_events() {
                    println!("  {} {}", "Action:".yellow().bold(), text.yellow());
                }
            }
            AgentEvent::Observation { text } => {
                if self.verbosity.show_events() {
                    let shown = if self.verbosity.show_tokens() {
                        text.clone()
                    } else {
                        preview(text, OBSERVATION_PREVIEW_CHARS)
                    };
                    println!("  {} {}", "Observation:".magenta().bold(), shown.dimmed());
                }
            }
            AgentEvent::Answered { .. } | AgentEvent::Exhausted { .. } => {
                self.end_stream();
                self.stop_spinner();
            }
        }
    }

    /// Start (or retitle) the spinner
    pub fn start_spinner(&mut self, message: &str) {
        if !self.show_spinner || !self.verbosity.show_progress() {
            return;
        }
        if let Some(pb) = &self.spinner {
            pb.set_message(message.to_string());
            return;
        }

        let pb = ProgressBar::new_spinner();
        let style = ProgressStyle::default_spinner()
            .template("{spinner:.cyan} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner());
        pb.set_style(style);
        pb.set_message(message.to_string());
        pb.enable_steady_tick(self.update_interval);
        self.spinner = Some(pb);
    }

    pub fn stop_spinner(&mut self) {
        if let Some(pb) = self.spinner.take() {
            pb.finish_and_clear();
        }
    }

    pub fn is_spinning(&self) -> bool {
        self.spinner.is_some()
    }

    fn end_stream(&mut self) {
        if self.mid_stream {
            println!();
            self.mid_stream = false;
        }
    }

    /// Display the outcome of a run
    pub fn show_run(&mut self, run: &AgentRun) {
        self.end_stream();
        self.stop_spinner();

        match run.final_answer() {
            Some(answer) if self.verbosity == Verbosity::Quiet => println!("{}", answer),
            Some(answer) => {
                println!();
                println!("{} {}", "✓".green().bold(), "Answer".green().bold());
                println!("{}\n", answer);
            }
            None => {
                self.show_warning(&format!(
                    "No answer after {} iterations. Try rephrasing the question or raising --max-iterations.",
                    run.iterations
                ));
            }
        }

        if self.verbosity.show_progress() {
            println!("{}", run.summary().dimmed());
            println!();
        }
    }

    /// Display ranked search results
    pub fn show_search_results(&self, query: &str, hits: &[SearchHit]) {
        self.show_section(&format!("Results for \"{}\"", query));
        if hits.is_empty() {
            println!("  {}", "No documents.".dimmed());
            return;
        }
        for (i, hit) in hits.iter().enumerate() {
            let label = if hit.title.is_empty() {
                hit.id.clone()
            } else {
                format!("{} ({})", hit.title, hit.id)
            };
            println!(
                "  {}. {} {}",
                (i + 1).to_string().cyan(),
                label.bold(),
                format!("score {:.3}", hit.score).dimmed()
            );
            println!("     {}", hit.snippet.dimmed());
        }
        println!();
    }

    /// Display the corpus listing
    pub fn show_documents(&self, documents: &[DocumentSummary]) {
        self.show_section(&format!("Documents ({})", documents.len()));
        for doc in documents {
            if doc.title.is_empty() {
                self.show_bullet(&doc.id);
            } else {
                self.show_bullet(&format!("{} {}", doc.id.cyan(), doc.title));
            }
        }
        println!();
    }

    /// Display error message
    pub fn show_error(&self, error: &str) {
        eprintln!("{} {}", "Error:".red().bold(), error.red());
    }

    /// Display warning message
    pub fn show_warning(&self, warning: &str) {
        println!("{} {}", "Warning:".yellow().bold(), warning.yellow());
    }

    /// Display info message
    pub fn show_info(&self, info: &str) {
        println!("{} {}", "Info:".cyan(), info);
    }

    /// Show section header
    pub fn show_section(&self, title: &str) {
        println!("\n{}", title.bold().cyan());
        println!("{}", "-".repeat(60).cyan());
    }

    /// Show bullet point
    pub fn show_bullet(&self, text: &str) {
        println!("  {} {}", "•".cyan(), text);
    }
}

impl Drop for DisplayManager {
    fn drop(&mut self) {
        self.stop_spinner();
    }
}

/// Shorten `text` to `max_chars` characters
pub fn preview(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((cut, _)) => format!("{}...", &text[..cut]),
        None => text.to_string(),
    }
}
