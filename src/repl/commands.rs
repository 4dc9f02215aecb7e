//! Command handler for REPL built-in commands
//!
//! Anything that does not start with `/` is a question for the agent.

use crate::cli::args::Verbosity;
use crate::repl::display::DisplayManager;
use crate::repl::session::SessionHistory;
use crate::retrieval::RetrievalEngine;
use crate::tools::ToolRegistry;
use colored::*;

/// REPL command types
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Help,
    Exit,
    Docs,
    Search { query: String, k: Option<usize> },
    Tools,
    History { limit: Option<usize> },
    Status,
    Verbose { enable: bool },
    Clear,
    Unknown { input: String },
}

/// Everything a command may read or change
pub struct CommandContext<'a> {
    pub engine: &'a RetrievalEngine,
    pub tools: &'a ToolRegistry,
    pub session: &'a mut SessionHistory,
    pub display: &'a mut DisplayManager,
}

/// Parse input string into a command
pub fn parse(input: &str) -> Command {
    let trimmed = input.trim();
    let unknown = || Command::Unknown {
        input: input.to_string(),
    };

    let Some(body) = trimmed.strip_prefix('/') else {
        return unknown();
    };
    let parts: Vec<&str> = body.split_whitespace().collect();
    let Some(name) = parts.first() else {
        return unknown();
    };

    match name.to_lowercase().as_str() {
        "help" | "h" => Command::Help,
        "exit" | "quit" | "q" => Command::Exit,
        "docs" => Command::Docs,
        "search" | "s" => parse_search(&parts[1..]).unwrap_or_else(unknown),
        "tools" => Command::Tools,
        "history" => Command::History {
            limit: parts.get(1).and_then(|s| s.parse().ok()),
        },
        "status" => Command::Status,
        "verbose" => {
            let enable = parts
                .get(1)
                .map(|s| matches!(s.to_lowercase().as_str(), "on" | "1" | "true"))
                .unwrap_or(true);
            Command::Verbose { enable }
        }
        "clear" | "cls" => Command::Clear,
        _ => unknown(),
    }
}

/// `/search [-k N] <query...>`
fn parse_search(parts: &[&str]) -> Option<Command> {
    let (k, rest) = match parts {
        ["-k", n, rest @ ..] => (Some(n.parse::<usize>().ok()?), rest),
        _ => (None, parts),
    };
    if rest.is_empty() {
        return None;
    }
    Some(Command::Search {
        query: rest.join(" "),
        k,
    })
}

/// Check if input is a command (starts with /)
pub fn is_command(input: &str) -> bool {
    input.trim().starts_with('/')
}

/// Execute a command
///
/// Returns true if the REPL should continue, false if it should exit.
pub fn execute(command: Command, ctx: &mut CommandContext<'_>) -> bool {
    match command {
        Command::Help => show_help(),
        Command::Exit => {
            println!("{}", "Goodbye!".green());
            return false;
        }
        Command::Docs => ctx.display.show_documents(&ctx.engine.list_documents()),
        Command::Search { query, k } => {
            let k = k.unwrap_or(ctx.engine.default_params().top_k);
            let hits = ctx.engine.search(&query, k);
            ctx.display.show_search_results(&query, &hits);
        }
        Command::Tools => show_tools(ctx.tools),
        Command::History { limit } => show_history(ctx.session, limit.unwrap_or(10)),
        Command::Status => show_status(ctx),
        Command::Verbose { enable } => {
            let level = if enable {
                Verbosity::Verbose
            } else {
                Verbosity::Normal
            };
            ctx.display.set_verbosity(level);
            let status = if enable { "enabled" } else { "disabled" };
            println!("{}", format!("Verbose mode {}", status).cyan());
        }
        Command::Clear => {
            print!("\x1B[2J\x1B[1;1H");
        }
        Command::Unknown { input } => {
            println!("{}", format!("Unknown command: {}", input).red());
            println!("Type {} for available commands", "/help".cyan());
        }
    }
    true
}

fn show_help() {
    println!("\n{}", "Available Commands:".bold().cyan());
    println!("{}", "=".repeat(60).cyan());

    let commands = [
        ("/help, /h", "Show this help message"),
        ("/docs", "List the documents in the corpus"),
        ("/search [-k N] <query>", "Rank documents without asking the model"),
        ("/tools", "Show the tools offered to the model"),
        ("/history [n]", "Show last n questions (default: 10)"),
        ("/status", "Show session statistics"),
        ("/verbose [on|off]", "Toggle thought/action/observation output"),
        ("/clear, /cls", "Clear screen"),
        ("/exit, /quit, /q", "Exit REPL"),
    ];

    for (cmd, desc) in commands {
        println!("  {:<24} {}", cmd.green(), desc);
    }

    println!("\n{}", "Usage:".bold());
    println!("  - Type a question directly (no / prefix)");
    println!("  - Use {} for input history", "UP/DOWN arrows".cyan());
    println!("  - Press {} or {} to exit", "Ctrl-D".cyan(), "/exit".cyan());
    println!();
}

fn show_tools(tools: &ToolRegistry) {
    println!("\n{}", format!("Tools ({}):", tools.len()).bold().cyan());
    println!("{}", "=".repeat(60).cyan());
    for spec in tools.specs() {
        println!("  {} {}", spec.call_syntax().green(), spec.description.dimmed());
    }
    println!();
}

fn show_history(session: &SessionHistory, limit: usize) {
    let history = session.recent(limit);

    if history.is_empty() {
        println!("{}", "No questions in history yet.".yellow());
        return;
    }

    println!(
        "\n{}",
        format!("Question History (last {}):", history.len()).bold().cyan()
    );
    println!("{}", "=".repeat(60).cyan());

    for (i, record) in history.iter().enumerate() {
        let index = history.len() - i;
        let status_icon = if record.answer.is_some() {
            "✓".green()
        } else {
            "✗".red()
        };
        let duration = format!("({}ms, {} iterations)", record.duration_ms, record.iterations).dimmed();

        println!(
            "  {}. {} {} {}",
            index.to_string().cyan(),
            status_icon,
            record.question,
            duration
        );
        if let Some(answer) = &record.answer {
            println!("     {}", answer.dimmed());
        }
    }
    println!();
}

fn show_status(ctx: &CommandContext<'_>) {
    println!("\n{}", "Session Status:".bold().cyan());
    println!("{}", "=".repeat(60).cyan());

    let duration = ctx.session.session_secs();
    let minutes = duration / 60;
    let seconds = duration % 60;
    let duration_str = if minutes > 0 {
        format!("{}m {}s", minutes, seconds)
    } else {
        format!("{}s", seconds)
    };

    println!("  Questions Asked:  {}", ctx.session.total_asked().to_string().green());
    println!("  Answered:         {}", ctx.session.answered_count().to_string().green());
    println!("  Documents:        {}", ctx.engine.corpus().len().to_string().green());
    println!("  Tools:            {}", ctx.tools.tool_names().join(", ").green());
    println!("  Session Duration: {}", duration_str.green());
    println!("  Verbosity:        {}", ctx.display.verbosity().as_str().green());
    println!();
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::corpus::{Corpus, Document};
    use crate::tools::Glossary;
    use std::sync::Arc;

    fn engine() -> Arc<RetrievalEngine> {
        let corpus = Corpus::new(vec![
            Document::new("doc1", "Quarterly sales revenue grew"),
            Document::new("doc2", "Operating costs fell"),
        ]);
        Arc::new(RetrievalEngine::build(corpus).unwrap())
    }

    #[test]
    fn test_is_command() {
        assert!(is_command("/help"));
        assert!(is_command(" /help"));
        assert!(!is_command("help"));
        assert!(!is_command("what was revenue?"));
    }

    #[test]
    fn test_parse_simple_commands() {
        assert_eq!(parse("/help"), Command::Help);
        assert_eq!(parse("/h"), Command::Help);
        assert_eq!(parse("/quit"), Command::Exit);
        assert_eq!(parse("/DOCS"), Command::Docs);
        assert_eq!(parse("/tools"), Command::Tools);
        assert_eq!(parse("/cls"), Command::Clear);
        assert_eq!(parse("/status"), Command::Status);
    }

    #[test]
    fn test_parse_search() {
        assert_eq!(
            parse("/search sales revenue"),
            Command::Search {
                query: "sales revenue".to_string(),
                k: None
            }
        );
        assert_eq!(
            parse("/search -k 2 cash flow"),
            Command::Search {
                query: "cash flow".to_string(),
                k: Some(2)
            }
        );
        assert!(matches!(parse("/search"), Command::Unknown { .. }));
        assert!(matches!(parse("/search -k x query"), Command::Unknown { .. }));
    }

    #[test]
    fn test_parse_history_and_verbose() {
        assert_eq!(parse("/history"), Command::History { limit: None });
        assert_eq!(parse("/history 5"), Command::History { limit: Some(5) });
        assert_eq!(parse("/verbose"), Command::Verbose { enable: true });
        assert_eq!(parse("/verbose off"), Command::Verbose { enable: false });
    }

    #[test]
    fn test_parse_unknown() {
        match parse("/unknown") {
            Command::Unknown { input } => assert!(input.contains("unknown")),
            other => panic!("Expected Unknown command, got {:?}", other),
        }
        assert!(matches!(parse("/"), Command::Unknown { .. }));
        assert!(matches!(parse("what is EPS?"), Command::Unknown { .. }));
    }

    #[test]
    fn test_execute() {
        let engine = engine();
        let tools = ToolRegistry::standard(engine.clone(), Glossary::builtin().unwrap()).unwrap();
        let mut session = SessionHistory::new();
        let mut display = DisplayManager::new(Verbosity::Normal).without_spinner();
        let mut ctx = CommandContext {
            engine: &engine,
            tools: &tools,
            session: &mut session,
            display: &mut display,
        };

        assert!(execute(Command::Help, &mut ctx));
        assert!(execute(parse("/search revenue"), &mut ctx));
        assert!(execute(Command::Docs, &mut ctx));
        assert!(execute(Command::History { limit: None }, &mut ctx));
        assert!(execute(Command::Verbose { enable: true }, &mut ctx));
        assert_eq!(ctx.display.verbosity(), Verbosity::Verbose);
        assert!(!execute(Command::Exit, &mut ctx));
    }
}
