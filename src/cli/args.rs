//! Command-line argument parsing for docbuddy
//!
//! Provides clap-based CLI with subcommands and verbosity control. Connection
//! and loop flags are optional so that unset flags fall back to the config file.

use crate::cli::config::Config;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// docbuddy - ask a local Ollama model questions about your documents
#[derive(Parser, Debug)]
#[command(name = "docbuddy")]
#[command(version)]
#[command(about = "Answer questions about a document collection with a local Ollama model", long_about = None)]
pub struct Args {
    /// Question to answer
    #[arg(value_name = "QUESTION")]
    pub question: Option<String>,

    /// Ollama model to use
    #[arg(short, long, global = true)]
    pub model: Option<String>,

    /// Ollama host
    #[arg(long, global = true)]
    pub host: Option<String>,

    /// Ollama port
    #[arg(long, global = true)]
    pub port: Option<u16>,

    /// JSON corpus file (built-in corpus by default)
    #[arg(long, global = true, value_name = "FILE")]
    pub corpus: Option<PathBuf>,

    /// Maximum reasoning iterations per question
    #[arg(long, global = true)]
    pub max_iterations: Option<usize>,

    /// Configuration file path
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Verbosity level: -q (quiet), default (normal), -v (verbose), -vv (very verbose)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Quiet mode (only print the final answer)
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Subcommand
    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available subcommands
#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Commands {
    /// Answer one question
    Ask {
        #[arg(value_name = "QUESTION")]
        question: String,
    },

    /// Start interactive REPL mode
    Start,

    /// Rank documents for a query without calling a model
    Search {
        #[arg(value_name = "QUERY")]
        query: String,

        /// Number of results
        #[arg(short, long)]
        k: Option<usize>,
    },

    /// List the documents in the corpus
    Docs,

    /// Check Ollama connectivity and model availability
    Doctor,

    /// Display current configuration
    Config,
}

/// Verbosity level enum
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verbosity {
    Quiet,
    Normal,
    Verbose,
    VeryVerbose,
}

impl Args {
    /// Verbosity from flags, falling back to the configured default
    pub fn verbosity(&self, default: Verbosity) -> Verbosity {
        if self.quiet {
            Verbosity::Quiet
        } else {
            match self.verbose {
                0 => default,
                1 => Verbosity::Verbose,
                _ => Verbosity::VeryVerbose,
            }
        }
    }

    /// Check that a question and a subcommand are not both given
    pub fn validate(&self) -> Result<(), String> {
        if self.command.is_some() && self.question.is_some() {
            return Err("Cannot specify a question together with a subcommand.".to_string());
        }
        if self.command.is_none() && self.question.is_none() {
            return Err(
                "Question required. Use 'docbuddy <QUESTION>', 'docbuddy start' or another subcommand."
                    .to_string(),
            );
        }
        Ok(())
    }

    /// Question from either the positional argument or `ask`
    pub fn question(&self) -> Option<&str> {
        match &self.command {
            Some(Commands::Ask { question }) => Some(question),
            _ => self.question.as_deref(),
        }
    }

    /// Overlay flags on top of file configuration
    pub fn apply_to(&self, config: &mut Config) {
        if let Some(model) = &self.model {
            config.ollama.model = model.clone();
        }
        if let Some(host) = &self.host {
            config.ollama.host = host.clone();
        }
        if let Some(port) = self.port {
            config.ollama.port = port;
        }
        if let Some(max) = self.max_iterations {
            config.agent.max_iterations = max;
        }
        if let Some(corpus) = &self.corpus {
            config.corpus.path = Some(corpus.to_string_lossy().into_owned());
        }
    }
}

impl Verbosity {
    /// Parse a config value
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "quiet" => Some(Verbosity::Quiet),
            "normal" => Some(Verbosity::Normal),
            "verbose" => Some(Verbosity::Verbose),
            "very_verbose" => Some(Verbosity::VeryVerbose),
            _ => None,
        }
    }

    /// Convert to string representation
    pub fn as_str(&self) -> &'static str {
        match self {
            Verbosity::Quiet => "quiet",
            Verbosity::Normal => "normal",
            Verbosity::Verbose => "verbose",
            Verbosity::VeryVerbose => "very_verbose",
        }
    }

    /// Default log filter for this level
    pub fn log_filter(&self) -> &'static str {
        match self {
            Verbosity::Quiet => "error",
            Verbosity::Normal => "warn",
            Verbosity::Verbose => "info",
            Verbosity::VeryVerbose => "debug",
        }
    }

    /// Check if should show the spinner
    pub fn show_progress(&self) -> bool {
        !matches!(self, Verbosity::Quiet)
    }

    /// Check if should show thoughts, actions and observations
    pub fn show_events(&self) -> bool {
        !matches!(self, Verbosity::Quiet)
    }

    /// Check if should show token streaming
    pub fn show_tokens(&self) -> bool {
        matches!(self, Verbosity::VeryVerbose)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(argv: &[&str]) -> Args {
        Args::try_parse_from(argv).unwrap()
    }

    #[test]
    fn test_positional_question() {
        let args = parse(&["docbuddy", "What were sales?"]);
        assert_eq!(args.question(), Some("What were sales?"));
        assert!(args.validate().is_ok());
    }

    #[test]
    fn test_ask_subcommand() {
        let args = parse(&["docbuddy", "ask", "What is EPS?", "--max-iterations", "3"]);
        assert_eq!(args.question(), Some("What is EPS?"));
        assert_eq!(args.max_iterations, Some(3));
        assert!(args.validate().is_ok());
    }

    #[test]
    fn test_search_subcommand() {
        let args = parse(&["docbuddy", "search", "cash flow", "-k", "2"]);
        assert_eq!(
            args.command,
            Some(Commands::Search {
                query: "cash flow".to_string(),
                k: Some(2)
            })
        );
        assert_eq!(args.question(), None);
    }

    #[test]
    fn test_validate_failures() {
        assert!(parse(&["docbuddy"]).validate().is_err());

        let mut both = parse(&["docbuddy", "docs"]);
        both.question = Some("q".to_string());
        assert!(both.validate().is_err());
    }

    #[test]
    fn test_verbosity() {
        assert_eq!(parse(&["docbuddy", "-q", "docs"]).verbosity(Verbosity::Normal), Verbosity::Quiet);
        assert_eq!(parse(&["docbuddy", "docs"]).verbosity(Verbosity::Normal), Verbosity::Normal);
        assert_eq!(parse(&["docbuddy", "-v", "docs"]).verbosity(Verbosity::Normal), Verbosity::Verbose);
        assert_eq!(parse(&["docbuddy", "-vv", "docs"]).verbosity(Verbosity::Normal), Verbosity::VeryVerbose);
        assert_eq!(parse(&["docbuddy", "docs"]).verbosity(Verbosity::Quiet), Verbosity::Quiet);
    }

    #[test]
    fn test_apply_to_config() {
        let args = parse(&[
            "docbuddy", "--model", "llama3", "--port", "8080", "--corpus", "docs.json", "docs",
        ]);
        let mut config = Config::default();
        args.apply_to(&mut config);

        assert_eq!(config.ollama.model, "llama3");
        assert_eq!(config.ollama.port, 8080);
        assert_eq!(config.ollama.host, "127.0.0.1");
        assert_eq!(config.corpus.path.as_deref(), Some("docs.json"));
        assert_eq!(config.agent.max_iterations, 6);
    }

    #[test]
    fn test_verbosity_methods() {
        assert_eq!(Verbosity::parse("very_verbose"), Some(Verbosity::VeryVerbose));
        assert_eq!(Verbosity::parse("loud"), None);
        assert_eq!(Verbosity::Verbose.as_str(), "verbose");
        assert_eq!(Verbosity::Normal.log_filter(), "warn");

        assert!(!Verbosity::Quiet.show_progress());
        assert!(Verbosity::Normal.show_events());
        assert!(!Verbosity::Verbose.show_tokens());
        assert!(Verbosity::VeryVerbose.show_tokens());
    }
}
