//! docbuddy - CLI entry point

use anyhow::{Context, Result};
use clap::Parser;
use colored::Colorize;
use docbuddy::{
    agent::{AgentConfig, AgentLoop},
    cli::{Args, Commands, Config, Verbosity},
    corpus::Corpus,
    doctor::Doctor,
    repl::{input::InputHandler, run_with_display, DisplayManager, EventBus, ReplSession},
    retrieval::RetrievalEngine,
    streaming::OllamaClient,
    tools::{Glossary, ToolRegistry},
};
use std::sync::Arc;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

/// Environment variable overriding the log filter
const LOG_ENV: &str = "DOCBUDDY_LOG";

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    if let Err(msg) = args.validate() {
        eprintln!("{} {}", "Error:".red().bold(), msg);
        std::process::exit(2);
    }

    let mut config = Config::load(args.config.clone()).context("Failed to load configuration")?;
    args.apply_to(&mut config);
    config.validate().context("Invalid configuration")?;

    let default_verbosity =
        Verbosity::parse(&config.telemetry.default_verbosity).unwrap_or(Verbosity::Normal);
    let verbosity = args.verbosity(default_verbosity);
    init_logging(verbosity);

    if !config.telemetry.color_output {
        colored::control::set_override(false);
    }

    match &args.command {
        Some(Commands::Start) => run_repl(&config, verbosity).await,
        Some(Commands::Search { query, k }) => run_search(&config, verbosity, query, *k),
        Some(Commands::Docs) => run_docs(&config, verbosity),
        Some(Commands::Doctor) => run_doctor(config).await,
        Some(Commands::Config) => show_config(&args, &config),
        Some(Commands::Ask { .. }) | None => {
            let question = args.question().context("Question required")?;
            run_question(&config, verbosity, question).await
        }
    }
}

fn init_logging(verbosity: Verbosity) {
    let filter = EnvFilter::try_from_env(LOG_ENV)
        .unwrap_or_else(|_| EnvFilter::new(verbosity.log_filter()));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

fn display_for(config: &Config, verbosity: Verbosity) -> DisplayManager {
    let display = DisplayManager::new(verbosity);
    if config.telemetry.show_spinner {
        display
    } else {
        display.without_spinner()
    }
}

/// Load the corpus and build the index once
fn build_engine(config: &Config) -> Result<Arc<RetrievalEngine>> {
    let path = config.corpus_path();
    let corpus = Corpus::load(path.as_deref()).with_context(|| match &path {
        Some(p) => format!("Failed to load corpus from {}", p.display()),
        None => "Failed to load built-in corpus".to_string(),
    })?;

    let engine = RetrievalEngine::build_with_params(corpus, config.search_params())
        .context("Failed to build document index")?;
    info!(
        documents = engine.corpus().len(),
        terms = engine.index().vocabulary_size(),
        "index ready"
    );
    Ok(Arc::new(engine))
}

fn build_client(config: &Config) -> Result<OllamaClient> {
    let client = OllamaClient::with_timeout(
        &config.ollama_url(),
        &config.ollama.model,
        config.request_timeout(),
    )
    .context("Failed to create Ollama client")?;
    Ok(client.with_sampling(config.sampling()))
}

/// Wire the capability table and the model into a control loop
async fn build_agent(config: &Config, engine: Arc<RetrievalEngine>) -> Result<AgentLoop> {
    let client = build_client(config)?;
    if !client.health_check().await? {
        eprintln!(
            "{} Ollama is not reachable at {}. Start it with: {}",
            "Error:".red().bold(),
            client.base_url(),
            "ollama serve".cyan()
        );
        std::process::exit(1);
    }

    let glossary = Glossary::builtin().context("Failed to load glossary")?;
    let mut tools = ToolRegistry::standard(engine, glossary)?;
    tools.restrict_to(&config.agent.allowed_tools)?;
    debug!(tools = ?tools.tool_names(), "tools registered");

    let agent = AgentLoop::new(
        Arc::new(client),
        Arc::new(tools),
        AgentConfig {
            max_iterations: config.agent.max_iterations,
        },
    )?;
    Ok(agent)
}

/// Answer one question and exit
async fn run_question(config: &Config, verbosity: Verbosity, question: &str) -> Result<()> {
    let engine = build_engine(config)?;
    let (bus, mut events) = EventBus::new();
    let agent = build_agent(config, engine).await?.with_events(bus);
    let mut display = display_for(config, verbosity);

    let run = match run_with_display(&agent, &mut events, &mut display, question).await {
        Ok(run) => run,
        Err(e) => {
            display.show_error(&e.to_string());
            std::process::exit(1);
        }
    };

    display.show_run(&run);
    if !run.is_answered() {
        std::process::exit(1);
    }
    Ok(())
}

/// Run agent in interactive REPL mode
async fn run_repl(config: &Config, verbosity: Verbosity) -> Result<()> {
    let engine = build_engine(config)?;
    let agent = build_agent(config, engine.clone()).await?;

    let input = match InputHandler::default_history_path() {
        Some(path) => InputHandler::with_history(path)?,
        None => InputHandler::new()?,
    };

    let mut session = ReplSession::new(agent, engine, input, display_for(config, verbosity));
    session.show_welcome(env!("CARGO_PKG_VERSION"), &config.ollama.model);
    session.run().await
}

fn run_search(config: &Config, verbosity: Verbosity, query: &str, k: Option<usize>) -> Result<()> {
    let engine = build_engine(config)?;
    let k = k.unwrap_or(config.retrieval.default_k);
    let hits = engine.search(query, k);
    display_for(config, verbosity).show_search_results(query, &hits);
    Ok(())
}

fn run_docs(config: &Config, verbosity: Verbosity) -> Result<()> {
    let engine = build_engine(config)?;
    display_for(config, verbosity).show_documents(&engine.list_documents());
    Ok(())
}

async fn run_doctor(config: Config) -> Result<()> {
    let client = build_client(&config)?;
    let doctor = Doctor::new(config, client);

    let checks = doctor.run_diagnostics().await;
    Doctor::display_results(&checks);

    std::process::exit(if Doctor::overall_status(&checks) { 0 } else { 1 });
}

fn show_config(args: &Args, config: &Config) -> Result<()> {
    let source = match (&args.config, Config::default_path()) {
        (Some(path), _) => path.display().to_string(),
        (None, Some(path)) if path.exists() => path.display().to_string(),
        _ => "built-in defaults".to_string(),
    };

    println!("\n{}", "docbuddy Configuration".bold().cyan());
    println!("{}", format!("# source: {}", source).dimmed());
    println!();
    print!("{}", config.to_toml()?);
    println!();
    Ok(())
}
