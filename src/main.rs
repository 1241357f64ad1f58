//! research-agent: tool-using research assistant.
//!
//! Usage:
//!   research-agent repl              Interactive question loop
//!   research-agent ask "<query>"     Answer one question and exit
//!   research-agent serve             Run the web form
//!   research-agent tools             List the registered tools
//!   research-agent init              Write a default config file

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::Colorize;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::io::BufReader;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

use research_agent::agent::{Agent, ReasoningLoop};
use research_agent::config::{self, ResearchConfig};
use research_agent::frontend::{self, WebState};
use research_agent::inference::InferenceClient;
use research_agent::persistence::PersistenceSink;
use research_agent::tools::{self, ToolRegistry};

// ---------------------------------------------------------------------------
// CLI definition
// ---------------------------------------------------------------------------

#[derive(Parser, Debug)]
#[command(name = "research-agent")]
#[command(version)]
#[command(about = "Research assistant backed by Wikipedia and web search")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Path to the TOML config file.
    #[arg(long)]
    config: Option<String>,

    /// Log level (debug, info, warn, error). Defaults to the config value.
    #[arg(long)]
    log_level: Option<String>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Ask questions interactively until `exit` or `quit`.
    Repl,

    /// Answer a single question.
    Ask {
        /// The question to research.
        #[arg(required = true, num_args = 1..)]
        query: Vec<String>,
    },

    /// Serve the web form.
    Serve {
        /// Listen address, overriding the config.
        #[arg(long)]
        bind: Option<String>,
    },

    /// List the tools available to the model.
    Tools,

    /// Write a default config file.
    Init {
        /// Overwrite an existing file.
        #[arg(long)]
        force: bool,
    },
}

// ---------------------------------------------------------------------------
// Entry point
// ---------------------------------------------------------------------------

#[tokio::main]
async fn main() -> Result<()> {
    let _ = dotenvy::dotenv();
    let cli = Cli::parse();

    let config_path = cli
        .config
        .as_deref()
        .map(|p| PathBuf::from(shellexpand::tilde(p).into_owned()))
        .unwrap_or_else(config::default_config_path);

    // Initialize logging
    let log_level = cli.log_level.clone().unwrap_or_else(|| {
        config::load_config(&config_path)
            .map(|c| c.log_level)
            .unwrap_or_else(|_| "info".into())
    });
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&log_level));
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .init();

    match cli.command {
        Commands::Init { force } => cmd_init(&config_path, force),
        Commands::Repl => cmd_repl(&config_path).await,
        Commands::Ask { query } => cmd_ask(&config_path, &query.join(" ")).await,
        Commands::Serve { bind } => cmd_serve(&config_path, bind).await,
        Commands::Tools => cmd_tools(&config_path),
    }
}

// ---------------------------------------------------------------------------
// Command implementations
// ---------------------------------------------------------------------------

fn cmd_init(config_path: &Path, force: bool) -> Result<()> {
    if config_path.exists() && !force {
        anyhow::bail!(
            "Config already exists at {} (use --force to overwrite)",
            config_path.display()
        );
    }
    config::save_config(&ResearchConfig::default(), config_path)?;
    println!(
        "{} Wrote default config to {}",
        ">>>".green().bold(),
        config_path.display()
    );
    println!(
        "    Set {} in the environment or a .env file before running.",
        config::API_KEY_VAR.bold()
    );
    Ok(())
}

async fn cmd_repl(config_path: &Path) -> Result<()> {
    let (_config, agent) = bootstrap(config_path)?;

    let stdin = BufReader::new(tokio::io::stdin());
    let mut stdout = tokio::io::stdout();
    let handled = frontend::run_repl(agent.as_ref(), stdin, &mut stdout)
        .await
        .context("Console I/O failed")?;

    info!("Session ended after {} queries", handled);
    Ok(())
}

async fn cmd_ask(config_path: &Path, query: &str) -> Result<()> {
    let (_config, agent) = bootstrap(config_path)?;

    match agent.run(query).await {
        Ok(answer) => {
            println!("{}", answer);
            Ok(())
        }
        Err(e) => {
            error!("Query failed: {}", e);
            eprintln!("{} {}", "Error:".red().bold(), e.user_message());
            std::process::exit(1);
        }
    }
}

async fn cmd_serve(config_path: &Path, bind: Option<String>) -> Result<()> {
    let (config, agent) = bootstrap(config_path)?;
    let bind_addr = bind.unwrap_or_else(|| config.bind_addr.clone());
    let state = Arc::new(WebState::new(agent, config.download_capacity));

    println!(
        "{} Serving research form on http://{}",
        ">>>".green().bold(),
        bind_addr
    );

    let cancel = CancellationToken::new();
    let signal_cancel = cancel.clone();
    tokio::spawn(async move {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("Failed to listen for Ctrl+C: {}", e);
            return;
        }
        println!("\n{} Shutting down gracefully...", "<<<".red().bold());
        signal_cancel.cancel();
    });

    frontend::serve(state, &bind_addr, cancel)
        .await
        .with_context(|| format!("Web server on {} failed", bind_addr))?;

    info!("Server shutdown complete");
    Ok(())
}

fn cmd_tools(config_path: &Path) -> Result<()> {
    // Listing tools needs no credential.
    let config = config::load_config(config_path)?;
    let sink = PersistenceSink::new(config.resolved_output_file());
    let destination = sink.default_destination().display().to_string();
    let registry = build_tools(&config, sink)?;

    println!();
    println!("{}", "=== Registered Tools ===".bold());
    for (i, tool) in registry.list().iter().enumerate() {
        println!();
        println!("  {}. {}", i + 1, tool.name().cyan().bold());
        println!("     {}", tool.description());
    }
    println!();
    println!("  {}: {}", "Output file".bold(), destination);
    println!();
    Ok(())
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Load and validate config, then wire the model, tools and loop together.
fn bootstrap(config_path: &Path) -> Result<(ResearchConfig, Arc<dyn Agent>)> {
    let config = config::load(config_path)
        .with_context(|| format!("Failed to load config from {}", config_path.display()))?;

    let sink = PersistenceSink::new(config.resolved_output_file());
    let registry = build_tools(&config, sink)?;
    let model = InferenceClient::new(&config).context("Failed to build inference client")?;
    let model_name = model.model().to_string();

    let research_loop = ReasoningLoop::new(&config, Arc::new(model), registry);
    info!(
        "Using model {} with tools: {} (max {} steps)",
        model_name,
        research_loop.registry().names().join(", "),
        research_loop.max_steps()
    );

    let agent: Arc<dyn Agent> = Arc::new(research_loop);
    Ok((config, agent))
}

fn build_tools(config: &ResearchConfig, sink: PersistenceSink) -> Result<ToolRegistry> {
    tools::build_registry(config, sink).context("Failed to build tool registry")
}
