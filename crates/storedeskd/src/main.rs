//! StoreDesk daemon - customer question routing and answering.
//!
//! Runs one message through the full pipeline (router, tools, retrieval,
//! generation) and prints the result as JSON.

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use storedesk_shared::{ChatRequest, Language};
use tracing::info;

use storedeskd::config::Config;
use storedeskd::ollama::OllamaClient;
use storedeskd::orchestrator::Orchestrator;
use storedeskd::router::Router;
use storedeskd::tools::ToolCatalog;

#[derive(Parser)]
#[command(name = "storedeskd")]
#[command(about = "StoreDesk - store assistant request router", long_about = None)]
#[command(version)]
struct Cli {
    /// Config file (default: /etc/storedesk/config.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Answer one customer message
    Ask {
        message: String,

        /// Store whose documents are searched
        #[arg(long)]
        store: i64,

        /// Document category (customer, owner, ...)
        #[arg(long, default_value = "customer")]
        category: String,

        /// Response language code or name (default: answer.default_language)
        #[arg(long)]
        lang: Option<String>,
    },

    /// Show the routing decision for a message
    Route { message: String },

    /// List the available tools
    Tools,
}

fn load_config(path: Option<PathBuf>) -> Result<Config> {
    match path {
        Some(path) => {
            let mut config = Config::load_from_path(&path)?;
            config.apply_overrides(|key| std::env::var(key).ok());
            Ok(config)
        }
        None => Ok(Config::load()),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = load_config(cli.config)?;
    info!("StoreDesk v{} starting", env!("CARGO_PKG_VERSION"));

    match cli.command {
        Commands::Ask {
            message,
            store,
            category,
            lang,
        } => {
            let language = match lang {
                Some(lang) => Language::from_name_or_code(&lang)
                    .ok_or_else(|| anyhow::anyhow!("unsupported language: {}", lang))?,
                None => config.answer.default_language,
            };
            let request = ChatRequest::new(&message, store)
                .with_category(&category)
                .with_language(language);

            let orchestrator = Orchestrator::from_config(&config)?;
            let response = orchestrator.handle(&request).await;
            println!("{}", serde_json::to_string_pretty(&response)?);
        }
        Commands::Route { message } => {
            let classifier = OllamaClient::new(
                config.llm.router_endpoint(),
                config.llm.router_timeout_secs,
            )?;
            let router = Router::new(
                Arc::new(classifier),
                Arc::new(ToolCatalog::standard()),
                &config.llm.router_model,
            )
            .with_fallback_language(config.router.fallback_language)
            .with_max_prompt_bytes(config.router.max_prompt_bytes);

            let decision = router.route(&message).await;
            println!("{}", serde_json::to_string_pretty(&decision)?);
        }
        Commands::Tools => {
            println!("{}", ToolCatalog::standard().render_for_prompt());
        }
    }

    Ok(())
}
