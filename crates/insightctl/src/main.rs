//! Insight Control - CLI for the Ollama-backed topic insight service.
//!
//! Runs topic analysis and availability checks against a local Ollama.

mod commands;

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

use insight_core::{Config, InsightRequest};

#[derive(Parser)]
#[command(name = "insightctl")]
#[command(about = "Topic insight via a local Ollama model", long_about = None)]
#[command(version)]
struct Cli {
    /// Path to the configuration file
    #[arg(long, default_value = "insight.toml")]
    config: PathBuf,

    /// Override the Ollama base URL
    #[arg(long)]
    endpoint: Option<String>,

    /// Override the model name
    #[arg(long)]
    model: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Analyze a topic and print the structured insight
    Analyze {
        /// Topic to analyze
        topic: String,

        /// Answer language (ru, en, es, fr, de)
        #[arg(long)]
        language: Option<String>,

        /// Supporting free text to attach to the request
        #[arg(long)]
        text: Option<String>,

        /// Requested number of results (1-50)
        #[arg(long)]
        max_results: Option<u32>,

        /// Print the raw JSON record instead of formatted output
        #[arg(long)]
        json: bool,

        /// Fail on backend errors instead of degrading to a fallback record
        #[arg(long)]
        strict: bool,
    },

    /// Show Ollama host and model availability
    Status,

    /// Probe the Ollama host and exit non-zero if the model is unusable
    Check,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .init();

    let cli = Cli::parse();
    let mut config = Config::load(&cli.config);
    if let Some(endpoint) = cli.endpoint {
        config.ollama.base_url = endpoint;
    }
    if let Some(model) = cli.model {
        config.ollama.model = model;
    }

    match cli.command {
        Commands::Analyze {
            topic,
            language,
            text,
            max_results,
            json,
            strict,
        } => {
            let mut request = InsightRequest::new(topic);
            request.language = language;
            request.text = text;
            request.max_results = max_results;
            commands::analyze(&config, &request, json, strict).await
        }
        Commands::Status => commands::status(&config).await,
        Commands::Check => commands::check(&config).await,
    }
}
