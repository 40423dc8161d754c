//! Command-line access to the webhook pipeline.
//!
//! `run` performs one full search/extract/answer/update cycle against the configured services and
//! prints the webhook response body. `extract` prints the text pulled from a local document,
//! which helps when checking how a file will look to the model.
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use docbridge::{
    api::WebhookResponse, config, extraction::ExtractorRegistry, logging,
    pipeline::{SearchQuery, WebhookPipeline},
};

#[derive(Parser)]
#[command(
    name = "docbridge-query",
    about = "Run the document query pipeline without the webhook server"
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Search, extract, ask the model and update the page.
    Run {
        #[arg(long)]
        query: String,
        #[arg(long, default_value = "")]
        page_id: String,
    },
    /// Print the text extracted from a local document.
    Extract { path: PathBuf },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    match cli.command {
        Command::Run { query, page_id } => run(query, page_id).await,
        Command::Extract { path } => extract(&path),
    }
}

async fn run(query: String, page_id: String) -> Result<()> {
    dotenvy::dotenv().ok();
    logging::init_tracing();
    config::init_config();

    let pipeline = WebhookPipeline::from_config(config::get_config())
        .context("failed to initialize pipeline")?;
    let outcome = pipeline
        .run(SearchQuery { query, page_id })
        .await
        .context("pipeline run failed")?;
    let body = serde_json::to_string_pretty(&WebhookResponse::from(outcome))?;
    println!("{body}");
    Ok(())
}

fn extract(path: &Path) -> Result<()> {
    let data = std::fs::read(path).with_context(|| format!("failed to read {}", path.display()))?;
    let name = path.to_string_lossy();
    let text = ExtractorRegistry::default()
        .extract_bytes(&name, &data)
        .with_context(|| format!("failed to extract text from {name}"))?;
    println!("{text}");
    Ok(())
}
