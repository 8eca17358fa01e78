//! Gluco CLI - Command-line interface
//!
//! Usage:
//!   gluco extract <path>
//!   gluco predict <path> [--model <path>]
//!   gluco records [--limit <n>]
//!   gluco ask <question>

use std::path::{Path, PathBuf};

use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use gluco_core::{AppConfig, Predictor, RecordRepository, SqliteRecordStore};
use gluco_extractor::{complete_rows, extract_document, DocumentExtraction};
use gluco_parser::ParserRegistry;
use gluco_research::{create_llm_client, ResearchAssistant};
use serde::Serialize;

#[derive(Parser)]
#[command(name = "gluco")]
#[command(about = "Diabetes risk feature extraction and prediction")]
#[command(version)]
struct Cli {
    /// TOML configuration file (environment variables still apply)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Extract schema features from a PDF, CSV or text file
    Extract {
        /// Input file
        path: PathBuf,
    },
    /// Extract features and predict diabetes risk
    Predict {
        /// Input file
        path: PathBuf,
        /// Model file (defaults to the configured path)
        #[arg(long)]
        model: Option<PathBuf>,
    },
    /// List stored prediction records
    Records {
        /// Number of records to show
        #[arg(long, short = 'n')]
        limit: Option<i64>,
    },
    /// Ask the diabetes research assistant
    Ask {
        /// Question to ask
        question: String,
    },
}

#[derive(Serialize)]
struct BatchOutput {
    count: usize,
    predictions: Vec<u8>,
}

#[derive(Serialize)]
struct SingleOutput<'a> {
    prediction: u8,
    features: &'a gluco_core::ExtractionResult,
}

fn load_config(path: Option<&Path>) -> anyhow::Result<AppConfig> {
    let config = match path {
        Some(path) => AppConfig::from_file(path)?.with_env_override()?,
        None => AppConfig::from_env()?,
    };
    Ok(config)
}

fn extract(config: &AppConfig, path: &Path) -> anyhow::Result<DocumentExtraction> {
    let doc = ParserRegistry::with_defaults()
        .parse(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    tracing::debug!(
        file = %doc.file_name,
        chars = doc.char_count(),
        preview = doc.preview(config.extraction.preview_chars),
        "Parsed input"
    );
    Ok(extract_document(&doc, config.extraction.min_text_chars)?)
}

fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn predict(config: &AppConfig, path: &Path, model: Option<&Path>) -> anyhow::Result<()> {
    let model_path = model.unwrap_or(&config.model.path);
    let Some(predictor) = gluco_model::load_predictor(model_path)? else {
        bail!("Model not found at {}", model_path.display());
    };

    match extract(config, path)? {
        DocumentExtraction::Rows { rows } => {
            let vectors = complete_rows(&rows)?;
            let predictions = predictor.predict_batch(&vectors)?;
            print_json(&BatchOutput {
                count: predictions.len(),
                predictions,
            })
        }
        DocumentExtraction::Text { result } => {
            if result.is_empty() {
                bail!("Could not extract any features from {}", path.display());
            }
            let features = result.to_feature_vector()?;
            let prediction = predictor.predict(&features)?;
            print_json(&SingleOutput {
                prediction,
                features: &result,
            })
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "warn".into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = load_config(cli.config.as_deref()).context("Failed to load configuration")?;

    match cli.command {
        Commands::Extract { path } => {
            let extraction = extract(&config, &path)?;
            print_json(&extraction)?;
        }
        Commands::Predict { path, model } => {
            predict(&config, &path, model.as_deref())?;
        }
        Commands::Records { limit } => {
            let store =
                SqliteRecordStore::connect(&config.database.url, config.database.pool_size).await?;
            let records = store
                .list_records(limit.unwrap_or(config.database.list_limit))
                .await?;
            print_json(&records)?;
        }
        Commands::Ask { question } => {
            let client = create_llm_client(&config.llm)?;
            let answer = ResearchAssistant::new(client).answer(&question).await;
            println!("{answer}");
        }
    }

    Ok(())
}
