// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Scanrelay — adaptive PDF-to-image conversion and OCR dispatch
//
// Entry point. Initialises logging, loads configuration, probes the local
// tooling, and runs one document through the pipeline.

mod services;

use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use scanrelay_core::error::Result;
use scanrelay_core::human_errors::humanize_error;
use scanrelay_core::PipelineConfig;
use scanrelay_document::{CapabilityRegistry, ConversionDecisionEngine, QualityAssessor, validate_document};
use scanrelay_extract::dispatcher::plan_call;
use scanrelay_extract::{OcrClients, Pipeline};

#[derive(Parser)]
#[command(name = "scanrelay")]
#[command(about = "Extract text from scanned documents, rasterising low-quality PDFs first")]
#[command(version)]
struct Cli {
    /// JSON config file (defaults to the per-user config if present)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a document through conversion and OCR
    Extract {
        file: PathBuf,
        /// Document type, e.g. bank_statement or passport
        #[arg(short, long)]
        doc_type: Option<String>,
        /// Print the result as JSON
        #[arg(long)]
        json: bool,
    },
    /// Show how a document would be handled, without calling the OCR service
    Assess {
        file: PathBuf,
        #[arg(short, long)]
        doc_type: Option<String>,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let outcome = match load_config(cli.config.as_deref()) {
        Ok(config) => match cli.command {
            Commands::Extract { file, doc_type, json } => {
                extract(config, &file, doc_type.as_deref(), json).await
            }
            Commands::Assess { file, doc_type } => assess(&config, &file, doc_type.as_deref()).await,
        },
        Err(err) => Err(err),
    };

    match outcome {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            tracing::error!(error = %err, "request failed");
            let human = humanize_error(&err);
            eprintln!("error: {}", human.message);
            eprintln!("  {}", human.suggestion);
            if human.retriable {
                ExitCode::from(75)
            } else {
                ExitCode::FAILURE
            }
        }
    }
}

fn load_config(explicit: Option<&Path>) -> Result<PipelineConfig> {
    let mut config = match services::data_dir::resolve_config(explicit) {
        Some(path) => {
            tracing::info!(path = %path.display(), "loading config");
            PipelineConfig::load(&path)?
        }
        None => PipelineConfig::default(),
    };
    config.apply_env();
    Ok(config)
}

async fn extract(config: PipelineConfig, file: &Path, doc_type: Option<&str>, json: bool) -> Result<()> {
    let registry = CapabilityRegistry::probe(&config).await;
    let clients = OcrClients::http(&config)?;
    let pipeline = Pipeline::from_registry(Arc::new(config), &registry, clients);

    tracing::info!(file = %file.display(), ?doc_type, "Scanrelay starting");
    let result = pipeline.extract_text(file, doc_type).await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&result)?);
    } else {
        println!("{}", result.text);
        eprintln!(
            "confidence {:.1} ({})",
            result.avg_confidence,
            if result.used_analyze { "analyze" } else { "detect" }
        );
    }
    Ok(())
}

async fn assess(config: &PipelineConfig, file: &Path, doc_type: Option<&str>) -> Result<()> {
    let bytes = tokio::fs::read(file).await?;
    let kind = validate_document(&bytes, config.min_document_bytes, config.limits.async_byte_ceiling)?;

    let report = serde_json::json!({
        "file": file.display().to_string(),
        "bytes": bytes.len(),
        "mime_type": kind.mime_type(),
        "quality": QualityAssessor::new().assess(&bytes),
        "convert": ConversionDecisionEngine::new(Arc::new(config.clone()))
            .should_convert(file, doc_type, &bytes),
        "call": format!("{:?}", plan_call(config, bytes.len(), doc_type)),
    });
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}
