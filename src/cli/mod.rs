// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
pub mod commands;

use anyhow::{anyhow, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;

use crate::config::AppConfig;
use crate::embeddings::{EmbeddingProvider, HashEmbedder, OnnxEmbeddingModel};
use crate::service::QaService;

/// Dimension used with `--hash-embeddings`, matching all-MiniLM-L6-v2
pub const HASH_EMBEDDING_DIMENSION: usize = 384;

/// PDF question answering over a local document folder
#[derive(Parser, Debug)]
#[command(name = "pdf-qa")]
#[command(version)]
#[command(about = "Answer questions from a folder of PDFs with a hosted LLM", long_about = None)]
pub struct Cli {
    /// Directory containing the PDF corpus
    #[arg(long, global = true, env = "DATA_DIR")]
    pub data_dir: Option<PathBuf>,

    /// Use deterministic hash embeddings instead of the ONNX model
    #[arg(long, global = true)]
    pub hash_embeddings: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Build the index and serve the HTTP API
    Serve(commands::ServeArgs),

    /// Answer a single question
    Ask(commands::AskArgs),

    /// Build the index and print corpus counts
    Index,
}

impl Cli {
    /// Environment configuration with command-line overrides applied
    pub fn load_config(&self) -> Result<AppConfig> {
        let mut config = AppConfig::from_env().map_err(|e| anyhow!(e.user_message()))?;
        if let Some(dir) = &self.data_dir {
            config.data_dir = dir.clone();
        }
        if let Commands::Serve(args) = &self.command {
            if let Some(host) = &args.host {
                config.api_host = host.clone();
            }
            if let Some(port) = args.port {
                config.api_port = port;
            }
        }
        config.validate().map_err(|e| anyhow!(e.user_message()))?;
        Ok(config)
    }
}

/// Pick the embedding provider for this run
pub fn build_embedder(config: &AppConfig, hashed: bool) -> Result<Arc<dyn EmbeddingProvider>> {
    if hashed {
        info!("Using hash embeddings ({} dimensions)", HASH_EMBEDDING_DIMENSION);
        return Ok(Arc::new(HashEmbedder::new(
            format!("hash-{}", HASH_EMBEDDING_DIMENSION),
            HASH_EMBEDDING_DIMENSION,
        )?));
    }
    Ok(Arc::new(OnnxEmbeddingModel::from_settings(&config.embedding)?))
}

/// Execute CLI command
pub async fn execute(cli: Cli) -> Result<()> {
    let config = cli.load_config()?;
    let embedder = build_embedder(&config, cli.hash_embeddings)?;
    let service = Arc::new(
        QaService::from_config(config, embedder).map_err(|e| anyhow!(e.user_message()))?,
    );

    match cli.command {
        Commands::Serve(_) => commands::serve(service).await,
        Commands::Ask(args) => commands::ask(service, args).await,
        Commands::Index => commands::index(service).await,
    }
}
