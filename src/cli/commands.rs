// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
use anyhow::{anyhow, Result};
use clap::Args;
use std::sync::Arc;
use tracing::{error, info};

use crate::api::start_server;
use crate::rag::{RagError, RetrievedChunk};
use crate::service::QaService;

pub const CONTEXT_SEPARATOR: &str = "--------------------------------";

/// Arguments for the serve command
#[derive(Args, Debug)]
pub struct ServeArgs {
    /// Address to bind (overrides API_HOST)
    #[arg(long)]
    pub host: Option<String>,

    /// Port to bind (overrides API_PORT)
    #[arg(long)]
    pub port: Option<u16>,
}

/// Arguments for the ask command
#[derive(Args, Debug)]
pub struct AskArgs {
    /// Question to answer
    pub question: String,

    /// Print the retrieved chunks after the answer
    #[arg(long)]
    pub show_context: bool,

    /// Number of chunks to retrieve (defaults to TOP_K)
    #[arg(long)]
    pub top_k: Option<usize>,
}

fn startup_error(e: RagError) -> anyhow::Error {
    error!("Error during initialization ({}): {}", e.error_code(), e);
    anyhow!(e.user_message())
}

pub async fn serve(service: Arc<QaService>) -> Result<()> {
    service.warm_up().await.map_err(startup_error)?;
    info!("Vector store created successfully");
    start_server(service).await
}

pub async fn ask(service: Arc<QaService>, args: AskArgs) -> Result<()> {
    service.warm_up().await.map_err(startup_error)?;

    let k = args.top_k.unwrap_or(service.config().top_k);
    let answer = service
        .ask_with_k(&args.question, k)
        .await
        .map_err(|e| anyhow!(e.user_message()))?;

    println!("{}", answer.answer);
    if args.show_context {
        println!();
        println!("Document Similarity Search");
        print!("{}", format_context(&answer.context));
    }
    info!("Response time: {}ms", answer.latency_ms);
    Ok(())
}

pub async fn index(service: Arc<QaService>) -> Result<()> {
    let index = service.warm_up().await.map_err(startup_error)?;

    match service.last_build_stats() {
        Some(stats) => {
            println!("Documents:        {}", stats.documents);
            println!("Pages:            {}", stats.pages);
            println!("Non-empty pages:  {}", stats.non_empty_pages);
            println!("Chunks:           {}", stats.chunks);
            println!("Build time:       {}ms", stats.elapsed_ms);
        }
        None => println!("Chunks:           {}", index.len()),
    }
    println!("Embedding model:  {} ({} dimensions)", index.model_name(), index.dimension());
    Ok(())
}

/// Render retrieved chunks as numbered blocks with separators
pub fn format_context(chunks: &[RetrievedChunk]) -> String {
    let mut out = String::new();
    for (i, chunk) in chunks.iter().enumerate() {
        out.push_str(&format!("Document {}:\n", i + 1));
        out.push_str(&chunk.text);
        out.push('\n');
        out.push_str(CONTEXT_SEPARATOR);
        out.push('\n');
    }
    out
}
