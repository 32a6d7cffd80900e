// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
pub mod api;
pub mod cli;
pub mod config;
pub mod embeddings;
pub mod inference;
pub mod ingest;
pub mod rag;
pub mod service;

pub use config::{AppConfig, ConfigError};
pub use inference::{Answer, InferenceError};
pub use rag::{RagError, RetrievedChunk};
pub use service::QaService;
