// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1

//! ONNX sentence-transformer embedder (all-MiniLM-L6-v2)
//!
//! - ONNX Runtime session, CUDA with automatic CPU fallback
//! - BERT tokenizer, truncated to the model's 256-token window
//! - Mean pooling over non-padding tokens, then L2 normalization
//! - Batches are padded to the longest sequence in the batch

use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use ndarray::{Array2, Axis};
use ort::execution_providers::{CPUExecutionProvider, CUDAExecutionProvider};
use ort::session::builder::GraphOptimizationLevel;
use ort::session::Session;
use ort::value::Value;
use std::path::Path;
use std::sync::{Arc, Mutex};
use tokenizers::{Tokenizer, TruncationParams};
use tracing::{info, warn};

use super::{l2_normalize, EmbeddingProvider};
use crate::config::EmbeddingSettings;

/// Maximum sequence length for all-MiniLM-L6-v2
const MAX_SEQUENCE_LENGTH: usize = 256;

/// ONNX-based embedding model
///
/// The session needs `&mut` to run, so it sits behind a mutex; clones share
/// the same session.
#[derive(Clone)]
pub struct OnnxEmbeddingModel {
    /// ONNX Runtime session (thread-safe via Arc<Mutex>)
    session: Arc<Mutex<Session>>,

    /// BERT tokenizer with truncation at `MAX_SEQUENCE_LENGTH`
    tokenizer: Arc<Tokenizer>,

    /// Identifier recorded in every index built with this model
    model_name: String,

    /// Output embedding dimensions, read from the model at load time
    dimension: usize,
}

impl std::fmt::Debug for OnnxEmbeddingModel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OnnxEmbeddingModel")
            .field("model_name", &self.model_name)
            .field("dimension", &self.dimension)
            .finish_non_exhaustive()
    }
}

impl OnnxEmbeddingModel {
    /// Load the model described by the node configuration
    ///
    /// # Arguments
    /// - `settings`: Model name plus paths to `model.onnx` and `tokenizer.json`
    ///
    /// # Returns
    /// - `Result<Self>`: Loaded model, same as [`OnnxEmbeddingModel::new`]
    pub fn from_settings(settings: &EmbeddingSettings) -> Result<Self> {
        Self::new(
            settings.model_name.clone(),
            &settings.model_path,
            &settings.tokenizer_path,
        )
    }

    /// Load an ONNX model and its tokenizer from disk
    ///
    /// Runs one sample inference to learn the hidden size, so a wrong model
    /// file fails here rather than during index build.
    ///
    /// # Arguments
    /// - `model_name`: Identifier stored with the index (e.g. "all-MiniLM-L6-v2")
    /// - `model_path`: Path to ONNX model file (model.onnx)
    /// - `tokenizer_path`: Path to tokenizer JSON file (tokenizer.json)
    ///
    /// # Returns
    /// - `Result<Self>`: Model instance or error
    ///
    /// # Errors
    /// Returns error if:
    /// - Either file does not exist
    /// - The ONNX session cannot be created on CUDA or CPU
    /// - The tokenizer cannot be loaded or configured
    /// - The sample inference yields an empty embedding
    pub fn new<P: AsRef<Path>>(
        model_name: impl Into<String>,
        model_path: P,
        tokenizer_path: P,
    ) -> Result<Self> {
        let model_name = model_name.into();
        let model_path = model_path.as_ref();
        let tokenizer_path = tokenizer_path.as_ref();

        if !model_path.exists() {
            anyhow::bail!("ONNX model file not found: {}", model_path.display());
        }
        if !tokenizer_path.exists() {
            anyhow::bail!("Tokenizer file not found: {}", tokenizer_path.display());
        }

        info!("Initializing ONNX embedding model {}", model_name);
        let session = match Self::build_session(model_path, true) {
            Ok(s) => {
                info!("CUDA execution provider initialized");
                s
            }
            Err(e) => {
                warn!("CUDA execution provider failed: {}", e);
                warn!("Falling back to CPU execution provider");
                Self::build_session(model_path, false).context(format!(
                    "Failed to load ONNX model from {}",
                    model_path.display()
                ))?
            }
        };

        let mut tokenizer = Tokenizer::from_file(tokenizer_path)
            .map_err(|e| anyhow!("Failed to load tokenizer: {}", e))?;
        tokenizer
            .with_truncation(Some(TruncationParams {
                max_length: MAX_SEQUENCE_LENGTH,
                ..Default::default()
            }))
            .map_err(|e| anyhow!("Failed to configure truncation: {}", e))?;

        let mut model = Self {
            session: Arc::new(Mutex::new(session)),
            tokenizer: Arc::new(tokenizer),
            model_name,
            dimension: 0,
        };

        let sample = model.run_batch(&["validation test".to_string()])?;
        model.dimension = sample
            .first()
            .map(Vec::len)
            .filter(|d| *d > 0)
            .ok_or_else(|| anyhow!("Model produced an empty embedding"))?;

        info!(
            "ONNX embedding model {} loaded ({} dimensions)",
            model.model_name, model.dimension
        );
        Ok(model)
    }

    fn build_session(model_path: &Path, cuda: bool) -> Result<Session> {
        let builder = Session::builder().context("Failed to create session builder")?;
        let builder = if cuda {
            builder
                .with_execution_providers([CUDAExecutionProvider::default().build()])
                .context("Failed to set CUDA execution provider")?
        } else {
            builder
                .with_execution_providers([CPUExecutionProvider::default().build()])
                .context("Failed to set CPU execution provider")?
        };
        builder
            .with_optimization_level(GraphOptimizationLevel::Level3)
            .context("Failed to set optimization level")?
            .with_intra_threads(4)
            .context("Failed to set intra threads")?
            .commit_from_file(model_path)
            .context("Failed to commit ONNX session")
    }

    /// Tokenize, pad, run and mean-pool one batch
    fn run_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(vec![]);
        }

        let encodings = texts
            .iter()
            .map(|text| {
                self.tokenizer
                    .encode(text.as_str(), true)
                    .map_err(|e| anyhow!("Tokenization failed: {}", e))
            })
            .collect::<Result<Vec<_>>>()?;

        let max_len = encodings
            .iter()
            .map(|enc| enc.get_ids().len())
            .max()
            .unwrap_or(0)
            .max(1);

        let batch = texts.len();
        let mut input_ids = Vec::with_capacity(batch * max_len);
        let mut attention_mask = Vec::with_capacity(batch * max_len);

        for encoding in &encodings {
            let ids = encoding.get_ids();
            let padding = max_len - ids.len();
            input_ids.extend(ids.iter().map(|&id| id as i64));
            input_ids.extend(std::iter::repeat(0i64).take(padding));
            attention_mask.extend(encoding.get_attention_mask().iter().map(|&m| m as i64));
            attention_mask.extend(std::iter::repeat(0i64).take(padding));
        }
        let token_type_ids = vec![0i64; batch * max_len];

        let input_ids_array = Array2::from_shape_vec((batch, max_len), input_ids)
            .context("Failed to create input_ids array")?;
        let attention_mask_array = Array2::from_shape_vec((batch, max_len), attention_mask.clone())
            .context("Failed to create attention_mask array")?;
        let token_type_ids_array = Array2::from_shape_vec((batch, max_len), token_type_ids)
            .context("Failed to create token_type_ids array")?;

        let mut session = self
            .session
            .lock()
            .map_err(|_| anyhow!("ONNX session lock poisoned"))?;
        let outputs = session.run(ort::inputs![
            "input_ids" => Value::from_array(input_ids_array)?,
            "attention_mask" => Value::from_array(attention_mask_array)?,
            "token_type_ids" => Value::from_array(token_type_ids_array)?
        ])?;

        // [batch, seq_len, hidden_dim]; output names differ between exports
        let hidden = outputs[0]
            .try_extract_array::<f32>()
            .context("Failed to extract output tensor")?;
        if hidden.ndim() != 3 {
            anyhow::bail!(
                "Model outputs unexpected shape: {:?} (expected [batch, seq_len, hidden])",
                hidden.shape()
            );
        }

        let mut embeddings = Vec::with_capacity(batch);
        for b in 0..batch {
            let item = hidden.index_axis(Axis(0), b);
            let hidden_dim = item.shape()[1];
            let mask = &attention_mask[b * max_len..(b + 1) * max_len];

            let mut pooled = vec![0.0f32; hidden_dim];
            let mut mask_sum = 0.0f32;
            for (i, &m) in mask.iter().enumerate().take(item.shape()[0]) {
                let weight = m as f32;
                mask_sum += weight;
                for (j, value) in pooled.iter_mut().enumerate() {
                    *value += item[[i, j]] * weight;
                }
            }
            for value in &mut pooled {
                *value /= mask_sum.max(1e-9);
            }

            l2_normalize(&mut pooled);
            embeddings.push(pooled);
        }

        Ok(embeddings)
    }
}

#[async_trait]
impl EmbeddingProvider for OnnxEmbeddingModel {
    fn model_name(&self) -> &str {
        &self.model_name
    }

    fn dimension(&self) -> usize {
        self.dimension
    }

    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        self.run_batch(&[text.to_string()])?
            .pop()
            .ok_or_else(|| anyhow!("Model returned no embedding"))
    }

    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        let embeddings = self.run_batch(texts)?;
        for (i, emb) in embeddings.iter().enumerate() {
            if emb.len() != self.dimension {
                anyhow::bail!(
                    "Unexpected embedding dimension at index {}: {} (expected {})",
                    i,
                    emb.len(),
                    self.dimension
                );
            }
        }
        Ok(embeddings)
    }
}
