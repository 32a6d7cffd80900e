// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Turns a question plus retrieved context into an answer

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Instant;
use tracing::{error, info};

use super::build_prompt;
use super::client::ChatCompletionClient;
use crate::rag::{RagError, RetrievedChunk};

/// Generated answer with the context it was grounded on
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Answer {
    pub answer: String,
    pub model: String,
    pub latency_ms: u64,
    pub context: Vec<RetrievedChunk>,
}

#[derive(Clone)]
pub struct AnswerComposer {
    client: Arc<dyn ChatCompletionClient>,
    model: String,
}

impl AnswerComposer {
    pub fn new(client: Arc<dyn ChatCompletionClient>, model: impl Into<String>) -> Self {
        Self {
            client,
            model: model.into(),
        }
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    /// One outbound completion; the generated text is returned unmodified
    pub async fn compose(
        &self,
        query: &str,
        context: Vec<RetrievedChunk>,
    ) -> Result<Answer, RagError> {
        let start = Instant::now();
        let prompt = build_prompt(query, &context);

        let answer = self
            .client
            .complete(&self.model, &prompt)
            .await
            .map_err(|e| {
                error!("Inference failed ({}): {}", e.error_code(), e);
                RagError::Inference(e)
            })?;

        let latency_ms = start.elapsed().as_millis() as u64;
        info!("Response time: {}ms", latency_ms);

        Ok(Answer {
            answer,
            model: self.model.clone(),
            latency_ms,
            context,
        })
    }
}
