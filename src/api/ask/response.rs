// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Ask API response types

use serde::{Deserialize, Serialize};

use crate::inference::Answer;
use crate::rag::RetrievedChunk;

/// Response body for POST /v1/ask
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AskResponse {
    pub query: String,

    /// Generated text, verbatim from the model
    pub answer: String,

    pub model: String,

    /// Time spent in the completion call
    pub latency_ms: u64,

    /// Number of chunks the answer was grounded on
    pub context_count: usize,

    /// Retrieved chunks, best first; omitted when not requested
    #[serde(skip_serializing_if = "Option::is_none")]
    pub context: Option<Vec<RetrievedChunk>>,
}

impl AskResponse {
    pub fn new(query: String, answer: Answer, include_context: bool) -> Self {
        Self {
            query,
            context_count: answer.context.len(),
            answer: answer.answer,
            model: answer.model,
            latency_ms: answer.latency_ms,
            context: include_context.then_some(answer.context),
        }
    }
}
