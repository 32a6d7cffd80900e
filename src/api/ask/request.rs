// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Ask API request types

use serde::{Deserialize, Serialize};

use crate::rag::MAX_QUERY_CHARS;

/// Upper bound on `topK` accepted over HTTP
pub const MAX_TOP_K: usize = 20;

/// Request body for POST /v1/ask
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AskRequest {
    /// Question to answer (required)
    pub query: String,

    /// Chunks to retrieve (1-20, server default when absent)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub top_k: Option<usize>,

    /// Return the retrieved chunks with the answer (default true)
    #[serde(default = "default_include_context")]
    pub include_context: bool,
}

fn default_include_context() -> bool {
    true
}

impl AskRequest {
    pub fn validate(&self) -> Result<(), String> {
        if self.query.trim().is_empty() {
            return Err("Query cannot be empty".to_string());
        }
        if self.query.chars().count() > MAX_QUERY_CHARS {
            return Err(format!(
                "Query too long (max {} characters)",
                MAX_QUERY_CHARS
            ));
        }
        match self.top_k {
            Some(0) => Err("topK must be at least 1".to_string()),
            Some(k) if k > MAX_TOP_K => Err(format!("topK cannot exceed {}", MAX_TOP_K)),
            _ => Ok(()),
        }
    }
}
