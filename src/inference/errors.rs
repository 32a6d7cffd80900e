// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Errors from the remote chat-completion call

use thiserror::Error;

/// Errors that can occur while asking the remote language model
///
/// Every variant is recoverable at the request boundary.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum InferenceError {
    /// Transport failure (DNS, connect, TLS, reset)
    #[error("Network error: {0}")]
    Network(String),

    /// Request exceeded the configured timeout
    #[error("Inference timeout after {timeout_ms}ms")]
    Timeout { timeout_ms: u64 },

    /// Provider rejected the request due to rate limiting
    #[error("Rate limited by inference provider")]
    RateLimited {
        /// Seconds the provider asked us to wait, if given
        retry_after_secs: Option<u64>,
    },

    /// Non-success HTTP status
    #[error("Inference API error: {status} - {message}")]
    Api { status: u16, message: String },

    /// Response body missing the generated text or not valid JSON
    #[error("Malformed inference response: {0}")]
    MalformedResponse(String),

    /// HTTP client could not be constructed
    #[error("Inference client setup failed: {0}")]
    Client(String),
}

impl InferenceError {
    pub fn error_code(&self) -> &'static str {
        match self {
            InferenceError::Network(_) => "INFERENCE_NETWORK",
            InferenceError::Timeout { .. } => "INFERENCE_TIMEOUT",
            InferenceError::RateLimited { .. } => "INFERENCE_RATE_LIMITED",
            InferenceError::Api { .. } => "INFERENCE_API_ERROR",
            InferenceError::MalformedResponse(_) => "INFERENCE_MALFORMED_RESPONSE",
            InferenceError::Client(_) => "INFERENCE_CLIENT",
        }
    }

    /// Get user-friendly error message for display
    pub fn user_message(&self) -> String {
        match self {
            InferenceError::Timeout { timeout_ms } => format!(
                "The language model did not answer within {} seconds. Please try again.",
                timeout_ms / 1000
            ),
            InferenceError::RateLimited {
                retry_after_secs: Some(secs),
            } => format!("The language model is rate limited; retry in {}s.", secs),
            InferenceError::RateLimited { .. } => {
                "The language model is rate limited; retry shortly.".to_string()
            }
            _ => self.to_string(),
        }
    }
}
