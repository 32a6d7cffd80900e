// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! OpenAI-compatible chat-completion client (Groq by default)

use async_trait::async_trait;
use reqwest::{header::RETRY_AFTER, Client, StatusCode};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, info, warn};

use super::errors::InferenceError;
use crate::config::{Credential, LlmSettings};

/// Sends one prompt and returns the generated text
#[async_trait]
pub trait ChatCompletionClient: Send + Sync {
    async fn complete(&self, model: &str, prompt: &str) -> Result<String, InferenceError>;
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: Option<ChatResponseMessage>,
}

#[derive(Deserialize)]
struct ChatResponseMessage {
    content: Option<String>,
}

/// Client for a hosted OpenAI-compatible endpoint
///
/// One request per call, no retries. The configured timeout covers the
/// whole request including the body.
pub struct GroqClient {
    client: Client,
    endpoint: String,
    api_key: Credential,
    timeout: Duration,
}

impl std::fmt::Debug for GroqClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GroqClient")
            .field("endpoint", &self.endpoint)
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}

impl GroqClient {
    pub fn new(
        endpoint: &str,
        api_key: Credential,
        timeout: Duration,
    ) -> Result<Self, InferenceError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| InferenceError::Client(e.to_string()))?;

        let endpoint = endpoint.trim_end_matches('/').to_string();
        info!(
            "Inference client configured: endpoint={}, timeout={}s",
            endpoint,
            timeout.as_secs()
        );

        Ok(Self {
            client,
            endpoint,
            api_key,
            timeout,
        })
    }

    pub fn from_settings(settings: &LlmSettings) -> Result<Self, InferenceError> {
        Self::new(&settings.api_url, settings.api_key.clone(), settings.timeout)
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    fn map_send_error(&self, e: reqwest::Error) -> InferenceError {
        if e.is_timeout() {
            InferenceError::Timeout {
                timeout_ms: self.timeout.as_millis() as u64,
            }
        } else {
            InferenceError::Network(e.to_string())
        }
    }
}

#[async_trait]
impl ChatCompletionClient for GroqClient {
    async fn complete(&self, model: &str, prompt: &str) -> Result<String, InferenceError> {
        let start = std::time::Instant::now();
        let request = ChatRequest {
            model,
            messages: vec![ChatMessage {
                role: "user",
                content: prompt,
            }],
        };

        let response = self
            .client
            .post(format!("{}/chat/completions", self.endpoint))
            .bearer_auth(self.api_key.expose())
            .json(&request)
            .send()
            .await
            .map_err(|e| self.map_send_error(e))?;

        let status = response.status();

        if status == StatusCode::TOO_MANY_REQUESTS {
            let retry_after_secs = response
                .headers()
                .get(RETRY_AFTER)
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.trim().parse().ok());
            warn!("Inference provider rate limited the request");
            return Err(InferenceError::RateLimited { retry_after_secs });
        }

        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            warn!("Inference API returned {}: {}", status, message);
            return Err(InferenceError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let body = response.text().await.map_err(|e| self.map_send_error(e))?;
        let parsed: ChatResponse = serde_json::from_str(&body)
            .map_err(|e| InferenceError::MalformedResponse(format!("JSON parse error: {}", e)))?;

        let content = parsed
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message)
            .and_then(|m| m.content)
            .ok_or_else(|| {
                InferenceError::MalformedResponse(
                    "Response has no choices[0].message.content".to_string(),
                )
            })?;

        debug!(
            "Completion from {} in {}ms ({} chars)",
            model,
            start.elapsed().as_millis(),
            content.len()
        );
        Ok(content)
    }
}
