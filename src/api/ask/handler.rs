// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Ask API endpoint handler

use axum::{extract::State, Json};
use tracing::{debug, info, warn};

use super::request::AskRequest;
use super::response::AskResponse;
use crate::api::errors::ApiError;
use crate::api::http_server::AppState;

/// POST /v1/ask - Answer a question from the PDF corpus
///
/// # Request
/// - `query`: Question (required)
/// - `topK`: Chunks to retrieve (1-20, default from config)
/// - `includeContext`: Return retrieved chunks (default true)
///
/// # Errors
/// - 400 Bad Request: Empty or oversized query, bad `topK`
/// - 502 Bad Gateway: Inference provider failed
/// - 503 Service Unavailable: Corpus or index could not be prepared
/// - 504 Gateway Timeout: Inference call timed out
pub async fn ask_handler(
    State(state): State<AppState>,
    Json(request): Json<AskRequest>,
) -> Result<Json<AskResponse>, ApiError> {
    debug!("Ask request: {:?}", request.query);

    if let Err(e) = request.validate() {
        warn!("Ask validation failed: {}", e);
        return Err(ApiError::InvalidRequest(e));
    }

    let k = request
        .top_k
        .unwrap_or_else(|| state.service.config().top_k);

    let answer = state
        .service
        .ask_with_k(&request.query, k)
        .await
        .map_err(ApiError::from)?;

    info!(
        "Answered '{}' with {} chunks in {}ms",
        request.query,
        answer.context.len(),
        answer.latency_ms
    );

    Ok(Json(AskResponse::new(
        request.query,
        answer,
        request.include_context,
    )))
}
