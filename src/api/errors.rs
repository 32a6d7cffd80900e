// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::inference::InferenceError;
use crate::rag::RagError;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ErrorResponse {
    pub error_type: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ApiError {
    InvalidRequest(String),
    /// Corpus or index could not be prepared
    ServiceUnavailable { code: String, message: String },
    /// The remote model failed or answered with garbage
    BadGateway { code: String, message: String },
    Timeout(String),
    InternalError(String),
}

impl ApiError {
    pub fn to_response(&self) -> ErrorResponse {
        let (error_type, message, code) = match self {
            ApiError::InvalidRequest(msg) => ("invalid_request", msg.clone(), None),
            ApiError::ServiceUnavailable { code, message } => {
                ("service_unavailable", message.clone(), Some(code.clone()))
            }
            ApiError::BadGateway { code, message } => {
                ("bad_gateway", message.clone(), Some(code.clone()))
            }
            ApiError::Timeout(msg) => ("timeout", msg.clone(), None),
            ApiError::InternalError(msg) => ("internal_error", msg.clone(), None),
        };

        ErrorResponse {
            error_type: error_type.to_string(),
            message,
            code,
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::ServiceUnavailable { .. } => StatusCode::SERVICE_UNAVAILABLE,
            ApiError::BadGateway { .. } => StatusCode::BAD_GATEWAY,
            ApiError::Timeout(_) => StatusCode::GATEWAY_TIMEOUT,
            ApiError::InternalError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<RagError> for ApiError {
    fn from(err: RagError) -> Self {
        let message = err.user_message();
        match &err {
            RagError::InvalidQuery(msg) => ApiError::InvalidRequest(msg.clone()),
            RagError::Inference(InferenceError::Timeout { .. }) => ApiError::Timeout(message),
            RagError::Inference(e) => ApiError::BadGateway {
                code: e.error_code().to_string(),
                message,
            },
            RagError::EmbeddingMismatch { .. } => ApiError::InternalError(message),
            // Query embedding failures share 503 with startup failures
            _ => ApiError::ServiceUnavailable {
                code: err.error_code().to_string(),
                message,
            },
        }
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ApiError::InvalidRequest(msg) => write!(f, "Invalid request: {}", msg),
            ApiError::ServiceUnavailable { message, .. } => {
                write!(f, "Service unavailable: {}", message)
            }
            ApiError::BadGateway { message, .. } => write!(f, "Upstream error: {}", message),
            ApiError::Timeout(msg) => write!(f, "Request timed out: {}", msg),
            ApiError::InternalError(msg) => write!(f, "Internal error: {}", msg),
        }
    }
}

impl std::error::Error for ApiError {}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status_code(), Json(self.to_response())).into_response()
    }
}
