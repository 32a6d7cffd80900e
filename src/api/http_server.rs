// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
use axum::{
    extract::State,
    response::{IntoResponse, Json},
    routing::{get, post},
    Router,
};
use serde_json::json;
use std::{net::SocketAddr, sync::Arc};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use super::ask::ask_handler;
use super::page::index_page;
use crate::service::QaService;

#[derive(Clone)]
pub struct AppState {
    pub service: Arc<QaService>,
}

impl AppState {
    pub fn new(service: Arc<QaService>) -> Self {
        Self { service }
    }
}

/// Router with every endpoint, for serving and for `oneshot` tests
pub fn create_app(state: AppState) -> Router {
    Router::new()
        // Browser form
        .route("/", get(index_page))
        // Health check
        .route("/health", get(health_handler))
        // Question answering
        .route("/v1/ask", post(ask_handler))
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

pub async fn start_server(service: Arc<QaService>) -> anyhow::Result<()> {
    let config = service.config();
    let addr: SocketAddr = format!("{}:{}", config.api_host, config.api_port).parse()?;
    let app = create_app(AppState::new(service));

    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!("API server listening on {}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}

async fn health_handler(State(state): State<AppState>) -> impl IntoResponse {
    let metrics = state.service.cache_metrics();
    let ready = state.service.index_ready().await;
    let chunks = if ready {
        state.service.last_build_stats().map(|s| s.chunks)
    } else {
        None
    };

    Json(json!({
        "status": "healthy",
        "model": state.service.config().llm.model,
        "indexReady": ready,
        "chunks": chunks,
        "cache": {
            "hits": metrics.hits,
            "misses": metrics.misses,
            "builds": metrics.builds,
        },
    }))
}
