use crate::config::ProxyConfig;
use axum::{
    extract::{rejection::JsonRejection, Json, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{any, get, post},
    Router,
};
use llmchess::ai::extract::extract_move;
use llmchess::ai::health::{health_url, probe, Health};
use llmchess::ai::transport::{
    ChatCompletionsClient, MoveEndpoint, ProxyErrorResponse, ProxyMoveRequest, ProxyMoveResponse,
};
use llmchess::ai::{AttemptFailure, Prompt};
use llmchess::core::{Provider, Sampling};
use reqwest::{Client, Url};
use serde::Serialize;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::services::{ServeDir, ServeFile};
use tower_http::trace::TraceLayer;
use tracing::{error, info, warn};

pub const PROXY_ERROR: &str = "Failed to connect to llama server";
pub const INVALID_REQUEST: &str = "Invalid request body";

#[derive(Clone)]
pub struct AppState {
    upstream: Arc<ChatCompletionsClient>,
    http: Client,
    health_url: Url,
    api_key: Option<String>,
}

impl AppState {
    pub fn new(config: &ProxyConfig) -> Self {
        let http = Client::new();
        let upstream = ChatCompletionsClient::new(
            http.clone(),
            config.upstream.clone(),
            config.model.clone(),
            Sampling::default(),
        )
        .with_api_key(config.api_key.clone());

        Self {
            upstream: Arc::new(upstream),
            http,
            health_url: health_url(&config.upstream, Provider::LlamaCpp),
            api_key: config.api_key.clone(),
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthResponse {
    pub status: &'static str,
    pub backend: &'static str,
    pub llama_server: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub llama_api_key: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub timestamp: String,
}

pub fn router(config: &ProxyConfig) -> Router {
    let state = AppState::new(config);
    let index = config.static_dir.join("index.html");

    Router::new()
        .route("/api/llama", post(llama_move))
        .route("/api/health", get(health))
        .route("/api/{*rest}", any(api_not_found))
        .with_state(state)
        .fallback_service(ServeDir::new(&config.static_dir).fallback(ServeFile::new(index)))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
}

async fn llama_move(
    State(state): State<AppState>,
    payload: Result<Json<ProxyMoveRequest>, JsonRejection>,
) -> Response {
    let Json(payload) = match payload {
        Ok(payload) => payload,
        Err(rejection) => {
            warn!("[PROXY] Rejected move request: {}", rejection.body_text());
            let body = ProxyErrorResponse {
                error: INVALID_REQUEST.to_string(),
                message: rejection.body_text(),
            };
            return (rejection.status(), Json(body)).into_response();
        }
    };
    info!(
        "[PROXY] Move request ({} chars of prompt)",
        payload.system_message.len() + payload.user_message.len()
    );
    let prompt = Prompt {
        system: payload.system_message,
        user: payload.user_message,
    };

    let result = match state.upstream.request(&prompt).await {
        Ok(reply) => extract_move(&reply),
        Err(e) => Err(AttemptFailure::Transport(e)),
    };

    match result {
        Ok(san) => {
            info!("[PROXY] Upstream answered {}", san);
            Json(ProxyMoveResponse { san: Some(san) }).into_response()
        }
        Err(failure) => {
            error!("[PROXY] Error proxying to llama server: {}", failure);
            let status = if failure.is_rate_limited() {
                StatusCode::TOO_MANY_REQUESTS
            } else {
                StatusCode::INTERNAL_SERVER_ERROR
            };
            let body = ProxyErrorResponse {
                error: PROXY_ERROR.to_string(),
                message: failure.to_string(),
            };
            (status, Json(body)).into_response()
        }
    }
}

async fn health(State(state): State<AppState>) -> Response {
    let timestamp = chrono::Utc::now().to_rfc3339();

    match probe(&state.http, &state.health_url, state.api_key.as_deref()).await {
        Health::Unreachable(reason) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(HealthResponse {
                status: "unhealthy",
                backend: "connected",
                llama_server: "disconnected",
                llama_api_key: None,
                error: Some(reason),
                timestamp,
            }),
        )
            .into_response(),
        upstream => Json(HealthResponse {
            status: "healthy",
            backend: "connected",
            llama_server: if upstream.is_reachable() {
                "connected"
            } else {
                "disconnected"
            },
            llama_api_key: Some(if state.api_key.is_some() {
                "configured"
            } else {
                "not configured"
            }),
            error: None,
            timestamp,
        })
        .into_response(),
    }
}

async fn api_not_found() -> StatusCode {
    StatusCode::NOT_FOUND
}
