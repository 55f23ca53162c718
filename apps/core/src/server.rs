//! HTTP surface.
//!
//! - `POST /api/analyze` remote classification only, the model-service proxy
//! - `POST /api/prompts` single-prompt analysis with local fallback and history
//! - `GET  /api/prompts/history` history and mean scores
//! - `POST /api/sessions` batch analysis of pasted prompt lines
//! - `GET  /api/sessions/quota` today's remaining session analyses
//! - `GET  /health` liveness

use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tower_http::cors::{Any, CorsLayer};
use tracing::{error, warn};

use crate::actors::messages::ClassifierError;
use crate::actors::remote::RemoteClassifier;
use crate::actors::supervisor::SupervisorHandle;
use crate::actors::traits::LlmActor;
use crate::error::AppError;
use crate::history::{HistorySnapshot, PromptOutcome};
use crate::quota::{DailyQuota, QuotaStatus};
use crate::session::{SessionAnalyzer, SessionReport};

#[derive(Clone)]
pub struct AppState {
    pub remote: RemoteClassifier,
    pub supervisor: SupervisorHandle,
    pub sessions: Arc<SessionAnalyzer>,
}

impl AppState {
    /// Wires the orchestrators around one LLM backend.
    pub fn new(llm: Arc<dyn LlmActor>, quota: DailyQuota, remote_timeout: Duration) -> Self {
        let remote = RemoteClassifier::new(llm);
        Self {
            supervisor: SupervisorHandle::new(remote.clone(), remote_timeout),
            remote,
            sessions: Arc::new(SessionAnalyzer::new(quota)),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct AnalyzeRequest {
    pub prompt: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct PromptRequest {
    pub prompt: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct SessionRequest {
    pub text: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct HealthResponse {
    status: String,
    remote_configured: bool,
    timestamp: String,
}

pub fn build_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(health))
        .route("/api/analyze", post(analyze))
        .route("/api/prompts", post(analyze_prompt))
        .route("/api/prompts/history", get(prompt_history))
        .route("/api/sessions", post(analyze_session))
        .route("/api/sessions/quota", get(session_quota))
        .layer(cors)
        .with_state(state)
}

fn error_body(status: StatusCode, value: serde_json::Value) -> Response {
    (status, Json(value)).into_response()
}

/// GET /health
async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        remote_configured: state.remote.is_configured(),
        timestamp: chrono::Utc::now().to_rfc3339(),
    })
}

/// POST /api/analyze
async fn analyze(
    State(state): State<AppState>,
    body: Result<Json<AnalyzeRequest>, JsonRejection>,
) -> Response {
    if !state.remote.is_configured() {
        return error_body(
            StatusCode::INTERNAL_SERVER_ERROR,
            serde_json::json!({ "error": "Gemini API key not configured on server." }),
        );
    }

    let body = match body {
        Ok(Json(body)) => body,
        Err(rejection) => {
            warn!(error = %rejection, "Unreadable analyze request");
            return error_body(
                StatusCode::INTERNAL_SERVER_ERROR,
                serde_json::json!({ "error": "Unexpected server error." }),
            );
        }
    };

    let prompt = match body.prompt {
        Some(prompt) if !prompt.trim().is_empty() => prompt,
        _ => {
            return error_body(
                StatusCode::BAD_REQUEST,
                serde_json::json!({ "error": "Prompt is required." }),
            )
        }
    };

    match state.remote.analyze(&prompt).await {
        Ok(analysis) => Json(analysis).into_response(),
        Err(ClassifierError::Decode { raw, .. }) => error_body(
            StatusCode::INTERNAL_SERVER_ERROR,
            serde_json::json!({ "error": "Failed to parse JSON from Gemini.", "raw": raw }),
        ),
        Err(ClassifierError::ConfigurationMissing(msg)) => {
            error_body(StatusCode::INTERNAL_SERVER_ERROR, serde_json::json!({ "error": msg }))
        }
        Err(e) => {
            error!(error = %e, "Error in /api/analyze");
            error_body(
                StatusCode::INTERNAL_SERVER_ERROR,
                serde_json::json!({ "error": "Unexpected server error." }),
            )
        }
    }
}

/// Unreadable bodies get the same 400 notice as blank input.
fn json_body<T>(body: Result<Json<T>, JsonRejection>, notice: &str) -> Result<T, AppError> {
    body.map(|Json(body)| body).map_err(|rejection| {
        warn!(error = %rejection, "Unreadable request body");
        AppError::Validation(notice.to_string())
    })
}

/// POST /api/prompts
async fn analyze_prompt(
    State(state): State<AppState>,
    body: Result<Json<PromptRequest>, JsonRejection>,
) -> Result<Json<PromptOutcome>, AppError> {
    let body = json_body(body, "Please enter a prompt first.")?;
    state
        .supervisor
        .analyze_prompt(body.prompt.unwrap_or_default())
        .await
        .map(Json)
}

/// GET /api/prompts/history
async fn prompt_history(State(state): State<AppState>) -> Result<Json<HistorySnapshot>, AppError> {
    state.supervisor.history().await.map(Json)
}

/// POST /api/sessions
async fn analyze_session(
    State(state): State<AppState>,
    body: Result<Json<SessionRequest>, JsonRejection>,
) -> Result<Json<SessionReport>, AppError> {
    let body = json_body(body, "Paste some conversation or prompts first.")?;
    state
        .sessions
        .analyze(body.text.as_deref().unwrap_or_default())
        .await
        .map(Json)
}

/// GET /api/sessions/quota
async fn session_quota(State(state): State<AppState>) -> Result<Json<QuotaStatus>, AppError> {
    state.sessions.quota_status().await.map(Json)
}
