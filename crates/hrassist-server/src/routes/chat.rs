//! Chat routes: one message in, one answer out.

use std::sync::Arc;
use std::time::Instant;

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use hrassist_engine::RouteKind;

use super::error_response;
use crate::state::AppState;

pub const MAX_MESSAGE_CHARS: usize = 10_000;

static UNSAFE_INPUT: Lazy<Vec<Regex>> = Lazy::new(|| {
    [
        r"(?is)<script\b.*?>",
        r"(?i)<iframe\b",
        r"(?i)javascript\s*:",
        r"(?i)vbscript\s*:",
        r"(?i)data\s*:\s*text/html",
        r"(?i)\bon[a-z]+\s*=",
    ]
    .iter()
    .map(|p| Regex::new(p).expect("valid regex"))
    .collect()
});

#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub session_id: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ChatResponse {
    pub response: String,
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub timestamp: String,
    pub session_id: String,
    pub route: RouteKind,
}

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/chat", post(chat))
        .route("/chat/health", get(chat_health))
}

/// Reject input the engine should never see.
pub fn validate_message(message: &str) -> Result<(), &'static str> {
    if message.trim().is_empty() {
        return Err("Message cannot be empty");
    }
    if message.chars().count() > MAX_MESSAGE_CHARS {
        return Err("Message is too long (maximum 10000 characters)");
    }
    if UNSAFE_INPUT.iter().any(|re| re.is_match(message)) {
        return Err("Message contains disallowed content");
    }
    Ok(())
}

/// POST /api/chat: answer one message.
async fn chat(State(state): State<Arc<AppState>>, Json(req): Json<ChatRequest>) -> Response {
    if let Err(reason) = validate_message(&req.message) {
        warn!("Rejected chat message: {}", reason);
        return error_response(StatusCode::BAD_REQUEST, reason);
    }

    let session_id = req
        .session_id
        .filter(|s| !s.trim().is_empty())
        .unwrap_or_else(|| uuid::Uuid::new_v4().to_string());

    let start = Instant::now();
    let answer = state.engine.answer(&session_id, &req.message).await;
    info!(
        session = %session_id,
        route = answer.route.as_str(),
        score = ?answer.score,
        elapsed_ms = start.elapsed().as_millis() as u64,
        "chat answered"
    );

    Json(ChatResponse {
        response: answer.text,
        success: true,
        error: None,
        timestamp: chrono::Utc::now().to_rfc3339(),
        session_id,
        route: answer.route,
    })
    .into_response()
}

/// GET /api/chat/health
async fn chat_health(State(state): State<Arc<AppState>>) -> Json<serde_json::Value> {
    let health = state.engine.health();
    Json(serde_json::json!({
        "status": "healthy",
        "qa_pairs": health.qa_pairs,
        "semantic_search": health.semantic_search,
        "embedder": health.embedder,
        "llm_available": health.generator.is_some(),
        "generator": health.generator,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_message() {
        assert!(validate_message("How many leave days?").is_ok());
        assert!(validate_message("   ").is_err());
        assert!(validate_message(&"a".repeat(MAX_MESSAGE_CHARS)).is_ok());
        assert!(validate_message(&"a".repeat(MAX_MESSAGE_CHARS + 1)).is_err());
        assert!(validate_message("<script>alert(1)</script>").is_err());
        assert!(validate_message("<IFRAME src=x>").is_err());
        assert!(validate_message("javascript: void(0)").is_err());
        assert!(validate_message("VBScript:MsgBox(1)").is_err());
        assert!(validate_message("<a href=\"data:text/html;base64,PHNjcmlwdD4=\">").is_err());
        assert!(validate_message("Is my data: safe?").is_ok());
        assert!(validate_message("<img onerror=alert(1)>").is_err());
        assert!(validate_message("What is the onboarding process?").is_ok());
    }
}
