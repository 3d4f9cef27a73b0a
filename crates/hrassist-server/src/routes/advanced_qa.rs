//! Advanced QA routes: suggestions, feedback, statistics and dataset upkeep.

use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Deserialize;
use tracing::{error, info};

use hrassist_store::FeedbackKind;

use super::error_response;
use crate::state::AppState;

const DEFAULT_SUGGESTIONS: usize = 5;
const MAX_SUGGESTIONS: usize = 20;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/advanced-qa/suggestions", post(suggestions))
        .route("/advanced-qa/enhanced-answer", post(enhanced_answer))
        .route("/advanced-qa/feedback", post(feedback))
        .route("/advanced-qa/statistics", get(statistics))
        .route("/advanced-qa/health", get(health))
        .route("/advanced-qa/generate-qa", post(generate_qa))
        .route("/advanced-qa/generate-qa/status", get(generate_qa_status))
        .route("/advanced-qa/reload", post(reload))
}

#[derive(Debug, Deserialize)]
pub struct QueryRequest {
    #[serde(default)]
    pub query: String,
    pub max_suggestions: Option<usize>,
    #[serde(default)]
    pub session_id: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct FeedbackRequest {
    pub question: String,
    pub feedback: String,
    pub suggested_answer: Option<String>,
}

/// POST /api/advanced-qa/suggestions: similar questions above the score floor.
async fn suggestions(
    State(state): State<Arc<AppState>>,
    Json(req): Json<QueryRequest>,
) -> Response {
    let query = req.query.trim();
    if query.is_empty() {
        return error_response(StatusCode::BAD_REQUEST, "Query cannot be empty");
    }
    let k = req
        .max_suggestions
        .unwrap_or(DEFAULT_SUGGESTIONS)
        .clamp(1, MAX_SUGGESTIONS);
    let found = state.engine.suggestions(query, k).await;

    Json(serde_json::json!({
        "query": query,
        "count": found.len(),
        "suggestions": found,
    }))
    .into_response()
}

/// POST /api/advanced-qa/enhanced-answer: the chat answer plus related questions.
async fn enhanced_answer(
    State(state): State<Arc<AppState>>,
    Json(req): Json<QueryRequest>,
) -> Response {
    let query = req.query.trim();
    if query.is_empty() {
        return error_response(StatusCode::BAD_REQUEST, "Query cannot be empty");
    }
    let session_id = req
        .session_id
        .filter(|s| !s.trim().is_empty())
        .unwrap_or_else(|| uuid::Uuid::new_v4().to_string());
    let answer = state.engine.answer(&session_id, query).await;
    let related = state
        .engine
        .suggestions(query, req.max_suggestions.unwrap_or(3).clamp(1, MAX_SUGGESTIONS))
        .await;

    Json(serde_json::json!({
        "query": query,
        "session_id": session_id,
        "answer": answer.text,
        "route": answer.route,
        "confidence": answer.score,
        "matched_question": answer.matched_question,
        "related_questions": related,
    }))
    .into_response()
}

/// POST /api/advanced-qa/feedback: record a verdict on an answer.
async fn feedback(
    State(state): State<Arc<AppState>>,
    Json(req): Json<FeedbackRequest>,
) -> Response {
    let kind: FeedbackKind = match req.feedback.parse() {
        Ok(kind) => kind,
        Err(e) => return error_response(StatusCode::BAD_REQUEST, e.to_string()),
    };
    if req.question.trim().is_empty() {
        return error_response(StatusCode::BAD_REQUEST, "Question cannot be empty");
    }

    match state
        .engine
        .apply_feedback(&req.question, kind, req.suggested_answer.as_deref())
        .await
    {
        Ok(true) => Json(serde_json::json!({
            "success": true,
            "message": format!("Feedback '{}' recorded", kind.as_str()),
        }))
        .into_response(),
        Ok(false) => error_response(StatusCode::NOT_FOUND, "Question not found in dataset"),
        Err(e) => {
            error!("Failed to save feedback: {}", e);
            error_response(StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
        }
    }
}

/// GET /api/advanced-qa/statistics
async fn statistics(State(state): State<Arc<AppState>>) -> Json<serde_json::Value> {
    Json(serde_json::json!(state.engine.statistics()))
}

/// GET /api/advanced-qa/health
async fn health(State(state): State<Arc<AppState>>) -> Json<serde_json::Value> {
    let harvest = state.harvest_status.read().clone();
    Json(serde_json::json!({
        "status": "healthy",
        "engine": state.engine.health(),
        "harvest": harvest,
    }))
}

/// POST /api/advanced-qa/generate-qa: harvest policy files in the background.
async fn generate_qa(State(state): State<Arc<AppState>>) -> Response {
    if state.engine.generator().is_none() {
        return error_response(
            StatusCode::SERVICE_UNAVAILABLE,
            "No LLM provider configured; QA generation is unavailable",
        );
    }
    if !state.try_start_harvest() {
        return error_response(StatusCode::CONFLICT, "QA generation is already running");
    }

    let worker = state.clone();
    tokio::spawn(async move {
        info!("QA harvest started");
        let outcome =
            hrassist_engine::harvest(&worker.engine, &worker.config.data_paths).await;
        if let Err(e) = &outcome {
            error!("QA harvest failed: {}", e);
        }
        worker.finish_harvest(outcome);
    });

    (
        StatusCode::ACCEPTED,
        Json(serde_json::json!({
            "success": true,
            "message": "QA generation started in the background",
        })),
    )
        .into_response()
}

/// GET /api/advanced-qa/generate-qa/status
async fn generate_qa_status(State(state): State<Arc<AppState>>) -> Json<serde_json::Value> {
    Json(serde_json::json!(*state.harvest_status.read()))
}

/// POST /api/advanced-qa/reload: re-read the dataset and re-embed it.
async fn reload(State(state): State<Arc<AppState>>) -> Response {
    match state.engine.reload().await {
        Ok(count) => Json(serde_json::json!({
            "success": true,
            "qa_pairs": count,
            "semantic_search": state.engine.knowledge().semantic_enabled(),
        }))
        .into_response(),
        Err(e) => {
            error!("Reload failed: {}", e);
            error_response(StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
        }
    }
}
