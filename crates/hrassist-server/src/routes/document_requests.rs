//! Document request routes.

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Deserialize;

use hrassist_core::Error;
use hrassist_engine::documents::{self, CATALOGUE};

use super::error_response;
use crate::state::AppState;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/document-requests/submit", post(submit))
        .route("/document-requests/status/{request_id}", get(status))
        .route("/document-requests/user/{user_id}", get(user_requests))
        .route("/document-requests/pending/count", get(pending_count))
        .route("/document-requests/documents/list", get(list_documents))
        .route("/document-requests/health", get(health))
}

#[derive(Debug, Deserialize)]
pub struct SubmitRequest {
    pub document_type: serde_json::Value,
    /// Form fields as an object, or free text.
    pub details: serde_json::Value,
    #[serde(default)]
    pub user_id: Option<String>,
}

fn value_text(value: &serde_json::Value) -> String {
    match value {
        serde_json::Value::String(s) => s.clone(),
        serde_json::Value::Null => String::new(),
        other => other.to_string(),
    }
}

/// POST /api/document-requests/submit
async fn submit(State(state): State<Arc<AppState>>, Json(req): Json<SubmitRequest>) -> Response {
    let doc_type = value_text(&req.document_type);
    let details = value_text(&req.details);
    let user_id = req.user_id.unwrap_or_default();

    match state.engine.requests().submit(&doc_type, &details, &user_id) {
        Ok(request) => Json(serde_json::json!({
            "success": true,
            "request_id": request.request_id,
            "message": documents::confirmation_text(&request, state.engine.company()),
            "request": request,
        }))
        .into_response(),
        Err(Error::Validation(reason)) => error_response(StatusCode::BAD_REQUEST, reason),
        Err(e) => error_response(StatusCode::INTERNAL_SERVER_ERROR, e.to_string()),
    }
}

/// GET /api/document-requests/status/{request_id}
async fn status(State(state): State<Arc<AppState>>, Path(request_id): Path<String>) -> Response {
    match state.engine.requests().get(&request_id) {
        Some(request) => Json(serde_json::json!(request)).into_response(),
        None => error_response(
            StatusCode::NOT_FOUND,
            format!("Request {} not found", request_id),
        ),
    }
}

/// GET /api/document-requests/user/{user_id}
async fn user_requests(
    State(state): State<Arc<AppState>>,
    Path(user_id): Path<String>,
) -> Json<serde_json::Value> {
    let requests = state.engine.requests().for_user(&user_id);
    Json(serde_json::json!({
        "user_id": user_id,
        "count": requests.len(),
        "requests": requests,
    }))
}

/// GET /api/document-requests/pending/count
async fn pending_count(State(state): State<Arc<AppState>>) -> Json<serde_json::Value> {
    let log = state.engine.requests();
    Json(serde_json::json!({
        "pending_count": log.pending_count(),
        "total": log.total(),
    }))
}

/// GET /api/document-requests/documents/list
async fn list_documents() -> Json<serde_json::Value> {
    let documents: Vec<serde_json::Value> = CATALOGUE
        .iter()
        .map(|kind| {
            serde_json::json!({
                "doc_type": kind.doc_type(),
                "name": kind.name,
                "required_fields": kind.required_fields().collect::<Vec<_>>(),
            })
        })
        .collect();
    Json(serde_json::json!({
        "count": documents.len(),
        "documents": documents,
    }))
}

/// GET /api/document-requests/health
async fn health(State(state): State<Arc<AppState>>) -> Json<serde_json::Value> {
    let log = state.engine.requests();
    Json(serde_json::json!({
        "status": "healthy",
        "document_types": CATALOGUE.len(),
        "total_requests": log.total(),
        "pending_requests": log.pending_count(),
        "pending_sessions": state.engine.pending().len(),
    }))
}
