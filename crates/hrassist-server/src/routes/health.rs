//! Service health.

use std::sync::Arc;

use axum::extract::State;
use axum::routing::get;
use axum::{Json, Router};

use crate::state::AppState;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new().route("/health", get(get_health))
}

/// GET /api/health: overall status.
async fn get_health(State(state): State<Arc<AppState>>) -> Json<serde_json::Value> {
    let engine = state.engine.health();
    let llm = state.llm_config.to_response();

    Json(serde_json::json!({
        "status": "healthy",
        "service": "hrassist",
        "version": env!("CARGO_PKG_VERSION"),
        "company": state.config.company.name,
        "timestamp": chrono::Utc::now().to_rfc3339(),
        "engine": engine,
        "llm": llm,
    }))
}
