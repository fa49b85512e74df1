use axum::{extract::State, Json};
use serde_json::{json, Value};
use std::sync::Arc;

use crate::app::AppState;

/// GET /health — plain liveness probe, no dependency checks.
pub async fn health_handler() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

/// GET /health/details — per-provider rolling health windows, for
/// operators; not part of any chat procedure's response shape.
pub async fn health_details_handler(State(state): State<Arc<AppState>>) -> Json<Value> {
    Json(json!({ "providers": state.health.all_entries() }))
}

/// GET /ready — readiness is distinguished from liveness by actually
/// touching the session database rather than just returning a constant.
pub async fn ready_handler(State(state): State<Arc<AppState>>) -> Json<Value> {
    let db_ok = state.sessions.list_active("__readiness_probe__").is_ok();
    Json(json!({ "ready": db_ok }))
}

pub async fn metrics_handler(State(state): State<Arc<AppState>>) -> Json<Value> {
    Json(json!({
        "providers": state.health.all_entries(),
        "metrics_enabled": state.config.metrics.enabled,
    }))
}
