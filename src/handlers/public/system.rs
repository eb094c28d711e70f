use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Json},
};
use serde_json::{json, Value};

use crate::state::AppState;

/// GET / - service descriptor
pub async fn root() -> Json<Value> {
    let version = env!("CARGO_PKG_VERSION");

    Json(json!({
        "success": true,
        "data": {
            "name": "E-Voting Admin API",
            "version": version,
            "endpoints": {
                "health": "/health (public)",
                "login": "/auth/login (public - token acquisition)",
                "whoami": "/api/auth/whoami (any authenticated user)",
                "users": "/api/users[/:id] (admin, officer)",
                "status": "/api/users/:id/status (admin)",
            }
        }
    }))
}

/// GET /health - runs the store probe
pub async fn health(State(state): State<AppState>) -> impl IntoResponse {
    let now = chrono::Utc::now();
    let lifecycle = state.database.state().await;

    match state.database.health_check().await {
        Ok(()) => (
            StatusCode::OK,
            Json(json!({
                "success": true,
                "data": {
                    "status": "ok",
                    "timestamp": now,
                    "database": "ok",
                    "lifecycle": lifecycle,
                }
            })),
        ),
        Err(fault) => (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(json!({
                "success": false,
                "error": "database unavailable",
                "data": {
                    "status": "degraded",
                    "timestamp": now,
                    "database_error": fault.kind(),
                    "lifecycle": lifecycle,
                }
            })),
        ),
    }
}
