// handlers/public/mod.rs - endpoints reachable without a session
use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use serde_json::{json, Value};

use crate::app::AppState;

pub mod auth;

pub async fn root() -> Json<Value> {
    Json(json!({
        "success": true,
        "data": {
            "name": "Hospital API",
            "version": env!("CARGO_PKG_VERSION"),
            "endpoints": {
                "public": "/login, /signup (form posts, set the jwt cookie)",
                "session": "/home, /password",
                "patient": "/contact, /appointments",
                "clinical": "/patients",
                "maintenance": "/devices",
                "admin": "/doctors, /technicians, /complaints",
            },
            "query": "?field=value&field[gte]=n&sort=-field,other&fields=a,b&page=1&limit=100",
        }
    }))
}

pub async fn health(State(state): State<AppState>) -> impl IntoResponse {
    let now = chrono::Utc::now();

    match state.records.health_check().await {
        Ok(()) => (
            StatusCode::OK,
            Json(json!({
                "success": true,
                "data": { "status": "ok", "timestamp": now, "database": "ok" }
            })),
        ),
        Err(e) => {
            tracing::error!("health check failed: {}", e);
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(json!({
                    "success": false,
                    "error": "database unavailable",
                    "data": { "status": "degraded", "timestamp": now }
                })),
            )
        }
    }
}
