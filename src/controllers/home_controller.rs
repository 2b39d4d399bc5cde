use axum::{http::StatusCode, Json};
use chrono::Utc;
use serde_json::{json, Value};

// GET /
pub async fn root() -> Json<Value> {
    Json(json!({
        "message": "PulseTrack API",
        "version": env!("CARGO_PKG_VERSION"),
        "endpoints": {
            "watchlist": "/api/watchlist",
            "alerts": "/api/alerts",
            "market": "/api/market",
            "realtime": "/ws",
        },
    }))
}

// GET /health
pub async fn health() -> Json<Value> {
    Json(json!({
        "status": "ok",
        "timestamp": Utc::now().timestamp(),
    }))
}

pub async fn not_found() -> (StatusCode, Json<Value>) {
    (
        StatusCode::NOT_FOUND,
        Json(json!({ "message": "Route not found" })),
    )
}
