use axum::{extract::State, Json};
use serde_json::{json, Value};

use crate::AppState;

pub async fn health_handler(State(state): State<AppState>) -> Json<Value> {
    Json(json!({
        "status": "healthy",
        "uptime": state.started_at.elapsed().as_secs(),
        "sessions": state.sessions.active_count().await,
        "timestamp": chrono::Utc::now().to_rfc3339()
    }))
}
