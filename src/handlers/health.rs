use axum::{Json, response::IntoResponse};

// Health handler - no upstream call
pub async fn health_handler() -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "ok",
        "now": chrono::Utc::now().to_rfc3339()
    }))
}
