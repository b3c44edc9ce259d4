use axum::{Json, response::IntoResponse};

// Fallback for unmatched routes. Deliberately a 200 liveness payload, not
// a 404 - existing callers probe arbitrary paths and expect success.
pub async fn alive_handler() -> impl IntoResponse {
    Json(serde_json::json!({
        "ok": true,
        "message": "whatsapp gateway alive"
    }))
}
