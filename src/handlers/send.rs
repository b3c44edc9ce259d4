use axum::{body::Bytes, extract::State};
use reqwest::Method;
use std::sync::Arc;

use crate::error::ApiError;
use crate::models::SendMessageRequest;
use crate::state::AppState;
use crate::upstream::UpstreamResult;

/// `POST /send` - validate the message request, wrap it in the Graph
/// template envelope and forward it. Upstream status/body come back
/// verbatim.
pub async fn send_handler(
    State(state): State<Arc<AppState>>,
    body: Bytes,
) -> Result<UpstreamResult, ApiError> {
    let request = SendMessageRequest::from_body(&body)?;

    // Fail fast: a call without credentials is destined to fail upstream
    if state.config.access_token.is_none() {
        return Err(ApiError::Misconfigured);
    }
    let phone_number_id = state
        .config
        .phone_number_id
        .as_deref()
        .ok_or(ApiError::Misconfigured)?;

    let envelope = request.to_upstream_envelope(&state.config.default_language);
    tracing::info!(to = %request.to, template = %request.template, "forwarding template message");

    let result = state
        .upstream
        .call(
            Method::POST,
            &format!("{phone_number_id}/messages"),
            &[],
            Some(&envelope),
        )
        .await;
    Ok(result)
}
