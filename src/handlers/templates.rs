use axum::extract::{Path, Query, State};
use reqwest::Method;
use serde::Deserialize;
use std::sync::Arc;

use crate::error::ApiError;
use crate::state::AppState;
use crate::upstream::UpstreamResult;

/// `GET /templates` - forwards all caller query params to the upstream
/// template listing and passes status/body through verbatim.
pub async fn list_templates_handler(
    State(state): State<Arc<AppState>>,
    Query(params): Query<Vec<(String, String)>>,
) -> Result<UpstreamResult, ApiError> {
    let waba_id = state.config.waba_id.as_deref().ok_or(ApiError::Misconfigured)?;

    let result = state
        .upstream
        .call(
            Method::GET,
            &format!("{waba_id}/message_templates"),
            &params,
            None,
        )
        .await;
    Ok(result)
}

#[derive(Deserialize)]
pub struct TemplateQuery {
    language: Option<String>,
}

/// `GET /templates/{name}` - upstream listing filtered by name + language.
pub async fn get_template_handler(
    State(state): State<Arc<AppState>>,
    Path(name): Path<String>,
    Query(params): Query<TemplateQuery>,
) -> Result<UpstreamResult, ApiError> {
    let waba_id = state.config.waba_id.as_deref().ok_or(ApiError::Misconfigured)?;
    let language = params
        .language
        .unwrap_or_else(|| state.config.default_language.clone());

    let query = [
        ("name".to_string(), name),
        ("language".to_string(), language),
    ];
    let result = state
        .upstream
        .call(
            Method::GET,
            &format!("{waba_id}/message_templates"),
            &query,
            None,
        )
        .await;
    Ok(result)
}
