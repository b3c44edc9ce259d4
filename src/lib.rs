pub mod config;
pub mod error;
pub mod handlers;
pub mod metrics;
pub mod middleware;
pub mod models;
pub mod rate_limit;
pub mod state;
pub mod upstream;

use axum::{
    Router,
    http::{HeaderValue, Method},
    middleware as axum_middleware,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use std::any::Any as StdAny;
use std::sync::Arc;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::cors::{Any, CorsLayer};

use crate::error::ApiError;
use crate::state::AppState;

/// Build the gateway router: guarded API routes behind the auth +
/// rate-limit middleware, plus the unauthenticated metrics endpoint.
pub fn create_router(state: Arc<AppState>) -> Router {
    let cors = cors_layer(&state.config.allowed_origin);

    let guarded = Router::new()
        .route("/health", get(handlers::health_handler))
        .route("/templates", get(handlers::list_templates_handler))
        .route("/templates/{name}", get(handlers::get_template_handler))
        .route("/send", post(handlers::send_handler))
        // Unmatched routes answer 200 alive, not 404
        .fallback(handlers::alive_handler)
        .layer(axum_middleware::from_fn_with_state(
            state.clone(),
            middleware::gateway_guard,
        ));

    Router::new()
        .route("/metrics", get(handlers::metrics_handler))
        .merge(guarded)
        .layer(CatchPanicLayer::custom(handle_panic))
        .layer(cors)
        .with_state(state)
}

// Panicking handlers answer a plain 500 envelope; the detail goes to the
// logs, never to the caller
fn handle_panic(err: Box<dyn StdAny + Send + 'static>) -> Response {
    let detail = if let Some(s) = err.downcast_ref::<String>() {
        s.clone()
    } else if let Some(s) = err.downcast_ref::<&str>() {
        (*s).to_string()
    } else {
        "unknown panic".to_string()
    };
    tracing::error!(detail = %detail, "request handler panicked");
    ApiError::Internal.into_response()
}

fn cors_layer(allowed_origin: &str) -> CorsLayer {
    let cors = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST])
        .allow_headers(Any);
    if allowed_origin == "*" {
        return cors.allow_origin(Any);
    }
    match allowed_origin.parse::<HeaderValue>() {
        Ok(origin) => cors.allow_origin(origin),
        Err(_) => {
            tracing::warn!(%allowed_origin, "unparseable ALLOWED_ORIGIN, allowing any origin");
            cors.allow_origin(Any)
        }
    }
}
