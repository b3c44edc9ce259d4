use axum::{
    extract::{ConnectInfo, Request, State},
    http::{HeaderName, HeaderValue},
    middleware::Next,
    response::{IntoResponse, Response},
};
use std::net::SocketAddr;
use std::sync::Arc;

use crate::error::ApiError;
use crate::metrics::{RATE_LIMITED_TOTAL, REQUEST_TOTAL, UNAUTHORIZED_TOTAL};
use crate::state::AppState;

const HEADER_API_KEY: &str = "x-api-key";
const HEADER_LIMIT: &str = "x-ratelimit-limit";
const HEADER_REMAINING: &str = "x-ratelimit-remaining";

/// Authentication and rate limiting in front of every gateway route.
///
/// Auth runs first so rejected callers don't consume quota meant for
/// legitimate traffic. Every response, whatever the outcome, carries the
/// x-ratelimit-limit / x-ratelimit-remaining telemetry headers; 401s report
/// a peeked (non-counting) remaining value.
pub async fn gateway_guard(
    State(state): State<Arc<AppState>>,
    request: Request,
    next: Next,
) -> Response {
    REQUEST_TOTAL.inc();

    let path = request.uri().path().to_string();
    let presented = request
        .headers()
        .get(HEADER_API_KEY)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("")
        .to_string();
    let client_ip = extract_client_ip(&request);
    let client_key = format!("{presented}|{client_ip}");

    let expected = state.config.api_secret.as_deref().unwrap_or("");
    if expected.is_empty() || presented.is_empty() || presented != expected {
        UNAUTHORIZED_TOTAL.inc();
        // Unredacted on purpose: the log stream is where misconfigured
        // callers get diagnosed
        tracing::warn!(path = %path, attempted_key = %presented, "rejected request with invalid api key");
        let mut response = ApiError::Unauthorized.into_response();
        set_rate_headers(
            &mut response,
            state.rate_limiter.limit(),
            state.rate_limiter.peek(&client_key),
        );
        return response;
    }

    let decision = state.rate_limiter.check(&client_key);
    if !decision.allowed {
        RATE_LIMITED_TOTAL.inc();
        tracing::warn!(path = %path, client_ip = %client_ip, "rate limit exceeded");
        let mut response = ApiError::RateLimited.into_response();
        set_rate_headers(&mut response, state.rate_limiter.limit(), 0);
        return response;
    }

    let mut response = next.run(request).await;
    set_rate_headers(&mut response, state.rate_limiter.limit(), decision.remaining);
    response
}

fn set_rate_headers(response: &mut Response, limit: u32, remaining: u32) {
    let headers = response.headers_mut();
    headers.insert(
        HeaderName::from_static(HEADER_LIMIT),
        HeaderValue::from(limit),
    );
    headers.insert(
        HeaderName::from_static(HEADER_REMAINING),
        HeaderValue::from(remaining),
    );
}

// X-Forwarded-For first hop, then X-Real-IP, then the peer address
fn extract_client_ip(request: &Request) -> String {
    let headers = request.headers();

    if let Some(forwarded) = headers.get("x-forwarded-for").and_then(|v| v.to_str().ok()) {
        let first = forwarded.split(',').next().unwrap_or("").trim();
        if !first.is_empty() {
            return first.to_string();
        }
    }

    if let Some(real_ip) = headers.get("x-real-ip").and_then(|v| v.to_str().ok()) {
        let real_ip = real_ip.trim();
        if !real_ip.is_empty() {
            return real_ip.to_string();
        }
    }

    request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|info| info.0.ip().to_string())
        .unwrap_or_else(|| "unknown".to_string())
}
