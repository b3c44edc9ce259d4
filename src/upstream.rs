use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use rand::Rng;
use reqwest::Method;
use serde_json::{Value, json};
use std::time::Duration;

use crate::metrics::{UPSTREAM_LATENCY, UPSTREAM_RETRIES_TOTAL};

pub const GRAPH_API_VERSION: &str = "v19.0";
pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Final outcome of one upstream call (after internal retries). Handlers
/// pass status and body back to the caller verbatim.
#[derive(Debug, Clone)]
pub struct UpstreamResult {
    pub ok: bool,
    pub status: u16,
    pub body: Value,
}

impl IntoResponse for UpstreamResult {
    fn into_response(self) -> Response {
        let status =
            StatusCode::from_u16(self.status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        (status, Json(self.body)).into_response()
    }
}

/// HTTP client for the Graph API with bounded jittered-backoff retry.
pub struct GraphClient {
    http: reqwest::Client,
    base_url: String,
    access_token: Option<String>,
}

impl GraphClient {
    pub fn new(base_url: String, access_token: Option<String>) -> Self {
        Self {
            // Bounded per attempt so a hung upstream can't stall a handler
            http: reqwest::Client::builder()
                .timeout(REQUEST_TIMEOUT)
                .build()
                .expect("failed to build HTTP client"),
            base_url,
            access_token,
        }
    }

    pub async fn call(
        &self,
        method: Method,
        path: &str,
        query: &[(String, String)],
        body: Option<&Value>,
    ) -> UpstreamResult {
        self.call_with_attempts(method, path, query, body, DEFAULT_MAX_ATTEMPTS)
            .await
    }

    /// Issue `method {base}/{version}/{path}` with up to `max_attempts`
    /// tries. Network errors and 429/5xx statuses are transient and retried
    /// after a backoff; any other status returns immediately.
    pub async fn call_with_attempts(
        &self,
        method: Method,
        path: &str,
        query: &[(String, String)],
        body: Option<&Value>,
        max_attempts: u32,
    ) -> UpstreamResult {
        let url = format!("{}/{}/{}", self.base_url, GRAPH_API_VERSION, path);
        let max_attempts = max_attempts.max(1);
        let mut last_error = String::new();

        for attempt in 1..=max_attempts {
            let mut request = self.http.request(method.clone(), &url).query(query);
            if let Some(token) = &self.access_token {
                request = request.bearer_auth(token);
            }
            if let Some(body) = body {
                request = request.json(body);
            }

            let timer = UPSTREAM_LATENCY.start_timer();
            match request.send().await {
                Ok(response) => {
                    timer.observe_duration();
                    let status = response.status();
                    let transient = status.as_u16() == 429 || status.is_server_error();
                    let result = UpstreamResult {
                        ok: status.is_success(),
                        status: status.as_u16(),
                        body: read_body(response).await,
                    };

                    if !transient || attempt == max_attempts {
                        return result;
                    }

                    let delay = backoff_delay(attempt);
                    tracing::warn!(
                        %url,
                        status = status.as_u16(),
                        attempt,
                        backoff_ms = delay.as_millis() as u64,
                        "transient upstream status, retrying"
                    );
                    UPSTREAM_RETRIES_TOTAL.inc();
                    tokio::time::sleep(delay).await;
                }
                Err(err) => {
                    timer.observe_duration();
                    last_error = err.to_string();

                    if attempt == max_attempts {
                        tracing::error!(%url, attempt, error = %last_error, "upstream call failed, attempts exhausted");
                        break;
                    }

                    let delay = backoff_delay(attempt);
                    tracing::warn!(
                        %url,
                        attempt,
                        backoff_ms = delay.as_millis() as u64,
                        error = %last_error,
                        "upstream call failed, retrying"
                    );
                    UPSTREAM_RETRIES_TOTAL.inc();
                    tokio::time::sleep(delay).await;
                }
            }
        }

        UpstreamResult {
            ok: false,
            status: 500,
            body: json!({ "error": "fetch failed", "detail": last_error }),
        }
    }
}

// Upstream bodies are JSON in practice; anything else passes through as text
async fn read_body(response: reqwest::Response) -> Value {
    let text = response.text().await.unwrap_or_default();
    serde_json::from_str(&text).unwrap_or(Value::String(text))
}

/// Deterministic backoff base: 2^attempt * 100ms.
pub fn backoff_base(attempt: u32) -> Duration {
    Duration::from_millis(2u64.saturating_pow(attempt).saturating_mul(100))
}

fn backoff_delay(attempt: u32) -> Duration {
    backoff_base(attempt) + Duration::from_millis(rand::thread_rng().gen_range(0..100))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{Router, extract::State, routing::get};
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn backoff_base_is_monotonic() {
        assert_eq!(backoff_base(1), Duration::from_millis(200));
        assert_eq!(backoff_base(2), Duration::from_millis(400));
        assert_eq!(backoff_base(3), Duration::from_millis(800));
        for attempt in 1..10 {
            assert!(backoff_base(attempt + 1) > backoff_base(attempt));
        }
    }

    #[test]
    fn jitter_stays_within_100ms_of_base() {
        for attempt in 1..5 {
            let delay = backoff_delay(attempt);
            let base = backoff_base(attempt);
            assert!(delay >= base);
            assert!(delay < base + Duration::from_millis(100));
        }
    }

    async fn spawn_stub<H, T>(handler: H) -> String
    where
        H: axum::handler::Handler<T, ()>,
        T: 'static,
    {
        let app = Router::new().route("/{version}/{path}", get(handler));
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://{addr}")
    }

    #[tokio::test]
    async fn recovers_after_transient_5xx() {
        let calls = Arc::new(AtomicUsize::new(0));
        let calls_seen = calls.clone();

        let app = Router::new()
            .route(
                "/{version}/{path}",
                get(
                    |State(calls): State<Arc<AtomicUsize>>| async move {
                        match calls.fetch_add(1, Ordering::SeqCst) {
                            0 | 1 => (StatusCode::SERVICE_UNAVAILABLE, "overloaded").into_response(),
                            _ => (StatusCode::OK, axum::Json(json!({"data": []}))).into_response(),
                        }
                    },
                ),
            )
            .with_state(calls);
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        let client = GraphClient::new(format!("http://{addr}"), Some("token".into()));
        let result = client
            .call(Method::GET, "thing", &[], None)
            .await;

        assert!(result.ok);
        assert_eq!(result.status, 200);
        assert_eq!(result.body, json!({"data": []}));
        assert_eq!(calls_seen.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn non_transient_4xx_is_not_retried() {
        let calls = Arc::new(AtomicUsize::new(0));
        let calls_seen = calls.clone();

        let app = Router::new()
            .route(
                "/{version}/{path}",
                get(
                    |State(calls): State<Arc<AtomicUsize>>| async move {
                        calls.fetch_add(1, Ordering::SeqCst);
                        (
                            StatusCode::NOT_FOUND,
                            axum::Json(json!({"error": {"message": "no such object"}})),
                        )
                    },
                ),
            )
            .with_state(calls);
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        let client = GraphClient::new(format!("http://{addr}"), Some("token".into()));
        let result = client
            .call(Method::GET, "missing", &[], None)
            .await;

        assert!(!result.ok);
        assert_eq!(result.status, 404);
        assert_eq!(result.body["error"]["message"], "no such object");
        assert_eq!(calls_seen.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn exhausted_connection_errors_yield_synthetic_500() {
        // Nothing is listening on this port
        let client = GraphClient::new("http://127.0.0.1:1".to_string(), None);
        let result = client
            .call_with_attempts(Method::GET, "thing", &[], None, 2)
            .await;

        assert!(!result.ok);
        assert_eq!(result.status, 500);
        assert_eq!(result.body["error"], "fetch failed");
        assert!(result.body["detail"].as_str().is_some_and(|d| !d.is_empty()));
    }

    #[tokio::test]
    async fn non_json_body_passes_through_as_text() {
        async fn plain() -> (StatusCode, &'static str) {
            (StatusCode::OK, "plain text response")
        }
        let base = spawn_stub(plain).await;

        let client = GraphClient::new(base, None);
        let result = client.call(Method::GET, "thing", &[], None).await;

        assert!(result.ok);
        assert_eq!(result.body, Value::String("plain text response".into()));
    }
}
