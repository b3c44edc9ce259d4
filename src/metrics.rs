use lazy_static::lazy_static;
use prometheus::{Counter, Histogram, register_counter, register_histogram};

lazy_static! {
    pub static ref REQUEST_TOTAL: Counter =
        register_counter!("wa_gateway_requests_total", "Total number of requests").unwrap();
    pub static ref UNAUTHORIZED_TOTAL: Counter = register_counter!(
        "wa_gateway_unauthorized_total",
        "Requests rejected for a missing or wrong api key"
    )
    .unwrap();
    pub static ref RATE_LIMITED_TOTAL: Counter = register_counter!(
        "wa_gateway_rate_limited_total",
        "Requests rejected by the rate limiter"
    )
    .unwrap();
    pub static ref UPSTREAM_RETRIES_TOTAL: Counter = register_counter!(
        "wa_gateway_upstream_retries_total",
        "Upstream calls retried after a transient failure"
    )
    .unwrap();
    pub static ref UPSTREAM_LATENCY: Histogram = register_histogram!(
        "wa_gateway_upstream_latency_seconds",
        "Graph API call latency in seconds, per attempt"
    )
    .unwrap();
}
