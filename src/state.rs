use std::time::Duration;

use crate::config::Args;
use crate::rate_limit::RateLimiter;
use crate::upstream::GraphClient;

// App's shared state, one per process
pub struct AppState {
    pub config: Args,
    pub upstream: GraphClient,
    pub rate_limiter: RateLimiter,
}

impl AppState {
    pub fn new(config: Args) -> Self {
        let upstream = GraphClient::new(
            config.graph_base_url.clone(),
            config.access_token.clone(),
        );
        let rate_limiter = RateLimiter::new(
            config.rate_max_requests,
            Duration::from_millis(config.rate_window_ms),
        );
        Self {
            config,
            upstream,
            rate_limiter,
        }
    }
}
