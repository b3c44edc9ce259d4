use clap::Parser;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tracing::Level;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

use wa_gateway::config::Args;
use wa_gateway::create_router;
use wa_gateway::state::AppState;

#[tokio::main]
async fn main() {
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(EnvFilter::from_default_env().add_directive(Level::INFO.into()))
        .init();

    // Parse cli arguments (env-var backed)
    let args = Args::parse();
    let port = args.port;

    // Creating shared state
    let state = Arc::new(AppState::new(args));

    // Spawn the bucket sweeper so idle client keys don't pin memory
    let sweeper_state = state.clone();
    let sweep_period = Duration::from_millis(state.config.rate_window_ms.max(1_000));
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(sweep_period);
        loop {
            interval.tick().await;
            sweeper_state.rate_limiter.sweep_expired();
        }
    });

    let app = create_router(state.clone());

    let addr = format!("0.0.0.0:{port}");
    let listener = match tokio::net::TcpListener::bind(&addr).await {
        Ok(listener) => listener,
        Err(err) => {
            tracing::error!(%addr, error = %err, "failed to bind");
            std::process::exit(1);
        }
    };

    tracing::info!(%addr, "gateway listening");
    tracing::info!(
        upstream = %state.config.graph_base_url,
        rate_limit = state.config.rate_max_requests,
        rate_window_ms = state.config.rate_window_ms,
        "forwarding to Graph API"
    );

    if let Err(err) = axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await
    {
        tracing::error!(error = %err, "server exited");
        std::process::exit(1);
    }
}
