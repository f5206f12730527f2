use std::sync::Arc;

use tracing_subscriber::EnvFilter;

use offer_dispatch::api;
use offer_dispatch::config::Config;
use offer_dispatch::engine::source::RotatingOfferSource;
use offer_dispatch::error::AppError;
use offer_dispatch::state::AppState;

#[tokio::main]
async fn main() -> Result<(), AppError> {
    let config = Config::from_env()?;

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(config.log_level.clone()))
        .with_target(false)
        .compact()
        .init();

    let source = Arc::new(RotatingOfferSource::with_default_catalog(
        config.dispatch.offer_ttl,
    ));
    let shared_state = Arc::new(AppState::new(
        source,
        config.dispatch,
        config.event_buffer_size,
    ));

    let app = api::rest::router(shared_state.clone());

    let bind_addr = format!("0.0.0.0:{}", config.http_port);
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .map_err(|err| AppError::Internal(format!("failed to bind {bind_addr}: {err}")))?;

    tracing::info!(
        http_port = config.http_port,
        poll_secs = config.dispatch.poll_period.as_secs(),
        offer_ttl_secs = config.dispatch.offer_ttl.as_secs(),
        "http server started"
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|err| AppError::Internal(format!("server error: {err}")))?;

    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %err, "failed to listen for shutdown signal");
    }
}
