pub mod handlers;
pub mod types;

use crate::{Result, config::ServerConfig, worker::Worker};
use axum::{
    Router,
    extract::DefaultBodyLimit,
    routing::{get, post},
};
use std::{net::SocketAddr, sync::Arc};
use tower::limit::GlobalConcurrencyLimitLayer;
use tower_http::trace::TraceLayer;
use tracing::info;

/// Jobs are delivered to the worker one at a time.
const IN_FLIGHT_JOBS: usize = 1;

pub fn router(worker: Arc<Worker>, max_body_bytes: usize) -> Router {
    let app_state = handlers::AppState { worker };

    let jobs = Router::new()
        .route("/run", post(handlers::run_job))
        .route("/runsync", post(handlers::run_job))
        .route("/score", post(handlers::score))
        .layer(GlobalConcurrencyLimitLayer::new(IN_FLIGHT_JOBS));

    Router::new()
        .route("/health", get(handlers::health))
        .merge(jobs)
        .layer(DefaultBodyLimit::max(max_body_bytes))
        .layer(TraceLayer::new_for_http())
        .with_state(app_state)
}

pub async fn run(config: ServerConfig, worker: Worker) -> Result<()> {
    let app = router(Arc::new(worker), config.max_body_bytes);

    let addr = SocketAddr::new(config.host.parse()?, config.port);

    info!("Starting server on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
