//! Shared fixtures for API integration tests.

use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;

use spinelift_api::config::ServerConfig;
use spinelift_api::routes;
use spinelift_api::state::AppState;
use spinelift_events::ProgressBus;
use spinelift_mesh_service::MeshServiceClient;
use spinelift_pipeline::{PipelineOrchestrator, RetryConfig};

pub fn test_config() -> ServerConfig {
    ServerConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        cors_origins: vec![],
        request_timeout_secs: 5,
        shutdown_timeout_secs: 5,
        mesh_service_url: "http://127.0.0.1:1".to_string(),
        callback_base_url: "http://127.0.0.1:3000".to_string(),
        max_concurrent_pipelines: 1,
    }
}

/// Build the application router the way `main` does, minus middleware.
pub fn build_test_app(pool: PgPool) -> Router {
    let config = Arc::new(test_config());
    let progress_bus = Arc::new(ProgressBus::default());
    let mesh_client = Arc::new(MeshServiceClient::new(config.mesh_service_url.clone()));
    let orchestrator = Arc::new(PipelineOrchestrator::new(
        pool.clone(),
        Arc::clone(&progress_bus),
        mesh_client,
        RetryConfig::default(),
        config.callback_url(),
    ));
    let state = AppState {
        pool,
        config,
        progress_bus,
        orchestrator,
    };
    Router::new()
        .merge(routes::health::router())
        .nest("/api/v1", routes::api_routes())
        .with_state(state)
}

/// A pool whose connections can never be established: handlers that
/// must not surface database failures are exercised against it.
pub fn unreachable_pool() -> PgPool {
    PgPoolOptions::new()
        .acquire_timeout(Duration::from_millis(100))
        .connect_lazy("postgres://spinelift@127.0.0.1:1/spinelift_test")
        .unwrap()
}
