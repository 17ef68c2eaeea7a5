use std::sync::Arc;

use spinelift_events::ProgressBus;
use spinelift_pipeline::PipelineOrchestrator;

use crate::config::ServerConfig;

/// Shared application state available to all Axum handlers via `State<AppState>`.
///
/// This is cheaply cloneable (inner data is behind `Arc` or is already `Clone`).
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool.
    pub pool: spinelift_db::DbPool,
    /// Server configuration.
    pub config: Arc<ServerConfig>,
    /// Per-project progress fan-out for WebSocket subscribers.
    pub progress_bus: Arc<ProgressBus>,
    /// Pipeline entry points shared with the background dispatcher.
    pub orchestrator: Arc<PipelineOrchestrator>,
}
