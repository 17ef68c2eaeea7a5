//! Inbound progress callbacks from the mesh service.

use axum::body::Bytes;
use axum::extract::State;
use axum::http::StatusCode;

use spinelift_mesh_service::ProgressCallback;

use crate::state::AppState;

/// POST /api/v1/callbacks/progress
///
/// Always acknowledges with 204. The mesh service has nowhere to route
/// an error, so malformed bodies and unknown correlation ids are logged
/// and dropped rather than rejected. The body is taken as raw bytes and
/// parsed here: an extractor rejection would leak a 4xx back to the
/// service.
pub async fn progress(State(state): State<AppState>, body: Bytes) -> StatusCode {
    match serde_json::from_slice::<ProgressCallback>(&body) {
        Ok(payload) => state.orchestrator.handle_callback(payload).await,
        Err(e) => {
            tracing::warn!(error = %e, "Dropping malformed progress callback");
        }
    }
    StatusCode::NO_CONTENT
}
