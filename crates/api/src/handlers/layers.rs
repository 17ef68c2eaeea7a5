//! Handlers for layer-scoped operations.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;
use serde_json::json;

use spinelift_core::error::CoreError;
use spinelift_core::types::DbId;
use spinelift_db::repositories::LayerRepo;
use spinelift_mesh_service::MeshParameters;

use crate::error::{AppError, AppResult};
use crate::response::DataResponse;
use crate::state::AppState;

/// Request body for mesh regeneration. Omitted parameters fall back to
/// the service defaults.
#[derive(Debug, Default, Deserialize)]
pub struct RegenerateRequest {
    #[serde(default)]
    pub parameters: Option<MeshParameters>,
}

/// POST /api/v1/projects/{id}/layers/{layer_id}/regenerate
///
/// Re-dispatches mesh generation for one layer with new parameters.
/// Returns 202: the replacement mesh arrives later via callback and
/// does not disturb the parent project's status.
pub async fn regenerate(
    State(state): State<AppState>,
    Path((project_id, layer_id)): Path<(DbId, DbId)>,
    body: Option<Json<RegenerateRequest>>,
) -> AppResult<(StatusCode, Json<DataResponse<serde_json::Value>>)> {
    let layer = LayerRepo::find_by_id(&state.pool, layer_id)
        .await?
        .filter(|l| l.project_id == project_id)
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "Layer",
            id: layer_id,
        }))?;

    let parameters = body
        .and_then(|Json(req)| req.parameters)
        .unwrap_or_default();

    state.orchestrator.regenerate_mesh(&layer, parameters).await?;

    Ok((
        StatusCode::ACCEPTED,
        Json(DataResponse {
            data: json!({
                "layer_id": layer.id,
                "status": "dispatched",
            }),
        }),
    ))
}
