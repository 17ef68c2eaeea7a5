//! Handlers for the `/projects` resource.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;
use validator::Validate;

use spinelift_core::error::CoreError;
use spinelift_core::progress::percent;
use spinelift_core::types::DbId;
use spinelift_db::models::layer::Layer;
use spinelift_db::models::project::{Project, ProjectStatusResponse, SubmitProject};
use spinelift_db::models::status::ProjectStatus;
use spinelift_db::repositories::{LayerRepo, ProcessingLogRepo, ProjectRepo};

use crate::error::{AppError, AppResult};
use crate::response::DataResponse;
use crate::state::AppState;

/// How many recent log entries the status endpoint returns.
const STATUS_LOG_LIMIT: i64 = 20;

/// Pagination query parameters for project listing.
#[derive(Debug, Deserialize)]
pub struct ListQuery {
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

/// Verify that a project exists, returning the full row.
async fn ensure_project_exists(pool: &sqlx::PgPool, id: DbId) -> AppResult<Project> {
    ProjectRepo::find_by_id(pool, id)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "Project",
            id,
        }))
}

/// POST /api/v1/projects
///
/// Registers a PSD artifact for processing. The project starts in
/// `pending`; the background dispatcher picks it up.
pub async fn submit(
    State(state): State<AppState>,
    Json(input): Json<SubmitProject>,
) -> AppResult<(StatusCode, Json<DataResponse<Project>>)> {
    input
        .validate()
        .map_err(|e| AppError::BadRequest(e.to_string()))?;

    let exists = tokio::fs::try_exists(&input.psd_file).await.unwrap_or(false);
    if !exists {
        return Err(AppError::BadRequest(format!(
            "PSD artifact not found: {}",
            input.psd_file
        )));
    }

    let project = ProjectRepo::create(&state.pool, &input).await?;
    tracing::info!(project_id = project.id, name = %project.name, "Project submitted");
    Ok((StatusCode::CREATED, Json(DataResponse { data: project })))
}

/// GET /api/v1/projects
pub async fn list(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> AppResult<Json<DataResponse<Vec<Project>>>> {
    let projects = ProjectRepo::list(&state.pool, query.limit, query.offset).await?;
    Ok(Json(DataResponse { data: projects }))
}

/// GET /api/v1/projects/{id}
pub async fn get_by_id(
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<Json<DataResponse<Project>>> {
    let project = ensure_project_exists(&state.pool, id).await?;
    Ok(Json(DataResponse { data: project }))
}

/// GET /api/v1/projects/{id}/status
///
/// Polling counterpart of the WebSocket stream: status label, computed
/// percentage, counters, and the most recent log entries.
pub async fn status(
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<Json<DataResponse<ProjectStatusResponse>>> {
    let project = ensure_project_exists(&state.pool, id).await?;
    let status = ProjectStatus::from_id(project.status_id).ok_or_else(|| {
        AppError::InternalError(format!("Unknown project status id {}", project.status_id))
    })?;
    let recent_logs = ProcessingLogRepo::recent(&state.pool, id, STATUS_LOG_LIMIT).await?;

    let response = ProjectStatusResponse {
        id: project.id,
        status: status.as_str(),
        progress: percent(project.completed_layers, project.total_layers),
        total_layers: project.total_layers,
        completed_layers: project.completed_layers,
        started_at: project.started_at,
        completed_at: project.completed_at,
        error_message: project.error_message,
        recent_logs,
    };
    Ok(Json(DataResponse { data: response }))
}

/// POST /api/v1/projects/{id}/cancel
///
/// 409 when the project is already terminal.
pub async fn cancel(
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<Json<DataResponse<Project>>> {
    let project = state.orchestrator.cancel(id).await?;
    Ok(Json(DataResponse { data: project }))
}

/// DELETE /api/v1/projects/{id}
pub async fn delete(State(state): State<AppState>, Path(id): Path<DbId>) -> AppResult<StatusCode> {
    let deleted = ProjectRepo::delete(&state.pool, id).await?;
    if deleted {
        tracing::info!(project_id = id, "Project deleted");
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(AppError::Core(CoreError::NotFound {
            entity: "Project",
            id,
        }))
    }
}

/// GET /api/v1/projects/{id}/layers
pub async fn list_layers(
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<Json<DataResponse<Vec<Layer>>>> {
    ensure_project_exists(&state.pool, id).await?;
    let layers = LayerRepo::list_by_project(&state.pool, id).await?;
    Ok(Json(DataResponse { data: layers }))
}
