//! Repository for the `projects` table.
//!
//! Uses `ProjectStatus` from `models::status` for all status
//! transitions. No magic numbers; every status literal is a named
//! constant, and every transition repeats the state-machine guard in
//! its WHERE clause.

use sqlx::PgPool;
use spinelift_core::types::DbId;

use crate::models::project::{Project, SubmitProject};
use crate::models::status::ProjectStatus;

/// Column list for `projects` queries.
const COLUMNS: &str = "\
    id, name, psd_file, status_id, total_layers, completed_layers, \
    error_message, started_at, completed_at, created_at, updated_at";

/// Maximum page size for project listing.
const MAX_LIMIT: i64 = 100;

/// Default page size for project listing.
const DEFAULT_LIMIT: i64 = 50;

/// Provides CRUD and lifecycle operations for projects.
pub struct ProjectRepo;

impl ProjectRepo {
    /// Create a new project in `pending` status.
    pub async fn create(pool: &PgPool, input: &SubmitProject) -> Result<Project, sqlx::Error> {
        let query = format!(
            "INSERT INTO projects (name, psd_file, status_id) \
             VALUES ($1, $2, $3) \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Project>(&query)
            .bind(&input.name)
            .bind(&input.psd_file)
            .bind(ProjectStatus::Pending.id())
            .fetch_one(pool)
            .await
    }

    /// Find a project by its ID.
    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<Project>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM projects WHERE id = $1");
        sqlx::query_as::<_, Project>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// List projects, newest first, with pagination.
    pub async fn list(
        pool: &PgPool,
        limit: Option<i64>,
        offset: Option<i64>,
    ) -> Result<Vec<Project>, sqlx::Error> {
        let limit = limit.unwrap_or(DEFAULT_LIMIT).min(MAX_LIMIT);
        let offset = offset.unwrap_or(0);
        let query = format!(
            "SELECT {COLUMNS} FROM projects ORDER BY created_at DESC LIMIT $1 OFFSET $2"
        );
        sqlx::query_as::<_, Project>(&query)
            .bind(limit)
            .bind(offset)
            .fetch_all(pool)
            .await
    }

    /// Atomically claim the oldest pending project for processing.
    ///
    /// This is the `pending -> processing` transition: sets
    /// `started_at`, resets the progress counters, and uses
    /// `SELECT FOR UPDATE SKIP LOCKED` so concurrent dispatcher
    /// instances never double-claim the same project.
    pub async fn claim_next(pool: &PgPool) -> Result<Option<Project>, sqlx::Error> {
        let query = format!(
            "UPDATE projects \
             SET status_id = $1, started_at = NOW(), \
                 total_layers = 0, completed_layers = 0, \
                 error_message = NULL, updated_at = NOW() \
             WHERE id = ( \
                 SELECT id FROM projects \
                 WHERE status_id = $2 \
                 ORDER BY created_at ASC \
                 LIMIT 1 \
                 FOR UPDATE SKIP LOCKED \
             ) \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Project>(&query)
            .bind(ProjectStatus::Processing.id())
            .bind(ProjectStatus::Pending.id())
            .fetch_optional(pool)
            .await
    }

    /// Apply a cumulative progress report, clamped to stay monotonic.
    ///
    /// `completed_layers` becomes
    /// `GREATEST(completed_layers, LEAST(reported, total_layers))` in a
    /// single statement, so duplicated or reordered callbacks can never
    /// move the counter backwards and concurrent reports for different
    /// projects cannot interfere. The SQL mirrors
    /// `spinelift_core::progress::clamp_completed`, which documents and
    /// tests the clamp in isolation. Returns the updated row, or `None` if
    /// the project is no longer `processing` (cancellation race: the
    /// caller drops the callback).
    pub async fn record_progress(
        pool: &PgPool,
        id: DbId,
        reported: i32,
    ) -> Result<Option<Project>, sqlx::Error> {
        let query = format!(
            "UPDATE projects \
             SET completed_layers = GREATEST(completed_layers, LEAST(GREATEST($2, 0), total_layers)), \
                 updated_at = NOW() \
             WHERE id = $1 AND status_id = $3 \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Project>(&query)
            .bind(id)
            .bind(reported)
            .bind(ProjectStatus::Processing.id())
            .fetch_optional(pool)
            .await
    }

    /// Transition `processing -> completed`, setting `completed_at` once.
    pub async fn complete(pool: &PgPool, id: DbId) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE projects \
             SET status_id = $2, completed_at = NOW(), updated_at = NOW() \
             WHERE id = $1 AND status_id = $3",
        )
        .bind(id)
        .bind(ProjectStatus::Completed.id())
        .bind(ProjectStatus::Processing.id())
        .execute(pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Transition `processing -> failed` with a descriptive message.
    ///
    /// Returns `false` (leaving the row unchanged) when the project is
    /// not in `processing` — e.g. an error callback racing a
    /// cancellation.
    pub async fn fail(pool: &PgPool, id: DbId, error: &str) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE projects \
             SET status_id = $2, error_message = $3, completed_at = NOW(), updated_at = NOW() \
             WHERE id = $1 AND status_id = $4",
        )
        .bind(id)
        .bind(ProjectStatus::Failed.id())
        .bind(error)
        .bind(ProjectStatus::Processing.id())
        .execute(pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Cancel a project while it is still `pending` or `processing`.
    ///
    /// Optimistic: the external computation is not preempted, but the
    /// status guards drop all of its later callbacks. Returns the
    /// updated row, or `None` if the project was already terminal.
    pub async fn cancel(pool: &PgPool, id: DbId) -> Result<Option<Project>, sqlx::Error> {
        let query = format!(
            "UPDATE projects \
             SET status_id = $2, completed_at = NOW(), updated_at = NOW() \
             WHERE id = $1 AND status_id IN ($3, $4) \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Project>(&query)
            .bind(id)
            .bind(ProjectStatus::Cancelled.id())
            .bind(ProjectStatus::Pending.id())
            .bind(ProjectStatus::Processing.id())
            .fetch_optional(pool)
            .await
    }

    /// Delete a project. Layers, meshes, and logs cascade.
    pub async fn delete(pool: &PgPool, id: DbId) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM projects WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
