//! Repository for the `layers` table.

use sqlx::PgPool;
use spinelift_core::types::DbId;
use uuid::Uuid;

use crate::models::layer::{Layer, NewLayer};
use crate::models::status::{LayerStatus, ProjectStatus};

/// Column list for `layers` queries.
const COLUMNS: &str = "\
    id, project_id, correlation_id, name, position, x, y, width, height, \
    opacity, blend_mode, image_data, metadata, status_id, created_at, updated_at";

/// Provides CRUD operations for project layers.
pub struct LayerRepo;

impl LayerRepo {
    /// Insert all extracted layers and the parent's layer total in one
    /// transaction.
    ///
    /// Each layer receives a fresh correlation id. All-or-nothing: an
    /// insert failure rolls the transaction back so a failed extraction
    /// never leaves partial layers (or a stale `total_layers`) behind.
    /// The total update is guarded by `processing`; `None` means the
    /// project was cancelled mid-extraction and nothing was written.
    pub async fn create_all(
        pool: &PgPool,
        project_id: DbId,
        layers: &[NewLayer],
    ) -> Result<Option<Vec<Layer>>, sqlx::Error> {
        let mut tx = pool.begin().await?;

        let result = sqlx::query(
            "UPDATE projects \
             SET total_layers = $2, updated_at = NOW() \
             WHERE id = $1 AND status_id = $3",
        )
        .bind(project_id)
        .bind(layers.len() as i32)
        .bind(ProjectStatus::Processing.id())
        .execute(&mut *tx)
        .await?;
        if result.rows_affected() == 0 {
            return Ok(None);
        }

        let mut created = Vec::with_capacity(layers.len());

        for layer in layers {
            let query = format!(
                "INSERT INTO layers \
                     (project_id, correlation_id, name, position, x, y, width, height, \
                      opacity, blend_mode, image_data, metadata, status_id) \
                 VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13) \
                 RETURNING {COLUMNS}"
            );
            let row = sqlx::query_as::<_, Layer>(&query)
                .bind(project_id)
                .bind(Uuid::new_v4())
                .bind(&layer.name)
                .bind(layer.position)
                .bind(layer.x)
                .bind(layer.y)
                .bind(layer.width)
                .bind(layer.height)
                .bind(layer.opacity)
                .bind(&layer.blend_mode)
                .bind(&layer.image_data)
                .bind(&layer.metadata)
                .bind(LayerStatus::Pending.id())
                .fetch_one(&mut *tx)
                .await?;
            created.push(row);
        }

        tx.commit().await?;
        Ok(Some(created))
    }

    /// Replace one layer's correlation id with a fresh one, returning it.
    ///
    /// Used when regeneration is dispatched: callbacks for any earlier
    /// dispatch of this layer stop resolving from this point on.
    pub async fn rotate_correlation(
        pool: &PgPool,
        id: DbId,
    ) -> Result<Option<Uuid>, sqlx::Error> {
        sqlx::query_scalar::<_, Uuid>(
            "UPDATE layers \
             SET correlation_id = gen_random_uuid(), updated_at = NOW() \
             WHERE id = $1 \
             RETURNING correlation_id",
        )
        .bind(id)
        .fetch_optional(pool)
        .await
    }

    /// Replace the correlation ids of all of a project's layers.
    ///
    /// Called when the project reaches a terminal status: every callback
    /// still in flight for the old ids then fails to resolve and is
    /// dropped at the boundary.
    pub async fn invalidate_correlations(
        pool: &PgPool,
        project_id: DbId,
    ) -> Result<u64, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE layers \
             SET correlation_id = gen_random_uuid(), updated_at = NOW() \
             WHERE project_id = $1",
        )
        .bind(project_id)
        .execute(pool)
        .await?;
        Ok(result.rows_affected())
    }

    /// Find a layer by its ID.
    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<Layer>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM layers WHERE id = $1");
        sqlx::query_as::<_, Layer>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Resolve an inbound callback's correlation id to a layer.
    ///
    /// `None` means the callback refers to cancelled, deleted, or
    /// simply unknown work and must be dropped by the caller.
    pub async fn find_by_correlation(
        pool: &PgPool,
        correlation_id: Uuid,
    ) -> Result<Option<Layer>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM layers WHERE correlation_id = $1");
        sqlx::query_as::<_, Layer>(&query)
            .bind(correlation_id)
            .fetch_optional(pool)
            .await
    }

    /// List a project's layers ordered by z-position.
    pub async fn list_by_project(
        pool: &PgPool,
        project_id: DbId,
    ) -> Result<Vec<Layer>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM layers WHERE project_id = $1 ORDER BY position ASC"
        );
        sqlx::query_as::<_, Layer>(&query)
            .bind(project_id)
            .fetch_all(pool)
            .await
    }

    /// Advance `pending -> processing` when mesh generation is dispatched.
    pub async fn mark_processing(pool: &PgPool, id: DbId) -> Result<bool, sqlx::Error> {
        Self::transition(pool, id, LayerStatus::Processing, &[LayerStatus::Pending]).await
    }

    /// Advance `processing -> completed` when the mesh result arrives.
    pub async fn mark_completed(pool: &PgPool, id: DbId) -> Result<bool, sqlx::Error> {
        Self::transition(pool, id, LayerStatus::Completed, &[LayerStatus::Processing]).await
    }

    /// Advance to `failed` from any non-terminal status.
    pub async fn mark_failed(pool: &PgPool, id: DbId) -> Result<bool, sqlx::Error> {
        Self::transition(
            pool,
            id,
            LayerStatus::Failed,
            &[LayerStatus::Pending, LayerStatus::Processing],
        )
        .await
    }

    /// Guarded status transition mirroring `LayerStatus::can_transition_to`.
    async fn transition(
        pool: &PgPool,
        id: DbId,
        to: LayerStatus,
        from: &[LayerStatus],
    ) -> Result<bool, sqlx::Error> {
        let from_ids: Vec<i16> = from.iter().map(|s| s.id()).collect();
        let result = sqlx::query(
            "UPDATE layers \
             SET status_id = $2, updated_at = NOW() \
             WHERE id = $1 AND status_id = ANY($3)",
        )
        .bind(id)
        .bind(to.id())
        .bind(&from_ids)
        .execute(pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }
}
