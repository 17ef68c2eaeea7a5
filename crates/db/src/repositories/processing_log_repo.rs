//! Repository for the append-only `processing_logs` table.

use sqlx::PgPool;
use spinelift_core::types::DbId;

use crate::models::processing_log::ProcessingLog;
use crate::models::status::LogStatus;

/// Column list for `processing_logs` queries.
const COLUMNS: &str = "id, project_id, step, status_id, message, metadata, created_at";

/// Hard ceiling on a recent-log query.
const MAX_RECENT: i64 = 100;

/// Appends and reads processing log entries. Entries are never updated
/// or deleted individually; they go away with their project.
pub struct ProcessingLogRepo;

impl ProcessingLogRepo {
    /// Append one log entry.
    pub async fn append(
        pool: &PgPool,
        project_id: DbId,
        step: &str,
        status: LogStatus,
        message: Option<&str>,
        metadata: serde_json::Value,
    ) -> Result<ProcessingLog, sqlx::Error> {
        let query = format!(
            "INSERT INTO processing_logs (project_id, step, status_id, message, metadata) \
             VALUES ($1, $2, $3, $4, $5) \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, ProcessingLog>(&query)
            .bind(project_id)
            .bind(step)
            .bind(status.id())
            .bind(message)
            .bind(metadata)
            .fetch_one(pool)
            .await
    }

    /// The most recent entries for a project, newest first.
    pub async fn recent(
        pool: &PgPool,
        project_id: DbId,
        limit: i64,
    ) -> Result<Vec<ProcessingLog>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM processing_logs \
             WHERE project_id = $1 \
             ORDER BY created_at DESC, id DESC \
             LIMIT $2"
        );
        sqlx::query_as::<_, ProcessingLog>(&query)
            .bind(project_id)
            .bind(limit.clamp(1, MAX_RECENT))
            .fetch_all(pool)
            .await
    }
}
