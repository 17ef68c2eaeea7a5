//! Processing log entity model.

use serde::Serialize;
use sqlx::FromRow;
use spinelift_core::types::{DbId, Timestamp};

use super::status::StatusId;

/// A row from the `processing_logs` table.
///
/// Append-only: entries are never mutated or deleted individually, only
/// cascade-deleted with their project.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct ProcessingLog {
    pub id: DbId,
    pub project_id: DbId,
    /// Free-form step label, e.g. `layer_extraction`.
    pub step: String,
    pub status_id: StatusId,
    pub message: Option<String>,
    pub metadata: serde_json::Value,
    pub created_at: Timestamp,
}
