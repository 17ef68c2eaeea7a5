//! Project entity models and DTOs.
//!
//! A project is the top-level trackable unit of processing: one
//! uploaded PSD artifact, decomposed into layers by the mesh service.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use spinelift_core::types::{DbId, Timestamp};

use super::processing_log::ProcessingLog;
use super::status::StatusId;

/// A row from the `projects` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Project {
    pub id: DbId,
    pub name: String,
    /// Reference to the uploaded PSD artifact (path on shared storage).
    pub psd_file: String,
    pub status_id: StatusId,
    /// Number of layers found by extraction. 0 until extraction returns.
    pub total_layers: i32,
    /// Number of layers whose mesh generation has finished.
    pub completed_layers: i32,
    /// Present iff the project is in `failed` status.
    pub error_message: Option<String>,
    pub started_at: Option<Timestamp>,
    pub completed_at: Option<Timestamp>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// DTO for submitting a new project via `POST /api/v1/projects`.
#[derive(Debug, Deserialize, validator::Validate)]
pub struct SubmitProject {
    #[validate(length(min = 1, max = 255, message = "name must be 1-255 characters"))]
    pub name: String,
    /// Path to the PSD artifact to process.
    #[validate(length(min = 1, message = "psd_file must not be empty"))]
    pub psd_file: String,
}

/// Response body for `GET /api/v1/projects/{id}/status`.
#[derive(Debug, Serialize)]
pub struct ProjectStatusResponse {
    pub id: DbId,
    /// Lowercase status label (`pending`, `processing`, ...).
    pub status: &'static str,
    /// Integer completion percentage in `0..=100`.
    pub progress: i16,
    pub total_layers: i32,
    pub completed_layers: i32,
    pub started_at: Option<Timestamp>,
    pub completed_at: Option<Timestamp>,
    pub error_message: Option<String>,
    /// Most recent log entries, newest first, bounded.
    pub recent_logs: Vec<ProcessingLog>,
}
