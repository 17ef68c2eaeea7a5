//! Layer entity models.

use serde::Serialize;
use sqlx::FromRow;
use spinelift_core::types::{DbId, Timestamp};
use uuid::Uuid;

use super::status::StatusId;

/// A row from the `layers` table: one analyzable layer of a project.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Layer {
    pub id: DbId,
    pub project_id: DbId,
    /// Opaque token linking asynchronous mesh-service callbacks back to
    /// this layer. Unknown correlation ids are dropped at the boundary.
    pub correlation_id: Uuid,
    pub name: String,
    /// Z-order position within the PSD.
    pub position: i32,
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
    pub opacity: f64,
    pub blend_mode: String,
    /// Base64 PNG raster from extraction, kept so a mesh can be
    /// regenerated without re-parsing the PSD. Excluded from API
    /// responses.
    #[serde(skip_serializing)]
    pub image_data: String,
    /// Free-form extraction metadata (visibility, mask flags, ...).
    pub metadata: serde_json::Value,
    pub status_id: StatusId,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// Values for inserting a layer after a successful extraction.
///
/// Populated once from the extraction result; immutable afterwards
/// except through explicit mesh regeneration.
#[derive(Debug, Clone)]
pub struct NewLayer {
    pub name: String,
    pub position: i32,
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
    pub opacity: f64,
    pub blend_mode: String,
    pub image_data: String,
    pub metadata: serde_json::Value,
}
