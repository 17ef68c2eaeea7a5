//! Mesh artifact entity model.

use serde::Serialize;
use sqlx::FromRow;
use spinelift_core::types::{DbId, Timestamp};

/// A row from the `meshes` table: the computed geometry for one layer.
///
/// A layer owns at most one mesh (`uq_meshes_layer_id`); regeneration
/// replaces the whole row atomically via an upsert, never partially.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Mesh {
    pub id: DbId,
    pub layer_id: DbId,
    /// Ordered 2-D points, stored as a JSON array of `[x, y]` pairs.
    pub vertices: serde_json::Value,
    /// Index triples into `vertices`.
    pub triangles: serde_json::Value,
    /// Texture coordinates, one per vertex.
    pub uvs: serde_json::Value,
    /// The generation parameters that produced this mesh, kept for
    /// reproducibility and debugging.
    pub parameters: serde_json::Value,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}
