//! Repository for the `meshes` table.

use sqlx::PgPool;
use spinelift_core::mesh_geometry::MeshGeometry;
use spinelift_core::types::DbId;

use crate::models::mesh::Mesh;

/// Column list for `meshes` queries.
const COLUMNS: &str =
    "id, layer_id, vertices, triangles, uvs, parameters, created_at, updated_at";

/// Provides persistence for per-layer mesh artifacts.
pub struct MeshRepo;

impl MeshRepo {
    /// Atomically replace a layer's mesh.
    ///
    /// A single `INSERT ... ON CONFLICT (layer_id) DO UPDATE` statement:
    /// readers observe either the previous mesh or the new one, never a
    /// partially overwritten row. The caller validates `geometry`
    /// before this point.
    pub async fn replace(
        pool: &PgPool,
        layer_id: DbId,
        geometry: &MeshGeometry,
        parameters: &serde_json::Value,
    ) -> Result<Mesh, sqlx::Error> {
        let vertices = serde_json::to_value(&geometry.vertices)
            .map_err(|e| sqlx::Error::Encode(Box::new(e)))?;
        let triangles = serde_json::to_value(&geometry.triangles)
            .map_err(|e| sqlx::Error::Encode(Box::new(e)))?;
        let uvs = serde_json::to_value(&geometry.uvs)
            .map_err(|e| sqlx::Error::Encode(Box::new(e)))?;

        let query = format!(
            "INSERT INTO meshes (layer_id, vertices, triangles, uvs, parameters) \
             VALUES ($1, $2, $3, $4, $5) \
             ON CONFLICT (layer_id) DO UPDATE \
             SET vertices = EXCLUDED.vertices, \
                 triangles = EXCLUDED.triangles, \
                 uvs = EXCLUDED.uvs, \
                 parameters = EXCLUDED.parameters, \
                 updated_at = NOW() \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Mesh>(&query)
            .bind(layer_id)
            .bind(vertices)
            .bind(triangles)
            .bind(uvs)
            .bind(parameters)
            .fetch_one(pool)
            .await
    }

    /// Find the mesh belonging to a layer, if one exists.
    pub async fn find_by_layer(
        pool: &PgPool,
        layer_id: DbId,
    ) -> Result<Option<Mesh>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM meshes WHERE layer_id = $1");
        sqlx::query_as::<_, Mesh>(&query)
            .bind(layer_id)
            .fetch_optional(pool)
            .await
    }
}
