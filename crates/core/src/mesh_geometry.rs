//! Typed mesh geometry and its structural validation.
//!
//! The mesh service returns vertices, triangle indices, and UV
//! coordinates as JSON arrays. [`MeshGeometry`] is the typed form the
//! pipeline validates before an artifact row is ever written, so a
//! malformed result can never half-replace an existing mesh.

use serde::{Deserialize, Serialize};

use crate::error::CoreError;

/// A triangulated 2-D mesh as produced by the mesh service.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MeshGeometry {
    /// Ordered 2-D points.
    pub vertices: Vec<[f64; 2]>,
    /// Index triples into `vertices`.
    pub triangles: Vec<[u32; 3]>,
    /// Texture coordinates, one per vertex.
    pub uvs: Vec<[f64; 2]>,
}

impl MeshGeometry {
    /// Validate the structural invariants of the geometry.
    ///
    /// Rules:
    /// - At least one vertex and one triangle.
    /// - Every triangle index must be `< vertices.len()`.
    /// - Exactly one UV pair per vertex.
    pub fn validate(&self) -> Result<(), CoreError> {
        if self.vertices.is_empty() {
            return Err(CoreError::Validation("Mesh has no vertices".to_string()));
        }
        if self.triangles.is_empty() {
            return Err(CoreError::Validation("Mesh has no triangles".to_string()));
        }

        let vertex_count = self.vertices.len() as u32;
        for (i, tri) in self.triangles.iter().enumerate() {
            if tri.iter().any(|&idx| idx >= vertex_count) {
                return Err(CoreError::Validation(format!(
                    "Triangle {i} references a vertex index >= {vertex_count}"
                )));
            }
        }

        if self.uvs.len() != self.vertices.len() {
            return Err(CoreError::Validation(format!(
                "Expected {} UV pairs, got {}",
                self.vertices.len(),
                self.uvs.len()
            )));
        }

        Ok(())
    }

    /// Number of vertices in the mesh.
    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    /// Number of triangles in the mesh.
    pub fn triangle_count(&self) -> usize {
        self.triangles.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    fn quad() -> MeshGeometry {
        MeshGeometry {
            vertices: vec![[0.0, 0.0], [1.0, 0.0], [1.0, 1.0], [0.0, 1.0]],
            triangles: vec![[0, 1, 2], [0, 2, 3]],
            uvs: vec![[0.0, 0.0], [1.0, 0.0], [1.0, 1.0], [0.0, 1.0]],
        }
    }

    #[test]
    fn valid_quad_passes() {
        assert!(quad().validate().is_ok());
    }

    #[test]
    fn empty_vertices_rejected() {
        let mesh = MeshGeometry {
            vertices: vec![],
            triangles: vec![],
            uvs: vec![],
        };
        assert_matches!(mesh.validate(), Err(CoreError::Validation(_)));
    }

    #[test]
    fn out_of_range_triangle_index_rejected() {
        let mut mesh = quad();
        mesh.triangles.push([0, 1, 4]);
        assert_matches!(mesh.validate(), Err(CoreError::Validation(_)));
    }

    #[test]
    fn uv_count_mismatch_rejected() {
        let mut mesh = quad();
        mesh.uvs.pop();
        assert_matches!(mesh.validate(), Err(CoreError::Validation(_)));
    }

    #[test]
    fn deserializes_service_payload() {
        let json = serde_json::json!({
            "vertices": [[0.0, 0.0], [10.0, 0.0], [5.0, 8.0]],
            "triangles": [[0, 1, 2]],
            "uvs": [[0.0, 0.0], [1.0, 0.0], [0.5, 1.0]],
        });
        let mesh: MeshGeometry = serde_json::from_value(json).unwrap();
        assert_eq!(mesh.vertex_count(), 3);
        assert_eq!(mesh.triangle_count(), 1);
        assert!(mesh.validate().is_ok());
    }
}
