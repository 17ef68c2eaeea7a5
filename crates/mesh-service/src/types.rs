//! Request and response types for the mesh service API.

use serde::{Deserialize, Serialize};

/// Pixel-space bounding box of a layer within the PSD canvas.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct LayerBounds {
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
}

/// One layer description returned by `/api/extract_layers`.
#[derive(Debug, Clone, Deserialize)]
pub struct ExtractedLayer {
    pub name: String,
    /// Base64-encoded PNG of the layer raster.
    pub image_data: String,
    /// Z-order position within the document.
    pub position: i32,
    pub bounds: LayerBounds,
    pub opacity: f64,
    pub blend_mode: String,
    /// Free-form extraction metadata (visibility, mask flags, ...).
    #[serde(default)]
    pub metadata: serde_json::Value,
}

/// Tunable triangulation parameters for mesh generation.
///
/// Stored verbatim on the resulting mesh artifact so a generation run
/// can be reproduced or debugged later.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MeshParameters {
    /// Contour simplification factor; smaller keeps more detail.
    #[serde(default = "default_detail_factor")]
    pub detail_factor: f64,
    /// Alpha value below which pixels are treated as transparent.
    #[serde(default = "default_alpha_threshold")]
    pub alpha_threshold: i32,
    /// Edge detection sensitivity.
    #[serde(default = "default_edge_threshold")]
    pub edge_threshold: i32,
    /// Upper bound on triangles in the generated mesh.
    #[serde(default = "default_max_triangles")]
    pub max_triangles: i32,
}

fn default_detail_factor() -> f64 {
    0.01
}

fn default_alpha_threshold() -> i32 {
    10
}

fn default_edge_threshold() -> i32 {
    5
}

fn default_max_triangles() -> i32 {
    5000
}

impl Default for MeshParameters {
    fn default() -> Self {
        Self {
            detail_factor: default_detail_factor(),
            alpha_threshold: default_alpha_threshold(),
            edge_threshold: default_edge_threshold(),
            max_triangles: default_max_triangles(),
        }
    }
}
