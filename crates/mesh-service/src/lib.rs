//! HTTP client for the external mesh-processing service.
//!
//! The mesh service owns the pixel-level work: it decomposes a PSD into
//! layers (`/api/extract_layers`, synchronous with a request timeout)
//! and triangulates per-layer meshes (`/api/generate_mesh`, accepted
//! asynchronously with results delivered via progress callbacks keyed
//! by correlation id).

pub mod callback;
pub mod client;
pub mod types;

pub use callback::{CallbackEvent, ProgressCallback};
pub use client::{MeshServiceClient, MeshServiceError};
pub use types::{ExtractedLayer, LayerBounds, MeshParameters};
