use spinelift_core::types::DbId;
use spinelift_mesh_service::client::MeshServiceError;

/// Errors surfaced by pipeline operations.
///
/// Failures inside the asynchronous pipeline run are recorded on the
/// project row instead of being returned; this type covers the
/// synchronous entry points (cancel, regenerate) and internal steps.
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error("Entity not found: {entity} with id {id}")]
    NotFound { entity: &'static str, id: DbId },

    /// The operation is not valid for the record's current status.
    #[error("Conflict: {0}")]
    Conflict(String),

    /// The PSD artifact could not be read from disk.
    #[error("Source artifact unreadable: {0}")]
    Artifact(String),

    #[error(transparent)]
    MeshService(#[from] MeshServiceError),

    #[error(transparent)]
    Database(#[from] sqlx::Error),
}
