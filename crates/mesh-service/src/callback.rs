//! Inbound progress callback payloads.
//!
//! The mesh service reports progress and errors by POSTing to the
//! platform's callback endpoint. Callbacks are correlated to a layer
//! via `correlation_id`; an id that does not resolve to known work is
//! dropped at the boundary, never raised to the service.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Discriminator for an inbound callback.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CallbackEvent {
    /// A cumulative progress report (`current` of `total` units done).
    Progress,
    /// The computation for this correlation id failed.
    Error,
}

/// Payload POSTed by the mesh service to `/api/v1/callbacks/progress`.
///
/// The service always reports cumulative `current/total`; the
/// orchestrator clamps the stored counter to stay monotonic, so
/// duplicated or reordered deliveries are harmless.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProgressCallback {
    /// Token linking this callback to the layer that requested work.
    pub correlation_id: Uuid,
    pub event: CallbackEvent,
    /// Cumulative number of completed units.
    #[serde(default)]
    pub current: Option<i32>,
    /// Total number of units, if the service knows it.
    #[serde(default)]
    pub total: Option<i32>,
    /// Percentage as computed by the service; informational only, the
    /// platform recomputes from its own counters.
    #[serde(default)]
    pub progress: Option<i16>,
    #[serde(default)]
    pub message: Option<String>,
    /// Completion payload; carries the generated mesh geometry under
    /// `"mesh"` when a generation finishes.
    #[serde(default)]
    pub data: Option<serde_json::Value>,
}

impl ProgressCallback {
    /// The mesh geometry attached to a completion callback, if present.
    pub fn mesh_payload(&self) -> Option<&serde_json::Value> {
        self.data.as_ref().and_then(|d| d.get("mesh"))
    }
}
