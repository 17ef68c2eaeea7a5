//! Event type constants for pipeline progress broadcasts.
//!
//! Used by the orchestrator when publishing to the progress bus and by
//! WebSocket clients to switch on the event kind. A subscription is
//! closed by the server after a terminal event type is delivered.

/// Progress update while a project is processing.
pub const EVENT_PROCESSING_PROGRESS: &str = "processing_progress";

/// The project completed successfully.
pub const EVENT_PROCESSING_COMPLETED: &str = "processing_completed";

/// The project failed with an error.
pub const EVENT_PROCESSING_FAILED: &str = "processing_failed";

/// The project was cancelled by the user.
pub const EVENT_PROCESSING_CANCELLED: &str = "processing_cancelled";

/// A single layer's mesh was regenerated outside the main pipeline run.
pub const EVENT_MESH_REGENERATED: &str = "mesh_regenerated";

/// Whether an event type ends the subscription stream.
pub fn is_terminal_event(event_type: &str) -> bool {
    matches!(
        event_type,
        EVENT_PROCESSING_COMPLETED | EVENT_PROCESSING_FAILED | EVENT_PROCESSING_CANCELLED
    )
}

/// Log step label for the initial layer extraction call.
pub const STEP_LAYER_EXTRACTION: &str = "layer_extraction";

/// Log step label for per-layer mesh generation.
pub const STEP_MESH_GENERATION: &str = "mesh_generation";

/// Log step label for cancellation.
pub const STEP_CANCELLATION: &str = "cancellation";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn terminal_events() {
        assert!(is_terminal_event(EVENT_PROCESSING_COMPLETED));
        assert!(is_terminal_event(EVENT_PROCESSING_FAILED));
        assert!(is_terminal_event(EVENT_PROCESSING_CANCELLED));
        assert!(!is_terminal_event(EVENT_PROCESSING_PROGRESS));
        assert!(!is_terminal_event(EVENT_MESH_REGENERATED));
    }
}
