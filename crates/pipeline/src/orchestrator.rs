//! Pipeline orchestration for one project.
//!
//! [`PipelineOrchestrator`] drives the two-phase pipeline: synchronous
//! layer extraction, then one asynchronous mesh-generation dispatch per
//! layer. Results come back through [`handle_callback`], correlated to
//! a layer by its correlation id. Every state change goes through the
//! guarded repository transitions, so a cancellation racing a callback
//! resolves to a dropped callback rather than a corrupted status.
//!
//! [`handle_callback`]: PipelineOrchestrator::handle_callback

use std::sync::Arc;

use sqlx::PgPool;
use spinelift_core::mesh_geometry::MeshGeometry;
use spinelift_core::pipeline_events::{
    EVENT_MESH_REGENERATED, EVENT_PROCESSING_CANCELLED, EVENT_PROCESSING_COMPLETED,
    EVENT_PROCESSING_FAILED, EVENT_PROCESSING_PROGRESS, STEP_CANCELLATION, STEP_LAYER_EXTRACTION,
    STEP_MESH_GENERATION,
};
use spinelift_core::progress::percent;
use spinelift_core::types::DbId;
use spinelift_db::models::layer::{Layer, NewLayer};
use spinelift_db::models::project::Project;
use spinelift_db::models::status::LogStatus;
use spinelift_db::repositories::{LayerRepo, MeshRepo, ProcessingLogRepo, ProjectRepo};
use spinelift_events::bus::{ProgressBus, ProgressEvent};
use spinelift_mesh_service::callback::{CallbackEvent, ProgressCallback};
use spinelift_mesh_service::client::MeshServiceClient;
use spinelift_mesh_service::types::MeshParameters;

use crate::error::PipelineError;
use crate::retry::{with_retry, RetryConfig};

/// Drives projects through extraction and mesh generation.
///
/// Shared via `Arc` between the dispatcher (which calls [`process`])
/// and the HTTP layer (cancel, regenerate, callbacks).
///
/// [`process`]: PipelineOrchestrator::process
pub struct PipelineOrchestrator {
    pool: PgPool,
    bus: Arc<ProgressBus>,
    client: Arc<MeshServiceClient>,
    retry: RetryConfig,
    /// Absolute URL the mesh service POSTs progress callbacks to.
    callback_url: String,
}

impl PipelineOrchestrator {
    pub fn new(
        pool: PgPool,
        bus: Arc<ProgressBus>,
        client: Arc<MeshServiceClient>,
        retry: RetryConfig,
        callback_url: String,
    ) -> Self {
        Self {
            pool,
            bus,
            client,
            retry,
            callback_url,
        }
    }

    // -----------------------------------------------------------------------
    // Pipeline run
    // -----------------------------------------------------------------------

    /// Run the pipeline for a freshly claimed project.
    ///
    /// The project is already in `processing` (the dispatcher's claim
    /// performed that transition). Failures are recorded on the project
    /// row and broadcast; this function never returns an error because
    /// there is no caller to handle one.
    pub async fn process(&self, project: Project) {
        let project_id = project.id;
        tracing::info!(project_id, name = %project.name, "Pipeline run started");

        let layers = match self.run_extraction(&project).await {
            Ok(layers) => layers,
            Err(e) => {
                self.fail_project(project_id, &format!("Layer extraction failed: {e}"))
                    .await;
                return;
            }
        };

        if layers.is_empty() {
            self.fail_project(project_id, "PSD contains no analyzable layers")
                .await;
            return;
        }

        let new_layers: Vec<NewLayer> = layers
            .iter()
            .map(|l| NewLayer {
                name: l.name.clone(),
                position: l.position,
                x: l.bounds.x,
                y: l.bounds.y,
                width: l.bounds.width,
                height: l.bounds.height,
                opacity: l.opacity,
                blend_mode: l.blend_mode.clone(),
                image_data: l.image_data.clone(),
                metadata: l.metadata.clone(),
            })
            .collect();

        // A cancel issued during extraction leaves the project terminal;
        // the guarded total update inside the transaction tells us to
        // stop before any layer row is written.
        let created = match LayerRepo::create_all(&self.pool, project_id, &new_layers).await {
            Ok(Some(created)) => created,
            Ok(None) => {
                tracing::info!(project_id, "Project no longer processing, run abandoned");
                return;
            }
            Err(e) => {
                tracing::error!(project_id, error = %e, "Failed to persist extracted layers");
                self.fail_project(project_id, "Internal error while persisting layers")
                    .await;
                return;
            }
        };

        self.append_log(
            project_id,
            STEP_LAYER_EXTRACTION,
            LogStatus::Completed,
            Some(&format!("Extracted {} layers", created.len())),
        )
        .await;
        self.bus
            .publish(
                project_id,
                ProgressEvent::new(
                    EVENT_PROCESSING_PROGRESS,
                    0,
                    0,
                    created.len() as i32,
                    Some(format!("Extracted {} layers", created.len())),
                ),
            )
            .await;

        self.append_log(
            project_id,
            STEP_MESH_GENERATION,
            LogStatus::Started,
            Some(&format!("Dispatching mesh generation for {} layers", created.len())),
        )
        .await;

        for layer in &created {
            if let Err(e) = self.dispatch_layer(layer).await {
                self.fail_project(
                    project_id,
                    &format!("Mesh generation dispatch failed for layer '{}': {e}", layer.name),
                )
                .await;
                return;
            }
        }

        tracing::info!(
            project_id,
            layers = created.len(),
            "All mesh generations dispatched, awaiting callbacks",
        );
    }

    /// Read the PSD artifact and call extraction with retry.
    async fn run_extraction(
        &self,
        project: &Project,
    ) -> Result<Vec<spinelift_mesh_service::types::ExtractedLayer>, PipelineError> {
        self.append_log(
            project.id,
            STEP_LAYER_EXTRACTION,
            LogStatus::Started,
            Some("Extracting layers from PSD"),
        )
        .await;

        let psd_bytes = tokio::fs::read(&project.psd_file)
            .await
            .map_err(|e| PipelineError::Artifact(format!("{}: {e}", project.psd_file)))?;

        let file_name = std::path::Path::new(&project.psd_file)
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "upload.psd".to_string());

        let layers = with_retry(
            &self.retry,
            |e: &spinelift_mesh_service::client::MeshServiceError| e.is_transient(),
            || self.client.extract_layers(psd_bytes.clone(), &file_name),
        )
        .await?;

        Ok(layers)
    }

    /// Mark a layer processing and dispatch its mesh generation.
    async fn dispatch_layer(&self, layer: &Layer) -> Result<(), PipelineError> {
        LayerRepo::mark_processing(&self.pool, layer.id).await?;

        let params = MeshParameters::default();
        with_retry(
            &self.retry,
            |e: &spinelift_mesh_service::client::MeshServiceError| e.is_transient(),
            || {
                self.client.generate_mesh(
                    &layer.image_data,
                    &params,
                    layer.correlation_id,
                    &self.callback_url,
                )
            },
        )
        .await?;
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Inbound callbacks
    // -----------------------------------------------------------------------

    /// Apply one inbound mesh service callback.
    ///
    /// Infallible from the caller's perspective: the callback endpoint
    /// always acknowledges, so every failure here is logged and
    /// swallowed. Unknown correlation ids (cancelled, deleted, or
    /// simply bogus work) are dropped silently.
    pub async fn handle_callback(&self, payload: ProgressCallback) {
        let layer = match LayerRepo::find_by_correlation(&self.pool, payload.correlation_id).await {
            Ok(Some(layer)) => layer,
            Ok(None) => {
                tracing::warn!(
                    correlation_id = %payload.correlation_id,
                    "Dropping callback with unknown correlation id",
                );
                return;
            }
            Err(e) => {
                tracing::error!(
                    correlation_id = %payload.correlation_id,
                    error = %e,
                    "Failed to resolve callback correlation id",
                );
                return;
            }
        };

        match payload.event {
            CallbackEvent::Progress => self.handle_progress(&layer, &payload).await,
            CallbackEvent::Error => self.handle_error(&layer, &payload).await,
        }
    }

    /// Apply a progress (possibly completion) callback for a layer.
    async fn handle_progress(&self, layer: &Layer, payload: &ProgressCallback) {
        let mut mesh_stored = false;

        if let Some(mesh_json) = payload.mesh_payload() {
            let geometry: MeshGeometry = match serde_json::from_value(mesh_json.clone()) {
                Ok(g) => g,
                Err(e) => {
                    self.fail_from_callback(
                        layer,
                        &format!("Malformed mesh payload for layer '{}': {e}", layer.name),
                    )
                    .await;
                    return;
                }
            };
            if let Err(e) = geometry.validate() {
                self.fail_from_callback(
                    layer,
                    &format!("Invalid mesh geometry for layer '{}': {e}", layer.name),
                )
                .await;
                return;
            }

            let parameters = mesh_parameters(mesh_json);
            if let Err(e) = MeshRepo::replace(&self.pool, layer.id, &geometry, &parameters).await {
                tracing::error!(layer_id = layer.id, error = %e, "Failed to store mesh");
                return;
            }
            // Completed -> completed is a no-op for regenerations.
            if let Err(e) = LayerRepo::mark_completed(&self.pool, layer.id).await {
                tracing::error!(layer_id = layer.id, error = %e, "Failed to complete layer");
            }
            mesh_stored = true;
            tracing::info!(
                layer_id = layer.id,
                vertices = geometry.vertex_count(),
                triangles = geometry.triangle_count(),
                "Mesh stored for layer",
            );
        }

        let reported = payload.current.unwrap_or(0);
        let updated =
            match ProjectRepo::record_progress(&self.pool, layer.project_id, reported).await {
                Ok(updated) => updated,
                Err(e) => {
                    tracing::error!(
                        project_id = layer.project_id,
                        error = %e,
                        "Failed to record progress",
                    );
                    return;
                }
            };

        let Some(project) = updated else {
            // The project is no longer processing. For a regeneration
            // the mesh replacement above is the entire point; announce
            // it. A plain late progress report is dropped.
            if mesh_stored {
                self.append_log(
                    layer.project_id,
                    STEP_MESH_GENERATION,
                    LogStatus::Completed,
                    Some(&format!("Mesh regenerated for layer '{}'", layer.name)),
                )
                .await;
                self.bus
                    .publish(
                        layer.project_id,
                        ProgressEvent::new(
                            EVENT_MESH_REGENERATED,
                            100,
                            0,
                            0,
                            Some(format!("Mesh regenerated for layer '{}'", layer.name)),
                        ),
                    )
                    .await;
            } else {
                tracing::debug!(
                    project_id = layer.project_id,
                    "Dropped progress callback for non-processing project",
                );
            }
            return;
        };

        let pct = percent(project.completed_layers, project.total_layers);
        self.append_log(
            project.id,
            STEP_MESH_GENERATION,
            LogStatus::InProgress,
            payload.message.as_deref(),
        )
        .await;
        self.bus
            .publish(
                project.id,
                ProgressEvent::new(
                    EVENT_PROCESSING_PROGRESS,
                    pct,
                    project.completed_layers,
                    project.total_layers,
                    payload.message.clone(),
                ),
            )
            .await;

        if project.total_layers > 0 && project.completed_layers == project.total_layers {
            self.complete_project(&project).await;
        }
    }

    /// Finish a project whose last layer just completed.
    async fn complete_project(&self, project: &Project) {
        match ProjectRepo::complete(&self.pool, project.id).await {
            Ok(true) => {}
            // Lost the race against another callback or a cancel.
            Ok(false) => return,
            Err(e) => {
                tracing::error!(project_id = project.id, error = %e, "Failed to complete project");
                return;
            }
        }

        self.append_log(
            project.id,
            STEP_MESH_GENERATION,
            LogStatus::Completed,
            Some("All layer meshes generated"),
        )
        .await;
        self.bus
            .publish(
                project.id,
                ProgressEvent::new(
                    EVENT_PROCESSING_COMPLETED,
                    100,
                    project.total_layers,
                    project.total_layers,
                    Some("Processing completed".to_string()),
                ),
            )
            .await;
        tracing::info!(project_id = project.id, "Project completed");
    }

    /// Apply an error callback for a layer.
    async fn handle_error(&self, layer: &Layer, payload: &ProgressCallback) {
        let message = payload
            .message
            .as_deref()
            .unwrap_or("Mesh service reported an error");
        self.fail_from_callback(
            layer,
            &format!("Mesh generation failed for layer '{}': {message}", layer.name),
        )
        .await;
    }

    /// Fail a layer and its project in response to a callback.
    async fn fail_from_callback(&self, layer: &Layer, message: &str) {
        if let Err(e) = LayerRepo::mark_failed(&self.pool, layer.id).await {
            tracing::error!(layer_id = layer.id, error = %e, "Failed to mark layer failed");
        }
        self.fail_project(layer.project_id, message).await;
    }

    /// Transition a project to `failed`, log, and broadcast.
    ///
    /// A no-op when the project is already terminal (e.g. an error
    /// callback racing a cancellation).
    async fn fail_project(&self, project_id: DbId, message: &str) {
        match ProjectRepo::fail(&self.pool, project_id, message).await {
            Ok(true) => {}
            Ok(false) => {
                tracing::debug!(project_id, "Failure dropped, project already terminal");
                return;
            }
            Err(e) => {
                tracing::error!(project_id, error = %e, "Failed to mark project failed");
                return;
            }
        }

        self.retire_correlations(project_id).await;
        tracing::warn!(project_id, message, "Project failed");
        self.append_log(
            project_id,
            STEP_MESH_GENERATION,
            LogStatus::Failed,
            Some(message),
        )
        .await;

        let (current, total) = self.counters(project_id).await;
        self.bus
            .publish(
                project_id,
                ProgressEvent::new(
                    EVENT_PROCESSING_FAILED,
                    percent(current, total),
                    current,
                    total,
                    Some(message.to_string()),
                ),
            )
            .await;
    }

    // -----------------------------------------------------------------------
    // User-initiated operations
    // -----------------------------------------------------------------------

    /// Cancel a project that is still `pending` or `processing`.
    ///
    /// Optimistic: in-flight mesh service work is not preempted, but the
    /// status guards drop everything it reports afterwards.
    pub async fn cancel(&self, project_id: DbId) -> Result<Project, PipelineError> {
        let Some(project) = ProjectRepo::cancel(&self.pool, project_id).await? else {
            return match ProjectRepo::find_by_id(&self.pool, project_id).await? {
                Some(_) => Err(PipelineError::Conflict(
                    "Project is already in a terminal status".to_string(),
                )),
                None => Err(PipelineError::NotFound {
                    entity: "project",
                    id: project_id,
                }),
            };
        };

        self.retire_correlations(project_id).await;
        self.append_log(
            project_id,
            STEP_CANCELLATION,
            LogStatus::Completed,
            Some("Processing cancelled by user"),
        )
        .await;
        self.bus
            .publish(
                project_id,
                ProgressEvent::new(
                    EVENT_PROCESSING_CANCELLED,
                    percent(project.completed_layers, project.total_layers),
                    project.completed_layers,
                    project.total_layers,
                    Some("Processing cancelled".to_string()),
                ),
            )
            .await;
        tracing::info!(project_id, "Project cancelled");
        Ok(project)
    }

    /// Re-dispatch mesh generation for one layer with new parameters.
    ///
    /// Leaves the layer and project statuses untouched; the resulting
    /// callback atomically replaces the stored mesh when it arrives.
    pub async fn regenerate_mesh(
        &self,
        layer: &Layer,
        parameters: MeshParameters,
    ) -> Result<(), PipelineError> {
        if layer.image_data.is_empty() {
            return Err(PipelineError::Conflict(
                "Layer has no stored raster to regenerate from".to_string(),
            ));
        }

        // Fresh correlation id per dispatch: only the callback for this
        // regeneration resolves, never a straggler from an earlier run.
        let Some(correlation_id) = LayerRepo::rotate_correlation(&self.pool, layer.id).await?
        else {
            return Err(PipelineError::NotFound {
                entity: "layer",
                id: layer.id,
            });
        };

        with_retry(
            &self.retry,
            |e: &spinelift_mesh_service::client::MeshServiceError| e.is_transient(),
            || {
                self.client.generate_mesh(
                    &layer.image_data,
                    &parameters,
                    correlation_id,
                    &self.callback_url,
                )
            },
        )
        .await?;

        self.append_log(
            layer.project_id,
            STEP_MESH_GENERATION,
            LogStatus::Started,
            Some(&format!("Mesh regeneration dispatched for layer '{}'", layer.name)),
        )
        .await;
        tracing::info!(layer_id = layer.id, "Mesh regeneration dispatched");
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Helpers
    // -----------------------------------------------------------------------

    /// Append a log entry, logging (not propagating) failures.
    async fn append_log(
        &self,
        project_id: DbId,
        step: &str,
        status: LogStatus,
        message: Option<&str>,
    ) {
        if let Err(e) = ProcessingLogRepo::append(
            &self.pool,
            project_id,
            step,
            status,
            message,
            serde_json::json!({}),
        )
        .await
        {
            tracing::error!(project_id, step, error = %e, "Failed to append processing log");
        }
    }

    /// Invalidate the project's layer correlation ids after a cancel or
    /// failure, so callbacks still in flight stop resolving. Completion
    /// deliberately keeps the ids: the counter can reach the total
    /// before every sibling's mesh body has landed, and those meshes
    /// must still be stored.
    async fn retire_correlations(&self, project_id: DbId) {
        if let Err(e) = LayerRepo::invalidate_correlations(&self.pool, project_id).await {
            tracing::error!(project_id, error = %e, "Failed to retire layer correlation ids");
        }
    }

    /// Current progress counters, (0, 0) when the row is unreadable.
    async fn counters(&self, project_id: DbId) -> (i32, i32) {
        match ProjectRepo::find_by_id(&self.pool, project_id).await {
            Ok(Some(p)) => (p.completed_layers, p.total_layers),
            _ => (0, 0),
        }
    }
}

/// Triangulation parameters echoed inside a mesh payload, `{}` if absent.
fn mesh_parameters(mesh: &serde_json::Value) -> serde_json::Value {
    mesh.get("metadata")
        .and_then(|m| m.get("parameters"))
        .cloned()
        .unwrap_or_else(|| serde_json::json!({}))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mesh_parameters_extracted_from_metadata() {
        let mesh = serde_json::json!({
            "vertices": [],
            "metadata": {"parameters": {"detail_factor": 0.02}},
        });
        assert_eq!(mesh_parameters(&mesh)["detail_factor"], 0.02);
    }

    #[test]
    fn mesh_parameters_default_to_empty_object() {
        let mesh = serde_json::json!({"vertices": []});
        assert_eq!(mesh_parameters(&mesh), serde_json::json!({}));
    }
}
