//! Mesh regeneration: replacement without disturbing project state.
//!
//! Regeneration dispatch rotates the layer's correlation id, so the
//! tests rotate through the repository the same way the orchestrator
//! does and then deliver the completion callback for the fresh id.

mod common;

use sqlx::PgPool;
use uuid::Uuid;

use spinelift_core::pipeline_events::EVENT_MESH_REGENERATED;
use spinelift_db::models::status::{LayerStatus, ProjectStatus};
use spinelift_db::repositories::{LayerRepo, MeshRepo, ProjectRepo};
use spinelift_mesh_service::callback::{CallbackEvent, ProgressCallback};

use common::{mesh_callback, orchestrator, orchestrator_with_bus, processing_project};

/// Four vertices, two triangles: distinguishable from the fixture mesh.
fn quad_mesh() -> serde_json::Value {
    serde_json::json!({
        "vertices": [[0.0, 0.0], [1.0, 0.0], [1.0, 1.0], [0.0, 1.0]],
        "triangles": [[0, 1, 2], [0, 2, 3]],
        "uvs": [[0.0, 0.0], [1.0, 0.0], [1.0, 1.0], [0.0, 1.0]],
        "metadata": {"parameters": {"detail_factor": 0.02}},
    })
}

fn quad_callback(correlation_id: Uuid) -> ProgressCallback {
    ProgressCallback {
        correlation_id,
        event: CallbackEvent::Progress,
        current: Some(1),
        total: Some(1),
        progress: None,
        message: Some("Mesh regenerated".to_string()),
        data: Some(serde_json::json!({ "mesh": quad_mesh() })),
    }
}

#[sqlx::test(migrations = "../db/migrations")]
async fn regeneration_replaces_mesh_and_leaves_project_untouched(pool: PgPool) {
    let (orchestrator, bus) = orchestrator_with_bus(&pool);
    let (project, layers) = processing_project(&pool, "revise", 1).await;
    let layer = &layers[0];

    orchestrator
        .handle_callback(mesh_callback(layer.correlation_id, 1, 1))
        .await;
    let completed = ProjectRepo::find_by_id(&pool, project.id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(completed.status_id, ProjectStatus::Completed.id());

    let fresh_id = LayerRepo::rotate_correlation(&pool, layer.id)
        .await
        .unwrap()
        .unwrap();
    assert_ne!(fresh_id, layer.correlation_id);

    let mut rx = bus.subscribe(project.id).await;
    orchestrator.handle_callback(quad_callback(fresh_id)).await;

    let mesh = MeshRepo::find_by_layer(&pool, layer.id).await.unwrap().unwrap();
    assert_eq!(mesh.vertices.as_array().unwrap().len(), 4);
    assert_eq!(mesh.parameters["detail_factor"], 0.02);

    let after = ProjectRepo::find_by_id(&pool, project.id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(after.status_id, ProjectStatus::Completed.id());
    assert_eq!(after.completed_layers, completed.completed_layers);
    assert_eq!(after.completed_at, completed.completed_at);

    let row = LayerRepo::find_by_id(&pool, layer.id).await.unwrap().unwrap();
    assert_eq!(row.status_id, LayerStatus::Completed.id());

    let event = rx.try_recv().unwrap();
    assert_eq!(event.event_type, EVENT_MESH_REGENERATED);
}

#[sqlx::test(migrations = "../db/migrations")]
async fn callback_for_superseded_correlation_id_is_dropped(pool: PgPool) {
    let orchestrator = orchestrator(&pool);
    let (project, layers) = processing_project(&pool, "revise", 1).await;
    let layer = &layers[0];

    orchestrator
        .handle_callback(mesh_callback(layer.correlation_id, 1, 1))
        .await;
    let original_mesh = MeshRepo::find_by_layer(&pool, layer.id).await.unwrap().unwrap();

    // Dispatching a regeneration supersedes the original id.
    LayerRepo::rotate_correlation(&pool, layer.id).await.unwrap().unwrap();
    orchestrator
        .handle_callback(quad_callback(layer.correlation_id))
        .await;

    let mesh = MeshRepo::find_by_layer(&pool, layer.id).await.unwrap().unwrap();
    assert_eq!(mesh.updated_at, original_mesh.updated_at);
    assert_eq!(mesh.vertices.as_array().unwrap().len(), 3);

    let after = ProjectRepo::find_by_id(&pool, project.id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(after.status_id, ProjectStatus::Completed.id());
}
