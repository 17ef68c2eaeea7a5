//! Cancellation semantics: optimistic cancel, dropped stragglers.

mod common;

use sqlx::PgPool;

use spinelift_db::models::status::{LayerStatus, ProjectStatus};
use spinelift_db::repositories::{LayerRepo, MeshRepo, ProjectRepo};
use spinelift_pipeline::PipelineError;

use common::{error_callback, mesh_callback, orchestrator, orchestrator_with_bus, processing_project};

#[sqlx::test(migrations = "../db/migrations")]
async fn cancel_moves_processing_project_to_cancelled(pool: PgPool) {
    let orchestrator = orchestrator(&pool);
    let (project, _) = processing_project(&pool, "draft", 2).await;

    let cancelled = orchestrator.cancel(project.id).await.unwrap();
    assert_eq!(cancelled.status_id, ProjectStatus::Cancelled.id());
    assert!(cancelled.completed_at.is_some());
}

#[sqlx::test(migrations = "../db/migrations")]
async fn cancel_on_terminal_project_is_a_conflict(pool: PgPool) {
    let orchestrator = orchestrator(&pool);
    let (project, _) = processing_project(&pool, "draft", 2).await;

    orchestrator.cancel(project.id).await.unwrap();
    let err = orchestrator.cancel(project.id).await.unwrap_err();
    assert!(matches!(err, PipelineError::Conflict(_)), "got {err:?}");
}

#[sqlx::test(migrations = "../db/migrations")]
async fn cancel_of_unknown_project_is_not_found(pool: PgPool) {
    let orchestrator = orchestrator(&pool);
    let err = orchestrator.cancel(4242).await.unwrap_err();
    assert!(matches!(err, PipelineError::NotFound { .. }), "got {err:?}");
}

/// A mesh-bearing callback that was already in flight when the user
/// cancelled must leave no trace: no mesh row, no layer transition, no
/// counter movement, no published event.
#[sqlx::test(migrations = "../db/migrations")]
async fn mesh_callback_after_cancel_is_dropped_entirely(pool: PgPool) {
    let (orchestrator, bus) = orchestrator_with_bus(&pool);
    let (project, layers) = processing_project(&pool, "abandoned", 2).await;
    let stale_id = layers[0].correlation_id;

    orchestrator.cancel(project.id).await.unwrap();
    let mut rx = bus.subscribe(project.id).await;

    orchestrator.handle_callback(mesh_callback(stale_id, 1, 2)).await;

    let project = ProjectRepo::find_by_id(&pool, project.id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(project.status_id, ProjectStatus::Cancelled.id());
    assert_eq!(project.completed_layers, 0);

    let layer = LayerRepo::find_by_id(&pool, layers[0].id).await.unwrap().unwrap();
    assert_eq!(layer.status_id, LayerStatus::Processing.id());
    assert!(MeshRepo::find_by_layer(&pool, layers[0].id).await.unwrap().is_none());

    assert!(rx.try_recv().is_err(), "no event may be published for a dropped callback");
}

#[sqlx::test(migrations = "../db/migrations")]
async fn error_callback_after_cancel_leaves_status_cancelled(pool: PgPool) {
    let orchestrator = orchestrator(&pool);
    let (project, layers) = processing_project(&pool, "abandoned", 1).await;
    let stale_id = layers[0].correlation_id;

    orchestrator.cancel(project.id).await.unwrap();
    orchestrator
        .handle_callback(error_callback(stale_id, "No contours found in image"))
        .await;

    let project = ProjectRepo::find_by_id(&pool, project.id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(project.status_id, ProjectStatus::Cancelled.id());
    assert!(project.error_message.is_none());
}
