//! Shared fixtures for pipeline integration tests.
//!
//! Tests drive the orchestrator through its callback and lifecycle
//! entry points against a per-test database. The mesh service client
//! points at an unroutable address; none of the paths exercised here
//! dispatch HTTP, so a reachable service is not required.

use std::sync::Arc;

use sqlx::PgPool;
use uuid::Uuid;

use spinelift_db::models::layer::{Layer, NewLayer};
use spinelift_db::models::project::{Project, SubmitProject};
use spinelift_db::repositories::{LayerRepo, ProjectRepo};
use spinelift_events::ProgressBus;
use spinelift_mesh_service::callback::{CallbackEvent, ProgressCallback};
use spinelift_mesh_service::MeshServiceClient;
use spinelift_pipeline::{PipelineOrchestrator, RetryConfig};

/// Orchestrator plus the bus it publishes to, for event assertions.
pub fn orchestrator_with_bus(pool: &PgPool) -> (Arc<PipelineOrchestrator>, Arc<ProgressBus>) {
    let bus = Arc::new(ProgressBus::default());
    let client = Arc::new(MeshServiceClient::new("http://127.0.0.1:1"));
    let orchestrator = PipelineOrchestrator::new(
        pool.clone(),
        Arc::clone(&bus),
        client,
        RetryConfig::default(),
        "http://127.0.0.1:1/api/v1/callbacks/progress".to_string(),
    );
    (Arc::new(orchestrator), bus)
}

pub fn orchestrator(pool: &PgPool) -> Arc<PipelineOrchestrator> {
    orchestrator_with_bus(pool).0
}

/// Create a project, claim it into `processing`, and insert `count`
/// layers already marked `processing` (as the dispatch phase leaves
/// them). Returns the claimed project and its layers.
pub async fn processing_project(pool: &PgPool, name: &str, count: usize) -> (Project, Vec<Layer>) {
    let input = SubmitProject {
        name: name.to_string(),
        psd_file: format!("fixtures/{name}.psd"),
    };
    ProjectRepo::create(pool, &input).await.unwrap();
    let project = ProjectRepo::claim_next(pool).await.unwrap().unwrap();

    let new_layers: Vec<NewLayer> = (0..count)
        .map(|i| new_layer(&format!("{name}-layer-{i}"), i as i32))
        .collect();
    let layers = LayerRepo::create_all(pool, project.id, &new_layers)
        .await
        .unwrap()
        .unwrap();
    for layer in &layers {
        assert!(LayerRepo::mark_processing(pool, layer.id).await.unwrap());
    }

    let project = ProjectRepo::find_by_id(pool, project.id)
        .await
        .unwrap()
        .unwrap();
    (project, layers)
}

pub fn new_layer(name: &str, position: i32) -> NewLayer {
    NewLayer {
        name: name.to_string(),
        position,
        x: 0,
        y: 0,
        width: 64,
        height: 64,
        opacity: 1.0,
        blend_mode: "normal".to_string(),
        image_data: "aGVsbG8=".to_string(),
        metadata: serde_json::json!({}),
    }
}

/// A minimal valid mesh payload: one triangle.
pub fn triangle_mesh() -> serde_json::Value {
    serde_json::json!({
        "vertices": [[0.0, 0.0], [1.0, 0.0], [0.0, 1.0]],
        "triangles": [[0, 1, 2]],
        "uvs": [[0.0, 0.0], [1.0, 0.0], [0.0, 1.0]],
    })
}

/// A completion callback carrying a mesh and a cumulative count.
pub fn mesh_callback(correlation_id: Uuid, current: i32, total: i32) -> ProgressCallback {
    ProgressCallback {
        correlation_id,
        event: CallbackEvent::Progress,
        current: Some(current),
        total: Some(total),
        progress: None,
        message: Some(format!("Mesh generated ({current}/{total})")),
        data: Some(serde_json::json!({ "mesh": triangle_mesh() })),
    }
}

pub fn error_callback(correlation_id: Uuid, message: &str) -> ProgressCallback {
    ProgressCallback {
        correlation_id,
        event: CallbackEvent::Error,
        current: None,
        total: None,
        progress: None,
        message: Some(message.to_string()),
        data: None,
    }
}
