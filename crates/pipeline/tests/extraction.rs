//! Layer persistence after extraction: all-or-nothing with the total.

mod common;

use sqlx::PgPool;

use spinelift_db::models::project::SubmitProject;
use spinelift_db::repositories::{LayerRepo, ProjectRepo};

use common::{new_layer, orchestrator};

async fn claimed_project(pool: &PgPool, name: &str) -> spinelift_db::models::project::Project {
    let input = SubmitProject {
        name: name.to_string(),
        psd_file: format!("fixtures/{name}.psd"),
    };
    ProjectRepo::create(pool, &input).await.unwrap();
    ProjectRepo::claim_next(pool).await.unwrap().unwrap()
}

#[sqlx::test(migrations = "../db/migrations")]
async fn create_all_records_layers_and_total_together(pool: PgPool) {
    let project = claimed_project(&pool, "fresh").await;

    let new_layers = vec![new_layer("body", 0), new_layer("arm", 1), new_layer("head", 2)];
    let created = LayerRepo::create_all(&pool, project.id, &new_layers)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(created.len(), 3);

    let project = ProjectRepo::find_by_id(&pool, project.id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(project.total_layers, 3);
}

/// A cancel during extraction must leave neither layer rows nor a
/// stale total behind: the guarded update aborts the transaction.
#[sqlx::test(migrations = "../db/migrations")]
async fn create_all_writes_nothing_once_project_is_cancelled(pool: PgPool) {
    let orchestrator = orchestrator(&pool);
    let project = claimed_project(&pool, "late-cancel").await;

    orchestrator.cancel(project.id).await.unwrap();

    let new_layers = vec![new_layer("body", 0)];
    let created = LayerRepo::create_all(&pool, project.id, &new_layers)
        .await
        .unwrap();
    assert!(created.is_none());

    assert!(LayerRepo::list_by_project(&pool, project.id)
        .await
        .unwrap()
        .is_empty());
    let project = ProjectRepo::find_by_id(&pool, project.id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(project.total_layers, 0);
}
