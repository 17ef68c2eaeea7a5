//! Repository layer.
//!
//! Each repository is a zero-sized struct providing async CRUD methods
//! that accept `&PgPool` as the first argument. Every status-changing
//! UPDATE carries a `WHERE status_id = ...` guard mirroring the
//! transition table in `models::status`, so illegal transitions and
//! late callbacks are no-ops that leave the row unchanged.

pub mod layer_repo;
pub mod mesh_repo;
pub mod processing_log_repo;
pub mod project_repo;

pub use layer_repo::LayerRepo;
pub use mesh_repo::MeshRepo;
pub use processing_log_repo::ProcessingLogRepo;
pub use project_repo::ProjectRepo;
