//! Shared domain logic for the SpineLift processing pipeline.
//!
//! This crate has no internal dependencies and holds only pure types and
//! functions: ID/timestamp aliases, the core error enum, progress
//! arithmetic, mesh geometry validation, and the WebSocket message type
//! constants used when broadcasting pipeline events.

pub mod error;
pub mod mesh_geometry;
pub mod pipeline_events;
pub mod progress;
pub mod types;

pub use error::CoreError;
