//! Row models and DTOs.

pub mod layer;
pub mod mesh;
pub mod processing_log;
pub mod project;
pub mod status;
