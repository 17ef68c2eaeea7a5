//! HTTP handlers, grouped by resource.

pub mod callbacks;
pub mod layers;
pub mod projects;
