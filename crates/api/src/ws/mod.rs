//! WebSocket streaming of pipeline progress.

pub mod handler;
