//! Real-time progress fan-out for the SpineLift pipeline.
//!
//! - [`ProgressBus`] — per-project publish/subscribe hub backed by
//!   `tokio::sync::broadcast`, keyed by project id.
//! - [`ProgressEvent`] — the envelope delivered to subscribers and
//!   serialized onto WebSocket connections.

pub mod bus;

pub use bus::{ProgressBus, ProgressEvent};
