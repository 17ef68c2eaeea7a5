//! Processing pipeline: orchestration, retry policy, and the background
//! dispatcher that feeds pending projects into the mesh service.

pub mod error;
pub mod orchestrator;
pub mod queue;
pub mod retry;

pub use error::PipelineError;
pub use orchestrator::PipelineOrchestrator;
pub use queue::{PipelineDispatcher, QueueConfig};
pub use retry::{next_delay, with_retry, RetryConfig};
