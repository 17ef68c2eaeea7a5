//! Background project dispatcher.
//!
//! Polls for pending projects every `poll_interval` and hands each one
//! to the orchestrator on its own task. Claiming uses
//! `SELECT FOR UPDATE SKIP LOCKED` via [`ProjectRepo::claim_next`], so
//! concurrent dispatcher instances never double-claim, and a semaphore
//! bounds how many projects are processed at once.

use std::sync::Arc;
use std::time::Duration;

use sqlx::PgPool;
use tokio::sync::Semaphore;
use tokio_util::sync::CancellationToken;
use spinelift_db::repositories::ProjectRepo;

use crate::orchestrator::PipelineOrchestrator;

/// Default polling interval for the dispatcher loop.
const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(1);

/// Default bound on concurrently processing projects.
const DEFAULT_MAX_CONCURRENT: usize = 5;

/// Tunable parameters for the dispatcher.
#[derive(Debug, Clone)]
pub struct QueueConfig {
    /// How many projects may be in flight at once.
    pub max_concurrent: usize,
    /// Delay between queue polls.
    pub poll_interval: Duration,
}

impl Default for QueueConfig {
    fn default() -> Self {
        Self {
            max_concurrent: DEFAULT_MAX_CONCURRENT,
            poll_interval: DEFAULT_POLL_INTERVAL,
        }
    }
}

/// Background project dispatcher.
///
/// A single long-lived Tokio task that matches pending projects with
/// free pipeline slots. Each claimed project runs on its own spawned
/// task, so a panic in one pipeline never takes down its siblings or
/// the dispatch loop.
pub struct PipelineDispatcher {
    pool: PgPool,
    orchestrator: Arc<PipelineOrchestrator>,
    config: QueueConfig,
    slots: Arc<Semaphore>,
}

impl PipelineDispatcher {
    pub fn new(pool: PgPool, orchestrator: Arc<PipelineOrchestrator>, config: QueueConfig) -> Self {
        let slots = Arc::new(Semaphore::new(config.max_concurrent.max(1)));
        Self {
            pool,
            orchestrator,
            config,
            slots,
        }
    }

    /// Run the dispatch loop until the cancellation token is triggered.
    ///
    /// Already-claimed projects keep running to completion after
    /// shutdown begins; only new claims stop.
    pub async fn run(&self, cancel: CancellationToken) {
        let mut ticker = tokio::time::interval(self.config.poll_interval);
        tracing::info!(
            max_concurrent = self.config.max_concurrent,
            poll_interval_ms = self.config.poll_interval.as_millis() as u64,
            "Pipeline dispatcher started",
        );

        loop {
            tokio::select! {
                _ = cancel.cancelled() => {
                    tracing::info!("Pipeline dispatcher shutting down");
                    break;
                }
                _ = ticker.tick() => {
                    self.drain_pending().await;
                }
            }
        }
    }

    /// One dispatch cycle: claim pending projects while slots are free.
    async fn drain_pending(&self) {
        loop {
            let Ok(permit) = Arc::clone(&self.slots).try_acquire_owned() else {
                // All slots busy; the next tick will try again.
                return;
            };

            match ProjectRepo::claim_next(&self.pool).await {
                Ok(Some(project)) => {
                    tracing::info!(
                        project_id = project.id,
                        name = %project.name,
                        "Project claimed for processing",
                    );
                    let orchestrator = Arc::clone(&self.orchestrator);
                    tokio::spawn(async move {
                        orchestrator.process(project).await;
                        drop(permit);
                    });
                }
                Ok(None) => return,
                Err(e) => {
                    tracing::error!(error = %e, "Failed to claim pending project");
                    return;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_bounds_concurrency_at_five() {
        let config = QueueConfig::default();
        assert_eq!(config.max_concurrent, 5);
        assert_eq!(config.poll_interval, Duration::from_secs(1));
    }
}
