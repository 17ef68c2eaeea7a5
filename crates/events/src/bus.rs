//! Per-project progress bus backed by `tokio::sync::broadcast` channels.
//!
//! [`ProgressBus`] is the publish/subscribe hub for [`ProgressEvent`]s,
//! keyed by project id so a subscriber only sees the project it asked
//! for. It is designed to be shared via `Arc<ProgressBus>` across the
//! application.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::{broadcast, RwLock};
use spinelift_core::types::DbId;

// ---------------------------------------------------------------------------
// ProgressEvent
// ---------------------------------------------------------------------------

/// A progress update for one project, as delivered to subscribers.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProgressEvent {
    /// Event kind, one of the `spinelift_core::pipeline_events` constants.
    pub event_type: String,

    /// Integer completion percentage (0-100).
    pub progress: i16,

    /// Layers completed so far.
    pub current: i32,

    /// Total layers, 0 until extraction has returned.
    pub total: i32,

    /// Human-readable step message, if any.
    pub message: Option<String>,

    /// When the event was published (UTC).
    pub timestamp: DateTime<Utc>,
}

impl ProgressEvent {
    /// Create an event stamped with the current time.
    pub fn new(
        event_type: impl Into<String>,
        progress: i16,
        current: i32,
        total: i32,
        message: Option<String>,
    ) -> Self {
        Self {
            event_type: event_type.into(),
            progress,
            current,
            total,
            message,
            timestamp: Utc::now(),
        }
    }
}

// ---------------------------------------------------------------------------
// ProgressBus
// ---------------------------------------------------------------------------

/// Default buffer capacity per project channel.
const DEFAULT_CAPACITY: usize = 256;

/// Named-channel fan-out bus, one broadcast channel per project.
///
/// Publishing is fire-and-forget: with no live subscriber the event is
/// dropped (late joiners fetch current state from the database).
/// Channels are pruned once their last subscriber is gone.
pub struct ProgressBus {
    channels: RwLock<HashMap<DbId, broadcast::Sender<ProgressEvent>>>,
    capacity: usize,
}

impl ProgressBus {
    /// Create a bus with a specific per-channel buffer capacity.
    ///
    /// When a buffer fills, the oldest un-consumed events are dropped
    /// and slow receivers observe `RecvError::Lagged`.
    pub fn new(capacity: usize) -> Self {
        Self {
            channels: RwLock::new(HashMap::new()),
            capacity,
        }
    }

    /// Subscribe to all subsequent events for one project.
    ///
    /// The returned receiver sees every event published for that id
    /// until it is dropped. There is no replay for events published
    /// before the subscription.
    pub async fn subscribe(&self, project_id: DbId) -> broadcast::Receiver<ProgressEvent> {
        let mut channels = self.channels.write().await;
        channels
            .entry(project_id)
            .or_insert_with(|| broadcast::channel(self.capacity).0)
            .subscribe()
    }

    /// Publish an event to all current subscribers of a project.
    ///
    /// Never blocks the publisher. If the project has no live
    /// subscribers the event is silently dropped and the channel is
    /// released.
    pub async fn publish(&self, project_id: DbId, event: ProgressEvent) {
        let mut channels = self.channels.write().await;
        if let Some(sender) = channels.get(&project_id) {
            if sender.receiver_count() == 0 {
                channels.remove(&project_id);
                return;
            }
            // SendError only means the receivers vanished concurrently.
            let _ = sender.send(event);
        }
    }

    /// Number of projects with at least one live subscriber.
    pub async fn channel_count(&self) -> usize {
        self.channels.read().await.len()
    }
}

impl Default for ProgressBus {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use spinelift_core::pipeline_events::EVENT_PROCESSING_PROGRESS;

    #[tokio::test]
    async fn subscriber_receives_published_event() {
        let bus = ProgressBus::default();
        let mut rx = bus.subscribe(1).await;

        bus.publish(
            1,
            ProgressEvent::new(EVENT_PROCESSING_PROGRESS, 50, 1, 2, Some("halfway".into())),
        )
        .await;

        let event = rx.recv().await.expect("should receive the event");
        assert_eq!(event.event_type, EVENT_PROCESSING_PROGRESS);
        assert_eq!(event.progress, 50);
        assert_eq!(event.current, 1);
        assert_eq!(event.total, 2);
        assert_eq!(event.message.as_deref(), Some("halfway"));
    }

    #[tokio::test]
    async fn channels_are_isolated_per_project() {
        let bus = ProgressBus::default();
        let mut rx_a = bus.subscribe(1).await;
        let mut rx_b = bus.subscribe(2).await;

        bus.publish(1, ProgressEvent::new("a.event", 10, 1, 10, None))
            .await;
        bus.publish(2, ProgressEvent::new("b.event", 20, 2, 10, None))
            .await;

        assert_eq!(rx_a.recv().await.unwrap().event_type, "a.event");
        assert_eq!(rx_b.recv().await.unwrap().event_type, "b.event");
        // Neither receiver sees the other project's event.
        assert!(rx_a.try_recv().is_err());
        assert!(rx_b.try_recv().is_err());
    }

    #[tokio::test]
    async fn multiple_subscribers_receive_same_event() {
        let bus = ProgressBus::default();
        let mut rx1 = bus.subscribe(7).await;
        let mut rx2 = bus.subscribe(7).await;

        bus.publish(7, ProgressEvent::new("multi.test", 0, 0, 3, None))
            .await;

        assert_eq!(rx1.recv().await.unwrap().event_type, "multi.test");
        assert_eq!(rx2.recv().await.unwrap().event_type, "multi.test");
    }

    #[tokio::test]
    async fn publish_with_no_subscribers_does_not_panic() {
        let bus = ProgressBus::default();
        bus.publish(42, ProgressEvent::new("orphan.event", 0, 0, 0, None))
            .await;
        assert_eq!(bus.channel_count().await, 0);
    }

    #[tokio::test]
    async fn channel_pruned_after_last_subscriber_drops() {
        let bus = ProgressBus::default();
        let rx = bus.subscribe(9).await;
        assert_eq!(bus.channel_count().await, 1);

        drop(rx);
        // The next publish observes zero receivers and prunes the entry.
        bus.publish(9, ProgressEvent::new("late.event", 0, 0, 0, None))
            .await;
        assert_eq!(bus.channel_count().await, 0);
    }

    #[tokio::test]
    async fn concurrent_publishes_do_not_cross_channels() {
        let bus = std::sync::Arc::new(ProgressBus::default());
        let mut rx_a = bus.subscribe(1).await;
        let mut rx_b = bus.subscribe(2).await;

        let publisher = |id: DbId, label: &'static str, bus: std::sync::Arc<ProgressBus>| {
            tokio::spawn(async move {
                for i in 0..100 {
                    bus.publish(id, ProgressEvent::new(label, 0, i, 100, None))
                        .await;
                }
            })
        };

        let a = publisher(1, "a.event", std::sync::Arc::clone(&bus));
        let b = publisher(2, "b.event", std::sync::Arc::clone(&bus));
        a.await.unwrap();
        b.await.unwrap();

        for _ in 0..100 {
            assert_eq!(rx_a.recv().await.unwrap().event_type, "a.event");
            assert_eq!(rx_b.recv().await.unwrap().event_type, "b.event");
        }
    }
}
