//! Progress events via an in-process broadcast channel.

use tokio::sync::broadcast;
use tracing::debug;

use reelforge_models::{ProductionEvent, ShotId, ShotStatus};

/// Channel for publishing/subscribing to production progress events.
///
/// Publishing never blocks and never fails: events published with no live
/// subscribers are dropped.
#[derive(Debug, Clone)]
pub struct ProgressChannel {
    tx: broadcast::Sender<ProductionEvent>,
}

impl ProgressChannel {
    /// Create a new progress channel with the given buffer size.
    pub fn new(buffer: usize) -> Self {
        let (tx, _) = broadcast::channel(buffer.max(1));
        Self { tx }
    }

    /// Subscribe to events from this point on.
    pub fn subscribe(&self) -> broadcast::Receiver<ProductionEvent> {
        self.tx.subscribe()
    }

    /// Publish an event.
    pub fn publish(&self, event: ProductionEvent) {
        debug!(?event, "Publishing progress event");
        let _ = self.tx.send(event);
    }

    /// Publish a log message.
    pub fn log(&self, message: impl Into<String>) {
        self.publish(ProductionEvent::log(message));
    }

    /// Publish a shot status change.
    pub fn shot_status(&self, shot_id: ShotId, status: ShotStatus) {
        self.publish(ProductionEvent::shot_status(shot_id, status));
    }

    /// Publish a quality-gate verdict for an attempt.
    pub fn attempt_scored(&self, shot_id: ShotId, attempt: u32, score: f32, passed: bool) {
        self.publish(ProductionEvent::attempt_scored(shot_id, attempt, score, passed));
    }

    /// Publish the run's halt reason.
    pub fn halted(&self, reason: impl Into<String>) {
        self.publish(ProductionEvent::halted(reason));
    }

    /// Publish a cancellation notice.
    pub fn cancelled(&self, shot_id: ShotId) {
        self.publish(ProductionEvent::cancelled(shot_id));
    }

    /// Publish run completion.
    pub fn done(&self) {
        self.publish(ProductionEvent::Done);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_subscriber_receives_events() {
        let channel = ProgressChannel::new(16);
        let mut rx = channel.subscribe();

        channel.shot_status(ShotId::from_index(0), ShotStatus::Generating);

        match rx.recv().await.unwrap() {
            ProductionEvent::ShotStatus { shot_id, status } => {
                assert_eq!(shot_id.as_str(), "S01");
                assert_eq!(status, ShotStatus::Generating);
            }
            other => panic!("unexpected event: {other:?}"),
        }
    }

    #[test]
    fn test_publish_without_subscribers_is_fine() {
        let channel = ProgressChannel::new(16);
        channel.log("no one is listening");
    }
}
