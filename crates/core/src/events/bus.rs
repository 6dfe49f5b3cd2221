use std::sync::Arc;
use tokio::sync::broadcast;

use super::types::EditorEvent;

pub const DEFAULT_CAPACITY: usize = 1024;

/// In-process event bus backed by `tokio::broadcast`.
/// Publishing never blocks; with no subscribers an event is simply dropped.
#[derive(Debug, Clone)]
pub struct EventBus {
    sender: Arc<broadcast::Sender<EditorEvent>>,
}

impl EventBus {
    /// Create a new event bus with the given channel capacity.
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self {
            sender: Arc::new(sender),
        }
    }

    /// Publish an event to all current subscribers, returning how many saw it.
    pub fn publish(&self, event: EditorEvent) -> usize {
        match self.sender.send(event) {
            Ok(receivers) => receivers,
            Err(broadcast::error::SendError(event)) => {
                tracing::trace!(?event, "event dropped: no subscribers");
                0
            }
        }
    }

    /// Subscribe to the event stream.
    pub fn subscribe(&self) -> broadcast::Receiver<EditorEvent> {
        self.sender.subscribe()
    }

    /// Number of active subscribers.
    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::GuideId;

    #[tokio::test]
    async fn publish_and_receive() {
        let bus = EventBus::new(16);
        let mut rx = bus.subscribe();
        let guide_id = GuideId::new();

        assert_eq!(bus.publish(EditorEvent::Unpublished { guide_id }), 1);

        let event = rx.recv().await.unwrap();
        assert_eq!(event, EditorEvent::Unpublished { guide_id });
    }

    #[tokio::test]
    async fn multiple_subscribers() {
        let bus = EventBus::new(16);
        let mut rx1 = bus.subscribe();
        let mut rx2 = bus.subscribe();

        assert_eq!(bus.subscriber_count(), 2);

        bus.publish(EditorEvent::GuideUpdated {
            guide_id: GuideId::new(),
        });

        assert!(matches!(rx1.recv().await.unwrap(), EditorEvent::GuideUpdated { .. }));
        assert!(matches!(rx2.recv().await.unwrap(), EditorEvent::GuideUpdated { .. }));
    }

    #[test]
    fn publishing_without_subscribers_is_harmless() {
        let bus = EventBus::default();
        assert_eq!(bus.publish(EditorEvent::Unpublished { guide_id: GuideId::new() }), 0);
    }
}
