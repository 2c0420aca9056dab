use tokio::sync::broadcast;
use tracing::debug;

use crate::constants::moderation::EVENT_BUS_CAPACITY;
use crate::events::types::{CallbackEvent, ContentEvent, HealthEvent, JoinEvent};

/// Per-kind broadcast channels between the gateway handlers and the
/// moderation pipelines.
///
/// Each event kind has its own channel so any number of subscribers can
/// listen independently; a slow subscriber lags and drops on its own receiver
/// without blocking publishers or other subscribers.
pub struct EventBus {
    content: broadcast::Sender<ContentEvent>,
    joins: broadcast::Sender<JoinEvent>,
    callbacks: broadcast::Sender<CallbackEvent>,
    health: broadcast::Sender<HealthEvent>,
}

impl EventBus {
    pub fn new() -> Self {
        let (content, _) = broadcast::channel(EVENT_BUS_CAPACITY);
        let (joins, _) = broadcast::channel(EVENT_BUS_CAPACITY);
        let (callbacks, _) = broadcast::channel(EVENT_BUS_CAPACITY);
        let (health, _) = broadcast::channel(EVENT_BUS_CAPACITY);
        Self {
            content,
            joins,
            callbacks,
            health,
        }
    }

    /// Publishing with no live subscribers is not an error; the event is
    /// simply dropped.
    pub fn publish_content(&self, event: ContentEvent) {
        if self.content.send(event).is_err() {
            debug!("Content event dropped: no subscribers");
        }
    }

    pub fn publish_join(&self, event: JoinEvent) {
        if self.joins.send(event).is_err() {
            debug!("Join event dropped: no subscribers");
        }
    }

    pub fn publish_callback(&self, event: CallbackEvent) {
        if self.callbacks.send(event).is_err() {
            debug!("Callback event dropped: no subscribers");
        }
    }

    pub fn publish_health(&self, event: HealthEvent) {
        if self.health.send(event).is_err() {
            debug!("Health event dropped: no subscribers");
        }
    }

    pub fn subscribe_content(&self) -> broadcast::Receiver<ContentEvent> {
        self.content.subscribe()
    }

    pub fn subscribe_joins(&self) -> broadcast::Receiver<JoinEvent> {
        self.joins.subscribe()
    }

    pub fn subscribe_callbacks(&self) -> broadcast::Receiver<CallbackEvent> {
        self.callbacks.subscribe()
    }

    pub fn subscribe_health(&self) -> broadcast::Receiver<HealthEvent> {
        self.health.subscribe()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn all_subscribers_receive_each_event() {
        let bus = EventBus::new();
        let mut a = bus.subscribe_joins();
        let mut b = bus.subscribe_joins();

        bus.publish_join(JoinEvent {
            chat_id: 1,
            user_id: 2,
            display_name: "newcomer".to_string(),
            avatar_url: None,
        });

        assert_eq!(a.recv().await.unwrap().user_id, 2);
        assert_eq!(b.recv().await.unwrap().user_id, 2);
    }

    #[tokio::test]
    async fn publish_without_subscribers_is_silent() {
        let bus = EventBus::new();
        bus.publish_health(HealthEvent::Resumed);
    }
}
