//! In-process change feed for checklist entries.
//!
//! Typed row-change events over a broadcast channel; each subscriber gets
//! its own cancellable receiver (dropping it ends the subscription). The
//! fraud/GPS logic never depends on this channel — it exists purely so
//! list surfaces can refresh without polling.

use serde::Serialize;
use tokio::sync::broadcast;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::features::checklist::dtos::ChecklistEntryDto;

const FEED_CAPACITY: usize = 256;

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum EntryEvent {
    Inserted { entry: ChecklistEntryDto },
    Updated { entry: ChecklistEntryDto },
    Deleted { id: Uuid },
}

pub struct EntryChangeFeed {
    sender: broadcast::Sender<EntryEvent>,
}

impl EntryChangeFeed {
    pub fn new() -> Self {
        let (sender, _) = broadcast::channel(FEED_CAPACITY);
        Self { sender }
    }

    /// Publish an event. A feed with no subscribers drops events silently.
    pub fn publish(&self, event: EntryEvent) {
        let _ = self.sender.send(event);
    }

    pub fn subscribe(&self) -> broadcast::Receiver<EntryEvent> {
        self.sender.subscribe()
    }
}

impl Default for EntryChangeFeed {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_subscriber_receives_published_event() {
        let feed = EntryChangeFeed::new();
        let mut rx = feed.subscribe();

        let id = Uuid::new_v4();
        feed.publish(EntryEvent::Deleted { id });

        match rx.recv().await.unwrap() {
            EntryEvent::Deleted { id: got } => assert_eq!(got, id),
            other => panic!("unexpected event: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_publish_without_subscribers_is_silent() {
        let feed = EntryChangeFeed::new();
        feed.publish(EntryEvent::Deleted { id: Uuid::new_v4() });
    }

    #[tokio::test]
    async fn test_dropped_receiver_ends_subscription() {
        let feed = EntryChangeFeed::new();
        let rx = feed.subscribe();
        drop(rx);
        feed.publish(EntryEvent::Deleted { id: Uuid::new_v4() });

        // a fresh subscriber only sees events published after it joined
        let mut rx2 = feed.subscribe();
        let id = Uuid::new_v4();
        feed.publish(EntryEvent::Deleted { id });
        match rx2.recv().await.unwrap() {
            EntryEvent::Deleted { id: got } => assert_eq!(got, id),
            other => panic!("unexpected event: {:?}", other),
        }
    }
}
