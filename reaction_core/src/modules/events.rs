use std::time::Duration;

use serde::Serialize;
use tokio::sync::broadcast;

const EVENT_CAP: usize = 64;

/// Notifications for the presentation layer. Delivery is best-effort: with no
/// subscriber, or a lagging one, events are dropped.
#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "snake_case", tag = "type")]
pub enum FeedEvent {
    Haptic {
        item_id: String,
        #[serde(with = "millis")]
        pulse: Duration,
    },
    TapAnimation {
        item_id: String,
    },
    ReactionChanged {
        item_id: String,
        liked: bool,
        count: i64,
    },
    ToggleFailed {
        item_id: String,
        message: String,
    },
}

#[derive(Clone)]
pub struct EventBus {
    tx: broadcast::Sender<FeedEvent>,
}

impl EventBus {
    pub fn new() -> Self {
        let (tx, _rx) = broadcast::channel(EVENT_CAP);
        Self { tx }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<FeedEvent> {
        self.tx.subscribe()
    }

    pub fn emit(&self, event: FeedEvent) {
        let _ = self.tx.send(event);
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

mod millis {
    use serde::Serializer;
    use std::time::Duration;

    pub fn serialize<S: Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_u64(u64::try_from(d.as_millis()).unwrap_or(u64::MAX))
    }
}
