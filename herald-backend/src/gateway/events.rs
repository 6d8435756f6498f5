use crate::gateway::GatewayEvent;
use dashmap::DashMap;
use tokio::sync::mpsc::{self, error::TrySendError};
use uuid::Uuid;

/// Per-subscriber queue depth. A subscriber that falls this far behind misses
/// events instead of stalling the dispatcher.
const SUBSCRIBER_BUFFER: usize = 256;

/// Fans `EventType` notices from the dispatcher and the Discord listener out
/// to every subscriber
pub struct EventBroadcaster {
    subscribers: DashMap<String, mpsc::Sender<GatewayEvent>>,
}

impl EventBroadcaster {
    pub fn new() -> Self {
        Self {
            subscribers: DashMap::new(),
        }
    }

    /// Returns (subscriber_id, receiver). Dropping the receiver unsubscribes.
    pub fn subscribe(&self) -> (String, mpsc::Receiver<GatewayEvent>) {
        let subscriber_id = Uuid::new_v4().to_string();
        let (tx, rx) = mpsc::channel(SUBSCRIBER_BUFFER);
        self.subscribers.insert(subscriber_id.clone(), tx);
        log::debug!("[EVENTS] Subscriber {} attached", subscriber_id);
        (subscriber_id, rx)
    }

    /// Never blocks; the dispatcher calls this from its hot path
    pub fn broadcast(&self, event: GatewayEvent) {
        if self.subscribers.is_empty() {
            return;
        }

        let mut closed = Vec::new();
        for entry in self.subscribers.iter() {
            match entry.value().try_send(event.clone()) {
                Ok(()) => {}
                Err(TrySendError::Full(_)) => {
                    log::warn!(
                        "[EVENTS] Subscriber {} is lagging, dropped '{}'",
                        entry.key(),
                        event.event
                    );
                }
                Err(TrySendError::Closed(_)) => closed.push(entry.key().clone()),
            }
        }

        for subscriber_id in closed {
            self.subscribers.remove(&subscriber_id);
            log::debug!("[EVENTS] Subscriber {} detached", subscriber_id);
        }

        log::trace!(
            "[EVENTS] '{}' delivered to {} subscribers",
            event.event,
            self.subscribers.len()
        );
    }

    pub fn subscriber_count(&self) -> usize {
        self.subscribers.len()
    }
}

impl Default for EventBroadcaster {
    fn default() -> Self {
        Self::new()
    }
}
