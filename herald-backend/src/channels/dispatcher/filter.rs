use crate::channels::types::{ClientUser, IncomingMessage, MessageEvent};
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::oneshot;

/// (user, channel) pairs whose next message answers a command's prompt
/// instead of being dispatched
#[derive(Debug, Default)]
pub struct AwaitingSet {
    pairs: DashMap<(String, String), Option<oneshot::Sender<IncomingMessage>>>,
}

impl AwaitingSet {
    pub fn new() -> Self {
        Self::default()
    }

    fn key(user_id: &str, channel_id: &str) -> (String, String) {
        (user_id.to_string(), channel_id.to_string())
    }

    /// Wait for the next message `user_id` posts in `channel_id`. Returns
    /// `None` on timeout, or right away if that pair is already prompted.
    /// The pair is released either way.
    pub async fn prompt(&self, user_id: &str, channel_id: &str, timeout: Duration) -> Option<IncomingMessage> {
        let key = Self::key(user_id, channel_id);
        let (tx, rx) = oneshot::channel();
        match self.pairs.entry(key.clone()) {
            Entry::Occupied(_) => return None,
            Entry::Vacant(slot) => {
                slot.insert(Some(tx));
            }
        }
        log::debug!("[AWAITING] Waiting for {} in channel {}", user_id, channel_id);

        let answer = tokio::time::timeout(timeout, rx).await.ok().and_then(Result::ok);
        self.pairs.remove(&key);
        if answer.is_none() {
            log::debug!("[AWAITING] Prompt for {} in channel {} timed out", user_id, channel_id);
        }
        answer
    }

    /// Hand `message` to the prompt waiting on its pair. Returns true if the
    /// pair is awaited, whether or not this message was the answer.
    pub fn offer(&self, message: &IncomingMessage) -> bool {
        let key = Self::key(&message.author.id, &message.channel_id);
        match self.pairs.get_mut(&key) {
            Some(mut waiter) => {
                if let Some(tx) = waiter.value_mut().take() {
                    let _ = tx.send(message.clone());
                }
                true
            }
            None => false,
        }
    }

    pub fn contains(&self, user_id: &str, channel_id: &str) -> bool {
        self.pairs.contains_key(&Self::key(user_id, channel_id))
    }

    /// Resolves once a prompt is waiting on the pair
    #[cfg(test)]
    pub async fn wait_for(&self, user_id: &str, channel_id: &str) {
        while !self.contains(user_id, channel_id) {
            tokio::time::sleep(Duration::from_millis(2)).await;
        }
    }
}

/// Cheap checks that reject a message before any parsing happens
pub struct MessagePreFilter {
    selfbot: bool,
    awaiting: Arc<AwaitingSet>,
}

impl MessagePreFilter {
    pub fn new(selfbot: bool, awaiting: Arc<AwaitingSet>) -> Self {
        Self { selfbot, awaiting }
    }

    pub fn should_handle(&self, event: &MessageEvent, client: &ClientUser) -> bool {
        let message = event.message();
        let own = message.author.id == client.id;

        if message.author.bot {
            return false;
        }
        // Self mode only listens to the controlling account, bot mode never does
        if self.selfbot != own {
            return false;
        }
        // Answers to a pending prompt go to the prompt, never to the parser
        let awaited = match event {
            MessageEvent::Created(message) => self.awaiting.offer(message),
            MessageEvent::Edited { message, .. } => {
                self.awaiting.contains(&message.author.id, &message.channel_id)
            }
        };
        if awaited {
            return false;
        }
        if let MessageEvent::Edited {
            previous: Some(previous),
            ..
        } = event
        {
            if previous.content == message.content {
                return false;
            }
        }
        true
    }
}
