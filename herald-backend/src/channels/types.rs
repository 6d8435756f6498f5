use crate::error::DispatchError;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Author of an incoming message
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Author {
    /// Platform-specific user ID
    pub id: String,
    /// Display name of the user
    pub name: String,
    /// Whether the account is automated (bots, webhooks)
    pub bot: bool,
}

/// Immutable snapshot of a chat message as delivered by the feed
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IncomingMessage {
    /// Platform-specific message ID
    pub id: String,
    pub author: Author,
    /// Platform-specific channel ID
    pub channel_id: String,
    /// Guild the message was posted in; `None` for direct messages
    pub guild_id: Option<String>,
    /// Raw text content
    pub content: String,
    pub created_at: DateTime<Utc>,
    pub edited_at: Option<DateTime<Utc>>,
    /// Whether the controlling account can edit this message itself
    pub editable: bool,
}

impl IncomingMessage {
    pub fn is_direct(&self) -> bool {
        self.guild_id.is_none()
    }
}

/// The account the dispatcher acts for (the bot, or the user in self mode)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientUser {
    pub id: String,
    pub name: String,
}

/// Event delivered by the message feed
#[derive(Debug, Clone)]
pub enum MessageEvent {
    /// A message was posted
    Created(IncomingMessage),
    /// A previously posted message was edited. `previous` is the last version
    /// the feed knew about, when it has one.
    Edited {
        message: IncomingMessage,
        previous: Option<IncomingMessage>,
    },
}

impl MessageEvent {
    pub fn message(&self) -> &IncomingMessage {
        match self {
            MessageEvent::Created(message) => message,
            MessageEvent::Edited { message, .. } => message,
        }
    }

    pub fn is_edit(&self) -> bool {
        matches!(self, MessageEvent::Edited { .. })
    }
}

/// Reference to a response the bot has sent
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SentMessage {
    pub id: String,
    pub channel_id: String,
    pub content: String,
    pub created_at: DateTime<Utc>,
}

impl From<&IncomingMessage> for SentMessage {
    /// Treat an incoming message as a response handle, for editing the
    /// controlling account's own messages in self mode
    fn from(message: &IncomingMessage) -> Self {
        Self {
            id: message.id.clone(),
            channel_id: message.channel_id.clone(),
            content: message.content.clone(),
            created_at: message.created_at,
        }
    }
}

/// Sends, edits and deletes the bot's responses on the chat platform
#[async_trait]
pub trait Responder: Send + Sync {
    async fn send(&self, channel_id: &str, content: &str) -> Result<SentMessage, DispatchError>;

    async fn edit(&self, sent: &SentMessage, content: &str) -> Result<SentMessage, DispatchError>;

    async fn delete(&self, sent: &SentMessage) -> Result<(), DispatchError>;
}

/// One call made against a `MockResponder`
#[cfg(test)]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResponderCall {
    Send { channel_id: String, content: String },
    Edit { message_id: String, content: String },
    Delete { message_id: String },
}

/// Recording responder for tests: every call is kept in order and sends get
/// sequential IDs (`r1`, `r2`, ...).
#[cfg(test)]
#[derive(Default)]
pub struct MockResponder {
    calls: parking_lot::Mutex<Vec<ResponderCall>>,
    next_id: std::sync::atomic::AtomicU64,
}

#[cfg(test)]
impl MockResponder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn calls(&self) -> Vec<ResponderCall> {
        self.calls.lock().clone()
    }

    pub fn sends(&self) -> Vec<String> {
        self.calls
            .lock()
            .iter()
            .filter_map(|c| match c {
                ResponderCall::Send { content, .. } => Some(content.clone()),
                _ => None,
            })
            .collect()
    }

    pub fn count_sends(&self) -> usize {
        self.sends().len()
    }

    pub fn count_edits(&self) -> usize {
        self.calls
            .lock()
            .iter()
            .filter(|c| matches!(c, ResponderCall::Edit { .. }))
            .count()
    }

    pub fn deleted_ids(&self) -> Vec<String> {
        self.calls
            .lock()
            .iter()
            .filter_map(|c| match c {
                ResponderCall::Delete { message_id } => Some(message_id.clone()),
                _ => None,
            })
            .collect()
    }
}

#[cfg(test)]
#[async_trait]
impl Responder for MockResponder {
    async fn send(&self, channel_id: &str, content: &str) -> Result<SentMessage, DispatchError> {
        let n = self
            .next_id
            .fetch_add(1, std::sync::atomic::Ordering::SeqCst)
            + 1;
        self.calls.lock().push(ResponderCall::Send {
            channel_id: channel_id.to_string(),
            content: content.to_string(),
        });
        Ok(SentMessage {
            id: format!("r{}", n),
            channel_id: channel_id.to_string(),
            content: content.to_string(),
            created_at: Utc::now(),
        })
    }

    async fn edit(&self, sent: &SentMessage, content: &str) -> Result<SentMessage, DispatchError> {
        self.calls.lock().push(ResponderCall::Edit {
            message_id: sent.id.clone(),
            content: content.to_string(),
        });
        Ok(SentMessage {
            content: content.to_string(),
            ..sent.clone()
        })
    }

    async fn delete(&self, sent: &SentMessage) -> Result<(), DispatchError> {
        self.calls.lock().push(ResponderCall::Delete {
            message_id: sent.id.clone(),
        });
        Ok(())
    }
}

#[cfg(test)]
impl IncomingMessage {
    /// Guild message from a regular user in channel `c1`
    pub fn test(id: &str, author_id: &str, content: &str) -> Self {
        Self {
            id: id.to_string(),
            author: Author {
                id: author_id.to_string(),
                name: format!("user{}", author_id),
                bot: false,
            },
            channel_id: "c1".to_string(),
            guild_id: Some("g1".to_string()),
            content: content.to_string(),
            created_at: Utc::now(),
            edited_at: None,
            editable: false,
        }
    }

    /// Same message as a direct message (no guild)
    pub fn direct(mut self) -> Self {
        self.guild_id = None;
        self
    }

    /// New version of this message with different content
    pub fn edited(&self, content: &str) -> Self {
        Self {
            content: content.to_string(),
            edited_at: Some(Utc::now()),
            ..self.clone()
        }
    }
}
