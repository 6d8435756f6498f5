use crate::channels::dispatcher::{CommandDispatcher, DispatchOutcome};
use crate::channels::types::{Author, ClientUser, IncomingMessage, MessageEvent, Responder, SentMessage};
use crate::config::Config;
use crate::error::DispatchError;
use crate::gateway::EventBroadcaster;
use crate::gateway::GatewayEvent;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serenity::all::{
    ChannelId, Client, Context, EditMessage, EventHandler, GatewayIntents, Message, MessageId,
    MessageUpdateEvent, Ready, Timestamp,
};
use serenity::http::Http;
use std::sync::Arc;
use tokio::sync::oneshot;

/// Discord rejects longer messages
const MAX_MESSAGE_LEN: usize = 2000;

fn parse_id(raw: &str) -> Option<u64> {
    raw.parse::<u64>().ok().filter(|id| *id != 0 && *id != u64::MAX)
}

fn to_utc(timestamp: &Timestamp) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(&timestamp.to_string())
        .map(|t| t.with_timezone(&Utc))
        .unwrap_or_else(|_| Utc::now())
}

fn truncate(content: &str) -> String {
    if content.chars().count() > MAX_MESSAGE_LEN {
        let mut cut: String = content.chars().take(MAX_MESSAGE_LEN - 3).collect();
        cut.push_str("...");
        cut
    } else {
        content.to_string()
    }
}

/// Snapshot a serenity message for the dispatcher. `own_id` is the account
/// we run as; only its messages can be edited by us.
fn to_incoming(msg: &Message, own_id: Option<&str>) -> IncomingMessage {
    let author_id = msg.author.id.to_string();
    IncomingMessage {
        id: msg.id.to_string(),
        editable: own_id == Some(author_id.as_str()),
        author: Author {
            id: author_id,
            name: msg.author.name.clone(),
            bot: msg.author.bot || msg.webhook_id.is_some(),
        },
        channel_id: msg.channel_id.to_string(),
        guild_id: msg.guild_id.map(|g| g.to_string()),
        content: msg.content.clone(),
        created_at: to_utc(&msg.timestamp),
        edited_at: msg.edited_timestamp.as_ref().map(to_utc),
    }
}

fn to_sent(msg: &Message) -> SentMessage {
    SentMessage {
        id: msg.id.to_string(),
        channel_id: msg.channel_id.to_string(),
        content: msg.content.clone(),
        created_at: to_utc(&msg.timestamp),
    }
}

/// Sends, edits and deletes responses over Discord's HTTP API
pub struct DiscordResponder {
    http: Arc<Http>,
}

impl DiscordResponder {
    pub fn new(http: Arc<Http>) -> Self {
        Self { http }
    }

    fn ids(sent: &SentMessage) -> Option<(ChannelId, MessageId)> {
        Some((
            ChannelId::new(parse_id(&sent.channel_id)?),
            MessageId::new(parse_id(&sent.id)?),
        ))
    }
}

#[async_trait]
impl Responder for DiscordResponder {
    async fn send(&self, channel_id: &str, content: &str) -> Result<SentMessage, DispatchError> {
        let send_error = |reason: String| DispatchError::Send {
            channel_id: channel_id.to_string(),
            reason,
        };
        let channel = parse_id(channel_id)
            .map(ChannelId::new)
            .ok_or_else(|| send_error("invalid channel ID".to_string()))?;

        let msg = channel
            .say(&*self.http, truncate(content))
            .await
            .map_err(|e| send_error(e.to_string()))?;
        Ok(to_sent(&msg))
    }

    async fn edit(&self, sent: &SentMessage, content: &str) -> Result<SentMessage, DispatchError> {
        let edit_error = |reason: String| DispatchError::Edit {
            message_id: sent.id.clone(),
            reason,
        };
        let (channel, message_id) =
            Self::ids(sent).ok_or_else(|| edit_error("invalid message reference".to_string()))?;

        let msg = channel
            .edit_message(&*self.http, message_id, EditMessage::new().content(truncate(content)))
            .await
            .map_err(|e| edit_error(e.to_string()))?;
        Ok(to_sent(&msg))
    }

    async fn delete(&self, sent: &SentMessage) -> Result<(), DispatchError> {
        let delete_error = |reason: String| DispatchError::Delete {
            message_id: sent.id.clone(),
            reason,
        };
        let (channel, message_id) =
            Self::ids(sent).ok_or_else(|| delete_error("invalid message reference".to_string()))?;

        channel
            .delete_message(&*self.http, message_id)
            .await
            .map_err(|e| delete_error(e.to_string()))
    }
}

struct DiscordHandler {
    dispatcher: Arc<CommandDispatcher>,
}

impl DiscordHandler {
    fn own_id(&self) -> Option<String> {
        self.dispatcher.client_user().map(|u| u.id.clone())
    }

    async fn dispatch(&self, event: MessageEvent) {
        let message_id = event.message().id.clone();
        match self.dispatcher.handle_message(event).await {
            Ok(DispatchOutcome::FilteredOut) | Ok(DispatchOutcome::NotInvocation) => {}
            Ok(outcome) => log::debug!("Discord: Message {} -> {:?}", message_id, outcome),
            Err(e) => log::error!("Discord: Failed to dispatch message {}: {}", message_id, e),
        }
    }
}

#[serenity::async_trait]
impl EventHandler for DiscordHandler {
    async fn message(&self, _ctx: Context, msg: Message) {
        // Joins, pins, boosts and the like carry no command text
        if msg.kind != serenity::all::MessageType::Regular
            && msg.kind != serenity::all::MessageType::InlineReply
        {
            return;
        }

        let own_id = self.own_id();
        let incoming = to_incoming(&msg, own_id.as_deref());
        self.dispatch(MessageEvent::Created(incoming)).await;
    }

    async fn message_update(
        &self,
        ctx: Context,
        old_if_available: Option<Message>,
        new: Option<Message>,
        event: MessageUpdateEvent,
    ) {
        // Embed unfurls and pins arrive as updates without new content
        if event.content.is_none() {
            return;
        }

        let new = match new {
            Some(msg) => msg,
            None => match event.channel_id.message(&ctx, event.id).await {
                Ok(msg) => msg,
                Err(e) => {
                    log::warn!("Discord: Failed to fetch edited message {}: {}", event.id, e);
                    return;
                }
            },
        };

        let own_id = self.own_id();
        let message = to_incoming(&new, own_id.as_deref());
        let previous = old_if_available.map(|old| to_incoming(&old, own_id.as_deref()));
        self.dispatch(MessageEvent::Edited { message, previous }).await;
    }

    async fn ready(&self, _ctx: Context, ready: Ready) {
        log::info!("Discord: Connected as {}", ready.user.name);
        self.dispatcher.set_client_user(ClientUser {
            id: ready.user.id.to_string(),
            name: ready.user.name.clone(),
        });
    }
}

/// Run the Discord feed until the shutdown signal fires or the client stops
pub async fn start_discord_listener(
    config: &Config,
    dispatcher: Arc<CommandDispatcher>,
    broadcaster: Arc<EventBroadcaster>,
    mut shutdown_rx: oneshot::Receiver<()>,
) -> Result<(), String> {
    let token = config
        .discord_bot_token
        .clone()
        .ok_or_else(|| "DISCORD_BOT_TOKEN is not set".to_string())?;

    log::info!("Starting Discord listener");

    // Message content is needed to see commands at all
    let intents = GatewayIntents::GUILD_MESSAGES
        | GatewayIntents::DIRECT_MESSAGES
        | GatewayIntents::MESSAGE_CONTENT;

    // Old versions of edited messages come from the cache
    let mut cache_settings = serenity::cache::Settings::default();
    cache_settings.max_messages = config.message_cache_size;

    let mut client = Client::builder(&token, intents)
        .cache_settings(cache_settings)
        .event_handler(DiscordHandler { dispatcher })
        .await
        .map_err(|e| format!("Failed to create Discord client: {}", e))?;

    broadcaster.broadcast(GatewayEvent::channel_started("discord", "discord"));

    let shard_manager = client.shard_manager.clone();

    let result = tokio::select! {
        _ = &mut shutdown_rx => {
            log::info!("Discord listener received shutdown signal");
            shard_manager.shutdown_all().await;
            Ok(())
        }
        result = client.start() => {
            result.map_err(|e| {
                let error = format!("Discord client error: {}", e);
                log::error!("{}", error);
                error
            })
        }
    };

    broadcaster.broadcast(GatewayEvent::channel_stopped("discord", "discord"));
    log::info!("Discord listener stopped");
    result
}

/// Responder for a bot token, usable before the gateway connects
pub fn responder_for_token(token: &str) -> Arc<DiscordResponder> {
    Arc::new(DiscordResponder::new(Arc::new(Http::new(token))))
}
