use crate::channels::dispatcher::CommandMessage;
use crate::channels::types::SentMessage;
use crate::commands::registry::Command;
use crate::commands::types::{CommandContext, CommandDefinition, CommandOutput};
use crate::error::DispatchError;
use async_trait::async_trait;
use chrono::Utc;

/// Measures the round trip of a reply
pub struct PingCommand {
    definition: CommandDefinition,
}

impl PingCommand {
    pub fn new() -> Self {
        Self {
            definition: CommandDefinition::new("ping", "util", "Checks the bot's round-trip time."),
        }
    }
}

impl Default for PingCommand {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Command for PingCommand {
    fn definition(&self) -> &CommandDefinition {
        &self.definition
    }

    async fn run(&self, msg: &mut CommandMessage, ctx: &CommandContext) -> Result<CommandOutput, DispatchError> {
        let responder = ctx.responder.as_ref();

        // In self mode the invoking message is ours, so edit it in place
        if msg.message.editable {
            let own = SentMessage::from(&msg.message);
            responder.edit(&own, "Pinging...").await?;
            let started = msg.message.edited_at.unwrap_or(msg.message.created_at);
            let elapsed = (Utc::now() - started).num_milliseconds().max(0);
            responder
                .edit(&own, &format!("🏓 Pong! The message round-trip took {}ms.", elapsed))
                .await?;
            // Never track the invoking message as one of our responses
            return Ok(Some(Vec::new()));
        }

        let pinging = msg.reply(responder, "Pinging...").await?;
        let elapsed = (pinging.created_at - msg.message.created_at)
            .num_milliseconds()
            .max(0);
        let pong = responder
            .edit(
                &pinging,
                &format!("🏓 Pong! The message round-trip took {}ms.", elapsed),
            )
            .await?;
        Ok(Some(vec![pong]))
    }
}
