use crate::channels::types::{IncomingMessage, Responder, SentMessage};
use crate::commands::registry::Command;
use crate::error::DispatchError;
use crate::settings::Scope;
use std::collections::HashMap;
use std::sync::Arc;

/// A message the parser recognised as an invocation attempt, plus the
/// response bookkeeping that lets edits update earlier replies in place.
#[derive(Clone)]
pub struct CommandMessage {
    pub message: IncomingMessage,
    command: Option<Arc<dyn Command>>,
    args: String,
    captures: Vec<Option<String>>,
    /// Responses sent for the previous version of the message, per channel
    carried: HashMap<String, Vec<SentMessage>>,
    /// How many carried responses this run has reused, per channel
    positions: HashMap<String, usize>,
    /// Responses recorded at finalization, per channel
    responses: HashMap<String, Vec<SentMessage>>,
}

impl CommandMessage {
    fn new(message: IncomingMessage, command: Option<Arc<dyn Command>>) -> Self {
        Self {
            message,
            command,
            args: String::new(),
            captures: Vec::new(),
            carried: HashMap::new(),
            positions: HashMap::new(),
            responses: HashMap::new(),
        }
    }

    /// Prefix or mention matched and one default-handling command resolved
    pub fn resolved(message: IncomingMessage, command: Arc<dyn Command>, args: String) -> Self {
        Self {
            args,
            ..Self::new(message, Some(command))
        }
    }

    /// A command's own pattern matched; `captures[0]` is the whole match
    pub fn with_captures(message: IncomingMessage, command: Arc<dyn Command>, captures: Vec<Option<String>>) -> Self {
        Self {
            captures,
            ..Self::new(message, Some(command))
        }
    }

    /// Looked like an invocation but no single command resolved
    pub fn unresolved(message: IncomingMessage) -> Self {
        Self::new(message, None)
    }

    pub fn command(&self) -> Option<&Arc<dyn Command>> {
        self.command.as_ref()
    }

    /// Text after the prefix and command name
    pub fn args(&self) -> &str {
        &self.args
    }

    /// Groups captured by a custom pattern match, for commands that parse
    /// their own arguments
    #[allow(dead_code)]
    pub fn captures(&self) -> &[Option<String>] {
        &self.captures
    }

    /// Settings scope of the triggering message
    pub fn scope(&self) -> Scope {
        Scope::of_guild(self.message.guild_id.as_deref())
    }

    /// Responses recorded by the last finalization, per channel
    #[cfg(test)]
    pub fn responses(&self) -> &HashMap<String, Vec<SentMessage>> {
        &self.responses
    }

    /// Seed this run with the responses of an earlier version of the message
    pub fn carry_responses_from(&mut self, previous: &CommandMessage) {
        self.carried = previous.responses.clone();
        self.positions.clear();
    }

    /// Reply to the author: mentions them in guilds, plain text in DMs
    pub async fn reply(&mut self, responder: &dyn Responder, text: &str) -> Result<SentMessage, DispatchError> {
        let content = if self.message.is_direct() {
            text.to_string()
        } else {
            format!("<@{}>, {}", self.message.author.id, text)
        };
        self.respond(responder, &content).await
    }

    /// Send plain text to the message's channel
    pub async fn say(&mut self, responder: &dyn Responder, text: &str) -> Result<SentMessage, DispatchError> {
        self.respond(responder, text).await
    }

    /// Edit the next carried response for the channel if there is one,
    /// otherwise send a new message.
    async fn respond(&mut self, responder: &dyn Responder, content: &str) -> Result<SentMessage, DispatchError> {
        let channel_id = self.message.channel_id.clone();
        let position = self.positions.get(&channel_id).copied().unwrap_or(0);

        let sent = match self.carried.get(&channel_id).and_then(|list| list.get(position)) {
            Some(previous) => responder.edit(previous, content).await?,
            None => responder.send(&channel_id, content).await?,
        };

        self.positions.insert(channel_id, position + 1);
        Ok(sent)
    }

    /// Delete carried responses this run did not reuse, then record `output`
    /// as the message's responses. Delete failures are logged and skipped.
    pub async fn finalize(&mut self, responder: &dyn Responder, output: Option<Vec<SentMessage>>) {
        for (channel_id, carried) in self.carried.drain() {
            let used = self.positions.get(&channel_id).copied().unwrap_or(0);
            for stale in carried.iter().skip(used) {
                if let Err(e) = responder.delete(stale).await {
                    log::warn!("[DISPATCHER] Failed to delete stale response {}: {}", stale.id, e);
                }
            }
        }
        self.positions.clear();

        self.responses.clear();
        for sent in output.unwrap_or_default() {
            self.responses.entry(sent.channel_id.clone()).or_default().push(sent);
        }
    }

    /// Delete every recorded response; used when an edit turns the message
    /// into something that is no longer a command
    pub async fn retract(&mut self, responder: &dyn Responder) {
        self.carried = std::mem::take(&mut self.responses);
        self.positions.clear();
        self.finalize(responder, None).await;
    }
}

impl std::fmt::Debug for CommandMessage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CommandMessage")
            .field("message_id", &self.message.id)
            .field("command", &self.command.as_ref().map(|c| c.name().to_string()))
            .field("args", &self.args)
            .field("captures", &self.captures)
            .field("responses", &self.responses.values().map(Vec::len).sum::<usize>())
            .finish()
    }
}
