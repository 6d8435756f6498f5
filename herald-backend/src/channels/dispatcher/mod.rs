//! Command dispatch: decides whether a chat message (or an edit of one)
//! invokes a command, runs it behind the inhibitors, and keeps the result
//! around so later edits update the same responses instead of adding new ones.
//!
//! Pipeline: pre-filter -> parser (custom patterns, prefix/mention, DM
//! fallback) -> inhibitors -> enablement/permission -> run -> finalize ->
//! result cache.

mod filter;
mod inhibitors;
mod message;
mod parser;
mod patterns;
mod results;

pub use filter::AwaitingSet;
pub use inhibitors::{blocklist, Inhibitor};
pub use message::CommandMessage;

use filter::MessagePreFilter;
use inhibitors::InhibitorChain;
use parser::MessageParser;
use patterns::PatternCache;
use results::{EditableResultCache, TrackedResult};

use crate::channels::types::{ClientUser, MessageEvent, Responder, SentMessage};
use crate::commands::registry::{Command, CommandRegistry};
use crate::commands::types::{CommandContext, CommandOutput};
use crate::commands::util::{preview, usage};
use crate::config::DispatcherConfig;
use crate::error::DispatchError;
use crate::gateway::EventBroadcaster;
use crate::gateway::GatewayEvent;
use crate::settings::ScopeSettings;
use once_cell::sync::OnceCell;
use std::sync::Arc;

/// Terminal state a message reached in the pipeline
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DispatchOutcome {
    /// Rejected by the pre-filter
    FilteredOut,
    /// The controlling account is not known yet
    NotReady,
    /// Edit of an untracked message while non-command edits are not tracked
    EditIgnored,
    /// Not an invocation attempt
    NotInvocation,
    /// An edit turned a tracked invocation into plain text; its responses
    /// were removed
    Retracted,
    /// Looked like an invocation but no single command resolved
    Unknown,
    /// Vetoed by an inhibitor
    Inhibited { label: String },
    /// The author may not run the command
    PermissionDenied,
    /// The command is disabled in the message's scope
    Disabled,
    /// An edit resolved a command but the original result is no longer
    /// tracked, so nothing ran
    Stale,
    /// The command ran
    Executed,
}

/// Routes incoming messages to commands
pub struct CommandDispatcher {
    config: DispatcherConfig,
    context: CommandContext,
    broadcaster: Arc<EventBroadcaster>,
    filter: MessagePreFilter,
    parser: MessageParser,
    inhibitors: InhibitorChain,
    results: EditableResultCache,
}

impl CommandDispatcher {
    pub fn new(
        config: DispatcherConfig,
        registry: Arc<CommandRegistry>,
        settings: Arc<ScopeSettings>,
        responder: Arc<dyn Responder>,
        broadcaster: Arc<EventBroadcaster>,
    ) -> Self {
        let awaiting = Arc::new(AwaitingSet::new());
        let context = CommandContext {
            responder,
            registry: registry.clone(),
            settings: settings.clone(),
            awaiting: awaiting.clone(),
            owners: Arc::new(config.owners.clone()),
            client_user: Arc::new(OnceCell::new()),
        };

        Self {
            filter: MessagePreFilter::new(config.selfbot, awaiting),
            parser: MessageParser::new(
                registry,
                settings,
                PatternCache::new(broadcaster.clone()),
                config.selfbot,
            ),
            inhibitors: InhibitorChain::new(broadcaster.clone()),
            results: EditableResultCache::new(config.command_editable_duration),
            config,
            context,
            broadcaster,
        }
    }

    /// Record the account the dispatcher acts for. Later calls (reconnects)
    /// keep the first identity.
    pub fn set_client_user(&self, user: ClientUser) {
        let name = user.name.clone();
        match self.context.client_user.set(user) {
            Ok(()) => log::info!("[DISPATCHER] Dispatching commands as {}", name),
            Err(_) => log::debug!("[DISPATCHER] Client user already set, ignoring {}", name),
        }
    }

    pub fn client_user(&self) -> Option<&ClientUser> {
        self.context.client_user()
    }

    /// Returns false if an inhibitor with the same name is registered
    pub fn add_inhibitor(&self, inhibitor: Arc<dyn Inhibitor>) -> bool {
        self.inhibitors.add(inhibitor)
    }

    #[allow(dead_code)]
    pub fn remove_inhibitor(&self, name: &str) -> bool {
        self.inhibitors.remove(name)
    }

    /// Run one message event through the pipeline.
    ///
    /// A failing command run is propagated after `command.error` is
    /// broadcast. Finalization and caching only happen on success, so a
    /// failed edit leaves the previous result and its responses in place.
    pub async fn handle_message(&self, event: MessageEvent) -> Result<DispatchOutcome, DispatchError> {
        let Some(client) = self.context.client_user().cloned() else {
            log::debug!("[DISPATCHER] Message received before the client user is known");
            return Ok(DispatchOutcome::NotReady);
        };

        if !self.filter.should_handle(&event, &client) {
            return Ok(DispatchOutcome::FilteredOut);
        }

        let is_edit = event.is_edit();
        let message = match event {
            MessageEvent::Created(message) => message,
            MessageEvent::Edited { message, .. } => message,
        };

        // Two edits of the same message in flight can read and write this
        // entry out of order
        let previous = if is_edit { self.results.get(&message.id) } else { None };
        if is_edit && previous.is_none() && !self.config.non_command_editable {
            log::debug!("[DISPATCHER] Ignoring edit of untracked message {}", message.id);
            return Ok(DispatchOutcome::EditIgnored);
        }

        let responder = self.context.responder.as_ref();

        let Some(mut cmd_msg) = self.parser.parse(&message, &client) else {
            let outcome = match previous {
                Some(TrackedResult::Command(mut earlier)) => {
                    log::info!("[DISPATCHER] Message {} is no longer a command", message.id);
                    earlier.retract(responder).await;
                    DispatchOutcome::Retracted
                }
                _ => DispatchOutcome::NotInvocation,
            };
            if self.config.non_command_editable {
                self.results.record(&message.id, TrackedResult::NonCommand);
            } else {
                self.results.remove(&message.id);
            }
            return Ok(outcome);
        };

        if let Some(TrackedResult::Command(earlier)) = &previous {
            cmd_msg.carry_responses_from(earlier);
        }

        // A command that ran but produced nothing is not worth tracking
        let mut track = true;

        let (outcome, responses) = if let Some(inhibition) = self.inhibitors.inhibit(&cmd_msg) {
            let responses = match &inhibition.response {
                Some(text) => Some(vec![cmd_msg.reply(responder, text).await?]),
                None => None,
            };
            (
                DispatchOutcome::Inhibited {
                    label: inhibition.label,
                },
                responses,
            )
        } else if let Some(command) = cmd_msg.command().cloned() {
            if !self
                .context
                .settings
                .is_command_enabled(command.as_ref(), &cmd_msg.scope())
            {
                let text = format!("The `{}` command is disabled.", command.name());
                let sent = cmd_msg.reply(responder, &text).await?;
                (DispatchOutcome::Disabled, Some(vec![sent]))
            } else if is_edit && previous.is_none() {
                log::debug!(
                    "[DISPATCHER] Edit of message {} resolved '{}' but has no tracked result",
                    message.id,
                    command.name()
                );
                (DispatchOutcome::Stale, None)
            } else if !command.has_permission(&cmd_msg, &self.context) {
                self.broadcaster.broadcast(GatewayEvent::command_blocked(
                    &message.id,
                    Some(command.name()),
                    "permission",
                ));
                let text = format!("You do not have permission to use the `{}` command.", command.name());
                let sent = cmd_msg.reply(responder, &text).await?;
                (DispatchOutcome::PermissionDenied, Some(vec![sent]))
            } else {
                let output = self.execute(command, &mut cmd_msg, is_edit).await?;
                track = output.is_some();
                (DispatchOutcome::Executed, output)
            }
        } else {
            (DispatchOutcome::Unknown, self.unknown_command(&mut cmd_msg, &client).await?)
        };

        cmd_msg.finalize(responder, responses).await;

        if track {
            self.results.record(&message.id, TrackedResult::Command(cmd_msg));
        } else {
            self.results.remove(&message.id);
        }
        Ok(outcome)
    }

    async fn execute(
        &self,
        command: Arc<dyn Command>,
        cmd_msg: &mut CommandMessage,
        from_edit: bool,
    ) -> Result<CommandOutput, DispatchError> {
        let message_id = cmd_msg.message.id.clone();
        log::info!(
            "[DISPATCHER] Running '{}' for {} (message {}{})",
            command.name(),
            cmd_msg.message.author.name,
            message_id,
            if from_edit { ", edited" } else { "" }
        );
        self.broadcaster
            .broadcast(GatewayEvent::command_run(&message_id, command.name(), from_edit));

        match command.run(cmd_msg, &self.context).await {
            Ok(output) => Ok(output),
            Err(e) => {
                log::error!("[DISPATCHER] Command '{}' failed: {}", command.name(), e);
                self.broadcaster.broadcast(GatewayEvent::command_error(
                    &message_id,
                    command.name(),
                    &e.to_string(),
                ));
                Err(e)
            }
        }
    }

    /// Announce an unresolved attempt and optionally point at `help`
    async fn unknown_command(
        &self,
        cmd_msg: &mut CommandMessage,
        client: &ClientUser,
    ) -> Result<Option<Vec<SentMessage>>, DispatchError> {
        let message = &cmd_msg.message;
        log::debug!(
            "[DISPATCHER] Unknown command in message {}: {}",
            message.id,
            preview(&message.content, 64)
        );
        self.broadcaster.broadcast(GatewayEvent::command_unknown(
            &message.id,
            &message.channel_id,
            &message.content,
        ));

        if !self.config.unknown_command_response {
            return Ok(None);
        }

        // DMs need neither prefix nor mention
        let help = if message.is_direct() {
            usage("help", None, None)
        } else {
            let prefix = self.context.settings.effective_prefix(&cmd_msg.scope());
            usage("help", prefix.as_deref(), Some(&client.name))
        };
        let text = format!("Unknown command. Use {} to view the list of all commands.", help);
        let sent = cmd_msg.reply(self.context.responder.as_ref(), &text).await?;
        Ok(Some(vec![sent]))
    }
}

#[cfg(test)]
#[path = "../dispatcher_tests.rs"]
mod dispatcher_tests;
