//! Command doubles shared by the unit and dispatcher tests.

use crate::channels::dispatcher::CommandMessage;
use crate::commands::registry::Command;
use crate::commands::types::{CommandContext, CommandDefinition, CommandOutput};
use crate::error::DispatchError;
use async_trait::async_trait;
use regex::Regex;
use std::sync::atomic::{AtomicUsize, Ordering};

#[derive(Debug, Clone)]
enum Behavior {
    /// Reply with fixed text
    Reply(String),
    /// Reply with "<name>: <args>"
    Echo,
    /// Run without producing output
    Silent,
    /// Fail with the given reason
    Fail(String),
}

/// Configurable command that counts its runs
pub struct StaticCommand {
    definition: CommandDefinition,
    behavior: Behavior,
    runs: AtomicUsize,
}

impl StaticCommand {
    pub fn new(name: &str, group: &str, reply: &str) -> Self {
        Self {
            definition: CommandDefinition::new(name, group, "test command"),
            behavior: Behavior::Reply(reply.to_string()),
            runs: AtomicUsize::new(0),
        }
    }

    pub fn echo(name: &str, group: &str) -> Self {
        Self {
            behavior: Behavior::Echo,
            ..Self::new(name, group, "")
        }
    }

    pub fn silent(name: &str, group: &str) -> Self {
        Self {
            behavior: Behavior::Silent,
            ..Self::new(name, group, "")
        }
    }

    pub fn failing(name: &str, group: &str, reason: &str) -> Self {
        Self {
            behavior: Behavior::Fail(reason.to_string()),
            ..Self::new(name, group, "")
        }
    }

    pub fn with_aliases(mut self, aliases: &[&str]) -> Self {
        self.definition = self.definition.with_aliases(aliases);
        self
    }

    pub fn with_patterns(mut self, patterns: &[&str]) -> Self {
        let compiled = patterns.iter().map(|p| Regex::new(p).unwrap()).collect();
        self.definition = self.definition.with_patterns(compiled);
        self
    }

    pub fn guarded(mut self) -> Self {
        self.definition = self.definition.guarded();
        self
    }

    pub fn without_default_handling(mut self) -> Self {
        self.definition = self.definition.without_default_handling();
        self
    }

    pub fn runs(&self) -> usize {
        self.runs.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Command for StaticCommand {
    fn definition(&self) -> &CommandDefinition {
        &self.definition
    }

    async fn run(&self, msg: &mut CommandMessage, ctx: &CommandContext) -> Result<CommandOutput, DispatchError> {
        self.runs.fetch_add(1, Ordering::SeqCst);
        match &self.behavior {
            Behavior::Reply(text) => {
                let sent = msg.say(ctx.responder.as_ref(), text).await?;
                Ok(Some(vec![sent]))
            }
            Behavior::Echo => {
                let text = format!("{}: {}", self.definition.name, msg.args());
                let sent = msg.say(ctx.responder.as_ref(), &text).await?;
                Ok(Some(vec![sent]))
            }
            Behavior::Silent => Ok(None),
            Behavior::Fail(reason) => Err(DispatchError::command(&self.definition.name, reason)),
        }
    }
}
