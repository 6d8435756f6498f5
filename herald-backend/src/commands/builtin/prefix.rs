use crate::channels::dispatcher::CommandMessage;
use crate::commands::registry::Command;
use crate::commands::types::{CommandContext, CommandDefinition, CommandOutput};
use crate::commands::util::usage;
use crate::error::DispatchError;
use async_trait::async_trait;

/// Shows or changes the command prefix of the current scope
pub struct PrefixCommand {
    definition: CommandDefinition,
}

impl PrefixCommand {
    pub fn new() -> Self {
        Self {
            definition: CommandDefinition::new("prefix", "util", "Shows or sets the command prefix.")
                .with_details(
                    "If no prefix is provided, the current prefix will be shown. \
                     If the prefix is \"default\", the prefix will be reset to the bot's default prefix. \
                     If the prefix is \"none\", the prefix will be removed entirely, only allowing mentions to run commands. \
                     Only the bot owner(s) may change the prefix.",
                )
                .with_examples(&["prefix", "prefix -", "prefix omg!", "prefix default", "prefix none"])
                .guarded(),
        }
    }
}

impl Default for PrefixCommand {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Command for PrefixCommand {
    fn definition(&self) -> &CommandDefinition {
        &self.definition
    }

    async fn run(&self, msg: &mut CommandMessage, ctx: &CommandContext) -> Result<CommandOutput, DispatchError> {
        let scope = msg.scope();
        let requested = msg.args().trim().to_string();
        let bot_name = ctx.client_user().map(|u| u.name.clone());
        let responder = ctx.responder.as_ref();

        if requested.is_empty() {
            let prefix = ctx.settings.effective_prefix(&scope);
            let shown = match &prefix {
                Some(p) => format!("The command prefix is `{}`.", p),
                None => "There is no command prefix.".to_string(),
            };
            let text = format!(
                "{} To run commands, use {}.",
                shown,
                usage("command", prefix.as_deref(), bot_name.as_deref())
            );
            let sent = msg.reply(responder, &text).await?;
            return Ok(Some(vec![sent]));
        }

        if !ctx.is_owner(&msg.message.author.id) {
            let sent = msg
                .reply(responder, "Only the bot owner(s) may change the command prefix.")
                .await?;
            return Ok(Some(vec![sent]));
        }

        let text = match requested.to_lowercase().as_str() {
            "default" => {
                ctx.settings.reset_prefix(&scope).await?;
                match ctx.settings.effective_prefix(&scope) {
                    Some(p) => format!("Reset the command prefix to the default (currently `{}`).", p),
                    None => "Reset the command prefix to the default (currently none).".to_string(),
                }
            }
            "none" => {
                ctx.settings.set_prefix(&scope, None).await?;
                "Removed the command prefix entirely.".to_string()
            }
            _ => {
                ctx.settings.set_prefix(&scope, Some(&requested)).await?;
                format!("Set the command prefix to `{}`.", requested)
            }
        };

        let prefix = ctx.settings.effective_prefix(&scope);
        let text = format!(
            "{} To run commands, use {}.",
            text,
            usage("command", prefix.as_deref(), bot_name.as_deref())
        );
        let sent = msg.reply(responder, &text).await?;
        Ok(Some(vec![sent]))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::builtin::test_support::{context, invocation, OWNER};
    use crate::settings::Scope;

    #[tokio::test]
    async fn test_show_prefix() {
        let (ctx, responder) = context();
        let (command, mut msg) = invocation(&ctx, "prefix", "1", "");
        command.run(&mut msg, &ctx).await.unwrap();
        assert!(responder.sends()[0].contains("The command prefix is `!`."));
    }

    #[tokio::test]
    async fn test_non_owner_cannot_change_prefix() {
        let (ctx, responder) = context();
        let (command, mut msg) = invocation(&ctx, "prefix", "1", "?");
        command.run(&mut msg, &ctx).await.unwrap();

        assert!(responder.sends()[0].contains("Only the bot owner(s)"));
        let scope = Scope::Guild("g1".to_string());
        assert_eq!(ctx.settings.effective_prefix(&scope).as_deref(), Some("!"));
    }

    #[tokio::test]
    async fn test_owner_sets_and_resets_prefix() {
        let (ctx, _responder) = context();
        let scope = Scope::Guild("g1".to_string());

        let (command, mut msg) = invocation(&ctx, "prefix", OWNER, "?");
        command.run(&mut msg, &ctx).await.unwrap();
        assert_eq!(ctx.settings.effective_prefix(&scope).as_deref(), Some("?"));

        let (_, mut msg) = invocation(&ctx, "prefix", OWNER, "none");
        command.run(&mut msg, &ctx).await.unwrap();
        assert_eq!(ctx.settings.effective_prefix(&scope), None);

        let (_, mut msg) = invocation(&ctx, "prefix", OWNER, "default");
        command.run(&mut msg, &ctx).await.unwrap();
        assert_eq!(ctx.settings.effective_prefix(&scope).as_deref(), Some("!"));
    }
}
