use crate::channels::dispatcher::CommandMessage;
use crate::commands::registry::{Command, NameLookup};
use crate::commands::types::{CommandContext, CommandDefinition, CommandOutput};
use crate::commands::util::{disambiguation, usage};
use crate::error::DispatchError;
use async_trait::async_trait;

/// Lists the commands available in the current scope, or describes one
pub struct HelpCommand {
    definition: CommandDefinition,
}

impl HelpCommand {
    pub fn new() -> Self {
        Self {
            definition: CommandDefinition::new(
                "help",
                "util",
                "Displays a list of available commands, or detailed information for a specified command.",
            )
            .with_aliases(&["commands"])
            .with_examples(&["help", "help prefix"])
            .guarded(),
        }
    }
}

impl Default for HelpCommand {
    fn default() -> Self {
        Self::new()
    }
}

fn describe(definition: &CommandDefinition, prefix: Option<&str>, bot_name: Option<&str>) -> String {
    let mut text = format!(
        "__Command **{}**:__ {}\n**Format:** {}",
        definition.name,
        definition.description,
        usage(&definition.name, prefix, bot_name)
    );
    if !definition.aliases.is_empty() {
        text.push_str(&format!("\n**Aliases:** {}", definition.aliases.join(", ")));
    }
    text.push_str(&format!("\n**Group:** {}", definition.qualified_name()));
    if let Some(details) = &definition.details {
        text.push_str(&format!("\n**Details:** {}", details));
    }
    if !definition.examples.is_empty() {
        text.push_str(&format!("\n**Examples:**\n{}", definition.examples.join("\n")));
    }
    text
}

#[async_trait]
impl Command for HelpCommand {
    fn definition(&self) -> &CommandDefinition {
        &self.definition
    }

    async fn run(&self, msg: &mut CommandMessage, ctx: &CommandContext) -> Result<CommandOutput, DispatchError> {
        let scope = msg.scope();
        let prefix = if msg.message.is_direct() {
            None
        } else {
            ctx.settings.effective_prefix(&scope)
        };
        let bot_name = if msg.message.is_direct() {
            None
        } else {
            ctx.client_user().map(|u| u.name.clone())
        };
        let search = msg.args().trim().to_string();

        let text = if search.is_empty() {
            let mut text = format!(
                "To run a command, use {}.\n\n__**Available commands**__",
                usage("command", prefix.as_deref(), bot_name.as_deref())
            );
            for group in ctx.registry.groups() {
                let lines: Vec<String> = ctx
                    .registry
                    .commands()
                    .filter(|c| c.definition().group == group.id)
                    .filter(|c| ctx.settings.is_command_enabled(c.as_ref(), &scope))
                    .map(|c| format!("**{}:** {}", c.name(), c.definition().description))
                    .collect();
                if !lines.is_empty() {
                    text.push_str(&format!("\n\n__{}__\n{}", group.name, lines.join("\n")));
                }
            }
            text
        } else {
            match ctx.registry.find_commands(&search, false) {
                NameLookup::Unique(command) => {
                    describe(command.definition(), prefix.as_deref(), bot_name.as_deref())
                }
                NameLookup::Ambiguous(found) => {
                    let names: Vec<&str> = found.iter().map(|c| c.name()).collect();
                    disambiguation(&names, "commands")
                }
                NameLookup::None => format!(
                    "Unable to identify command. Use {} to view the list of all commands.",
                    usage("help", prefix.as_deref(), bot_name.as_deref())
                ),
            }
        };

        let sent = msg.reply(ctx.responder.as_ref(), &text).await?;
        Ok(Some(vec![sent]))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::builtin::test_support::{context, invocation};

    #[tokio::test]
    async fn test_help_lists_enabled_commands() {
        let (ctx, responder) = context();
        let ping = ctx.registry.find_commands("ping", true).unique().unwrap();
        ctx.settings
            .set_command_enabled(ping.as_ref(), &crate::settings::Scope::Guild("g1".to_string()), false)
            .await
            .unwrap();

        let (command, mut msg) = invocation(&ctx, "help", "1", "");
        command.run(&mut msg, &ctx).await.unwrap();

        let text = &responder.sends()[0];
        assert!(text.contains("**help:**"));
        assert!(text.contains("**prefix:**"));
        assert!(!text.contains("**ping:**"));
    }

    #[tokio::test]
    async fn test_help_describes_one_command() {
        let (ctx, responder) = context();
        let (command, mut msg) = invocation(&ctx, "help", "1", "prefix");
        command.run(&mut msg, &ctx).await.unwrap();

        let text = &responder.sends()[0];
        assert!(text.contains("__Command **prefix**:__"));
        assert!(text.contains("util:prefix"));
    }

    #[tokio::test]
    async fn test_help_reports_ambiguity() {
        let (ctx, responder) = context();
        let (command, mut msg) = invocation(&ctx, "help", "1", "able");
        command.run(&mut msg, &ctx).await.unwrap();

        assert!(responder.sends()[0].contains("Multiple commands found"));
    }
}
