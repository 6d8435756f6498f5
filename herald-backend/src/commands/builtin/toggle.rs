use crate::channels::dispatcher::CommandMessage;
use crate::commands::registry::{Command, NameLookup};
use crate::commands::types::{CommandContext, CommandDefinition, CommandGroup, CommandOutput};
use crate::commands::util::disambiguation;
use crate::error::DispatchError;
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;

/// What an enable/disable argument resolved to
enum Target {
    Group(CommandGroup),
    Command(Arc<dyn Command>),
}

impl Target {
    fn label(&self) -> &'static str {
        match self {
            Target::Group(_) => "group",
            Target::Command(_) => "command",
        }
    }

    fn name(&self) -> String {
        match self {
            Target::Group(g) => g.name.clone(),
            Target::Command(c) => c.name().to_string(),
        }
    }

    fn guarded(&self) -> bool {
        match self {
            Target::Group(g) => g.guarded,
            Target::Command(c) => c.definition().guarded,
        }
    }
}

/// How long a bare `enable`/`disable` waits for the author to name a target
const PROMPT_TIMEOUT: Duration = Duration::from_secs(30);

/// A single group wins, then a single command. Otherwise the reply text
/// lists whatever was ambiguous.
fn resolve(ctx: &CommandContext, search: &str) -> Result<Target, String> {
    let groups = ctx.registry.find_groups(search, false);
    if groups.len() == 1 {
        return Ok(Target::Group(groups[0].clone()));
    }

    let commands = match ctx.registry.find_commands(search, false) {
        NameLookup::Unique(command) => return Ok(Target::Command(command)),
        NameLookup::Ambiguous(found) => found,
        NameLookup::None => Vec::new(),
    };
    if commands.is_empty() && groups.is_empty() {
        return Err(format!("Unable to find a command or group named `{}`.", search));
    }

    let mut lists = Vec::new();
    if commands.len() > 1 {
        let names: Vec<&str> = commands.iter().map(|c| c.name()).collect();
        lists.push(disambiguation(&names, "commands"));
    }
    if groups.len() > 1 {
        let names: Vec<&str> = groups.iter().map(|g| g.name.as_str()).collect();
        lists.push(disambiguation(&names, "groups"));
    }
    Err(lists.join("\n"))
}

async fn toggle(msg: &mut CommandMessage, ctx: &CommandContext, enable: bool) -> Result<CommandOutput, DispatchError> {
    let responder = ctx.responder.as_ref();
    let verb = if enable { "enable" } else { "disable" };
    let mut sent = Vec::new();

    let mut search = msg.args().trim().to_string();
    if search.is_empty() {
        let question = format!(
            "Which command or group would you like to {}? Respond with `cancel` to cancel the command. \
             The command will automatically be cancelled in {} seconds.",
            verb,
            PROMPT_TIMEOUT.as_secs()
        );
        sent.push(msg.reply(responder, &question).await?);

        let answer = ctx
            .awaiting
            .prompt(&msg.message.author.id, &msg.message.channel_id, PROMPT_TIMEOUT)
            .await
            .map(|m| m.content.trim().to_string())
            .filter(|text| !text.is_empty() && !text.eq_ignore_ascii_case("cancel"));
        match answer {
            Some(text) => search = text,
            None => {
                sent.push(msg.reply(responder, "Cancelled command.").await?);
                return Ok(Some(sent));
            }
        }
    }

    let target = match resolve(ctx, &search) {
        Ok(target) => target,
        Err(text) => {
            sent.push(msg.reply(responder, &text).await?);
            return Ok(Some(sent));
        }
    };

    let scope = msg.scope();
    let (label, name) = (target.label(), target.name());
    let currently = match &target {
        Target::Group(g) => ctx.settings.is_group_enabled(g, &scope),
        Target::Command(c) => ctx.settings.is_command_enabled(c.as_ref(), &scope),
    };

    let text = if !enable && target.guarded() {
        format!("You cannot disable the `{}` {}.", name, label)
    } else if currently == enable {
        format!("The `{}` {} is already {}d.", name, label, verb)
    } else {
        match &target {
            Target::Group(g) => ctx.settings.set_group_enabled(g, &scope, enable).await?,
            Target::Command(c) => ctx.settings.set_command_enabled(c.as_ref(), &scope, enable).await?,
        }
        format!("{} the `{}` {}.", if enable { "Enabled" } else { "Disabled" }, name, label)
    };

    sent.push(msg.reply(responder, &text).await?);
    Ok(Some(sent))
}

/// Re-enables a command or group in the current scope
pub struct EnableCommand {
    definition: CommandDefinition,
}

impl EnableCommand {
    pub fn new() -> Self {
        Self {
            definition: CommandDefinition::new("enable", "commands", "Enables a command or command group.")
                .with_aliases(&["enable-command", "cmd-on", "command-on"])
                .with_details("The argument must be the name/ID (partial or whole) of a command or command group. Only the bot owner(s) may use this command.")
                .with_examples(&["enable util", "enable Utility", "enable prefix"])
                .guarded(),
        }
    }
}

impl Default for EnableCommand {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Command for EnableCommand {
    fn definition(&self) -> &CommandDefinition {
        &self.definition
    }

    fn has_permission(&self, msg: &CommandMessage, ctx: &CommandContext) -> bool {
        ctx.is_owner(&msg.message.author.id)
    }

    async fn run(&self, msg: &mut CommandMessage, ctx: &CommandContext) -> Result<CommandOutput, DispatchError> {
        toggle(msg, ctx, true).await
    }
}

/// Disables a command or group in the current scope
pub struct DisableCommand {
    definition: CommandDefinition,
}

impl DisableCommand {
    pub fn new() -> Self {
        Self {
            definition: CommandDefinition::new("disable", "commands", "Disables a command or command group.")
                .with_aliases(&["disable-command", "cmd-off", "command-off"])
                .with_details("The argument must be the name/ID (partial or whole) of a command or command group. Only the bot owner(s) may use this command.")
                .with_examples(&["disable util", "disable Utility", "disable ping"])
                .guarded(),
        }
    }
}

impl Default for DisableCommand {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Command for DisableCommand {
    fn definition(&self) -> &CommandDefinition {
        &self.definition
    }

    fn has_permission(&self, msg: &CommandMessage, ctx: &CommandContext) -> bool {
        ctx.is_owner(&msg.message.author.id)
    }

    async fn run(&self, msg: &mut CommandMessage, ctx: &CommandContext) -> Result<CommandOutput, DispatchError> {
        toggle(msg, ctx, false).await
    }
}
