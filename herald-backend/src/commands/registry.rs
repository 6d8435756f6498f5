use crate::channels::dispatcher::CommandMessage;
use crate::commands::types::{CommandContext, CommandDefinition, CommandGroup, CommandOutput};
use crate::error::DispatchError;
use async_trait::async_trait;
use std::sync::Arc;

/// Trait that all commands must implement
#[async_trait]
pub trait Command: Send + Sync {
    /// Returns the command's static definition
    fn definition(&self) -> &CommandDefinition;

    /// Returns the command's name
    fn name(&self) -> &str {
        &self.definition().name
    }

    /// Whether the author of `msg` may run this command
    fn has_permission(&self, _msg: &CommandMessage, _ctx: &CommandContext) -> bool {
        true
    }

    /// Executes the command. Responses should be sent through `msg.reply`/
    /// `msg.say` so that edits of the triggering message update them in place.
    async fn run(&self, msg: &mut CommandMessage, ctx: &CommandContext) -> Result<CommandOutput, DispatchError>;
}

/// Result of resolving a name or alias
#[derive(Clone)]
pub enum NameLookup {
    None,
    Unique(Arc<dyn Command>),
    Ambiguous(Vec<Arc<dyn Command>>),
}

impl NameLookup {
    fn from_matches(mut matches: Vec<Arc<dyn Command>>) -> Self {
        match matches.len() {
            0 => NameLookup::None,
            1 => NameLookup::Unique(matches.remove(0)),
            _ => NameLookup::Ambiguous(matches),
        }
    }

    #[cfg(test)]
    pub fn unique(self) -> Option<Arc<dyn Command>> {
        match self {
            NameLookup::Unique(command) => Some(command),
            _ => None,
        }
    }
}

impl std::fmt::Debug for NameLookup {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            NameLookup::None => write!(f, "None"),
            NameLookup::Unique(c) => write!(f, "Unique({})", c.name()),
            NameLookup::Ambiguous(cs) => {
                let names: Vec<&str> = cs.iter().map(|c| c.name()).collect();
                write!(f, "Ambiguous({:?})", names)
            }
        }
    }
}

fn matches_exact(definition: &CommandDefinition, search: &str) -> bool {
    definition.name == search
        || definition.aliases.iter().any(|a| a == search)
        || definition.qualified_name() == search
}

fn matches_partial(definition: &CommandDefinition, search: &str) -> bool {
    definition.name.contains(search)
        || definition.aliases.iter().any(|a| a.contains(search))
        || definition.qualified_name() == search
}

/// Registry that holds all available commands and groups, in registration order
pub struct CommandRegistry {
    groups: Vec<CommandGroup>,
    commands: Vec<Arc<dyn Command>>,
}

impl CommandRegistry {
    pub fn new() -> Self {
        CommandRegistry {
            groups: Vec::new(),
            commands: Vec::new(),
        }
    }

    /// Register a group. Fails if the ID is taken.
    pub fn register_group(&mut self, group: CommandGroup) -> Result<(), String> {
        if self.group(&group.id).is_some() {
            return Err(format!("A group with the ID \"{}\" is already registered", group.id));
        }
        log::debug!("[REGISTRY] Registered group {}", group.id);
        self.groups.push(group);
        Ok(())
    }

    /// Register a command. Its group must already be registered and neither
    /// its name nor any alias may collide with an existing command.
    pub fn register_command(&mut self, command: Arc<dyn Command>) -> Result<(), String> {
        let definition = command.definition();
        if self.group(&definition.group).is_none() {
            return Err(format!(
                "Group \"{}\" is not registered (command \"{}\")",
                definition.group, definition.name
            ));
        }

        let mut names = vec![definition.name.as_str()];
        names.extend(definition.aliases.iter().map(String::as_str));
        for existing in &self.commands {
            let taken = existing.definition();
            for name in &names {
                if taken.name == *name || taken.aliases.iter().any(|a| a == name) {
                    return Err(format!(
                        "\"{}\" is already used by command \"{}\"",
                        name, taken.name
                    ));
                }
            }
        }

        log::debug!("[REGISTRY] Registered command {}", definition.qualified_name());
        self.commands.push(command);
        Ok(())
    }

    /// All commands in registration order
    pub fn commands(&self) -> impl Iterator<Item = &Arc<dyn Command>> {
        self.commands.iter()
    }

    pub fn groups(&self) -> &[CommandGroup] {
        &self.groups
    }

    pub fn group(&self, id: &str) -> Option<&CommandGroup> {
        self.groups.iter().find(|g| g.id == id)
    }

    /// Resolve a command by name, alias or `group:member`, case-insensitively.
    /// Inexact searches match substrings but narrow to an exact hit when
    /// there is one.
    pub fn find_commands(&self, search: &str, exact: bool) -> NameLookup {
        let search = search.to_lowercase();

        if exact {
            let matches = self
                .commands
                .iter()
                .filter(|c| matches_exact(c.definition(), &search))
                .cloned()
                .collect();
            return NameLookup::from_matches(matches);
        }

        let matches: Vec<Arc<dyn Command>> = self
            .commands
            .iter()
            .filter(|c| matches_partial(c.definition(), &search))
            .cloned()
            .collect();

        if let Some(hit) = matches.iter().find(|c| {
            let d = c.definition();
            d.name == search || d.aliases.iter().any(|a| *a == search)
        }) {
            return NameLookup::Unique(hit.clone());
        }

        NameLookup::from_matches(matches)
    }

    /// Find groups by ID or display name, with the same exact/inexact rules
    pub fn find_groups(&self, search: &str, exact: bool) -> Vec<&CommandGroup> {
        let search = search.to_lowercase();
        let is_exact = |g: &CommandGroup| g.id == search || g.name.to_lowercase() == search;

        if exact {
            return self.groups.iter().filter(|g| is_exact(g)).collect();
        }

        let matches: Vec<&CommandGroup> = self
            .groups
            .iter()
            .filter(|g| g.id.contains(&search) || g.name.to_lowercase().contains(&search))
            .collect();

        if let Some(hit) = matches.iter().find(|g| is_exact(g)) {
            return vec![*hit];
        }
        matches
    }

    /// Get count of registered commands
    pub fn len(&self) -> usize {
        self.commands.len()
    }

    #[allow(dead_code)]
    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }
}

impl Default for CommandRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::testing::StaticCommand;

    fn registry() -> CommandRegistry {
        let mut registry = CommandRegistry::new();
        registry.register_group(CommandGroup::new("util", "Utility")).unwrap();
        registry.register_group(CommandGroup::new("commands", "Commands")).unwrap();
        registry
            .register_command(Arc::new(StaticCommand::new("ping", "util", "pong").with_aliases(&["p"])))
            .unwrap();
        registry
            .register_command(Arc::new(StaticCommand::new("enable", "commands", "on")))
            .unwrap();
        registry
            .register_command(Arc::new(StaticCommand::new("enable-all", "commands", "all on")))
            .unwrap();
        registry
            .register_command(Arc::new(StaticCommand::new("disable", "commands", "off")))
            .unwrap();
        registry
    }

    #[test]
    fn test_exact_lookup_is_case_insensitive() {
        let registry = registry();
        assert_eq!(registry.find_commands("PING", true).unique().unwrap().name(), "ping");
        assert_eq!(registry.find_commands("p", true).unique().unwrap().name(), "ping");
        assert_eq!(registry.find_commands("util:ping", true).unique().unwrap().name(), "ping");
        assert!(matches!(registry.find_commands("pin", true), NameLookup::None));
    }

    #[test]
    fn test_partial_lookup_prefers_exact_hit() {
        let registry = registry();
        // "enable" is a substring of "enable-all" but also an exact name
        assert_eq!(registry.find_commands("enable", false).unique().unwrap().name(), "enable");
        assert_eq!(registry.find_commands("pin", false).unique().unwrap().name(), "ping");
    }

    #[test]
    fn test_partial_lookup_reports_ambiguity() {
        let registry = registry();
        match registry.find_commands("able", false) {
            NameLookup::Ambiguous(found) => {
                let names: Vec<&str> = found.iter().map(|c| c.name()).collect();
                assert_eq!(names, vec!["enable", "enable-all", "disable"]);
            }
            other => panic!("expected ambiguity, got {:?}", other),
        }
    }

    #[test]
    fn test_duplicate_names_are_rejected() {
        let mut registry = registry();
        let err = registry
            .register_command(Arc::new(StaticCommand::new("p", "util", "dup")))
            .unwrap_err();
        assert!(err.contains("ping"));
        assert!(registry.register_group(CommandGroup::new("util", "Again")).is_err());
    }

    #[test]
    fn test_unknown_group_is_rejected() {
        let mut registry = registry();
        assert!(registry
            .register_command(Arc::new(StaticCommand::new("x", "missing", "x")))
            .is_err());
    }

    #[test]
    fn test_find_groups() {
        let registry = registry();
        assert_eq!(registry.find_groups("Utility", true)[0].id, "util");
        assert_eq!(registry.find_groups("comm", false)[0].id, "commands");
        assert!(registry.find_groups("nothing", false).is_empty());
    }

    #[test]
    fn test_commands_keep_registration_order() {
        let registry = registry();
        let names: Vec<&str> = registry.commands().map(|c| c.name()).collect();
        assert_eq!(names, vec!["ping", "enable", "enable-all", "disable"]);
        assert_eq!(registry.len(), 4);
    }
}
