use crate::channels::dispatcher::AwaitingSet;
use crate::channels::types::{ClientUser, Responder, SentMessage};
use crate::commands::registry::CommandRegistry;
use crate::settings::ScopeSettings;
use once_cell::sync::OnceCell;
use regex::Regex;
use std::collections::HashSet;
use std::sync::Arc;

/// What a command produced: the responses it wants tracked for later edits,
/// or `None` for no output.
pub type CommandOutput = Option<Vec<SentMessage>>;

/// Static description of a command
#[derive(Debug, Clone)]
pub struct CommandDefinition {
    /// Lowercase command name
    pub name: String,
    /// Lowercase alternative names
    pub aliases: Vec<String>,
    /// ID of the group this command belongs to
    pub group: String,
    /// Name of the command within its group
    pub member_name: String,
    pub description: String,
    pub details: Option<String>,
    pub examples: Vec<String>,
    /// Guarded commands can never be disabled
    pub guarded: bool,
    /// Whether the dispatcher splits prefix + name from the argument text
    pub default_handling: bool,
    /// Patterns that trigger the command regardless of prefix
    pub patterns: Vec<Regex>,
}

impl CommandDefinition {
    pub fn new(name: &str, group: &str, description: &str) -> Self {
        let name = name.to_lowercase();
        Self {
            member_name: name.clone(),
            name,
            aliases: Vec::new(),
            group: group.to_lowercase(),
            description: description.to_string(),
            details: None,
            examples: Vec::new(),
            guarded: false,
            default_handling: true,
            patterns: Vec::new(),
        }
    }

    pub fn with_aliases(mut self, aliases: &[&str]) -> Self {
        self.aliases = aliases.iter().map(|a| a.to_lowercase()).collect();
        self
    }

    pub fn with_details(mut self, details: &str) -> Self {
        self.details = Some(details.to_string());
        self
    }

    pub fn with_examples(mut self, examples: &[&str]) -> Self {
        self.examples = examples.iter().map(|e| e.to_string()).collect();
        self
    }

    #[allow(dead_code)]
    pub fn with_patterns(mut self, patterns: Vec<Regex>) -> Self {
        self.patterns = patterns;
        self
    }

    pub fn guarded(mut self) -> Self {
        self.guarded = true;
        self
    }

    /// Opt out of prefix + name splitting; the command is only reachable
    /// through its custom patterns.
    #[allow(dead_code)]
    pub fn without_default_handling(mut self) -> Self {
        self.default_handling = false;
        self
    }

    /// `group:member` form used for exact lookups
    pub fn qualified_name(&self) -> String {
        format!("{}:{}", self.group, self.member_name)
    }
}

/// A named collection of commands that can be enabled/disabled as a unit
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandGroup {
    /// Lowercase group ID
    pub id: String,
    /// Display name
    pub name: String,
    pub guarded: bool,
}

impl CommandGroup {
    pub fn new(id: &str, name: &str) -> Self {
        Self {
            id: id.to_lowercase(),
            name: name.to_string(),
            guarded: false,
        }
    }

    pub fn guarded(mut self) -> Self {
        self.guarded = true;
        self
    }
}

/// Shared services handed to every command run
#[derive(Clone)]
pub struct CommandContext {
    pub responder: Arc<dyn Responder>,
    pub registry: Arc<CommandRegistry>,
    pub settings: Arc<ScopeSettings>,
    pub awaiting: Arc<AwaitingSet>,
    pub owners: Arc<HashSet<String>>,
    pub client_user: Arc<OnceCell<ClientUser>>,
}

impl CommandContext {
    pub fn is_owner(&self, user_id: &str) -> bool {
        self.owners.contains(user_id)
    }

    pub fn client_user(&self) -> Option<&ClientUser> {
        self.client_user.get()
    }
}
