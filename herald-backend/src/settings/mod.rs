//! Per-scope settings: configured prefixes and command/group enablement.
//!
//! A scope is either a guild or the global scope used for direct messages and
//! as the fallback for every guild. Storage is delegated to a
//! `SettingProvider`; `ScopeSettings` layers the fallback rules on top.

pub mod memory;

pub use memory::MemorySettingProvider;

use crate::commands::{Command, CommandGroup};
use crate::error::SettingsError;
use async_trait::async_trait;
use serde_json::Value;
use std::fmt;
use std::sync::Arc;

/// Setting key holding a scope's command prefix
pub const PREFIX_KEY: &str = "prefix";

/// Scope a setting applies to
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Scope {
    Global,
    Guild(String),
}

impl Scope {
    /// Scope of a message: its guild, or global for direct messages
    pub fn of_guild(guild_id: Option<&str>) -> Self {
        match guild_id {
            Some(id) => Scope::Guild(id.to_string()),
            None => Scope::Global,
        }
    }
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Scope::Global => write!(f, "global"),
            Scope::Guild(id) => write!(f, "{}", id),
        }
    }
}

/// Storage capability for scope settings.
///
/// Reads are synchronous so the dispatch hot path never waits on storage;
/// writes may be asynchronous.
#[async_trait]
pub trait SettingProvider: Send + Sync {
    /// Prepare the provider (connect, warm caches). Called once at startup.
    async fn init(&self) -> Result<(), SettingsError>;

    /// Release any resources held by the provider. Writes after this fail.
    async fn destroy(&self) -> Result<(), SettingsError>;

    fn get(&self, scope: &Scope, key: &str) -> Option<Value>;

    /// Store a value, returning it
    async fn set(&self, scope: &Scope, key: &str, value: Value) -> Result<Value, SettingsError>;

    /// Remove a value, returning the old one
    async fn remove(&self, scope: &Scope, key: &str) -> Result<Option<Value>, SettingsError>;
}

fn command_key(command: &str) -> String {
    format!("cmd-{}", command)
}

fn group_key(group: &str) -> String {
    format!("grp-{}", group)
}

/// Settings view used by the dispatcher and the built-in commands
pub struct ScopeSettings {
    provider: Arc<dyn SettingProvider>,
    default_prefix: String,
}

impl ScopeSettings {
    pub fn new(provider: Arc<dyn SettingProvider>, default_prefix: impl Into<String>) -> Self {
        Self {
            provider,
            default_prefix: default_prefix.into(),
        }
    }

    pub fn provider(&self) -> &Arc<dyn SettingProvider> {
        &self.provider
    }

    /// Prefix in effect for a scope: the scope's own value, then the global
    /// value, then the configured default. Missing or non-string values fall
    /// through. An empty prefix means mention-only (`None`).
    pub fn effective_prefix(&self, scope: &Scope) -> Option<String> {
        let from_scope = |s: &Scope| {
            self.provider
                .get(s, PREFIX_KEY)
                .and_then(|v| v.as_str().map(str::to_string))
        };

        let prefix = match scope {
            Scope::Guild(_) => from_scope(scope).or_else(|| from_scope(&Scope::Global)),
            Scope::Global => from_scope(&Scope::Global),
        }
        .unwrap_or_else(|| self.default_prefix.clone());

        if prefix.is_empty() { None } else { Some(prefix) }
    }

    /// Set a scope's prefix. `None` stores an empty prefix (mention-only).
    pub async fn set_prefix(&self, scope: &Scope, prefix: Option<&str>) -> Result<(), SettingsError> {
        let value = Value::String(prefix.unwrap_or_default().to_string());
        self.provider.set(scope, PREFIX_KEY, value).await?;
        log::info!("[SETTINGS] Prefix for scope {} set to {:?}", scope, prefix);
        Ok(())
    }

    /// Drop a scope's own prefix so it falls back to the next level
    pub async fn reset_prefix(&self, scope: &Scope) -> Result<(), SettingsError> {
        self.provider.remove(scope, PREFIX_KEY).await?;
        log::info!("[SETTINGS] Prefix for scope {} reset", scope);
        Ok(())
    }

    fn flag(&self, scope: &Scope, key: &str) -> bool {
        let lookup = |s: &Scope| self.provider.get(s, key).and_then(|v| v.as_bool());
        match scope {
            Scope::Guild(_) => lookup(scope).or_else(|| lookup(&Scope::Global)),
            Scope::Global => lookup(scope),
        }
        .unwrap_or(true)
    }

    pub fn is_group_enabled(&self, group: &CommandGroup, scope: &Scope) -> bool {
        group.guarded || self.flag(scope, &group_key(&group.id))
    }

    /// Guarded commands are always enabled; otherwise both the command and
    /// its group must be enabled in the scope.
    pub fn is_command_enabled(&self, command: &dyn Command, scope: &Scope) -> bool {
        let definition = command.definition();
        if definition.guarded {
            return true;
        }
        self.flag(scope, &group_key(&definition.group)) && self.flag(scope, &command_key(&definition.name))
    }

    pub async fn set_command_enabled(
        &self,
        command: &dyn Command,
        scope: &Scope,
        enabled: bool,
    ) -> Result<(), SettingsError> {
        let name = &command.definition().name;
        self.provider
            .set(scope, &command_key(name), Value::Bool(enabled))
            .await?;
        log::info!("[SETTINGS] Command '{}' enabled={} in scope {}", name, enabled, scope);
        Ok(())
    }

    pub async fn set_group_enabled(
        &self,
        group: &CommandGroup,
        scope: &Scope,
        enabled: bool,
    ) -> Result<(), SettingsError> {
        self.provider
            .set(scope, &group_key(&group.id), Value::Bool(enabled))
            .await?;
        log::info!("[SETTINGS] Group '{}' enabled={} in scope {}", group.id, enabled, scope);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::testing::StaticCommand;

    fn settings(default_prefix: &str) -> ScopeSettings {
        ScopeSettings::new(Arc::new(MemorySettingProvider::new()), default_prefix)
    }

    #[test]
    fn test_scope_display() {
        assert_eq!(Scope::Global.to_string(), "global");
        assert_eq!(Scope::Guild("42".to_string()).to_string(), "42");
        assert_eq!(Scope::of_guild(None), Scope::Global);
        assert_eq!(Scope::of_guild(Some("42")), Scope::Guild("42".to_string()));
    }

    #[tokio::test]
    async fn test_prefix_fallback_chain() {
        let settings = settings("!");
        let guild = Scope::Guild("1".to_string());

        assert_eq!(settings.effective_prefix(&guild).as_deref(), Some("!"));

        settings.set_prefix(&Scope::Global, Some("?")).await.unwrap();
        assert_eq!(settings.effective_prefix(&guild).as_deref(), Some("?"));

        settings.set_prefix(&guild, Some("$")).await.unwrap();
        assert_eq!(settings.effective_prefix(&guild).as_deref(), Some("$"));
        assert_eq!(settings.effective_prefix(&Scope::Global).as_deref(), Some("?"));

        settings.set_prefix(&guild, None).await.unwrap();
        assert_eq!(settings.effective_prefix(&guild), None);

        settings.reset_prefix(&guild).await.unwrap();
        assert_eq!(settings.effective_prefix(&guild).as_deref(), Some("?"));
    }

    #[tokio::test]
    async fn test_invalid_prefix_value_falls_back() {
        let settings = settings("!");
        let guild = Scope::Guild("1".to_string());
        settings
            .provider()
            .set(&guild, PREFIX_KEY, Value::from(12))
            .await
            .unwrap();
        assert_eq!(settings.effective_prefix(&guild).as_deref(), Some("!"));
    }

    #[test]
    fn test_empty_default_prefix_is_mention_only() {
        assert_eq!(settings("").effective_prefix(&Scope::Global), None);
    }

    #[tokio::test]
    async fn test_command_enablement_per_scope() {
        let settings = settings("!");
        let ping = StaticCommand::new("ping", "util", "pong");
        let guild = Scope::Guild("1".to_string());
        let other = Scope::Guild("2".to_string());

        assert!(settings.is_command_enabled(&ping, &guild));

        settings.set_command_enabled(&ping, &guild, false).await.unwrap();
        assert!(!settings.is_command_enabled(&ping, &guild));
        assert!(settings.is_command_enabled(&ping, &other));

        settings.set_command_enabled(&ping, &Scope::Global, false).await.unwrap();
        assert!(!settings.is_command_enabled(&ping, &other));

        settings.set_command_enabled(&ping, &guild, true).await.unwrap();
        assert!(settings.is_command_enabled(&ping, &guild));
    }

    #[tokio::test]
    async fn test_disabled_group_disables_its_commands() {
        let settings = settings("!");
        let ping = StaticCommand::new("ping", "util", "pong");
        let util = CommandGroup::new("util", "Utility");
        let guild = Scope::Guild("1".to_string());

        settings.set_group_enabled(&util, &guild, false).await.unwrap();
        assert!(!settings.is_group_enabled(&util, &guild));
        assert!(!settings.is_command_enabled(&ping, &guild));
    }

    #[tokio::test]
    async fn test_guarded_command_cannot_be_disabled() {
        let settings = settings("!");
        let guarded = StaticCommand::new("enable", "commands", "ok").guarded();
        let guild = Scope::Guild("1".to_string());

        settings.set_command_enabled(&guarded, &guild, false).await.unwrap();
        assert!(settings.is_command_enabled(&guarded, &guild));
    }
}
