use std::collections::HashSet;
use std::env;
use std::time::Duration;

/// Environment variable names - single source of truth
pub mod env_vars {
    pub const DISCORD_BOT_TOKEN: &str = "DISCORD_BOT_TOKEN";
    pub const COMMAND_PREFIX: &str = "HERALD_COMMAND_PREFIX";
    /// Comma separated user IDs
    pub const OWNER_IDS: &str = "HERALD_OWNER_IDS";
    /// Comma separated user IDs whose commands are ignored
    pub const BLOCKED_USER_IDS: &str = "HERALD_BLOCKED_USER_IDS";
    pub const SELFBOT: &str = "HERALD_SELFBOT";
    pub const NON_COMMAND_EDITABLE: &str = "HERALD_NON_COMMAND_EDITABLE";
    pub const UNKNOWN_COMMAND_RESPONSE: &str = "HERALD_UNKNOWN_COMMAND_RESPONSE";
    // Seconds; 0 or less disables edit tracking
    pub const COMMAND_EDITABLE_DURATION: &str = "HERALD_COMMAND_EDITABLE_DURATION";
    pub const MESSAGE_CACHE_SIZE: &str = "HERALD_MESSAGE_CACHE_SIZE";
}

/// Default values
pub mod defaults {
    pub const COMMAND_PREFIX: &str = "!";
    pub const SELFBOT: bool = false;
    pub const NON_COMMAND_EDITABLE: bool = true;
    pub const UNKNOWN_COMMAND_RESPONSE: bool = true;
    pub const COMMAND_EDITABLE_DURATION: i64 = 30;
    pub const MESSAGE_CACHE_SIZE: usize = 200;
}

fn env_flag(name: &str, default: bool) -> bool {
    env::var(name)
        .map(|v| v == "true" || v == "1")
        .unwrap_or(default)
}

/// Read-only options the dispatcher is built with
#[derive(Clone, Debug)]
pub struct DispatcherConfig {
    /// Restricted mode: only the controlling account's own messages are handled
    pub selfbot: bool,
    /// Keep tracking edits of messages that were not commands
    pub non_command_editable: bool,
    /// Reply with guidance when a command name does not resolve
    pub unknown_command_response: bool,
    /// How long results stay editable; `None` disables tracking
    pub command_editable_duration: Option<Duration>,
    /// Users allowed to run owner-only commands
    pub owners: HashSet<String>,
}

impl Default for DispatcherConfig {
    fn default() -> Self {
        Self {
            selfbot: defaults::SELFBOT,
            non_command_editable: defaults::NON_COMMAND_EDITABLE,
            unknown_command_response: defaults::UNKNOWN_COMMAND_RESPONSE,
            command_editable_duration: editable_duration(defaults::COMMAND_EDITABLE_DURATION),
            owners: HashSet::new(),
        }
    }
}

/// Seconds to a retention window; zero or negative means no tracking
pub fn editable_duration(secs: i64) -> Option<Duration> {
    u64::try_from(secs)
        .ok()
        .filter(|s| *s > 0)
        .map(Duration::from_secs)
}

fn parse_user_ids(raw: &str) -> HashSet<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|id| !id.is_empty())
        .map(str::to_string)
        .collect()
}

#[derive(Clone, Debug)]
pub struct Config {
    pub discord_bot_token: Option<String>,
    /// Default prefix for scopes without their own; empty means mention-only
    pub command_prefix: String,
    /// Messages serenity keeps per channel so edits can be diffed
    pub message_cache_size: usize,
    pub blocked_users: HashSet<String>,
    pub dispatcher: DispatcherConfig,
}

impl Config {
    pub fn from_env() -> Self {
        let editable_secs = env::var(env_vars::COMMAND_EDITABLE_DURATION)
            .ok()
            .and_then(|v| {
                v.trim()
                    .parse::<i64>()
                    .map_err(|e| {
                        log::warn!(
                            "Invalid {} '{}': {}, using default",
                            env_vars::COMMAND_EDITABLE_DURATION,
                            v,
                            e
                        )
                    })
                    .ok()
            })
            .unwrap_or(defaults::COMMAND_EDITABLE_DURATION);

        Self {
            discord_bot_token: env::var(env_vars::DISCORD_BOT_TOKEN)
                .ok()
                .filter(|t| !t.is_empty()),
            command_prefix: env::var(env_vars::COMMAND_PREFIX)
                .unwrap_or_else(|_| defaults::COMMAND_PREFIX.to_string()),
            message_cache_size: env::var(env_vars::MESSAGE_CACHE_SIZE)
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults::MESSAGE_CACHE_SIZE),
            blocked_users: env::var(env_vars::BLOCKED_USER_IDS)
                .map(|v| parse_user_ids(&v))
                .unwrap_or_default(),
            dispatcher: DispatcherConfig {
                selfbot: env_flag(env_vars::SELFBOT, defaults::SELFBOT),
                non_command_editable: env_flag(
                    env_vars::NON_COMMAND_EDITABLE,
                    defaults::NON_COMMAND_EDITABLE,
                ),
                unknown_command_response: env_flag(
                    env_vars::UNKNOWN_COMMAND_RESPONSE,
                    defaults::UNKNOWN_COMMAND_RESPONSE,
                ),
                command_editable_duration: editable_duration(editable_secs),
                owners: env::var(env_vars::OWNER_IDS)
                    .map(|v| parse_user_ids(&v))
                    .unwrap_or_default(),
            },
        }
    }
}
