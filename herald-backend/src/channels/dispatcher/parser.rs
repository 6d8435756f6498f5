use super::patterns::{PatternCache, FALLBACK_PATTERN};
use super::message::CommandMessage;
use crate::channels::types::{ClientUser, IncomingMessage};
use crate::commands::registry::{CommandRegistry, NameLookup};
use crate::commands::util::preview;
use crate::settings::{Scope, ScopeSettings};
use regex::Regex;
use std::sync::Arc;

/// Turns raw message content into a command invocation
pub struct MessageParser {
    registry: Arc<CommandRegistry>,
    settings: Arc<ScopeSettings>,
    pub(super) patterns: PatternCache,
    selfbot: bool,
}

impl MessageParser {
    pub fn new(
        registry: Arc<CommandRegistry>,
        settings: Arc<ScopeSettings>,
        patterns: PatternCache,
        selfbot: bool,
    ) -> Self {
        Self {
            registry,
            settings,
            patterns,
            selfbot,
        }
    }

    /// `None` when the message is not an invocation attempt at all. An attempt
    /// naming no single default-handling command yields an unresolved message.
    pub fn parse(&self, message: &IncomingMessage, client: &ClientUser) -> Option<CommandMessage> {
        // Custom patterns take priority over any prefix
        for command in self.registry.commands() {
            for pattern in &command.definition().patterns {
                if let Some(caps) = pattern.captures(&message.content) {
                    let captures = caps
                        .iter()
                        .map(|m| m.map(|m| m.as_str().to_string()))
                        .collect();
                    log::debug!(
                        "[PARSER] Message {} matched pattern of '{}'",
                        message.id,
                        command.name()
                    );
                    return Some(CommandMessage::with_captures(
                        message.clone(),
                        command.clone(),
                        captures,
                    ));
                }
            }
        }

        let scope = Scope::of_guild(message.guild_id.as_deref());
        let prefix = self.settings.effective_prefix(&scope);
        if let Some(pattern) = self.patterns.get_or_build(prefix.as_deref(), &client.id) {
            if let Some(cmd_msg) = self.match_default(message, &pattern) {
                return Some(cmd_msg);
            }
        }

        if message.is_direct() && !self.selfbot {
            return self.match_default(message, &FALLBACK_PATTERN);
        }
        None
    }

    fn match_default(&self, message: &IncomingMessage, pattern: &Regex) -> Option<CommandMessage> {
        let caps = pattern.captures(&message.content)?;
        let whole = caps.get(0)?;
        let name = caps.name("name")?.as_str();

        match self.registry.find_commands(name, true) {
            NameLookup::Unique(command) if command.definition().default_handling => {
                let args = message.content[whole.end()..].trim_start().to_string();
                Some(CommandMessage::resolved(message.clone(), command, args))
            }
            lookup => {
                log::debug!(
                    "[PARSER] '{}' in message {} did not resolve: {:?}",
                    preview(name, 32),
                    message.id,
                    lookup
                );
                Some(CommandMessage::unresolved(message.clone()))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::testing::StaticCommand;
    use crate::commands::types::CommandGroup;
    use crate::gateway::EventBroadcaster;
    use crate::settings::MemorySettingProvider;

    fn client() -> ClientUser {
        ClientUser {
            id: "123".to_string(),
            name: "Herald".to_string(),
        }
    }

    fn parser_with(selfbot: bool) -> (MessageParser, Arc<ScopeSettings>) {
        let mut registry = CommandRegistry::new();
        registry.register_group(CommandGroup::new("util", "Utility")).unwrap();
        registry.register_group(CommandGroup::new("misc", "Misc")).unwrap();
        registry
            .register_command(Arc::new(StaticCommand::echo("ping", "util").with_aliases(&["p"])))
            .unwrap();
        registry
            .register_command(Arc::new(
                StaticCommand::new("roll", "util", "4").with_patterns(&[r"(?i)^roll (\d+)d(\d+)"]),
            ))
            .unwrap();
        registry
            .register_command(Arc::new(StaticCommand::new("manual", "util", "").without_default_handling()))
            .unwrap();
        // Exact lookup of "util:ping" hits both util:ping and this name
        registry
            .register_command(Arc::new(StaticCommand::new("util:ping", "misc", "")))
            .unwrap();

        let settings = Arc::new(ScopeSettings::new(Arc::new(MemorySettingProvider::new()), "!"));
        let patterns = PatternCache::new(Arc::new(EventBroadcaster::new()));
        (
            MessageParser::new(Arc::new(registry), settings.clone(), patterns, selfbot),
            settings,
        )
    }

    fn parse(parser: &MessageParser, message: IncomingMessage) -> Option<CommandMessage> {
        parser.parse(&message, &client())
    }

    fn resolved_name(cmd_msg: &Option<CommandMessage>) -> Option<String> {
        cmd_msg
            .as_ref()
            .and_then(|m| m.command())
            .map(|c| c.name().to_string())
    }

    #[test]
    fn test_prefix_and_mention_resolve_same_command() {
        let (parser, _) = parser_with(false);
        for content in ["!ping", "<@123> ping", "<@!123> PING", "<@123> !ping", "!p"] {
            let cmd_msg = parse(&parser, IncomingMessage::test("m1", "1", content));
            assert_eq!(resolved_name(&cmd_msg).as_deref(), Some("ping"), "{}", content);
        }
    }

    #[test]
    fn test_args_follow_command_name() {
        let (parser, _) = parser_with(false);
        let cmd_msg = parse(&parser, IncomingMessage::test("m1", "1", "!ping   hello  world"))
            .unwrap();
        assert_eq!(cmd_msg.args(), "hello  world");
    }

    #[test]
    fn test_custom_pattern_wins_without_prefix() {
        let (parser, _) = parser_with(false);
        let cmd_msg = parse(&parser, IncomingMessage::test("m1", "1", "roll 2d6")).unwrap();
        assert_eq!(cmd_msg.command().unwrap().name(), "roll");
        assert_eq!(
            cmd_msg.captures(),
            &[
                Some("roll 2d6".to_string()),
                Some("2".to_string()),
                Some("6".to_string())
            ]
        );
    }

    #[test]
    fn test_unresolved_attempts() {
        let (parser, _) = parser_with(false);
        for content in ["!nope", "!manual", "!util:ping"] {
            let cmd_msg = parse(&parser, IncomingMessage::test("m1", "1", content));
            assert!(cmd_msg.is_some(), "{}", content);
            assert!(resolved_name(&cmd_msg).is_none(), "{}", content);
        }
    }

    #[test]
    fn test_plain_chatter_is_not_an_invocation() {
        let (parser, _) = parser_with(false);
        assert!(parse(&parser, IncomingMessage::test("m1", "1", "hello there")).is_none());
        assert!(parse(&parser, IncomingMessage::test("m1", "1", "<@456> ping")).is_none());
    }

    #[test]
    fn test_direct_messages_need_no_prefix() {
        let (parser, _) = parser_with(false);
        let cmd_msg = parse(&parser, IncomingMessage::test("m1", "1", "ping hi").direct());
        assert_eq!(resolved_name(&cmd_msg).as_deref(), Some("ping"));
        assert_eq!(cmd_msg.unwrap().args(), "hi");

        // Any first token is an attempt in a DM
        let chatter = parse(&parser, IncomingMessage::test("m2", "1", "hello").direct());
        assert!(chatter.is_some());
        assert!(resolved_name(&chatter).is_none());
    }

    #[test]
    fn test_self_mode_skips_fallback() {
        let (parser, _) = parser_with(true);
        assert!(parse(&parser, IncomingMessage::test("m1", "123", "ping").direct()).is_none());
    }

    #[tokio::test]
    async fn test_guild_prefix_overrides_default() {
        let (parser, settings) = parser_with(false);
        settings
            .set_prefix(&Scope::Guild("g1".to_string()), Some("?"))
            .await
            .unwrap();

        let guild = parse(&parser, IncomingMessage::test("m1", "1", "?ping"));
        assert_eq!(resolved_name(&guild).as_deref(), Some("ping"));
        assert!(parse(&parser, IncomingMessage::test("m2", "1", "!ping")).is_none());

        let mut other = IncomingMessage::test("m3", "1", "!ping");
        other.guild_id = Some("g2".to_string());
        assert_eq!(resolved_name(&parse(&parser, other)).as_deref(), Some("ping"));
    }

    #[tokio::test]
    async fn test_mention_only_scope() {
        let (parser, settings) = parser_with(false);
        settings
            .set_prefix(&Scope::Guild("g1".to_string()), None)
            .await
            .unwrap();

        assert!(parse(&parser, IncomingMessage::test("m1", "1", "!ping")).is_none());
        let mention = parse(&parser, IncomingMessage::test("m2", "1", "<@123> ping"));
        assert_eq!(resolved_name(&mention).as_deref(), Some("ping"));
    }
}
