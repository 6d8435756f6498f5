use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Event types for dispatcher broadcasts
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventType {
    // Channel events
    ChannelStarted,
    ChannelStopped,
    // Dispatcher events
    DispatcherDebug, // Diagnostic trace (e.g. a new prefix pattern was compiled)
    CommandBlocked,  // An inhibitor or permission check vetoed a command
    CommandUnknown,  // A prefix/mention matched but no command resolved
    CommandRun,      // A command is about to execute
    CommandError,    // A command's execution failed
}

impl EventType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ChannelStarted => "channel.started",
            Self::ChannelStopped => "channel.stopped",
            Self::DispatcherDebug => "dispatcher.debug",
            Self::CommandBlocked => "command.blocked",
            Self::CommandUnknown => "command.unknown",
            Self::CommandRun => "command.run",
            Self::CommandError => "command.error",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "channel.started" => Some(EventType::ChannelStarted),
            "channel.stopped" => Some(EventType::ChannelStopped),
            "dispatcher.debug" => Some(EventType::DispatcherDebug),
            "command.blocked" => Some(EventType::CommandBlocked),
            "command.unknown" => Some(EventType::CommandUnknown),
            "command.run" => Some(EventType::CommandRun),
            "command.error" => Some(EventType::CommandError),
            _ => None,
        }
    }
}

impl std::fmt::Display for EventType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl From<EventType> for String {
    fn from(event_type: EventType) -> Self {
        event_type.as_str().to_string()
    }
}

/// Server-push event to all subscribers
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayEvent {
    #[serde(rename = "type")]
    pub type_: String,
    pub event: String,
    pub data: Value,
}

impl GatewayEvent {
    pub fn new(event: impl Into<String>, data: Value) -> Self {
        Self {
            type_: "event".to_string(),
            event: event.into(),
            data,
        }
    }

    /// Parsed event type, if the name is one we know
    pub fn event_type(&self) -> Option<EventType> {
        EventType::from_str(&self.event)
    }

    pub fn channel_started(channel_type: &str, name: &str) -> Self {
        Self::new(
            EventType::ChannelStarted,
            serde_json::json!({
                "channel_type": channel_type,
                "name": name
            }),
        )
    }

    pub fn channel_stopped(channel_type: &str, name: &str) -> Self {
        Self::new(
            EventType::ChannelStopped,
            serde_json::json!({
                "channel_type": channel_type,
                "name": name
            }),
        )
    }

    pub fn dispatcher_debug(message: &str) -> Self {
        Self::new(
            EventType::DispatcherDebug,
            serde_json::json!({ "message": message }),
        )
    }

    pub fn command_blocked(message_id: &str, command: Option<&str>, reason: &str) -> Self {
        Self::new(
            EventType::CommandBlocked,
            serde_json::json!({
                "message_id": message_id,
                "command": command,
                "reason": reason
            }),
        )
    }

    pub fn command_unknown(message_id: &str, channel_id: &str, content: &str) -> Self {
        Self::new(
            EventType::CommandUnknown,
            serde_json::json!({
                "message_id": message_id,
                "channel_id": channel_id,
                "content": content
            }),
        )
    }

    pub fn command_run(message_id: &str, command: &str, from_edit: bool) -> Self {
        Self::new(
            EventType::CommandRun,
            serde_json::json!({
                "message_id": message_id,
                "command": command,
                "from_edit": from_edit
            }),
        )
    }

    pub fn command_error(message_id: &str, command: &str, error: &str) -> Self {
        Self::new(
            EventType::CommandError,
            serde_json::json!({
                "message_id": message_id,
                "command": command,
                "error": error
            }),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_type_names_round_trip() {
        for event_type in [
            EventType::ChannelStarted,
            EventType::ChannelStopped,
            EventType::DispatcherDebug,
            EventType::CommandBlocked,
            EventType::CommandUnknown,
            EventType::CommandRun,
            EventType::CommandError,
        ] {
            assert_eq!(EventType::from_str(event_type.as_str()), Some(event_type));
        }
        assert_eq!(EventType::from_str("agent.response"), None);
    }

    #[test]
    fn test_command_blocked_payload() {
        let event = GatewayEvent::command_blocked("42", Some("ping"), "blacklisted");
        assert_eq!(event.event, "command.blocked");
        assert_eq!(event.event_type(), Some(EventType::CommandBlocked));
        assert_eq!(event.data["reason"], "blacklisted");
        assert_eq!(event.data["command"], "ping");

        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], "event");
    }
}
