//! Errors that can escape the dispatch pipeline.

use thiserror::Error;

/// Failure raised while reading or writing scope settings.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SettingsError {
    #[error("settings provider error: {0}")]
    Provider(String),
}

/// Failure propagated out of `CommandDispatcher::handle_message`.
#[derive(Debug, Error)]
pub enum DispatchError {
    #[error("failed to send response in channel {channel_id}: {reason}")]
    Send { channel_id: String, reason: String },
    #[error("failed to edit response {message_id}: {reason}")]
    Edit { message_id: String, reason: String },
    #[error("failed to delete response {message_id}: {reason}")]
    Delete { message_id: String, reason: String },
    #[error("command `{command}` failed: {reason}")]
    Command { command: String, reason: String },
    #[error(transparent)]
    Settings(#[from] SettingsError),
}

impl DispatchError {
    #[allow(dead_code)]
    pub fn command(command: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Command {
            command: command.into(),
            reason: reason.into(),
        }
    }
}
