//! Built-in commands: utilities plus scope administration.

pub mod help;
pub mod ping;
pub mod prefix;
pub mod toggle;

use crate::commands::registry::CommandRegistry;
use crate::commands::types::CommandGroup;
use std::sync::Arc;

pub use help::HelpCommand;
pub use ping::PingCommand;
pub use prefix::PrefixCommand;
pub use toggle::{DisableCommand, EnableCommand};

/// Register the built-in groups and commands
pub fn register_all(registry: &mut CommandRegistry) {
    let groups = [
        CommandGroup::new("util", "Utility"),
        CommandGroup::new("commands", "Commands").guarded(),
    ];
    for group in groups {
        if let Err(e) = registry.register_group(group) {
            log::warn!("[REGISTRY] Skipping built-in group: {}", e);
        }
    }

    let commands: Vec<Arc<dyn crate::commands::Command>> = vec![
        Arc::new(HelpCommand::new()),
        Arc::new(PingCommand::new()),
        Arc::new(PrefixCommand::new()),
        Arc::new(EnableCommand::new()),
        Arc::new(DisableCommand::new()),
    ];
    for command in commands {
        if let Err(e) = registry.register_command(command) {
            log::warn!("[REGISTRY] Skipping built-in command: {}", e);
        }
    }
}
