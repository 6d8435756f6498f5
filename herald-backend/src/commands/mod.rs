pub mod builtin;
pub mod registry;
pub mod types;
pub mod util;

#[cfg(test)]
pub mod testing;

pub use registry::{Command, CommandRegistry};
pub use types::CommandGroup;

/// Create a registry with the built-in groups and commands
pub fn create_default_registry() -> CommandRegistry {
    let mut registry = CommandRegistry::new();
    builtin::register_all(&mut registry);
    registry
}
