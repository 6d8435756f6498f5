//! Message feed plumbing: platform-neutral message types, the Discord
//! adapter, and the command dispatcher that consumes them.

pub mod discord;
pub mod dispatcher;
pub mod types;

pub use dispatcher::CommandDispatcher;
