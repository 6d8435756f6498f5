//! Notification plumbing: the dispatcher publishes debug traces, blocked and
//! unknown command notices through an `EventBroadcaster` handle injected at
//! construction, so it never depends on a concrete chat client.

pub mod events;
pub mod protocol;

pub use events::EventBroadcaster;
pub use protocol::{EventType, GatewayEvent};
