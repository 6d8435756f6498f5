use crate::channels::dispatcher::CommandMessage;
use crate::gateway::EventBroadcaster;
use crate::gateway::GatewayEvent;
use parking_lot::RwLock;
use std::collections::HashSet;
use std::sync::Arc;

/// Veto returned by an inhibitor
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Inhibition {
    /// Why the command was blocked (e.g. "throttled", "guild-only")
    pub label: String,
    /// Text to reply with instead of running the command
    pub response: Option<String>,
}

impl Inhibition {
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            response: None,
        }
    }

    #[allow(dead_code)]
    pub fn with_response(label: impl Into<String>, response: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            response: Some(response.into()),
        }
    }
}

/// Guard consulted before a command runs
pub trait Inhibitor: Send + Sync {
    /// Unique name, used to deduplicate and remove inhibitors
    fn name(&self) -> &str;

    /// `Some` vetoes the command
    fn inhibit(&self, msg: &CommandMessage) -> Option<Inhibition>;
}

/// Adapter turning a closure into a named inhibitor
pub struct FnInhibitor<F> {
    name: String,
    check: F,
}

impl<F> FnInhibitor<F>
where
    F: Fn(&CommandMessage) -> Option<Inhibition> + Send + Sync,
{
    pub fn new(name: impl Into<String>, check: F) -> Self {
        Self {
            name: name.into(),
            check,
        }
    }
}

impl<F> Inhibitor for FnInhibitor<F>
where
    F: Fn(&CommandMessage) -> Option<Inhibition> + Send + Sync,
{
    fn name(&self) -> &str {
        &self.name
    }

    fn inhibit(&self, msg: &CommandMessage) -> Option<Inhibition> {
        (self.check)(msg)
    }
}

/// Silently refuse commands from the listed user ids
pub fn blocklist(blocked: HashSet<String>) -> Arc<dyn Inhibitor> {
    Arc::new(FnInhibitor::new("blocklist", move |msg: &CommandMessage| {
        blocked
            .contains(&msg.message.author.id)
            .then(|| Inhibition::new("blocked"))
    }))
}

/// Ordered inhibitors; the first veto wins
pub struct InhibitorChain {
    inhibitors: RwLock<Vec<Arc<dyn Inhibitor>>>,
    broadcaster: Arc<EventBroadcaster>,
}

impl InhibitorChain {
    pub fn new(broadcaster: Arc<EventBroadcaster>) -> Self {
        Self {
            inhibitors: RwLock::new(Vec::new()),
            broadcaster,
        }
    }

    /// Append an inhibitor. Returns false if one with the same name is
    /// already registered.
    pub fn add(&self, inhibitor: Arc<dyn Inhibitor>) -> bool {
        let mut inhibitors = self.inhibitors.write();
        if inhibitors.iter().any(|i| i.name() == inhibitor.name()) {
            return false;
        }
        log::debug!("[INHIBITORS] Added inhibitor '{}'", inhibitor.name());
        inhibitors.push(inhibitor);
        true
    }

    /// Remove an inhibitor by name. Returns false if it was not registered.
    pub fn remove(&self, name: &str) -> bool {
        let mut inhibitors = self.inhibitors.write();
        let before = inhibitors.len();
        inhibitors.retain(|i| i.name() != name);
        before != inhibitors.len()
    }

    /// Run the inhibitors in registration order, stopping at the first veto,
    /// which is announced as `command.blocked`.
    pub fn inhibit(&self, msg: &CommandMessage) -> Option<Inhibition> {
        let inhibitors = self.inhibitors.read().clone();
        for inhibitor in inhibitors {
            if let Some(inhibition) = inhibitor.inhibit(msg) {
                log::info!(
                    "[INHIBITORS] '{}' blocked message {}: {}",
                    inhibitor.name(),
                    msg.message.id,
                    inhibition.label
                );
                self.broadcaster.broadcast(GatewayEvent::command_blocked(
                    &msg.message.id,
                    msg.command().map(|c| c.name()),
                    &inhibition.label,
                ));
                return Some(inhibition);
            }
        }
        None
    }
}
