use crate::channels::dispatcher::CommandMessage;
use dashmap::DashMap;
use std::sync::Arc;
use std::time::Duration;

/// What the cache remembers about a recently seen message
#[derive(Debug, Clone)]
pub enum TrackedResult {
    /// The message invoked (or tried to invoke) a command
    Command(CommandMessage),
    /// The message was seen but was not an invocation; editing it into one
    /// still runs the command
    NonCommand,
}

/// Recent dispatch results keyed by the triggering message ID, so edits can
/// re-run a command and reuse its responses.
pub struct EditableResultCache {
    entries: Arc<DashMap<String, TrackedResult>>,
    duration: Option<Duration>,
}

impl EditableResultCache {
    /// `None` disables tracking entirely
    pub fn new(duration: Option<Duration>) -> Self {
        Self {
            entries: Arc::new(DashMap::new()),
            duration: duration.filter(|d| !d.is_zero()),
        }
    }

    pub fn get(&self, message_id: &str) -> Option<TrackedResult> {
        self.entries.get(message_id).map(|e| e.value().clone())
    }

    /// Drop an entry. Missing keys are ignored.
    pub fn remove(&self, message_id: &str) -> bool {
        self.entries.remove(message_id).is_some()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Store the result for a message. A fresh entry gets an eviction timer;
    /// replacing an existing one (an edit) keeps the original deadline.
    pub fn record(&self, message_id: &str, result: TrackedResult) {
        let Some(duration) = self.duration else {
            return;
        };
        let replaced = self.entries.insert(message_id.to_string(), result).is_some();
        if !replaced {
            self.schedule_eviction(message_id.to_string(), duration);
        }
        log::trace!("[RESULTS] Tracking {} (replaced: {}, {} tracked)", message_id, replaced, self.len());
    }

    fn schedule_eviction(&self, message_id: String, duration: Duration) {
        let entries = Arc::clone(&self.entries);
        tokio::spawn(async move {
            tokio::time::sleep(duration).await;
            if entries.remove(&message_id).is_some() {
                log::debug!("[RESULTS] Evicted result for message {}", message_id);
            }
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::channels::types::IncomingMessage;

    fn tracked() -> TrackedResult {
        TrackedResult::Command(CommandMessage::unresolved(IncomingMessage::test("m1", "1", "!x")))
    }

    #[tokio::test]
    async fn test_disabled_cache_records_nothing() {
        let cache = EditableResultCache::new(None);
        cache.record("m1", tracked());
        assert_eq!(cache.len(), 0);

        let zero = EditableResultCache::new(Some(Duration::ZERO));
        zero.record("m1", tracked());
        assert!(zero.get("m1").is_none());
    }

    #[tokio::test]
    async fn test_entry_is_evicted_after_duration() {
        let cache = EditableResultCache::new(Some(Duration::from_millis(50)));
        cache.record("m1", TrackedResult::NonCommand);
        assert!(cache.get("m1").is_some());

        tokio::time::sleep(Duration::from_millis(120)).await;
        assert!(cache.get("m1").is_none());
    }

    #[tokio::test]
    async fn test_replacing_keeps_original_deadline() {
        let cache = EditableResultCache::new(Some(Duration::from_millis(100)));
        cache.record("m1", TrackedResult::NonCommand);

        tokio::time::sleep(Duration::from_millis(60)).await;
        cache.record("m1", tracked());
        assert!(matches!(cache.get("m1"), Some(TrackedResult::Command(_))));

        tokio::time::sleep(Duration::from_millis(80)).await;
        assert!(cache.get("m1").is_none());
    }

    #[tokio::test]
    async fn test_removal_is_idempotent() {
        let cache = EditableResultCache::new(Some(Duration::from_millis(30)));
        cache.record("m1", TrackedResult::NonCommand);
        assert!(cache.remove("m1"));
        assert!(!cache.remove("m1"));

        // The pending timer must tolerate the missing key
        tokio::time::sleep(Duration::from_millis(60)).await;
        assert_eq!(cache.len(), 0);
    }
}
