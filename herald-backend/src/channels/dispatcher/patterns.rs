use crate::gateway::EventBroadcaster;
use crate::gateway::GatewayEvent;
use dashmap::DashMap;
use once_cell::sync::Lazy;
use regex::Regex;
use std::sync::Arc;

/// Bare first token, used for direct messages that carry no prefix at all
pub static FALLBACK_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)^(?P<name>\S+)").expect("fallback pattern is valid"));

/// Compile the invocation pattern for a prefix. The command name is captured
/// as `name`; with no prefix only a mention of the account matches.
pub fn build_pattern(prefix: Option<&str>, client_id: &str) -> Result<Regex, regex::Error> {
    let mention = format!(r"<@!?{}>", regex::escape(client_id));
    let source = match prefix {
        Some(prefix) if !prefix.is_empty() => {
            let escaped = regex::escape(prefix);
            format!(
                r"(?i)^(?:{escaped}\s*|{mention}\s*(?:{escaped})?)(?P<name>\S+)",
                escaped = escaped,
                mention = mention
            )
        }
        _ => format!(r"(?i)^{}\s*(?P<name>\S+)", mention),
    };
    Regex::new(&source)
}

/// Compiled invocation patterns keyed by prefix (`None` = mention-only).
/// Entries are built on first use and never evicted.
pub struct PatternCache {
    patterns: DashMap<Option<String>, Arc<Regex>>,
    broadcaster: Arc<EventBroadcaster>,
}

impl PatternCache {
    pub fn new(broadcaster: Arc<EventBroadcaster>) -> Self {
        Self {
            patterns: DashMap::new(),
            broadcaster,
        }
    }

    /// Pattern for `prefix`, compiling it on first use
    pub fn get_or_build(&self, prefix: Option<&str>, client_id: &str) -> Option<Arc<Regex>> {
        let key = prefix.filter(|p| !p.is_empty()).map(str::to_string);
        if let Some(pattern) = self.patterns.get(&key) {
            return Some(pattern.clone());
        }

        let pattern = match build_pattern(key.as_deref(), client_id) {
            Ok(pattern) => Arc::new(pattern),
            Err(e) => {
                log::error!("[PATTERNS] Failed to build pattern for prefix {:?}: {}", key, e);
                return None;
            }
        };

        let mut built = false;
        let pattern = self
            .patterns
            .entry(key.clone())
            .or_insert_with(|| {
                built = true;
                pattern
            })
            .value()
            .clone();

        // Shard lock released above; len() would deadlock inside the entry
        if built {
            let trace = format!("Built command pattern for prefix {:?}: {}", key, pattern.as_str());
            log::debug!("[PATTERNS] {} ({} cached)", trace, self.len());
            self.broadcaster.broadcast(GatewayEvent::dispatcher_debug(&trace));
        }
        Some(pattern)
    }

    pub fn len(&self) -> usize {
        self.patterns.len()
    }
}
