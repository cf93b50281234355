use serde_json::{Map, Value};

/// Per-lead context: field name -> JSON value.
pub type ContextMap = Map<String, Value>;

#[derive(Debug, Clone)]
pub struct Entry {
    pub value: ContextMap,
    pub updated_at_ms: u64,
}

impl Entry {
    pub fn new(updated_at_ms: u64) -> Self {
        Self {
            value: ContextMap::new(),
            updated_at_ms,
        }
    }

    /// Stale once strictly more than `ttl_ms` has passed since the last write.
    pub fn is_expired(&self, now: u64, ttl_ms: u64) -> bool {
        now.saturating_sub(self.updated_at_ms) > ttl_ms
    }

    /// Shallow merge: patch fields overwrite, the rest are kept.
    pub fn merge(&mut self, patch: ContextMap, now: u64) {
        self.value.extend(patch);
        self.updated_at_ms = now;
    }
}
