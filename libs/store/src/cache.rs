//! Cache for parsed ASTs and validation reports
//!
//! Keys are namespaced with fixed prefixes; the AST key is the hex SHA-256 of
//! the normalised source, so a changed source never hits a stale entry and
//! stale reads are harmless.

use lru::LruCache;
use std::num::NonZeroUsize;
use std::sync::{Arc, Mutex};

const DEFAULT_CAPACITY: usize = 1000;

/// Cache key construction
pub mod keys {
    use sha2::{Digest, Sha256};

    pub const AST_PREFIX: &str = "ast:";
    pub const CONSTANT_PREFIX: &str = "constant:";
    pub const RULE_DEF_PREFIX: &str = "rule-def:";
    pub const VALIDATION_PREFIX: &str = "validation:";

    /// Normalise a rule source for hashing: unify line endings and strip
    /// outer whitespace so formatting-only differences share a cache entry.
    pub fn normalise_source(source: &str) -> String {
        source.replace("\r\n", "\n").trim().to_string()
    }

    fn sha256_hex(text: &str) -> String {
        let mut hasher = Sha256::new();
        hasher.update(text.as_bytes());
        hex::encode(hasher.finalize())
    }

    /// `ast:<sha256(normalised source)>`
    pub fn ast_key(source: &str) -> String {
        format!("{AST_PREFIX}{}", sha256_hex(&normalise_source(source)))
    }

    /// `validation:<sha256(normalised source)>`
    pub fn validation_key(source: &str) -> String {
        format!(
            "{VALIDATION_PREFIX}{}",
            sha256_hex(&normalise_source(source))
        )
    }

    /// `constant:<code>`
    pub fn constant_key(code: &str) -> String {
        format!("{CONSTANT_PREFIX}{code}")
    }

    /// `rule-def:<code>`
    pub fn rule_def_key(code: &str) -> String {
        format!("{RULE_DEF_PREFIX}{code}")
    }
}

/// Bounded LRU cache of shared values, safe to use from many evaluations.
pub struct SharedCache<T> {
    entries: Mutex<LruCache<String, Arc<T>>>,
}

impl<T> SharedCache<T> {
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        let capacity = NonZeroUsize::new(capacity.max(1)).expect("capacity is at least 1");
        Self {
            entries: Mutex::new(LruCache::new(capacity)),
        }
    }

    pub fn get(&self, key: &str) -> Option<Arc<T>> {
        self.entries
            .lock()
            .expect("cache lock poisoned")
            .get(key)
            .cloned()
    }

    pub fn put(&self, key: impl Into<String>, value: Arc<T>) {
        self.entries
            .lock()
            .expect("cache lock poisoned")
            .put(key.into(), value);
    }

    pub fn evict(&self, key: &str) {
        self.entries.lock().expect("cache lock poisoned").pop(key);
    }

    pub fn clear(&self) {
        self.entries.lock().expect("cache lock poisoned").clear();
    }

    pub fn len(&self) -> usize {
        self.entries.lock().expect("cache lock poisoned").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<T> Default for SharedCache<T> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ast_key_is_stable_across_formatting() {
        let a = keys::ast_key("name: X\nthen: [\"set a to 1\"]\n");
        let b = keys::ast_key("  name: X\nthen: [\"set a to 1\"]  ");
        assert_eq!(a, b);
        assert!(a.starts_with("ast:"));
        assert_eq!(a.len(), "ast:".len() + 64);
    }

    #[test]
    fn test_different_sources_have_different_keys() {
        assert_ne!(keys::ast_key("name: A"), keys::ast_key("name: B"));
    }

    #[test]
    fn test_cache_roundtrip_and_eviction() {
        let cache: SharedCache<String> = SharedCache::with_capacity(2);
        cache.put("a", Arc::new("1".to_string()));
        cache.put("b", Arc::new("2".to_string()));
        assert_eq!(cache.get("a").as_deref(), Some(&"1".to_string()));

        // Capacity 2: inserting a third evicts the least recently used
        cache.put("c", Arc::new("3".to_string()));
        assert!(cache.get("b").is_none());

        cache.evict("a");
        assert!(cache.get("a").is_none());

        cache.clear();
        assert!(cache.is_empty());
    }
}
