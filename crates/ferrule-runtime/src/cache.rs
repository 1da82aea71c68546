//! Compilation cache, keyed by verbatim script text (`spec.md` §4.6).
//!
//! `Arc<Mutex<HashMap<K, Arc<V>>>>`: the map guards only the act of
//! publishing a new entry, and readers clone the `Arc` out and release the
//! lock immediately, so a cache hit never holds the mutex across a parse.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use ferrule_compiler::Block;

/// A compiled script and its pre-split source lines, shared (never mutated)
/// across every execution that hits this entry (`spec.md` §3's "Compilation
/// cache values are never mutated after insertion").
pub struct CacheEntry {
    pub block: Block,
    pub lines: Vec<String>,
}

/// `source text -> Arc<CacheEntry>` (`spec.md` §4.6, §5).
#[derive(Clone, Default)]
pub struct CompilationCache {
    entries: Arc<Mutex<HashMap<String, Arc<CacheEntry>>>>,
}

impl CompilationCache {
    pub fn new() -> Self {
        Self {
            entries: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Returns the cached entry for `source`, if any. Never holds the lock
    /// longer than the lookup itself.
    pub fn get(&self, source: &str) -> Option<Arc<CacheEntry>> {
        self.entries.lock().expect("cache mutex poisoned").get(source).cloned()
    }

    /// Publish a fully-constructed entry under `source`. "Last writer wins"
    /// on a race between two compiles of the same source is acceptable per
    /// `spec.md` §5, since both entries are structurally equivalent.
    pub fn insert(&self, source: String, entry: Arc<CacheEntry>) {
        self.entries.lock().expect("cache mutex poisoned").insert(source, entry);
    }

    pub fn clear(&self) {
        self.entries.lock().expect("cache mutex poisoned").clear();
    }

    pub fn len(&self) -> usize {
        self.entries.lock().expect("cache mutex poisoned").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dummy_entry() -> Arc<CacheEntry> {
        Arc::new(CacheEntry {
            block: Block::default(),
            lines: Vec::new(),
        })
    }

    #[test]
    fn miss_then_hit_after_insert() {
        let cache = CompilationCache::new();
        assert!(cache.get("{ set(a, 1) }").is_none());
        cache.insert("{ set(a, 1) }".to_string(), dummy_entry());
        assert!(cache.get("{ set(a, 1) }").is_some());
    }

    #[test]
    fn clear_empties_the_cache() {
        let cache = CompilationCache::new();
        cache.insert("x".to_string(), dummy_entry());
        assert_eq!(cache.len(), 1);
        cache.clear();
        assert!(cache.is_empty());
    }

    #[test]
    fn cloned_handle_shares_storage() {
        let cache = CompilationCache::new();
        let handle = cache.clone();
        handle.insert("shared".to_string(), dummy_entry());
        assert!(cache.get("shared").is_some());
    }
}
