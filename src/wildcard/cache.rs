//! Compiled pattern cache
//!
//! Query evaluation tends to repeat the same few wildcard terms. Patterns
//! are compiled outside the lock; a concurrent miss on the same query
//! compiles twice and keeps the last result.

use std::num::NonZeroUsize;
use std::sync::{Arc, Mutex, MutexGuard, OnceLock, PoisonError};

use lru::LruCache;

use super::Wildcard;
use crate::error::CompileError;

/// Capacity of the process-wide cache
pub const DEFAULT_CAPACITY: usize = 256;

/// LRU cache of compiled patterns keyed by query text
pub struct PatternCache {
    inner: Mutex<LruCache<String, Arc<Wildcard>>>,
}

impl PatternCache {
    /// Create a cache holding at most `capacity` patterns (at least one).
    pub fn new(capacity: usize) -> Self {
        let capacity = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN);
        PatternCache {
            inner: Mutex::new(LruCache::new(capacity)),
        }
    }

    /// Process-wide cache used by the NIF layer
    pub fn global() -> &'static PatternCache {
        static CACHE: OnceLock<PatternCache> = OnceLock::new();
        CACHE.get_or_init(|| PatternCache::new(DEFAULT_CAPACITY))
    }

    /// Return the cached pattern for `query`, compiling it on a miss.
    ///
    /// Failed compilations are not cached.
    pub fn get_or_compile(&self, query: &str) -> Result<Arc<Wildcard>, CompileError> {
        if let Some(pattern) = self.lock().get(query) {
            return Ok(Arc::clone(pattern));
        }
        let pattern = Arc::new(Wildcard::parse(query)?);
        self.lock().put(query.to_owned(), Arc::clone(&pattern));
        Ok(pattern)
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    pub fn clear(&self) {
        self.lock().clear();
    }

    // Poisoning is ignored: entries are independent of each other
    fn lock(&self) -> MutexGuard<'_, LruCache<String, Arc<Wildcard>>> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Default for PatternCache {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hit_returns_same_pattern() {
        let cache = PatternCache::new(4);
        let a = cache.get_or_compile("a.*b").unwrap();
        let b = cache.get_or_compile("a.*b").unwrap();
        assert!(Arc::ptr_eq(&a, &b));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_errors_not_cached() {
        let cache = PatternCache::new(4);
        assert!(cache.get_or_compile("a.{3,2}").is_err());
        assert!(cache.is_empty());
    }

    #[test]
    fn test_eviction() {
        let cache = PatternCache::new(2);
        let first = cache.get_or_compile("x.").unwrap();
        cache.get_or_compile("y.").unwrap();
        cache.get_or_compile("z.").unwrap();
        assert_eq!(cache.len(), 2);
        let again = cache.get_or_compile("x.").unwrap();
        assert!(!Arc::ptr_eq(&first, &again));
        assert_eq!(*first, *again);

        cache.clear();
        assert!(cache.is_empty());
    }

    #[test]
    fn test_zero_capacity_holds_one() {
        let cache = PatternCache::new(0);
        cache.get_or_compile("a").unwrap();
        cache.get_or_compile("b").unwrap();
        assert_eq!(cache.len(), 1);
    }
}
