//! Byte-Token Set
//!
//! Interns byte sequences (element names, attribute names, attribute
//! values) and hands out stable 1-based ids. Keys live in a dense vector
//! indexed by id; the [`HashIndex`] holds only the chains.

use super::index::HashIndex;
use crate::error::CapacityError;

/// Hash of a byte token (`h = 31 * h + b`, wrapping)
#[inline]
pub fn token_hash(token: &[u8]) -> u32 {
    token
        .iter()
        .fold(0u32, |h, &b| (h << 5).wrapping_sub(h).wrapping_add(u32::from(b)))
}

/// Set of byte tokens with stable ids
#[derive(Debug, Clone)]
pub struct TokenSet {
    /// Keys indexed by id; slot 0 is the empty sentinel
    keys: Vec<Box<[u8]>>,
    index: HashIndex,
}

impl TokenSet {
    /// Create an empty set with the default capacity
    pub fn new() -> Self {
        Self::with_capacity(8)
    }

    /// Create an empty set with room for `capacity` entries
    pub fn with_capacity(capacity: usize) -> Self {
        let index = HashIndex::with_capacity(capacity);
        let mut keys = Vec::with_capacity(index.capacity());
        keys.push(Box::default());
        TokenSet { keys, index }
    }

    /// Return the id of `key`, inserting it if absent. Never returns 0.
    pub fn intern(&mut self, key: &[u8]) -> Result<u32, CapacityError> {
        let hash = token_hash(key);
        if let Some(id) = self.find(hash, key) {
            return Ok(id);
        }

        let before = self.index.capacity();
        let keys = &self.keys;
        let id = self
            .index
            .insert(hash, |id| token_hash(&keys[id as usize]))?;
        if self.index.capacity() != before {
            tracing::debug!(
                entries = self.index.len(),
                capacity = self.index.capacity(),
                "token set grown"
            );
        }
        debug_assert_eq!(id as usize, self.keys.len());
        self.keys.push(key.into());
        Ok(id)
    }

    /// Id of `key`, if present
    pub fn lookup(&self, key: &[u8]) -> Option<u32> {
        self.find(token_hash(key), key)
    }

    fn find(&self, hash: u32, key: &[u8]) -> Option<u32> {
        self.index.find(hash, |id| &*self.keys[id as usize] == key)
    }

    #[inline]
    pub fn contains(&self, key: &[u8]) -> bool {
        self.lookup(key).is_some()
    }

    /// Key stored under `id` (None for 0 and unknown ids)
    pub fn key(&self, id: u32) -> Option<&[u8]> {
        if id == 0 {
            return None;
        }
        self.keys.get(id as usize).map(|k| &**k)
    }

    /// Number of stored keys
    #[inline]
    pub fn len(&self) -> usize {
        self.index.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    /// Current bucket count
    #[inline]
    pub fn capacity(&self) -> usize {
        self.index.capacity()
    }

    /// Re-bucket all keys into at least `capacity` buckets, keeping every id.
    pub fn rehash(&mut self, capacity: usize) -> Result<(), CapacityError> {
        let keys = &self.keys;
        self.index
            .rehash(capacity, |id| token_hash(&keys[id as usize]))
    }

    /// Iterate over `(id, key)` pairs in id order
    pub fn iter(&self) -> impl Iterator<Item = (u32, &[u8])> + '_ {
        self.keys
            .iter()
            .enumerate()
            .skip(1)
            .map(|(id, key)| (id as u32, &**key))
    }

    /// Remove all keys
    pub fn clear(&mut self) {
        self.keys.truncate(1);
        self.index.clear();
    }
}

impl Default for TokenSet {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_intern_returns_nonzero() {
        let mut set = TokenSet::new();
        let id = set.intern(b"item").unwrap();
        assert!(id > 0);
        assert_eq!(set.key(id), Some(b"item" as &[u8]));
        assert_eq!(set.len(), 1);
    }

    #[test]
    fn test_intern_duplicate() {
        let mut set = TokenSet::new();
        let a = set.intern(b"name").unwrap();
        let b = set.intern(b"name").unwrap();
        assert_eq!(a, b);
        assert_eq!(set.len(), 1);
    }

    #[test]
    fn test_empty_key_is_a_key() {
        let mut set = TokenSet::new();
        let id = set.intern(b"").unwrap();
        assert_eq!(id, 1);
        assert_eq!(set.lookup(b""), Some(1));
        assert_eq!(set.key(0), None);
    }

    #[test]
    fn test_lookup_missing() {
        let mut set = TokenSet::new();
        set.intern(b"a").unwrap();
        assert_eq!(set.lookup(b"b"), None);
        assert!(!set.contains(b"b"));
    }

    #[test]
    fn test_growth_keeps_ids() {
        let mut set = TokenSet::with_capacity(2);
        let ids: Vec<u32> = (0..1000)
            .map(|i| set.intern(format!("tag{}", i).as_bytes()).unwrap())
            .collect();
        assert_eq!(set.len(), 1000);
        assert!(set.capacity() >= 1001);
        for (i, id) in ids.iter().enumerate() {
            assert_eq!(*id, i as u32 + 1);
            assert_eq!(set.lookup(format!("tag{}", i).as_bytes()), Some(*id));
        }
    }

    #[test]
    fn test_rehash_explicit() {
        let mut set = TokenSet::new();
        let a = set.intern(b"alpha").unwrap();
        let b = set.intern(b"beta").unwrap();
        set.rehash(256).unwrap();
        assert_eq!(set.capacity(), 256);
        assert_eq!(set.lookup(b"alpha"), Some(a));
        assert_eq!(set.lookup(b"beta"), Some(b));
    }

    #[test]
    fn test_iter_order() {
        let mut set = TokenSet::new();
        set.intern(b"x").unwrap();
        set.intern(b"y").unwrap();
        let keys: Vec<_> = set.iter().collect();
        assert_eq!(keys, vec![(1, b"x" as &[u8]), (2, b"y" as &[u8])]);
    }

    #[test]
    fn test_clear() {
        let mut set = TokenSet::new();
        set.intern(b"x").unwrap();
        set.clear();
        assert!(set.is_empty());
        assert_eq!(set.intern(b"y").unwrap(), 1);
    }

    #[test]
    fn test_hash_polynomial() {
        // ((97 * 31) + 98) * 31 + 99
        assert_eq!(token_hash(b"abc"), 96354);
        assert_eq!(token_hash(b""), 0);
    }
}
