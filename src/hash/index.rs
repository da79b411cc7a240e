//! Bucket/next arena shared by all hash sets
//!
//! The arena only knows ids and hash values. Key storage and the hash
//! function belong to the concrete set, which passes a `hash_of(id)`
//! callback whenever entries have to be re-bucketed.

use crate::error::CapacityError;

/// Largest bucket array the arena will allocate
pub const MAX_CAPACITY: usize = 1 << 31;

/// Chained hash index over dense 1-based ids
#[derive(Debug, Clone)]
pub struct HashIndex {
    /// First id of each bucket chain (0 = empty bucket)
    buckets: Vec<u32>,
    /// Next id in the same chain, indexed by id (0 = end of chain)
    next: Vec<u32>,
    /// Number of entries plus the reserved slot 0
    size: u32,
}

impl HashIndex {
    /// Create an index whose capacity is `capacity` rounded up to a power of two
    pub fn with_capacity(capacity: usize) -> Self {
        let cap = capacity.clamp(2, MAX_CAPACITY).next_power_of_two();
        HashIndex {
            buckets: vec![0; cap],
            next: vec![0; cap],
            size: 1,
        }
    }

    /// Number of live entries
    #[inline]
    pub fn len(&self) -> usize {
        self.size as usize - 1
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.size == 1
    }

    /// Current bucket count
    #[inline]
    pub fn capacity(&self) -> usize {
        self.buckets.len()
    }

    /// Id that the next insertion will receive
    #[inline]
    pub fn next_id(&self) -> u32 {
        self.size
    }

    #[inline]
    fn slot(hash: u32, capacity: usize) -> usize {
        hash as usize & (capacity - 1)
    }

    /// Walk the chain for `hash` and return the first id accepted by `eq`.
    pub fn find<F>(&self, hash: u32, mut eq: F) -> Option<u32>
    where
        F: FnMut(u32) -> bool,
    {
        let mut id = self.buckets[Self::slot(hash, self.buckets.len())];
        while id != 0 {
            if eq(id) {
                return Some(id);
            }
            id = self.next[id as usize];
        }
        None
    }

    /// Allocate the next id and chain it under `hash`.
    ///
    /// The caller must already know that the key is absent. The table is
    /// grown first if the new id would not fit into `next`.
    pub fn insert<H>(&mut self, hash: u32, hash_of: H) -> Result<u32, CapacityError>
    where
        H: Fn(u32) -> u32,
    {
        if self.size as usize >= self.next.len() {
            let doubled = self.next.len() << 1;
            if doubled > MAX_CAPACITY {
                return Err(CapacityError { entries: self.len() });
            }
            self.rehash(doubled, hash_of)?;
        }
        let id = self.size;
        let b = Self::slot(hash, self.buckets.len());
        self.next[id as usize] = self.buckets[b];
        self.buckets[b] = id;
        self.size += 1;
        Ok(id)
    }

    /// Re-bucket all entries into a table of at least `capacity` buckets.
    ///
    /// Ids are preserved; only chain placement changes. The capacity never
    /// drops below what the current entries need.
    pub fn rehash<H>(&mut self, capacity: usize, hash_of: H) -> Result<(), CapacityError>
    where
        H: Fn(u32) -> u32,
    {
        let cap = capacity.max(self.size as usize).max(2).next_power_of_two();
        if cap > MAX_CAPACITY {
            return Err(CapacityError { entries: self.len() });
        }

        let mut buckets = vec![0u32; cap];
        for &head in &self.buckets {
            let mut id = head;
            while id != 0 {
                let p = Self::slot(hash_of(id), cap);
                let nx = self.next[id as usize];
                self.next[id as usize] = buckets[p];
                buckets[p] = id;
                id = nx;
            }
        }
        self.buckets = buckets;
        self.next.resize(cap, 0);
        Ok(())
    }

    /// Drop all entries, keeping the allocated capacity.
    pub fn clear(&mut self) {
        self.buckets.fill(0);
        self.next.fill(0);
        self.size = 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // Identity hash over a fixed key table
    fn keyed(keys: &[u32]) -> impl Fn(u32) -> u32 + '_ {
        move |id| keys[id as usize]
    }

    #[test]
    fn test_capacity_rounding() {
        assert_eq!(HashIndex::with_capacity(0).capacity(), 2);
        assert_eq!(HashIndex::with_capacity(5).capacity(), 8);
        assert_eq!(HashIndex::with_capacity(16).capacity(), 16);
    }

    #[test]
    fn test_insert_and_find() {
        let keys = vec![0, 10, 20, 30];
        let mut index = HashIndex::with_capacity(2);
        for id in 1..keys.len() as u32 {
            let got = index.insert(keys[id as usize], keyed(&keys)).unwrap();
            assert_eq!(got, id);
        }
        assert_eq!(index.len(), 3);
        for id in 1..keys.len() as u32 {
            let hash = keys[id as usize];
            assert_eq!(index.find(hash, |c| keys[c as usize] == hash), Some(id));
        }
        assert_eq!(index.find(40, |c| keys[c as usize] == 40), None);
    }

    #[test]
    fn test_grows_before_overflow() {
        let keys: Vec<u32> = (0..100).collect();
        let mut index = HashIndex::with_capacity(2);
        for id in 1..100u32 {
            index.insert(id, keyed(&keys)).unwrap();
            assert!(index.next_id() as usize <= index.capacity());
        }
        assert_eq!(index.capacity(), 128);
    }

    #[test]
    fn test_explicit_rehash_keeps_ids() {
        let keys = vec![0, 3, 7, 11, 15];
        let mut index = HashIndex::with_capacity(8);
        for id in 1..keys.len() as u32 {
            index.insert(keys[id as usize], keyed(&keys)).unwrap();
        }
        index.rehash(64, keyed(&keys)).unwrap();
        assert_eq!(index.capacity(), 64);
        for id in 1..keys.len() as u32 {
            let hash = keys[id as usize];
            assert_eq!(index.find(hash, |c| keys[c as usize] == hash), Some(id));
        }
        // Shrinking below the entry count is clamped
        index.rehash(1, keyed(&keys)).unwrap();
        assert!(index.capacity() >= keys.len());
    }

    #[test]
    fn test_clear() {
        let keys = vec![0, 1];
        let mut index = HashIndex::with_capacity(4);
        index.insert(1, keyed(&keys)).unwrap();
        index.clear();
        assert!(index.is_empty());
        assert_eq!(index.find(1, |_| true), None);
        assert_eq!(index.next_id(), 1);
    }
}
