//! Name Dictionary
//!
//! Interns element or attribute names and keeps value statistics per name.
//! Ids come from the underlying [`TokenSet`] and never change once issued,
//! so the pre-order encoding can store them directly.

use super::name_stats::NameStats;
use crate::config::StatsConfig;
use crate::error::CapacityError;
use crate::hash::TokenSet;

/// Name dictionary with per-name statistics
#[derive(Debug, Clone)]
pub struct Names {
    set: TokenSet,
    /// Statistics indexed by name id; slot 0 is unused
    stats: Vec<NameStats>,
    max_categories: usize,
    /// Set once a full statistics pass has completed
    stats_computed: bool,
}

impl Names {
    pub fn new(config: &StatsConfig) -> Self {
        let set = TokenSet::with_capacity(config.initial_capacity);
        let mut stats = Vec::with_capacity(set.capacity());
        stats.push(NameStats::default());
        Names {
            set,
            stats,
            max_categories: config.max_categories,
            stats_computed: false,
        }
    }

    /// Id of `key`, inserting it without touching statistics.
    pub fn intern(&mut self, key: &[u8]) -> Result<u32, CapacityError> {
        let id = self.set.intern(key)?;
        if id as usize == self.stats.len() {
            self.stats.push(NameStats::default());
        }
        Ok(id)
    }

    /// Record one occurrence of `key`, with an optional value.
    pub fn index(&mut self, key: &[u8], value: Option<&[u8]>) -> Result<u32, CapacityError> {
        let id = self.intern(key)?;
        let max_categories = self.max_categories;
        let stats = &mut self.stats[id as usize];
        stats.count += 1;
        if let Some(value) = value {
            stats.add(value, max_categories)?;
        }
        Ok(id)
    }

    /// Fold a value into the statistics of an existing name.
    ///
    /// Unknown ids are ignored.
    pub fn index_id(&mut self, id: u32, value: &[u8]) -> Result<(), CapacityError> {
        if id == 0 {
            return Ok(());
        }
        let max_categories = self.max_categories;
        match self.stats.get_mut(id as usize) {
            Some(stats) => stats.add(value, max_categories),
            None => Ok(()),
        }
    }

    /// Id of `key`, if interned
    #[inline]
    pub fn lookup(&self, key: &[u8]) -> Option<u32> {
        self.set.lookup(key)
    }

    /// Name stored under `id`
    #[inline]
    pub fn key(&self, id: u32) -> Option<&[u8]> {
        self.set.key(id)
    }

    /// Statistics of `id`
    pub fn stats(&self, id: u32) -> Option<&NameStats> {
        if id == 0 {
            return None;
        }
        self.stats.get(id as usize)
    }

    /// Number of interned names
    #[inline]
    pub fn len(&self) -> usize {
        self.set.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.set.is_empty()
    }

    /// Iterate over `(id, name, stats)` in id order
    pub fn iter(&self) -> impl Iterator<Item = (u32, &[u8], &NameStats)> + '_ {
        self.set
            .iter()
            .map(move |(id, key)| (id, key, &self.stats[id as usize]))
    }

    /// Forget all statistics, keeping names and ids.
    pub fn reset_stats(&mut self) {
        for stats in &mut self.stats {
            *stats = NameStats::default();
        }
        self.stats_computed = false;
    }

    #[inline]
    pub fn stats_computed(&self) -> bool {
        self.stats_computed
    }

    pub fn set_stats_computed(&mut self, computed: bool) {
        self.stats_computed = computed;
    }

    /// The underlying token set
    pub fn tokens(&self) -> &TokenSet {
        &self.set
    }
}

impl Default for Names {
    fn default() -> Self {
        Self::new(&StatsConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::ValueKind;

    #[test]
    fn test_index_counts() {
        let mut names = Names::default();
        let a = names.index(b"item", None).unwrap();
        let b = names.index(b"item", None).unwrap();
        assert_eq!(a, b);
        assert_eq!(names.stats(a).unwrap().count, 2);
        assert_eq!(names.len(), 1);
    }

    #[test]
    fn test_intern_leaves_stats() {
        let mut names = Names::default();
        let id = names.intern(b"id").unwrap();
        assert_eq!(names.stats(id).unwrap().count, 0);
        assert_eq!(names.lookup(b"id"), Some(id));
    }

    #[test]
    fn test_values() {
        let mut names = Names::default();
        let id = names.index(b"price", Some(b"12")).unwrap();
        names.index(b"price", Some(b"7")).unwrap();
        let stats = names.stats(id).unwrap();
        assert_eq!(stats.kind, ValueKind::Integer);
        assert_eq!(stats.len, 3);
        assert_eq!(stats.range(), Some((7.0, 12.0)));
    }

    #[test]
    fn test_index_id() {
        let mut names = Names::default();
        let id = names.intern(b"title").unwrap();
        names.index_id(id, b"hello").unwrap();
        names.index_id(0, b"ignored").unwrap();
        names.index_id(99, b"ignored").unwrap();
        let stats = names.stats(id).unwrap();
        assert_eq!(stats.len, 5);
        assert_eq!(stats.count, 0);
    }

    #[test]
    fn test_reset_keeps_ids() {
        let mut names = Names::default();
        let id = names.index(b"a", Some(b"x")).unwrap();
        names.set_stats_computed(true);
        names.reset_stats();
        assert!(!names.stats_computed());
        assert_eq!(names.lookup(b"a"), Some(id));
        assert_eq!(names.stats(id).unwrap().count, 0);
        assert_eq!(names.stats(id).unwrap().len, 0);
    }

    #[test]
    fn test_many_names_grow() {
        let config = StatsConfig {
            initial_capacity: 2,
            ..StatsConfig::default()
        };
        let mut names = Names::new(&config);
        let ids: Vec<u32> = (0..300)
            .map(|i| names.index(format!("n{}", i).as_bytes(), None).unwrap())
            .collect();
        for (i, id) in ids.iter().enumerate() {
            assert_eq!(names.lookup(format!("n{}", i).as_bytes()), Some(*id));
            assert_eq!(names.stats(*id).unwrap().count, 1);
        }
        assert_eq!(names.iter().count(), 300);
    }
}
