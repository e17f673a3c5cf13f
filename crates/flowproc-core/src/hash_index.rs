//! Flow lookup: a direct-mapped one-entry cache in front of an intrusive
//! hash-chained index, both addressing the flow arena by index rather than
//! by pointer.

use crate::flow::{FlowArena, FlowKey};
use crate::hash::fast_hash;

fn bump_entry_cache_hits(arena: &mut FlowArena, idx: u32) {
    arena.get_mut(idx).cache_hits += 1;
}

/// Running counters describing lookup behavior, surfaced in reports.
#[derive(Debug, Default, Clone, Copy)]
pub struct LookupStats {
    pub cache_hits: u64,
    pub cache_misses: u64,
    pub total_lookups: u64,
    pub collision_count: u64,
    pub total_entries: u64,
}

/// Hash-chained index over the flow arena, fronted by a direct-mapped
/// lookup cache.
///
/// Buckets and the cache both hold `Option<u32>` arena indices rather than
/// references: the arena never relocates entries, so an index is as good
/// as a pointer and sidesteps Rust's aliasing rules entirely.
#[derive(Debug)]
pub struct HashIndex {
    buckets: Vec<Option<u32>>,
    cache: Vec<Option<u32>>,
    bucket_mask: u32,
    cache_mask: u32,
    pub stats: LookupStats,
}

impl HashIndex {
    pub fn new(hash_table_size: usize, cache_size: usize) -> Self {
        assert!(hash_table_size.is_power_of_two());
        assert!(cache_size.is_power_of_two());
        Self {
            buckets: vec![None; hash_table_size],
            cache: vec![None; cache_size],
            bucket_mask: (hash_table_size - 1) as u32,
            cache_mask: (cache_size - 1) as u32,
            stats: LookupStats::default(),
        }
    }

    fn bucket_of(&self, key: FlowKey) -> usize {
        (fast_hash(key) & self.bucket_mask) as usize
    }

    fn cache_slot_of(&self, key: FlowKey) -> usize {
        (fast_hash(key) & self.cache_mask) as usize
    }

    /// Find `key`'s arena index, checking the direct-mapped cache first.
    ///
    /// A direct-cache hit also bumps the found entry's own `cache_hits`
    /// counter, the same bookkeeping the predictor's cache-hit-ratio
    /// feature reads back; a chain walk (even one that succeeds) does not,
    /// since it didn't skip any work.
    pub fn lookup(&mut self, key: FlowKey, arena: &mut FlowArena) -> Option<u32> {
        let slot = self.cache_slot_of(key);
        if let Some(idx) = self.cache[slot] {
            if arena.get(idx).key == key {
                self.stats.cache_hits += 1;
                bump_entry_cache_hits(arena, idx);
                return Some(idx);
            }
        }

        self.stats.total_lookups += 1;
        let mut cursor = self.buckets[self.bucket_of(key)];
        while let Some(idx) = cursor {
            let entry = arena.get(idx);
            if entry.key == key {
                self.cache[slot] = Some(idx);
                return Some(idx);
            }
            cursor = entry.next;
            self.stats.collision_count += 1;
        }

        self.stats.cache_misses += 1;
        None
    }

    /// Link a newly-allocated arena entry into its hash bucket.
    ///
    /// The caller is responsible for setting `arena.get_mut(idx).next`
    /// from the returned previous head, since the arena and index are
    /// separate owners and can't be borrowed mutably at the same time.
    pub fn insert(&mut self, key: FlowKey, idx: u32) -> Option<u32> {
        let bucket = self.bucket_of(key);
        let previous_head = self.buckets[bucket];
        self.buckets[bucket] = Some(idx);
        self.stats.total_entries += 1;
        previous_head
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lookup_miss_on_empty_index() {
        let mut index = HashIndex::new(16, 4);
        let mut arena = FlowArena::new(4);
        assert!(index.lookup(7, &mut arena).is_none());
        assert_eq!(index.stats.cache_misses, 1);
    }

    #[test]
    fn insert_then_lookup_via_chain_hit() {
        let mut index = HashIndex::new(16, 4);
        let mut arena = FlowArena::new(4);
        let idx = arena.allocate(99, 0).unwrap();
        let prev = index.insert(99, idx);
        arena.get_mut(idx).next = prev;

        let found = index.lookup(99, &mut arena);
        assert_eq!(found, Some(idx));
    }

    #[test]
    fn second_lookup_hits_direct_mapped_cache() {
        let mut index = HashIndex::new(16, 4);
        let mut arena = FlowArena::new(4);
        let idx = arena.allocate(5, 0).unwrap();
        index.insert(5, idx);

        index.lookup(5, &mut arena);
        let before = index.stats.cache_hits;
        index.lookup(5, &mut arena);
        assert_eq!(index.stats.cache_hits, before + 1);
    }

    #[test]
    fn chained_collisions_are_counted() {
        // Force two keys into the same bucket by using a tiny table.
        let mut index = HashIndex::new(2, 2);
        let mut arena = FlowArena::new(4);
        let a = arena.allocate(1, 0).unwrap();
        let prev_a = index.insert(1, a);
        arena.get_mut(a).next = prev_a;

        let b = arena.allocate(2, 0).unwrap();
        if index.bucket_of(1) == index.bucket_of(2) {
            let prev_b = index.insert(2, b);
            arena.get_mut(b).next = prev_b;
            // Lookup for `a`, which now sits behind `b` in the chain.
            index.cache = vec![None; index.cache.len()];
            index.lookup(1, &mut arena);
            assert!(index.stats.collision_count >= 1);
        }
    }
}
