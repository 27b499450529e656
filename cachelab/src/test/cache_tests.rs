use std::collections::HashSet;

use crate::cache::{Cache, CacheTrait, GenericCache, Line, Resolution};
use crate::geometry::Geometry;
use crate::replacement_policies::{FirstInFirstOut, LeastRecentlyUsed, ReplacementPolicy};

// With no set or offset bits every address is its own tag in the only set
fn single_set<R: ReplacementPolicy>(lines: usize, policy: R) -> Cache<R> {
    Cache::new(Geometry::new(0, lines, 0).unwrap(), policy)
}

fn tags<R: ReplacementPolicy>(cache: &Cache<R>, set: usize) -> Vec<u64> {
    cache.set(set).unwrap().lines().iter().map(|line| line.tag).collect()
}

/// Resolves an address, evicting if needed, and returns whether it hit
fn access<C: CacheTrait>(cache: &mut C, address: u64) -> bool {
    match cache.resolve(address) {
        Resolution::Hit { .. } => true,
        Resolution::MissInstalled { .. } => false,
        Resolution::MissFull => {
            cache.evict(address);
            false
        }
    }
}

#[test]
fn repeated_access_misses_once() {
    let mut cache = Cache::new(Geometry::new(2, 2, 4).unwrap(), LeastRecentlyUsed);
    assert_eq!(cache.resolve(0x1234), Resolution::MissInstalled { line: 0 });
    for _ in 0..100 {
        assert_eq!(cache.resolve(0x1234), Resolution::Hit { line: 0 });
    }
    // Same block, different offset
    assert_eq!(cache.resolve(0x123f), Resolution::Hit { line: 0 });
}

#[test]
fn free_lines_fill_in_index_order() {
    let mut cache = single_set(3, LeastRecentlyUsed);
    assert_eq!(cache.resolve(7), Resolution::MissInstalled { line: 0 });
    assert_eq!(cache.resolve(8), Resolution::MissInstalled { line: 1 });
    assert_eq!(cache.resolve(9), Resolution::MissInstalled { line: 2 });
    assert_eq!(cache.resolve(10), Resolution::MissFull);
    // A full miss leaves the set untouched until the caller evicts
    assert_eq!(tags(&cache, 0), vec![7, 8, 9]);
}

fn direct_mapped_conflict<R: ReplacementPolicy>(policy: R) {
    let mut cache = Cache::new(Geometry::new(1, 1, 2).unwrap(), policy);
    // Both land in set 1 with tags 0 and 1
    let a = 0b0100;
    let b = 0b1100;
    assert_eq!(cache.resolve(a), Resolution::MissInstalled { line: 0 });
    assert_eq!(cache.resolve(b), Resolution::MissFull);
    assert_eq!(cache.evict(b), 0);
    assert_eq!(tags(&cache, 1), vec![1]);
    assert_eq!(cache.resolve(a), Resolution::MissFull);
}

#[test]
fn direct_mapped_conflict_evicts_under_lru() {
    direct_mapped_conflict(LeastRecentlyUsed);
}

#[test]
fn direct_mapped_conflict_evicts_under_fifo() {
    direct_mapped_conflict(FirstInFirstOut);
}

#[test]
fn lru_evicts_least_recently_touched() {
    let mut cache = single_set(4, LeastRecentlyUsed);
    for address in 1..=4 {
        access(&mut cache, address);
    }
    assert!(access(&mut cache, 1));
    assert_eq!(cache.resolve(5), Resolution::MissFull);
    assert_eq!(cache.evict(5), 1);
    assert_eq!(tags(&cache, 0), vec![1, 5, 3, 4]);
}

#[test]
fn fifo_evicts_earliest_inserted_despite_touch() {
    let mut cache = single_set(4, FirstInFirstOut);
    for address in 1..=4 {
        access(&mut cache, address);
    }
    assert!(access(&mut cache, 1));
    assert_eq!(cache.resolve(5), Resolution::MissFull);
    assert_eq!(cache.evict(5), 0);
    assert_eq!(tags(&cache, 0), vec![5, 2, 3, 4]);
    // The refilled line is now the newest, so 2 goes next
    assert_eq!(cache.resolve(6), Resolution::MissFull);
    assert_eq!(cache.evict(6), 1);
}

#[test]
fn evicted_line_is_restamped() {
    let mut cache = single_set(2, LeastRecentlyUsed);
    access(&mut cache, 1);
    access(&mut cache, 2);
    access(&mut cache, 3);
    let line = cache.set(0).unwrap().lines()[0];
    assert_eq!(line, Line { valid: true, tag: 3, recency_stamp: 3, insertion_stamp: 3 });
}

#[test]
fn ties_go_to_the_lowest_index() {
    let line = |recency_stamp, insertion_stamp| Line {
        valid: true,
        tag: 0,
        recency_stamp,
        insertion_stamp,
    };
    let lines = [line(4, 2), line(4, 1), line(9, 1)];
    assert_eq!(LeastRecentlyUsed.select_victim(&lines), 0);
    assert_eq!(FirstInFirstOut.select_victim(&lines), 1);
    let lines = [line(5, 5), line(3, 3), line(3, 3)];
    assert_eq!(LeastRecentlyUsed.select_victim(&lines), 1);
    assert_eq!(FirstInFirstOut.select_victim(&lines), 1);
}

fn check_set_invariants<C: CacheTrait>(cache: &C) {
    for index in 0..cache.geometry().num_sets() {
        let valid: Vec<&Line> = cache.set(index).unwrap().lines().iter().filter(|l| l.valid).collect();
        let tags: HashSet<u64> = valid.iter().map(|l| l.tag).collect();
        let recency: HashSet<u64> = valid.iter().map(|l| l.recency_stamp).collect();
        let insertion: HashSet<u64> = valid.iter().map(|l| l.insertion_stamp).collect();
        assert_eq!(tags.len(), valid.len(), "duplicate tag in set {index}");
        assert_eq!(recency.len(), valid.len(), "shared recency stamp in set {index}");
        assert_eq!(insertion.len(), valid.len(), "shared insertion stamp in set {index}");
    }
}

#[test]
fn stamps_and_tags_stay_unique() {
    let geometry = Geometry::new(2, 4, 3).unwrap();
    let mut lru = GenericCache::from(Cache::new(geometry, LeastRecentlyUsed));
    let mut fifo = GenericCache::from(Cache::new(geometry, FirstInFirstOut));
    // Cheap deterministic scramble over a region a few times larger than the cache
    let mut address: u64 = 0x9e37;
    for _ in 0..5000 {
        address = address.wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407);
        let address = (address >> 33) % 1024;
        access(&mut lru, address);
        access(&mut fifo, address);
    }
    check_set_invariants(&lru);
    check_set_invariants(&fifo);
    assert_eq!(lru.get_uninitialised_line_count(), 0);
}

#[test]
fn lines_start_invalid() {
    let mut cache = GenericCache::from(Cache::new(Geometry::new(3, 2, 0).unwrap(), FirstInFirstOut));
    assert_eq!(cache.policy_name(), "fifo");
    assert_eq!(cache.get_uninitialised_line_count(), 16);
    access(&mut cache, 0);
    access(&mut cache, 1);
    assert_eq!(cache.get_uninitialised_line_count(), 14);
    assert!(cache.set(8).is_none());
}
