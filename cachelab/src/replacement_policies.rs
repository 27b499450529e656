use crate::cache::Line;

/// A generic trait for implementing new replacement policies. Can be used to parameterise a Cache.
///
/// Policies don't keep any state of their own. Every line carries a recency stamp and an insertion
/// stamp drawn from its set's counters, and a policy only decides which of the two orders victims
pub trait ReplacementPolicy {
    /// Short name used in logs and diagnostics
    const NAME: &'static str;

    /// The stamp compared when choosing a victim. The line with the smallest key is evicted
    ///
    /// # Arguments
    ///
    /// * `line`: A valid line of a full set
    ///
    /// returns: u64
    fn eviction_key(&self, line: &Line) -> u64;

    /// Used by the cache to pick the line to overwrite when a set is full
    ///
    /// Lines are scanned in index order and the current minimum is only replaced on a strictly
    /// smaller key, so equal keys resolve to the lowest index
    ///
    /// # Arguments
    ///
    /// * `lines`: Every line of the set, in index order
    ///
    /// returns: usize, the index of the victim within the set
    fn select_victim(&self, lines: &[Line]) -> usize {
        let mut min_index = 0;
        let mut min_value = match lines.first() {
            Some(line) => self.eviction_key(line),
            None => return 0,
        };
        let mut index = 1;
        while index < lines.len() {
            let value = self.eviction_key(&lines[index]);
            if value < min_value {
                min_value = value;
                min_index = index;
            }
            index += 1;
        }
        min_index
    }
}

/// Least Recently Used replacement policy
///
/// Evicts the line whose recency stamp is oldest. Hits refresh the recency stamp, so a line that
/// keeps getting used stays resident
#[derive(Debug, Default, Clone, Copy)]
pub struct LeastRecentlyUsed;

impl ReplacementPolicy for LeastRecentlyUsed {
    const NAME: &'static str = "lru";

    fn eviction_key(&self, line: &Line) -> u64 {
        line.recency_stamp
    }
}

/// First In First Out replacement policy
///
/// Evicts the line which was filled earliest, no matter how often it has been hit since
#[derive(Debug, Default, Clone, Copy)]
pub struct FirstInFirstOut;

impl ReplacementPolicy for FirstInFirstOut {
    const NAME: &'static str = "fifo";

    fn eviction_key(&self, line: &Line) -> u64 {
        line.insertion_stamp
    }
}
