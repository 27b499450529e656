use crate::geometry::Geometry;
use crate::replacement_policies::{FirstInFirstOut, LeastRecentlyUsed, ReplacementPolicy};

/// One storage slot of a set
///
/// Stamps are only meaningful relative to other lines of the same set
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Line {
    pub valid: bool,
    pub tag: u64,
    pub recency_stamp: u64,
    pub insertion_stamp: u64,
}

/// What happened when an address was looked up in its set
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolution {
    /// The tag was resident in `line`
    Hit { line: usize },
    /// The tag was absent and has been installed into the free `line`
    MissInstalled { line: usize },
    /// The tag was absent and every line is occupied, the caller has to evict
    MissFull,
}

/// A fixed number of lines, plus the two counters their stamps are drawn from
///
/// Both counters only ever increase, so no two lines of a set share a recency stamp or an
/// insertion stamp once they have been filled
#[derive(Debug, Clone)]
pub struct CacheSet {
    lines: Box<[Line]>,
    recency_counter: u64,
    insertion_counter: u64,
}

impl CacheSet {
    fn new(lines_per_set: usize) -> Self {
        Self {
            lines: vec![Line::default(); lines_per_set].into_boxed_slice(),
            recency_counter: 0,
            insertion_counter: 0,
        }
    }

    pub fn lines(&self) -> &[Line] {
        &self.lines
    }

    fn touch(&mut self, index: usize) {
        self.recency_counter += 1;
        self.lines[index].recency_stamp = self.recency_counter;
    }

    // A refilled line counts as both just used and just inserted
    fn fill(&mut self, index: usize, tag: u64) {
        self.recency_counter += 1;
        self.insertion_counter += 1;
        let line = &mut self.lines[index];
        line.valid = true;
        line.tag = tag;
        line.recency_stamp = self.recency_counter;
        line.insertion_stamp = self.insertion_counter;
    }
}

/// A generic trait for caches
///
/// Technically not required as we're using static dispatch through [`GenericCache`] instead of
/// dyn Cache, but it keeps the policy specific caches and the enum over them interchangeable
pub trait CacheTrait {
    /// The geometry the cache was built with
    fn geometry(&self) -> &Geometry;

    /// Converts an address into a tag and a set index. See [`Geometry::decode`]
    ///
    /// # Arguments
    ///
    /// * `input`: The address
    ///
    /// returns: (u64, usize)
    fn address_to_tag_and_set(&self, input: u64) -> (u64, usize) {
        self.geometry().decode(input)
    }

    /// Looks an address up in its set
    ///
    /// Lines are scanned in index order. A resident tag has its recency refreshed, otherwise the
    /// lowest indexed free line is filled. If there is no free line nothing changes and
    /// [`Resolution::MissFull`] is returned
    ///
    /// # Arguments
    ///
    /// * `input`: The address being accessed
    ///
    /// returns: Resolution
    fn resolve(&mut self, input: u64) -> Resolution;

    /// Replaces a line of the address's set according to the replacement policy, returning the
    /// index of the victim within its set
    ///
    /// Must only be called after [`CacheTrait::resolve`] reported [`Resolution::MissFull`] for the
    /// same address
    fn evict(&mut self, input: u64) -> usize;

    /// Gets a set by index, if it exists
    fn set(&self, index: usize) -> Option<&CacheSet>;

    /// Name of the replacement policy in use
    fn policy_name(&self) -> &'static str;

    /// Gets the number of lines which have never been filled. Useful for analysing cache
    /// performance or debugging
    fn get_uninitialised_line_count(&self) -> usize;
}

/// A cache parameterised by a replacement policy
///
/// Sets own their lines outright and are indexed directly by the decoded set index, so there are
/// no references between sets or lines
pub struct Cache<R: ReplacementPolicy> {
    geometry: Geometry,
    sets: Vec<CacheSet>,
    replacement_policy: R,
}

impl<R: ReplacementPolicy> Cache<R> {
    /// Creates a cache with every line invalid
    pub fn new(geometry: Geometry, policy: R) -> Self {
        Self {
            sets: (0..geometry.num_sets())
                .map(|_| CacheSet::new(geometry.lines_per_set()))
                .collect(),
            geometry,
            replacement_policy: policy,
        }
    }
}

impl<R: ReplacementPolicy> CacheTrait for Cache<R> {
    fn geometry(&self) -> &Geometry {
        &self.geometry
    }

    fn resolve(&mut self, input: u64) -> Resolution {
        let (tag, set_index) = self.geometry.decode(input);
        let set = &mut self.sets[set_index];
        if let Some(line) = set.lines.iter().position(|l| l.valid && l.tag == tag) {
            set.touch(line);
            return Resolution::Hit { line };
        }
        match set.lines.iter().position(|l| !l.valid) {
            Some(line) => {
                set.fill(line, tag);
                Resolution::MissInstalled { line }
            }
            None => Resolution::MissFull,
        }
    }

    fn evict(&mut self, input: u64) -> usize {
        let (tag, set_index) = self.geometry.decode(input);
        let set = &mut self.sets[set_index];
        debug_assert!(set.lines.iter().all(|l| l.valid && l.tag != tag));
        let victim = self.replacement_policy.select_victim(&set.lines);
        log::trace!(
            "{} eviction in set {set_index}: line {victim}, tag {:#x} replaced by {tag:#x}",
            R::NAME,
            set.lines[victim].tag
        );
        set.fill(victim, tag);
        victim
    }

    fn set(&self, index: usize) -> Option<&CacheSet> {
        self.sets.get(index)
    }

    fn policy_name(&self) -> &'static str {
        R::NAME
    }

    fn get_uninitialised_line_count(&self) -> usize {
        self.sets
            .iter()
            .flat_map(|set| set.lines.iter())
            .filter(|line| !line.valid)
            .count()
    }
}

/// Enum for both caches provided by the library
///
/// Using trait objects in Rust reduces boilerplate, but we would be de-referencing for each record
/// of the trace. Branching on the concrete types lets the compiler inline the policy
pub enum GenericCache {
    LeastRecentlyUsed(Cache<LeastRecentlyUsed>),
    FirstInFirstOut(Cache<FirstInFirstOut>),
}

impl From<Cache<LeastRecentlyUsed>> for GenericCache {
    fn from(value: Cache<LeastRecentlyUsed>) -> Self {
        Self::LeastRecentlyUsed(value)
    }
}

impl From<Cache<FirstInFirstOut>> for GenericCache {
    fn from(value: Cache<FirstInFirstOut>) -> Self {
        Self::FirstInFirstOut(value)
    }
}

impl CacheTrait for GenericCache {
    fn geometry(&self) -> &Geometry {
        match self {
            GenericCache::LeastRecentlyUsed(c) => c.geometry(),
            GenericCache::FirstInFirstOut(c) => c.geometry(),
        }
    }

    fn resolve(&mut self, input: u64) -> Resolution {
        match self {
            GenericCache::LeastRecentlyUsed(c) => c.resolve(input),
            GenericCache::FirstInFirstOut(c) => c.resolve(input),
        }
    }

    fn evict(&mut self, input: u64) -> usize {
        match self {
            GenericCache::LeastRecentlyUsed(c) => c.evict(input),
            GenericCache::FirstInFirstOut(c) => c.evict(input),
        }
    }

    fn set(&self, index: usize) -> Option<&CacheSet> {
        match self {
            GenericCache::LeastRecentlyUsed(c) => c.set(index),
            GenericCache::FirstInFirstOut(c) => c.set(index),
        }
    }

    fn policy_name(&self) -> &'static str {
        match self {
            GenericCache::LeastRecentlyUsed(c) => c.policy_name(),
            GenericCache::FirstInFirstOut(c) => c.policy_name(),
        }
    }

    fn get_uninitialised_line_count(&self) -> usize {
        match self {
            GenericCache::LeastRecentlyUsed(c) => c.get_uninitialised_line_count(),
            GenericCache::FirstInFirstOut(c) => c.get_uninitialised_line_count(),
        }
    }
}
