use std::fmt;
use std::io::BufRead;
use std::time::{Duration, Instant};
use serde::{Deserialize, Serialize};

use crate::cache::{Cache, CacheTrait, GenericCache, Resolution};
use crate::config::{ReplacementPolicyConfig, SimulatorConfig};
use crate::error::{ConfigError, TraceError};
use crate::geometry::Geometry;
use crate::replacement_policies::{FirstInFirstOut, LeastRecentlyUsed};
use crate::trace::{Operation, TraceReader, TraceRecord};

/// The simulator replays trace records against a cache and collects results.
///
/// It supports calling simulate multiple times, the cache state, the time taken to simulate, and
/// the results carry over between calls. Independent simulators never share any state
pub struct Simulator {
    cache: GenericCache,
    result: CacheResult,
    verbose: bool,
    strict_trace: bool,
    simulation_time: Duration,
}

/// The result of a simulation. Can be serialised as JSON
#[derive(Debug, Default, Clone, Copy, Serialize, Deserialize, Eq, PartialEq)]
pub struct CacheResult {
    pub hits: u64,
    pub misses: u64,
    pub evictions: u64,
}

impl fmt::Display for CacheResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "hits:{} misses:{} evictions:{}", self.hits, self.misses, self.evictions)
    }
}

/// One step of replaying a record, in the order it happened
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Hit,
    Miss,
    Eviction,
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Outcome::Hit => "hit",
            Outcome::Miss => "miss",
            Outcome::Eviction => "eviction",
        })
    }
}

/// What a record did to the cache, produced for every replayed record in verbose mode
///
/// Displays in the lackey trace format followed by the outcomes, e.g. `M 20,1 miss hit`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Annotation {
    pub record: TraceRecord,
    pub outcomes: Vec<Outcome>,
}

impl fmt::Display for Annotation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.record)?;
        for outcome in &self.outcomes {
            write!(f, " {outcome}")?;
        }
        Ok(())
    }
}

impl Simulator {

    /// Creates a new simulator for a given configuration
    ///
    /// # Arguments
    ///
    /// * `config`: A simulator configuration, usually resulting from the command line or JSON
    ///
    /// returns: Result<Simulator, ConfigError>, failing if the geometry is invalid
    pub fn new(config: &SimulatorConfig) -> Result<Self, ConfigError> {
        let geometry = config.geometry()?;
        log::info!(
            "{} sets of {} lines, {} tag bits, {} set bits, {} block bits, {:?}",
            geometry.num_sets(),
            geometry.lines_per_set(),
            geometry.tag_bits(),
            geometry.set_bits(),
            geometry.block_bits(),
            config.replacement_policy
        );
        Ok(Self {
            cache: Self::config_to_cache(geometry, config.replacement_policy),
            result: CacheResult::default(),
            verbose: config.verbose,
            strict_trace: config.strict_trace,
            simulation_time: Duration::new(0, 0),
        })
    }

    /// Performs a single load or store, counting a hit, or a miss followed by an eviction if the
    /// set was full
    fn access(&mut self, address: u64, outcomes: &mut Vec<Outcome>) {
        match self.cache.resolve(address) {
            Resolution::Hit { .. } => {
                self.result.hits += 1;
                self.note(outcomes, Outcome::Hit);
            }
            Resolution::MissInstalled { .. } => {
                self.result.misses += 1;
                self.note(outcomes, Outcome::Miss);
            }
            Resolution::MissFull => {
                self.result.misses += 1;
                self.note(outcomes, Outcome::Miss);
                self.cache.evict(address);
                self.result.evictions += 1;
                self.note(outcomes, Outcome::Eviction);
            }
        }
    }

    fn note(&self, outcomes: &mut Vec<Outcome>, outcome: Outcome) {
        if self.verbose {
            outcomes.push(outcome);
        }
    }

    /// Replays a single record, returning its annotation in verbose mode
    ///
    /// A modify is a load followed by a store to the same address. Nothing can run between the
    /// two halves, so the block the load left behind is still resident and the store is counted
    /// as a hit without looking it up again
    ///
    /// Instruction fetches are ignored entirely and never annotated
    pub fn replay(&mut self, record: &TraceRecord) -> Option<Annotation> {
        let mut outcomes = Vec::new();
        match record.operation {
            Operation::Instruction => return None,
            Operation::Load | Operation::Store => self.access(record.address, &mut outcomes),
            Operation::Modify => {
                self.access(record.address, &mut outcomes);
                self.result.hits += 1;
                self.note(&mut outcomes, Outcome::Hit);
            }
        }
        self.verbose.then(|| Annotation {
            record: *record,
            outcomes,
        })
    }

    /// Simulates the cache over a sequence of records, stopping at the first error
    ///
    /// # Arguments
    ///
    /// * `records`: The records, usually a [`TraceReader`]
    ///
    /// returns: Result<&CacheResult, TraceError>
    pub fn simulate<I>(&mut self, records: I) -> Result<&CacheResult, TraceError>
    where
        I: IntoIterator<Item = Result<TraceRecord, TraceError>>,
    {
        self.simulate_with(records, |_| {})
    }

    /// Simulates the cache over a sequence of records, handing every annotation to
    /// `on_annotation` as soon as its record has been replayed. Annotations are only produced in
    /// verbose mode
    pub fn simulate_with<I, F>(&mut self, records: I, mut on_annotation: F) -> Result<&CacheResult, TraceError>
    where
        I: IntoIterator<Item = Result<TraceRecord, TraceError>>,
        F: FnMut(&Annotation),
    {
        let start = Instant::now();
        for record in records {
            if let Some(annotation) = self.replay(&record?) {
                on_annotation(&annotation);
            }
        }
        let end = Instant::now();
        self.simulation_time += end - start;
        log::debug!("replay finished, {}", self.result);
        Ok(&self.result)
    }

    /// Simulates the cache over a textual trace, honouring the configured parsing mode
    pub fn simulate_reader<R: BufRead>(&mut self, reader: R) -> Result<&CacheResult, TraceError> {
        let records = self.records(reader);
        self.simulate(records)
    }

    /// Wraps a reader in a [`TraceReader`] using the configured parsing mode
    pub fn records<R: BufRead>(&self, reader: R) -> TraceReader<R> {
        TraceReader::new(reader).strict(self.strict_trace)
    }

    /// Gets the results so far
    pub fn result(&self) -> &CacheResult {
        &self.result
    }

    /// Gets the simulated cache, for inspecting its sets
    pub fn cache(&self) -> &GenericCache {
        &self.cache
    }

    /// Gets the wall-clock execution time for processing
    pub fn get_execution_time(&self) -> &Duration {
        &self.simulation_time
    }

    /// Gets the number of lines which were never filled
    pub fn get_uninitialised_line_count(&self) -> usize {
        self.cache.get_uninitialised_line_count()
    }

    /// Creates a new cache from a validated geometry and a replacement policy
    fn config_to_cache(geometry: Geometry, policy: ReplacementPolicyConfig) -> GenericCache {
        match policy {
            ReplacementPolicyConfig::LeastRecentlyUsed => {
                GenericCache::from(Cache::new(geometry, LeastRecentlyUsed))
            }
            ReplacementPolicyConfig::FirstInFirstOut => {
                GenericCache::from(Cache::new(geometry, FirstInFirstOut))
            }
        }
    }
}
