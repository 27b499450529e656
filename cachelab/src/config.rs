use std::io::Read;
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::geometry::Geometry;

/// A configuration for a single cache, and how its trace should be replayed
///
/// ```
/// use cachelab::config::{ReplacementPolicyConfig, SimulatorConfig};
/// let config = SimulatorConfig::from_json_reader(
///     r#"{ "set_bits": 4, "lines_per_set": 2, "block_bits": 4, "replacement_policy": "fifo" }"#.as_bytes()
/// ).unwrap();
/// assert_eq!(config.replacement_policy, ReplacementPolicyConfig::FirstInFirstOut);
/// assert_eq!(config.geometry().unwrap().num_sets(), 16);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SimulatorConfig {
    pub set_bits: u32,
    pub lines_per_set: usize,
    pub block_bits: u32,
    #[serde(default)]
    pub replacement_policy: ReplacementPolicyConfig,
    /// Emit an annotation for every replayed record
    #[serde(default)]
    pub verbose: bool,
    /// Report a malformed trace line as an error instead of treating it as the end of the trace
    #[serde(default)]
    pub strict_trace: bool,
}

/// The replacement policy - lru or fifo. Defaults to lru.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum ReplacementPolicyConfig {
    #[default]
    #[serde(alias = "lru")]
    LeastRecentlyUsed,
    #[serde(alias = "fifo")]
    FirstInFirstOut,
}

impl SimulatorConfig {
    /// Creates a configuration with the default policy, verbosity and parsing mode
    pub fn new(set_bits: u32, lines_per_set: usize, block_bits: u32) -> Self {
        Self {
            set_bits,
            lines_per_set,
            block_bits,
            replacement_policy: ReplacementPolicyConfig::default(),
            verbose: false,
            strict_trace: false,
        }
    }

    pub fn with_policy(mut self, policy: ReplacementPolicyConfig) -> Self {
        self.replacement_policy = policy;
        self
    }

    pub fn with_verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    pub fn with_strict_trace(mut self, strict: bool) -> Self {
        self.strict_trace = strict;
        self
    }

    /// Parses a configuration from JSON. Negative widths are rejected here, as every width is
    /// unsigned
    pub fn from_json_reader<R: Read>(reader: R) -> serde_json::Result<Self> {
        serde_json::from_reader(reader)
    }

    /// Validates the widths and builds the geometry they describe
    pub fn geometry(&self) -> Result<Geometry, ConfigError> {
        Geometry::new(self.set_bits, self.lines_per_set, self.block_bits)
    }
}
