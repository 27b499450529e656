//! # CacheLab
//!
//! CacheLab is a library for simulating a single set-associative cache against a recorded trace
//! of memory accesses
//!
//! It decomposes addresses into tags and set indices, keeps per-set occupancy and recency state,
//! evicts with a least recently used or first in first out policy, and replays valgrind style
//! traces to produce hit, miss and eviction counts
//!
//! It models occupancy only. There is no timing, no data, and no write-back behaviour

/// Contains the implementation of the cache, and a utility enum over the supported policies
pub mod cache;

/// Contains the configuration format, which can be read from JSON or built by hand
pub mod config;

/// Contains the error types returned while configuring the cache or reading a trace
pub mod error;

/// Contains the cache geometry and the address decoder
pub mod geometry;

/// Contains helpers for opening trace files
pub mod io;

/// Contains the provided replacement policies, with a trait for implementing custom replacement
/// policies
pub mod replacement_policies;

/// Contains the simulator used to replay a trace with a given cache configuration
pub mod simulator;

/// Contains the trace record format and its parser
pub mod trace;

#[cfg(test)]
mod test;

/// Contains utilities for generating traces in tests and benchmarks.
pub mod util;
