use std::io;
use std::path::PathBuf;
use thiserror::Error;

use crate::geometry::ADDRESS_BITS;

/// Errors raised while validating a cache configuration. All of these are fatal and are reported
/// before any record is replayed
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{set_bits} set index bits and {block_bits} block offset bits exceed the {}-bit address width", ADDRESS_BITS)]
    AddressWidthExceeded { set_bits: u32, block_bits: u32 },
    #[error("a set must hold at least one line")]
    NoLines,
    #[error("a cache with 2^{set_bits} sets of {lines_per_set} lines is too large to simulate")]
    CacheTooLarge { set_bits: u32, lines_per_set: usize },
}

/// Errors raised while reading a trace
#[derive(Debug, Error)]
pub enum TraceError {
    #[error("couldn't open the trace file at path {}: {source}", .path.display())]
    Unavailable {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("couldn't read the trace: {0}")]
    Io(#[from] io::Error),
    /// Only produced when strict parsing is enabled, otherwise a malformed line ends the trace
    #[error("malformed trace record on line {line_number}: {line:?}")]
    Malformed { line_number: usize, line: String },
}
