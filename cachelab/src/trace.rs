use std::fmt;
use std::io::BufRead;
use lazy_static::lazy_static;
use regex::Regex;

use crate::error::TraceError;

lazy_static! {
    // OP ADDRESS,SIZE with optional leading whitespace, as written by valgrind's lackey tool
    static ref RECORD_PATTERN: Regex = Regex::new(
        r"^\s*(?P<op>[ILSM])\s+(?:0[xX])?(?P<address>[0-9a-fA-F]+),\s*(?P<size>[0-9]+)\s*$"
    ).expect("record pattern is valid");
}

/// The kind of memory access a trace record describes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    /// Instruction fetch. Recognised so lackey traces can be replayed, but never simulated
    Instruction,
    Load,
    Store,
    /// A load immediately followed by a store to the same address
    Modify,
}

impl Operation {
    pub fn symbol(&self) -> char {
        match self {
            Operation::Instruction => 'I',
            Operation::Load => 'L',
            Operation::Store => 'S',
            Operation::Modify => 'M',
        }
    }

    fn from_symbol(symbol: &str) -> Option<Self> {
        match symbol {
            "I" => Some(Operation::Instruction),
            "L" => Some(Operation::Load),
            "S" => Some(Operation::Store),
            "M" => Some(Operation::Modify),
            _ => None,
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.symbol())
    }
}

/// A single parsed line of a trace. The size is carried along for annotations only, it plays no
/// part in the simulation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TraceRecord {
    pub operation: Operation,
    pub address: u64,
    pub size: u32,
}

impl fmt::Display for TraceRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {:x},{}", self.operation, self.address, self.size)
    }
}

/// Parses one trace line, returning None if it doesn't follow the `OP ADDRESS,SIZE` format
///
/// Addresses are hexadecimal with an optional `0x` prefix and must fit in 64 bits, sizes are
/// decimal
///
/// # Examples
///
/// ```
/// use cachelab::trace::{parse_record, Operation};
/// let record = parse_record(" M 0x7ff000398,8").unwrap();
/// assert_eq!(record.operation, Operation::Modify);
/// assert_eq!(record.address, 0x7ff000398);
/// assert_eq!(record.size, 8);
/// assert!(parse_record("L 10;1").is_none());
/// ```
pub fn parse_record(line: &str) -> Option<TraceRecord> {
    let captures = RECORD_PATTERN.captures(line)?;
    Some(TraceRecord {
        operation: Operation::from_symbol(captures.name("op")?.as_str())?,
        address: u64::from_str_radix(captures.name("address")?.as_str(), 16).ok()?,
        size: captures.name("size")?.as_str().parse().ok()?,
    })
}

/// Lazily reads records from a trace, one line at a time
///
/// Blank lines are skipped. By default the first malformed line ends the trace, exactly as if the
/// input had run out, and whatever was replayed up to that point stands. In strict mode the
/// malformed line is reported as [`TraceError::Malformed`] instead. Either way nothing is read
/// after it
pub struct TraceReader<R> {
    reader: R,
    buffer: Vec<u8>,
    line_number: usize,
    strict: bool,
    finished: bool,
}

impl<R: BufRead> TraceReader<R> {
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            buffer: Vec::with_capacity(64),
            line_number: 0,
            strict: false,
            finished: false,
        }
    }

    pub fn strict(mut self, strict: bool) -> Self {
        self.strict = strict;
        self
    }

    /// Number of lines consumed so far, including blank ones
    pub fn lines_read(&self) -> usize {
        self.line_number
    }

    fn malformed(&mut self) -> Option<Result<TraceRecord, TraceError>> {
        self.finished = true;
        let line = String::from_utf8_lossy(&self.buffer).trim_end().to_string();
        if self.strict {
            Some(Err(TraceError::Malformed {
                line_number: self.line_number,
                line,
            }))
        } else {
            log::debug!("trace ended early at line {}: {line:?}", self.line_number);
            None
        }
    }
}

impl<R: BufRead> Iterator for TraceReader<R> {
    type Item = Result<TraceRecord, TraceError>;

    fn next(&mut self) -> Option<Self::Item> {
        while !self.finished {
            self.buffer.clear();
            match self.reader.read_until(b'\n', &mut self.buffer) {
                Ok(0) => self.finished = true,
                Ok(_) => {
                    self.line_number += 1;
                    let parsed = match std::str::from_utf8(&self.buffer) {
                        Ok(line) if line.trim().is_empty() => continue,
                        Ok(line) => parse_record(line),
                        Err(_) => None,
                    };
                    return match parsed {
                        Some(record) => Some(Ok(record)),
                        None => self.malformed(),
                    };
                }
                Err(e) => {
                    self.finished = true;
                    return Some(Err(e.into()));
                }
            }
        }
        None
    }
}
