use serde::Serialize;

use crate::cache::Line;
use crate::error::ConfigError;

/// Width of a simulated address
pub const ADDRESS_BITS: u32 = u64::BITS;

/// The shape of a cache: how many sets it has, how many lines each set holds, and how an address
/// splits into tag, set index and block offset
///
/// A geometry can only be built through [`Geometry::new`], so holding one means the widths have
/// already been validated and decoding can never fail
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Geometry {
    set_bits: u32,
    lines_per_set: usize,
    block_bits: u32,
    tag_bits: u32,
    num_sets: usize,
    set_selection_bit_mask: u64,
}

impl Geometry {
    /// Validates and builds a geometry
    ///
    /// # Arguments
    ///
    /// * `set_bits`: Number of set index bits, the cache has 2^set_bits sets
    /// * `lines_per_set`: Associativity, must be at least 1
    /// * `block_bits`: Number of block offset bits, a block is 2^block_bits bytes
    ///
    /// returns: Result<Geometry, ConfigError>
    pub fn new(set_bits: u32, lines_per_set: usize, block_bits: u32) -> Result<Self, ConfigError> {
        let index_bits = set_bits
            .checked_add(block_bits)
            .filter(|bits| *bits <= ADDRESS_BITS)
            .ok_or(ConfigError::AddressWidthExceeded { set_bits, block_bits })?;
        if lines_per_set == 0 {
            return Err(ConfigError::NoLines);
        }
        let too_large = ConfigError::CacheTooLarge { set_bits, lines_per_set };
        let num_sets = 1usize.checked_shl(set_bits).ok_or(too_large)?;
        // Every line gets allocated up front, so the whole arena has to be addressable
        num_sets
            .checked_mul(lines_per_set)
            .and_then(|lines| lines.checked_mul(std::mem::size_of::<Line>()))
            .filter(|bytes| *bytes <= isize::MAX as usize)
            .ok_or(too_large)?;
        let set_selection_bit_mask = if set_bits == 0 {
            0
        } else {
            u64::MAX >> (ADDRESS_BITS - set_bits)
        };
        Ok(Self {
            set_bits,
            lines_per_set,
            block_bits,
            tag_bits: ADDRESS_BITS - index_bits,
            num_sets,
            set_selection_bit_mask,
        })
    }

    /// Splits an address into its tag and set index
    ///
    /// The block offset bits are discarded, the next `set_bits` bits select the set, and whatever
    /// remains above them is the tag
    ///
    /// # Examples
    ///
    /// ```
    /// use cachelab::geometry::Geometry;
    /// let geometry = Geometry::new(4, 1, 4).unwrap();
    /// assert_eq!(geometry.decode(0x110), (0x1, 0x1));
    /// assert_eq!(geometry.decode(0x2f3), (0x2, 0xf));
    /// ```
    pub fn decode(&self, address: u64) -> (u64, usize) {
        // Shifts by the full address width are legal here and leave nothing behind
        let set = address.checked_shr(self.block_bits).unwrap_or(0) & self.set_selection_bit_mask;
        let tag = address.checked_shr(self.block_bits + self.set_bits).unwrap_or(0);
        (tag, set as usize)
    }

    pub fn set_bits(&self) -> u32 {
        self.set_bits
    }

    pub fn lines_per_set(&self) -> usize {
        self.lines_per_set
    }

    pub fn block_bits(&self) -> u32 {
        self.block_bits
    }

    pub fn tag_bits(&self) -> u32 {
        self.tag_bits
    }

    pub fn num_sets(&self) -> usize {
        self.num_sets
    }

    /// Total number of lines across every set
    pub fn num_lines(&self) -> usize {
        self.num_sets * self.lines_per_set
    }
}
