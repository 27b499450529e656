use std::fmt::Write;

use crate::trace::Operation;

const OPERATIONS: [Operation; 3] = [Operation::Load, Operation::Store, Operation::Modify];

/// Generates a lackey style trace which walks memory with a fixed stride
///
/// Addresses start at `base` and advance by `stride` bytes, wrapping back to `base` every `span`
/// bytes (a span of 0 never wraps). Operations cycle through load, store and modify
///
/// # Arguments
///
/// * `records`: Number of lines to generate
/// * `base`: The first address
/// * `stride`: Distance between consecutive addresses
/// * `span`: Size of the region walked
///
/// returns: String
///
/// # Examples
///
/// ```
/// use cachelab::util::strided_trace;
/// assert_eq!(strided_trace(4, 0x100, 8, 16), " L 100,8\n S 108,8\n M 100,8\n L 108,8\n");
/// ```
pub fn strided_trace(records: usize, base: u64, stride: u64, span: u64) -> String {
    let mut out = String::with_capacity(records * 16);
    let mut offset: u64 = 0;
    for i in 0..records {
        let operation = OPERATIONS[i % OPERATIONS.len()];
        // Writing to a String can't fail
        let _ = writeln!(out, " {} {:x},{}", operation, base.wrapping_add(offset), stride.max(1));
        offset = offset.wrapping_add(stride);
        if span != 0 {
            offset %= span;
        }
    }
    out
}
