//! Alignment constants and helpers.
//!
//! The allocator works in units of the machine word (`WSIZE`) and the
//! double word (`DSIZE`), the latter being the alignment unit for every
//! block boundary in the heap.
//!
//! ```text
//!   WSIZE = size_of::<usize>()   (8 on a 64-bit target)
//!   DSIZE = 2 * WSIZE            (16 on a 64-bit target)
//!   MIN_BLOCK_SIZE = 4 * WSIZE   (2 * DSIZE)
//! ```

use std::mem;

/// Width of one machine word, in bytes.
pub const WSIZE: usize = mem::size_of::<usize>();

/// Width of the double-word alignment unit, in bytes.
pub const DSIZE: usize = 2 * WSIZE;

/// Minimum possible block size: header + two free-list words + footer.
pub const MIN_BLOCK_SIZE: usize = 4 * WSIZE;

/// Rounds `value` up to the double-word alignment unit.
///
/// # Examples
///
/// ```
/// use rallocator::align::align_to;
/// assert_eq!(align_to(13, 16), 16);
/// assert_eq!(align_to(16, 16), 16);
/// ```
#[macro_export]
macro_rules! align {
  ($value:expr) => {
    $crate::align::align_to($value, $crate::align::DSIZE)
  };
}

/// Rounds `value` up to a multiple of `align` (`align` must be a power of two).
pub const fn align_to(value: usize, align: usize) -> usize {
  (value + align - 1) & !(align - 1)
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn align_to_rounds_up_to_power_of_two() {
    assert_eq!(align_to(0, DSIZE), 0);
    assert_eq!(align_to(1, DSIZE), DSIZE);
    assert_eq!(align_to(DSIZE, DSIZE), DSIZE);
    assert_eq!(align_to(DSIZE + 1, DSIZE), 2 * DSIZE);
  }

  #[test]
  fn word_sizes_match_usize() {
    assert_eq!(WSIZE, mem::size_of::<usize>());
    assert_eq!(DSIZE, 2 * WSIZE);
    assert_eq!(MIN_BLOCK_SIZE, 4 * WSIZE);
  }
}
