//! Boundary-tag block layout engine.
//!
//! Every byte of the managed heap window belongs to exactly one block. A
//! block at payload address `bp` is laid out as:
//!
//! ```text
//!          bp - WSIZE        bp                    bp + size - DSIZE
//!               │            │                              │
//!               ▼            ▼                              ▼
//!        ┌──────────┬────────────────────────────────┬──────────┐
//!        │  header  │            payload              │  footer │
//!        │ (1 word) │ (size - DSIZE bytes, >= 2 words) │ (1 word)│
//!        └──────────┴────────────────────────────────┴──────────┘
//! ```
//!
//! Header and footer both encode `(size | alloc_bit)` in one word. For a
//! free block the first two payload words are reused to thread the
//! explicit free list (`prev`, `next`); see [`freelist`](crate::freelist).
//!
//! This module is the only place in the crate that reads or writes raw
//! heap bytes. Everything above it (free list, policy, allocator) goes
//! through these functions instead of touching pointers directly.

use crate::align::{DSIZE, WSIZE};

/// Packs a block size and allocated bit into one boundary-tag word.
///
/// `size` must already be a multiple of `DSIZE`; `alloc` must be `0` or `1`.
pub const fn pack(size: usize, alloc: usize) -> usize {
  size | alloc
}

/// Extracts the size field from a header or footer word.
pub const fn unpack_size(tag: usize) -> usize {
  tag & !(DSIZE - 1)
}

/// Extracts the allocated bit from a header or footer word.
pub const fn unpack_alloc(tag: usize) -> usize {
  tag & 0x1
}

/// Reads the machine word at `addr`.
///
/// # Safety
/// `addr` must be a valid, properly aligned address for a `usize` read
/// within the managed heap window.
#[inline]
pub unsafe fn read_word(addr: usize) -> usize {
  unsafe { (addr as *const usize).read() }
}

/// Writes the machine word `value` at `addr`.
///
/// # Safety
/// `addr` must be a valid, properly aligned address for a `usize` write
/// within the managed heap window.
#[inline]
pub unsafe fn write_word(addr: usize, value: usize) {
  unsafe { (addr as *mut usize).write(value) }
}

/// Address of the header word for the block whose payload starts at `bp`.
#[inline]
pub const fn header_addr(bp: usize) -> usize {
  bp - WSIZE
}

/// Address of the footer word for the block whose payload starts at `bp`.
///
/// # Safety
/// The header at `bp - WSIZE` must already hold this block's current size.
#[inline]
pub unsafe fn footer_addr(bp: usize) -> usize {
  let size = unsafe { unpack_size(read_word(header_addr(bp))) };
  bp + size - DSIZE
}

/// Reads this block's size from its header.
///
/// # Safety
/// `bp` must point at a live block's payload.
#[inline]
pub unsafe fn size_of_block(bp: usize) -> usize {
  unsafe { unpack_size(read_word(header_addr(bp))) }
}

/// Reads this block's allocated bit from its header.
///
/// # Safety
/// `bp` must point at a live block's payload.
#[inline]
pub unsafe fn alloc_of_block(bp: usize) -> usize {
  unsafe { unpack_alloc(read_word(header_addr(bp))) }
}

/// Writes `(size, alloc)` into both the header and footer of the block at `bp`.
///
/// # Safety
/// `bp`/`size` must describe a block fully contained in the managed heap
/// window, with `size` a multiple of `DSIZE` and `>= MIN_BLOCK_SIZE`.
#[inline]
pub unsafe fn set_header_footer(bp: usize, size: usize, alloc: usize) {
  let tag = pack(size, alloc);
  unsafe {
    write_word(header_addr(bp), tag);
    write_word(bp + size - DSIZE, tag);
  }
}

/// Payload address of the block physically following `bp`.
///
/// # Safety
/// `bp` must point at a live block's payload; the returned address is only
/// meaningful if it is not past the epilogue.
#[inline]
pub unsafe fn next_block_addr(bp: usize) -> usize {
  unsafe { bp + size_of_block(bp) }
}

/// Payload address of the block physically preceding `bp`, found by
/// reading the backward neighbor's footer.
///
/// At the very first real block this reads the prologue's footer and
/// yields `bp` itself by construction of the prologue sentinel — callers
/// (see [`crate::policy::coalesce`]) must test for that explicitly.
///
/// # Safety
/// The word at `bp - DSIZE` must be a valid footer (i.e. `bp` must not be
/// the heap's very first word).
#[inline]
pub unsafe fn prev_block_addr(bp: usize) -> usize {
  let prev_size = unsafe { unpack_size(read_word(bp - DSIZE)) };
  bp - prev_size
}

/// Reads the free-list `prev` pointer stored in a free block's payload.
///
/// # Safety
/// `bp` must point at a free block (alloc bit clear) so the payload words
/// are free-list links rather than user data.
#[inline]
pub unsafe fn free_prev(bp: usize) -> usize {
  unsafe { read_word(bp) }
}

/// Reads the free-list `next` pointer stored in a free block's payload.
///
/// # Safety
/// `bp` must point at a free block (alloc bit clear).
#[inline]
pub unsafe fn free_next(bp: usize) -> usize {
  unsafe { read_word(bp + WSIZE) }
}

/// Writes the free-list `prev` pointer into a free block's payload.
///
/// # Safety
/// `bp` must point at a free block with room for two payload words.
#[inline]
pub unsafe fn set_free_prev(bp: usize, prev: usize) {
  unsafe { write_word(bp, prev) }
}

/// Writes the free-list `next` pointer into a free block's payload.
///
/// # Safety
/// `bp` must point at a free block with room for two payload words.
#[inline]
pub unsafe fn set_free_next(bp: usize, next: usize) {
  unsafe { write_word(bp + WSIZE, next) }
}
