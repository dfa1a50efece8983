//! Offline consistency checker.
//!
//! Not on the allocation hot path — used by tests (and, via
//! [`Heap::check`](crate::allocator::Heap::check), by the demo binary) to
//! verify spec.md §3's invariants after a sequence of operations. Walks
//! forward through every block from the first real block to the
//! epilogue, then separately walks the free list to check link and
//! membership integrity.

use std::collections::HashSet;

use crate::align::{DSIZE, MIN_BLOCK_SIZE, WSIZE};
use crate::block::{alloc_of_block, footer_addr, header_addr, next_block_addr, read_word, size_of_block};
use crate::freelist::FreeList;

/// A violated invariant, as found by [`check`].
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum CheckError {
  #[error("block at {bp:#x} is not double-word aligned")]
  Misaligned { bp: usize },
  #[error("block at {bp:#x} has size {size}, which is not a valid double-word multiple at or above the minimum block size")]
  BadSize { bp: usize, size: usize },
  #[error("block at {bp:#x} has mismatched header/footer ({hdr:#x} vs {ftr:#x})")]
  HeaderFooterMismatch { bp: usize, hdr: usize, ftr: usize },
  #[error("adjacent free blocks at {first:#x} and {second:#x} were not coalesced")]
  AdjacentFreeBlocks { first: usize, second: usize },
  #[error("epilogue header at {addr:#x} does not encode (0, allocated)")]
  BadEpilogue { addr: usize },
  #[error("free list contains {listed} blocks but the heap scan found {scanned} free blocks")]
  FreeListCountMismatch { listed: usize, scanned: usize },
  #[error("free list contains address {bp:#x}, which the heap scan does not consider free")]
  FreeListMemberNotFree { bp: usize },
}

/// Walks the heap from `heap_low` to the epilogue at `epilogue_addr`,
/// checking every per-block invariant from spec.md §3, then walks
/// `free_list` and checks it contains exactly the set of free blocks
/// found during the scan.
///
/// When `verbose` is set, each block's state is emitted as a `trace!`
/// event (mirroring the teacher crate's `print_alloc` debug helper).
pub fn check(
  heap_low: usize,
  epilogue_addr: usize,
  free_list: &FreeList,
  verbose: bool,
) -> Result<(), CheckError> {
  // First real block's payload starts after the pad, the prologue header,
  // the prologue's zero-size sentinel footer, and the (now-overwritten)
  // first block's own header word: 4 words in from `heap_low`.
  let mut bp = heap_low + 4 * WSIZE;
  let mut scanned_free = HashSet::new();

  while bp < epilogue_addr {
    if bp % DSIZE != 0 {
      return Err(CheckError::Misaligned { bp });
    }

    let size = unsafe { size_of_block(bp) };
    let alloc = unsafe { alloc_of_block(bp) };

    if size < MIN_BLOCK_SIZE || size % DSIZE != 0 {
      return Err(CheckError::BadSize { bp, size });
    }

    let hdr = unsafe { read_word(header_addr(bp)) };
    let ftr = unsafe { read_word(footer_addr(bp)) };
    if hdr != ftr {
      return Err(CheckError::HeaderFooterMismatch { bp, hdr, ftr });
    }

    if verbose {
      tracing::trace!(bp = format_args!("{bp:#x}"), size, alloc, "block");
    }

    if alloc == 0 {
      scanned_free.insert(bp);
    }

    let next = unsafe { next_block_addr(bp) };
    if alloc == 0 && next < epilogue_addr && unsafe { alloc_of_block(next) } == 0 {
      return Err(CheckError::AdjacentFreeBlocks { first: bp, second: next });
    }

    bp = next;
  }

  let epilogue = unsafe { read_word(epilogue_addr) };
  if crate::block::unpack_size(epilogue) != 0 || crate::block::unpack_alloc(epilogue) != 1 {
    return Err(CheckError::BadEpilogue { addr: epilogue_addr });
  }

  let mut listed = HashSet::new();
  for bp in unsafe { free_list.iter() } {
    if !scanned_free.contains(&bp) {
      return Err(CheckError::FreeListMemberNotFree { bp });
    }
    listed.insert(bp);
  }

  if listed.len() != scanned_free.len() {
    return Err(CheckError::FreeListCountMismatch { listed: listed.len(), scanned: scanned_free.len() });
  }

  Ok(())
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::allocator::Heap;
  use crate::region::MockRegion;

  #[test]
  fn fresh_heap_passes_check() {
    let h = Heap::init(MockRegion::with_capacity(1 << 16)).unwrap();
    h.check(false).unwrap();
  }

  #[test]
  fn heap_passes_after_alloc_free_cycles() {
    let mut h = Heap::init(MockRegion::with_capacity(1 << 16)).unwrap();
    let mut ptrs = Vec::new();
    for size in [16usize, 32, 48, 4096, 8] {
      ptrs.push(unsafe { h.allocate(size) }.unwrap());
    }
    for p in ptrs.iter().step_by(2) {
      unsafe { h.free(Some(*p)) };
    }
    h.check(true).unwrap();
  }
}
