//! Public allocator state and operations.
//!
//! [`Heap<R>`] bundles everything spec.md calls "process-wide state" —
//! the managed region, the free list head, and the repeat-pattern
//! heuristic — into one explicit value, per the design note that "a
//! clean design factors the state into an explicit allocator value and
//! threads it through all operations." [`crate::lib`] layers a thin
//! global adapter on top for callers that want the traditional C-style
//! free-function API.

use std::ptr::{self, NonNull};

use crate::align::{DSIZE, MIN_BLOCK_SIZE, WSIZE};
use crate::block::{alloc_of_block, next_block_addr, set_header_footer, size_of_block};
use crate::policy::{self, FitHeuristic, Fit};
use crate::region::{RegionError, RegionProvider};

/// Failure establishing a [`Heap`].
#[derive(Debug, thiserror::Error)]
pub enum AllocError {
  /// The region provider could not supply the bytes needed to write the
  /// heap's sentinels and initial free block.
  #[error("heap initialization failed: {0}")]
  Init(#[from] RegionError),
}

/// A single-threaded, boundary-tagged explicit-free-list heap over a
/// region supplied by `R`.
///
/// `Heap` is intentionally not `Send`/`Sync` (callers must externally
/// serialize, per spec.md's concurrency model); every operation takes
/// `&mut self`.
pub struct Heap<R: RegionProvider> {
  region: R,
  free_list: crate::freelist::FreeList,
  epilogue: usize,
  heuristic: FitHeuristic,
}

impl<R: RegionProvider> Heap<R> {
  /// Initializes a heap over `region`: writes the alignment pad,
  /// prologue, and epilogue sentinels, then extends once more to create
  /// the initial free block of minimum size.
  ///
  /// Must be called exactly once before any other operation.
  pub fn init(mut region: R) -> Result<Self, AllocError> {
    let base = region.extend(4 * WSIZE)?;
    let epilogue = unsafe { policy::write_sentinels(base) };

    let mut free_list = crate::freelist::FreeList::new();
    let mut epilogue = epilogue;
    policy::extend_heap(&mut region, &mut free_list, &mut epilogue, MIN_BLOCK_SIZE / WSIZE)
      .ok_or(RegionError::OutOfMemory { requested: MIN_BLOCK_SIZE })?;

    Ok(Self { region, free_list, epilogue, heuristic: FitHeuristic::new() })
  }

  /// Allocates `size` bytes, per spec §4.7.
  ///
  /// Returns `None` for `size == 0` or if the region provider refuses to
  /// grow the heap. The returned pointer is `DSIZE`-aligned and its
  /// contents are uninitialized.
  ///
  /// # Safety
  /// The caller must not read or write the returned payload outside the
  /// bounds implied by `size`, and must eventually pass it to `free` or
  /// `reallocate` at most once.
  pub unsafe fn allocate(&mut self, size: usize) -> Option<NonNull<u8>> {
    if size == 0 {
      return None;
    }

    let asize = policy::adjusted_size(size);

    let bp = match policy::find_fit(&self.free_list, asize, &mut self.heuristic) {
      Fit::Found(bp) => bp,
      Fit::NeedsExtension(bytes) => {
        let words = bytes / WSIZE;
        policy::extend_heap(&mut self.region, &mut self.free_list, &mut self.epilogue, words)?
      }
    };

    policy::place(&mut self.free_list, bp, asize);
    NonNull::new(bp as *mut u8)
  }

  /// Frees a previously allocated block, per spec §4.8. A `None` pointer
  /// is a no-op.
  ///
  /// # Safety
  /// `ptr`, if present, must have been returned by `allocate`/`reallocate`
  /// on this heap and not already freed. Double-free and invalid pointers
  /// are undefined behavior, not detected here.
  pub unsafe fn free(&mut self, ptr: Option<NonNull<u8>>) {
    let Some(ptr) = ptr else {
      return;
    };
    let bp = ptr.as_ptr() as usize;
    unsafe {
      let size = size_of_block(bp);
      set_header_footer(bp, size, 0);
      policy::coalesce(&mut self.free_list, bp);
    }
  }

  /// Reallocates `ptr` to hold at least `size` bytes, per spec §4.9.
  ///
  /// `ptr == None` delegates to `allocate`. `size == 0` frees `ptr` and
  /// returns `None`. Otherwise, growth in place via forward-neighbor
  /// absorption is attempted before falling back to allocate-copy-free.
  ///
  /// # Safety
  /// Same preconditions as `allocate`/`free`.
  pub unsafe fn reallocate(&mut self, ptr: Option<NonNull<u8>>, size: usize) -> Option<NonNull<u8>> {
    if size == 0 {
      unsafe { self.free(ptr) };
      return None;
    }

    let Some(ptr) = ptr else {
      return unsafe { self.allocate(size) };
    };

    let bp = ptr.as_ptr() as usize;
    let oldsize = unsafe { size_of_block(bp) };
    // Spec-preserved overhead accounting: payload + header + footer,
    // counted separately from `oldsize`'s own header+footer inclusion.
    // See DESIGN.md Open Question 1.
    let newsize = size + 2 * WSIZE;

    if newsize <= oldsize {
      return Some(ptr);
    }

    let next = unsafe { next_block_addr(bp) };
    if unsafe { alloc_of_block(next) } == 0 {
      let next_size = unsafe { size_of_block(next) };
      if oldsize + next_size >= newsize {
        unsafe { self.free_list.remove(next) };
        unsafe { set_header_footer(bp, oldsize + next_size, 1) };
        return Some(ptr);
      }
    }

    let new_ptr = unsafe { self.allocate(newsize) }?;
    // Copy at most the old block's actual payload capacity, not `newsize`
    // bytes (DESIGN.md Open Question 2: the spec's source over-reads here;
    // this implementation corrects it).
    let copy_len = (oldsize.saturating_sub(2 * WSIZE)).min(size);
    unsafe {
      ptr::copy_nonoverlapping(bp as *const u8, new_ptr.as_ptr(), copy_len);
      self.free(Some(ptr));
    }
    Some(new_ptr)
  }

  /// Runs the offline consistency checker (see [`crate::check`]) over the
  /// whole heap and free list.
  pub fn check(&self, verbose: bool) -> Result<(), crate::check::CheckError> {
    crate::check::check(self.region.low(), self.epilogue, &self.free_list, verbose)
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::region::MockRegion;

  fn heap() -> Heap<MockRegion> {
    Heap::init(MockRegion::with_capacity(1 << 20)).unwrap()
  }

  #[test]
  fn scenario_1_single_small_allocation_is_aligned_and_minimum_sized() {
    let mut h = heap();
    let a = unsafe { h.allocate(1) }.unwrap();
    assert_eq!(a.as_ptr() as usize % DSIZE, 0);
    assert_eq!(unsafe { size_of_block(a.as_ptr() as usize) }, MIN_BLOCK_SIZE);
    assert_eq!(unsafe { alloc_of_block(a.as_ptr() as usize) }, 1);
  }

  #[test]
  fn scenario_2_freed_block_is_reused_by_next_same_size_allocation() {
    let mut h = heap();
    let a = unsafe { h.allocate(64) }.unwrap();
    let _b = unsafe { h.allocate(64) }.unwrap();
    unsafe { h.free(Some(a)) };
    let c = unsafe { h.allocate(64) }.unwrap();
    assert_eq!(a, c);
  }

  #[test]
  fn scenario_3_freeing_two_adjacent_blocks_coalesces() {
    let mut h = heap();
    let a = unsafe { h.allocate(64) }.unwrap();
    let b = unsafe { h.allocate(64) }.unwrap();
    let asize = policy::adjusted_size(64);
    unsafe {
      h.free(Some(a));
      h.free(Some(b));
    }
    assert_eq!(unsafe { size_of_block(a.as_ptr() as usize) }, 2 * asize);
  }

  #[test]
  fn scenario_4_realloc_grows_in_place_via_forward_neighbor() {
    let mut h = heap();
    let a = unsafe { h.allocate(32) }.unwrap();
    let b = unsafe { h.allocate(32) }.unwrap();
    unsafe { h.free(Some(b)) };
    let c = unsafe { h.reallocate(Some(a), 48) }.unwrap();
    assert_eq!(a, c);
  }

  #[test]
  fn scenario_5_realloc_to_much_larger_size_copies_and_preserves_bytes() {
    let mut h = heap();
    let a = unsafe { h.allocate(32) }.unwrap();
    let _b = unsafe { h.allocate(32) }.unwrap();
    unsafe {
      for i in 0..32u8 {
        a.as_ptr().add(i as usize).write(i);
      }
    }
    let c = unsafe { h.reallocate(Some(a), 256) }.unwrap();
    assert_ne!(a, c);
    for i in 0..32u8 {
      assert_eq!(unsafe { c.as_ptr().add(i as usize).read() }, i);
    }
  }

  #[test]
  fn scenario_6_repeat_pattern_escape_fires_after_enough_identical_requests() {
    let mut h = heap();
    for _ in 0..40 {
      unsafe { h.allocate(128) }.unwrap();
    }
    assert!(h.heuristic.repeat_count() > policy::REPEAT_THRESHOLD);
  }

  #[test]
  fn allocate_zero_returns_none() {
    let mut h = heap();
    assert!(unsafe { h.allocate(0) }.is_none());
  }

  #[test]
  fn free_of_none_is_noop() {
    let mut h = heap();
    unsafe { h.free(None) };
  }

  #[test]
  fn reallocate_none_delegates_to_allocate() {
    let mut h = heap();
    let p = unsafe { h.reallocate(None, 16) };
    assert!(p.is_some());
  }

  #[test]
  fn reallocate_to_zero_frees_and_returns_none() {
    let mut h = heap();
    let a = unsafe { h.allocate(16) }.unwrap();
    let p = unsafe { h.reallocate(Some(a), 0) };
    assert!(p.is_none());
  }

  #[test]
  fn reallocate_shrink_returns_same_pointer() {
    let mut h = heap();
    let a = unsafe { h.allocate(64) }.unwrap();
    let b = unsafe { h.reallocate(Some(a), 8) }.unwrap();
    assert_eq!(a, b);
  }

  #[test]
  fn heap_passes_consistency_check_after_mixed_operations() {
    let mut h = heap();
    let mut ptrs = Vec::new();
    for size in [16usize, 200, 32, 4000, 64] {
      ptrs.push(unsafe { h.allocate(size) }.unwrap());
    }
    unsafe {
      h.free(Some(ptrs[1]));
      h.free(Some(ptrs[3]));
    }
    let _ = unsafe { h.reallocate(Some(ptrs[0]), 512) };
    h.check(false).expect("heap must remain consistent");
  }
}
