//! Region provider: the external collaborator that grows and reports the
//! managed byte range.
//!
//! The allocator core never talks to the operating system directly; it
//! asks a [`RegionProvider`] to extend the managed window and trusts that
//! previously-returned bytes are preserved verbatim. [`SbrkRegion`] is the
//! production implementation, built on `libc::sbrk` the same way the
//! teacher crate's `BumpAllocator` does; [`MockRegion`] is a deterministic,
//! `Vec`-backed double used by tests so they don't fight over the real
//! process break.

use std::alloc::{self, Layout};

use libc::{c_void, intptr_t, sbrk};

/// Failure returned when a [`RegionProvider`] cannot grow the managed
/// region further.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum RegionError {
  /// The provider refused to extend the region by `requested` bytes.
  #[error("region provider refused to extend by {requested} bytes")]
  OutOfMemory { requested: usize },
}

/// The "sbrk-like" interface the allocator core depends on.
///
/// Implementors must preserve previously-returned bytes verbatim across
/// calls to `extend`, and must never return an address that aliases a
/// previously-returned range.
pub trait RegionProvider {
  /// Grows the region by `increment_bytes`, returning the address of the
  /// first newly-added byte.
  fn extend(&mut self, increment_bytes: usize) -> Result<usize, RegionError>;

  /// Address of the first byte of the managed region.
  fn low(&self) -> usize;

  /// Address one past the last byte of the managed region.
  fn high(&self) -> usize;

  /// Current size in bytes of the managed region (`high() - low()`).
  fn size(&self) -> usize {
    self.high() - self.low()
  }
}

/// Production region provider backed by the process's `sbrk` break.
///
/// Mirrors the teacher crate's `BumpAllocator::allocate`: it calls
/// `libc::sbrk`, checks for the `(void*)-1` failure sentinel, and tracks
/// the low/high watermarks it has personally requested (not the process
/// break as a whole, since something else may also be moving it).
pub struct SbrkRegion {
  low: usize,
  high: usize,
}

impl SbrkRegion {
  /// Creates a region provider with no bytes requested yet.
  ///
  /// # Safety
  /// The caller must not mix this provider's `sbrk` calls with other
  /// unrelated users of `sbrk`/`brk` in the same process.
  pub unsafe fn new() -> Self {
    let here = unsafe { sbrk(0) } as usize;
    Self { low: here, high: here }
  }
}

impl RegionProvider for SbrkRegion {
  fn extend(&mut self, increment_bytes: usize) -> Result<usize, RegionError> {
    let addr = unsafe { sbrk(increment_bytes as intptr_t) };
    if addr == usize::MAX as *mut c_void {
      tracing::warn!(requested = increment_bytes, "sbrk refused to extend region");
      return Err(RegionError::OutOfMemory { requested: increment_bytes });
    }
    let addr = addr as usize;
    if self.low == self.high {
      self.low = addr;
    }
    self.high = addr + increment_bytes;
    tracing::debug!(addr, increment_bytes, new_high = self.high, "region extended");
    Ok(addr)
  }

  fn low(&self) -> usize {
    self.low
  }

  fn high(&self) -> usize {
    self.high
  }
}

/// Deterministic, heap-allocated region provider used by tests.
///
/// Backs the managed window with a single fixed-size, leaked allocation so
/// that addresses handed to the allocator core remain stable for the
/// lifetime of the test, without touching the real process break.
pub struct MockRegion {
  base: usize,
  capacity: usize,
  used: usize,
  layout: Layout,
}

impl MockRegion {
  /// Creates a mock region with `capacity` bytes of backing storage
  /// available to be handed out via `extend`.
  pub fn with_capacity(capacity: usize) -> Self {
    let layout = Layout::from_size_align(capacity, 16).expect("valid mock region layout");
    let base = unsafe { alloc::alloc_zeroed(layout) };
    assert!(!base.is_null(), "mock region allocation failed");
    Self { base: base as usize, capacity, used: 0, layout }
  }
}

impl RegionProvider for MockRegion {
  fn extend(&mut self, increment_bytes: usize) -> Result<usize, RegionError> {
    if self.used + increment_bytes > self.capacity {
      return Err(RegionError::OutOfMemory { requested: increment_bytes });
    }
    let addr = self.base + self.used;
    self.used += increment_bytes;
    Ok(addr)
  }

  fn low(&self) -> usize {
    self.base
  }

  fn high(&self) -> usize {
    self.base + self.used
  }
}

impl Drop for MockRegion {
  fn drop(&mut self) {
    unsafe { alloc::dealloc(self.base as *mut u8, self.layout) };
  }
}
