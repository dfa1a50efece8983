//! # rallocator - boundary-tag explicit-free-list heap allocator
//!
//! This crate implements the core of a general-purpose dynamic storage
//! allocator over a single contiguous, growable byte region supplied by a
//! lower-level region provider (an `sbrk`-like interface). It exports the
//! classical four operations of a C-style heap allocator — `init`,
//! `allocate`, `free`, `reallocate` — built on a boundary-tagged block
//! layout, an explicit doubly-linked free list threaded through free
//! blocks' own payload words, immediate coalescing on free, first-fit
//! search with a repeat-pattern escape hatch, and an in-place
//! reallocation policy that avoids copying when the forward neighbor can
//! absorb the growth.
//!
//! ## Overview
//!
//! ```text
//!   Boundary-tag block:
//!
//!   ┌──────────┬──────────────────────────────────┬──────────┐
//!   │  header  │             payload               │  footer │
//!   │ size|a   │ (free blocks: prev, next here)     │ size|a  │
//!   └──────────┴──────────────────────────────────┴──────────┘
//!              ▲
//!              └── address returned to the caller
//!
//!   Heap window:
//!
//!   [pad][prologue hdr][prologue sentinel] [block] [block] ... [epilogue]
//!        └──────────── allocated, never freed ─────────────┘
//! ```
//!
//! ## Crate Structure
//!
//! ```text
//!   rallocator
//!   ├── align      - word/double-word constants and alignment helpers
//!   ├── block      - boundary-tag primitives (the only raw-pointer layer)
//!   ├── freelist   - explicit doubly-linked free list
//!   ├── region     - the region-provider trait, sbrk and mock impls
//!   ├── policy     - coalesce, heap extension, find-fit, place
//!   ├── allocator  - Heap<R>: process-wide state and the public operations
//!   └── check      - offline consistency checker (test-only hot path)
//! ```
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use rallocator::region::SbrkRegion;
//! use rallocator::allocator::Heap;
//!
//! fn main() {
//!     let mut heap = unsafe { Heap::init(SbrkRegion::new()) }.unwrap();
//!
//!     unsafe {
//!         let ptr = heap.allocate(64).unwrap();
//!         ptr.as_ptr().write(42);
//!         heap.free(Some(ptr));
//!     }
//! }
//! ```
//!
//! A thin global-allocator-style adapter is also available for callers
//! that prefer the traditional C free-function surface; see
//! [`init`], [`allocate`], [`free`], [`reallocate`] at the crate root.
//!
//! ## Safety
//!
//! This crate is inherently unsafe as it deals with raw memory management.
//! All allocation and deallocation operations require `unsafe` blocks, and
//! the crate is single-threaded and non-reentrant: callers must
//! externally serialize access to a shared [`allocator::Heap`].

pub mod align;
pub mod allocator;
pub mod block;
pub mod check;
pub mod freelist;
pub mod policy;
pub mod region;

use std::cell::RefCell;
use std::ptr::NonNull;

use allocator::{AllocError, Heap};
use region::SbrkRegion;

thread_local! {
  static GLOBAL: RefCell<Option<Heap<SbrkRegion>>> = const { RefCell::new(None) };
}

/// Initializes the thread-local global heap over `sbrk`. Must be called
/// exactly once per thread before any other free function in this module.
///
/// This is a thin adapter over [`Heap::init`], provided because a
/// traditional C-style global allocator API is, per design, "a thin
/// adapter bound to one instance" — callers who want an explicit,
/// instantiable allocator should use [`allocator::Heap`] directly instead.
pub fn init() -> Result<(), AllocError> {
  let heap = Heap::init(unsafe { SbrkRegion::new() })?;
  GLOBAL.with(|cell| *cell.borrow_mut() = Some(heap));
  Ok(())
}

/// Allocates `size` bytes from the global heap. See [`Heap::allocate`].
///
/// # Panics
/// Panics if [`init`] has not been called on this thread.
pub fn allocate(size: usize) -> Option<NonNull<u8>> {
  GLOBAL.with(|cell| {
    let mut heap = cell.borrow_mut();
    let heap = heap.as_mut().expect("rallocator::init must be called before allocate");
    unsafe { heap.allocate(size) }
  })
}

/// Frees `ptr` on the global heap. See [`Heap::free`].
///
/// # Panics
/// Panics if [`init`] has not been called on this thread.
pub fn free(ptr: Option<NonNull<u8>>) {
  GLOBAL.with(|cell| {
    let mut heap = cell.borrow_mut();
    let heap = heap.as_mut().expect("rallocator::init must be called before free");
    unsafe { heap.free(ptr) }
  })
}

/// Reallocates `ptr` to `size` bytes on the global heap. See
/// [`Heap::reallocate`].
///
/// # Panics
/// Panics if [`init`] has not been called on this thread.
pub fn reallocate(ptr: Option<NonNull<u8>>, size: usize) -> Option<NonNull<u8>> {
  GLOBAL.with(|cell| {
    let mut heap = cell.borrow_mut();
    let heap = heap.as_mut().expect("rallocator::init must be called before reallocate");
    unsafe { heap.reallocate(ptr, size) }
  })
}
