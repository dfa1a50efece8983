//! End-to-end scenarios from spec.md §8, run against the in-memory
//! `MockRegion` so they don't touch the real process break.

use rallocator::allocator::Heap;
use rallocator::policy;
use rallocator::region::MockRegion;

fn heap() -> Heap<MockRegion> {
  Heap::init(MockRegion::with_capacity(1 << 20)).unwrap()
}

#[test]
fn scenario_1_allocate_one_byte() {
  let mut h = heap();
  let a = unsafe { h.allocate(1) }.unwrap();
  assert_eq!(a.as_ptr() as usize % 16, 0, "payload must be double-word aligned");
  h.check(false).unwrap();
}

#[test]
fn scenario_2_free_then_realloc_same_size_reuses_address() {
  let mut h = heap();
  let a = unsafe { h.allocate(64) }.unwrap();
  let _b = unsafe { h.allocate(64) }.unwrap();
  unsafe { h.free(Some(a)) };
  let c = unsafe { h.allocate(64) }.unwrap();
  assert_eq!(a, c);
  h.check(false).unwrap();
}

#[test]
fn scenario_3_freeing_two_blocks_coalesces_into_one() {
  let mut h = heap();
  let a = unsafe { h.allocate(64) }.unwrap();
  let b = unsafe { h.allocate(64) }.unwrap();
  unsafe {
    h.free(Some(a));
    h.free(Some(b));
  }
  h.check(false).unwrap();
}

#[test]
fn scenario_4_realloc_absorbs_free_forward_neighbor_without_copy() {
  let mut h = heap();
  let a = unsafe { h.allocate(32) }.unwrap();
  let b = unsafe { h.allocate(32) }.unwrap();
  unsafe { h.free(Some(b)) };
  let c = unsafe { h.reallocate(Some(a), 48) }.unwrap();
  assert_eq!(a, c, "in-place growth must return the same address");
  h.check(false).unwrap();
}

#[test]
fn scenario_5_realloc_to_much_larger_size_copies_old_bytes() {
  let mut h = heap();
  let a = unsafe { h.allocate(32) }.unwrap();
  let _b = unsafe { h.allocate(32) }.unwrap();
  let pattern: Vec<u8> = (0u8..32).collect();
  unsafe { std::ptr::copy_nonoverlapping(pattern.as_ptr(), a.as_ptr(), 32) };

  let c = unsafe { h.reallocate(Some(a), 256) }.unwrap();
  assert_ne!(a, c);
  let copied = unsafe { std::slice::from_raw_parts(c.as_ptr(), 32) };
  assert_eq!(copied, pattern.as_slice());
  h.check(false).unwrap();
}

#[test]
fn scenario_6_repeat_pattern_escape_avoids_quadratic_walk() {
  let mut h = heap();
  // Fragment the free list with many small blocks of a distinct size so
  // the walk would otherwise have to skip over them every time.
  for _ in 0..50 {
    let p = unsafe { h.allocate(16) }.unwrap();
    unsafe { h.free(Some(p)) };
  }

  for _ in 0..40 {
    unsafe { h.allocate(128) }.unwrap();
  }

  h.check(false).unwrap();
}

#[test]
fn law_allocate_zero_is_null() {
  let mut h = heap();
  assert!(unsafe { h.allocate(0) }.is_none());
}

#[test]
fn law_free_null_is_noop() {
  let mut h = heap();
  unsafe { h.free(None) };
  h.check(false).unwrap();
}

#[test]
fn law_realloc_shrink_returns_same_pointer_when_capacity_suffices() {
  let mut h = heap();
  let a = unsafe { h.allocate(64) }.unwrap();
  let oldsize = unsafe { rallocator::block::size_of_block(a.as_ptr() as usize) };
  let k = oldsize - 2 * rallocator::align::WSIZE;
  let b = unsafe { h.reallocate(Some(a), k) }.unwrap();
  assert_eq!(a, b);
}

#[test]
fn invariant_adjusted_size_always_meets_minimum_block_size() {
  for size in [0usize, 1, 8, 16, 17, 100, 4096] {
    assert!(policy::adjusted_size(size) >= rallocator::align::MIN_BLOCK_SIZE);
    assert_eq!(policy::adjusted_size(size) % rallocator::align::DSIZE, 0);
  }
}

#[test]
fn writes_to_one_allocation_do_not_perturb_another() {
  let mut h = heap();
  let a = unsafe { h.allocate(64) }.unwrap();
  let b = unsafe { h.allocate(64) }.unwrap();
  unsafe {
    std::ptr::write_bytes(a.as_ptr(), 0xAA, 64);
    std::ptr::write_bytes(b.as_ptr(), 0xBB, 64);
  }
  let a_bytes = unsafe { std::slice::from_raw_parts(a.as_ptr(), 64) };
  let b_bytes = unsafe { std::slice::from_raw_parts(b.as_ptr(), 64) };
  assert!(a_bytes.iter().all(|&byte| byte == 0xAA));
  assert!(b_bytes.iter().all(|&byte| byte == 0xBB));
}
