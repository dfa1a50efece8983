//! Interactive walkthrough of the allocator, playing the same role as the
//! teacher crate's `examples/bump.rs`: each step prints what it did and
//! waits for ENTER so the state can be inspected with external tools
//! (`pmap`, `gdb`, ...) between steps.

use std::io::Read;

use rallocator::allocator::Heap;
use rallocator::region::SbrkRegion;

fn block_until_enter_pressed() {
  println!("\n>>> Press ENTER to continue...");
  let _ = std::io::stdin().bytes().next();
}

fn main() {
  tracing_subscriber::fmt::init();

  let mut heap = Heap::init(unsafe { SbrkRegion::new() }).expect("heap init failed");
  heap.check(false).expect("fresh heap must be consistent");

  println!("[0] Heap initialized.");
  block_until_enter_pressed();

  // 1) Allocate a small block.
  let a = unsafe { heap.allocate(24) }.expect("allocate(24) failed");
  println!("\n[1] allocate(24) -> {:?}", a);
  unsafe { a.cast::<u64>().as_ptr().write(0xDEAD_BEEF) };
  block_until_enter_pressed();

  // 2) Allocate a second block of the same size.
  let b = unsafe { heap.allocate(24) }.expect("allocate(24) failed");
  println!("\n[2] allocate(24) -> {:?}", b);
  block_until_enter_pressed();

  // 3) Free the first block, then allocate the same size again: LIFO +
  //    first-fit should hand back the same address.
  unsafe { heap.free(Some(a)) };
  let c = unsafe { heap.allocate(24) }.expect("allocate(24) failed");
  println!(
    "\n[3] free(a); allocate(24) -> {:?} (reused a? {})",
    c,
    c == a
  );
  block_until_enter_pressed();

  // 4) Free both blocks so they coalesce into one run.
  unsafe {
    heap.free(Some(b));
    heap.free(Some(c));
  }
  println!("\n[4] freed both blocks; they should have coalesced.");
  block_until_enter_pressed();

  // 5) Reallocate growth in place vs. copy.
  let d = unsafe { heap.allocate(32) }.expect("allocate(32) failed");
  unsafe {
    for i in 0..32u8 {
      d.as_ptr().add(i as usize).write(i);
    }
  }
  let e = unsafe { heap.reallocate(Some(d), 512) }.expect("reallocate failed");
  println!(
    "\n[5] reallocate(d, 512) -> {:?} (copied? {})",
    e,
    e != d
  );
  block_until_enter_pressed();

  // 6) Drive the repeat-pattern escape hatch with identical-size requests.
  for _ in 0..40 {
    let _ = unsafe { heap.allocate(128) };
  }
  println!("\n[6] issued 40 allocate(128) calls to exercise the repeat-pattern escape hatch.");

  heap.check(true).expect("heap must remain consistent after the walkthrough");
  println!("\n[7] consistency check passed. End of demo.");
}
