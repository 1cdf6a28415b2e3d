use super::*;

#[test]
fn fresh_arena_has_no_capacity() {
  let arena = Arena::<u64>::init("u64");
  assert_eq!(arena.item_count(), 0);
  assert_eq!(arena.capacity(), 0);
  assert_eq!(arena.subarena_count(), 0);
}

#[test]
fn alloc_increments_item_count_and_stays_in_one_subarena() {
  let mut arena = Arena::<u64>::init("u64");
  for _ in 0..ELEMENTS_PER_SUBARENA {
    arena.alloc();
  }
  assert_eq!(arena.item_count(), ELEMENTS_PER_SUBARENA);
  assert_eq!(arena.subarena_count(), 1);
  assert_eq!(arena.capacity(), ELEMENTS_PER_SUBARENA);
}

#[test]
fn the_129th_alloc_crosses_into_a_second_subarena() {
  let mut arena = Arena::<u64>::init("u64");
  for _ in 0..ELEMENTS_PER_SUBARENA {
    arena.alloc();
  }
  assert_eq!(arena.subarena_count(), 1);
  arena.alloc();
  assert_eq!(arena.subarena_count(), 2);
  assert_eq!(arena.item_count(), ELEMENTS_PER_SUBARENA + 1);
}

#[test]
fn two_full_subarenas_hold_256_items() {
  let mut arena = Arena::<u64>::init("u64");
  for _ in 0..(2 * ELEMENTS_PER_SUBARENA) {
    arena.alloc();
  }
  assert_eq!(arena.subarena_count(), 2);
  assert_eq!(arena.item_count(), 2 * ELEMENTS_PER_SUBARENA);
  assert_eq!(arena.capacity(), 2 * ELEMENTS_PER_SUBARENA);
}

#[test]
fn pointers_remain_stable_across_further_allocation() {
  let mut arena = Arena::<[u64; 3]>::init("triple");
  let first = arena.alloc();
  unsafe {
    first.as_ptr().write([1, 2, 3]);
  }
  for _ in 0..(ELEMENTS_PER_SUBARENA * 2) {
    arena.alloc();
  }
  unsafe {
    assert_eq!(*first.as_ptr(), [1, 2, 3]);
  }
}

#[test]
fn dealloc_then_alloc_reuses_the_cell_without_growing_capacity() {
  let mut arena = Arena::<u64>::init("u64");
  let ptrs: Vec<_> = (0..ELEMENTS_PER_SUBARENA).map(|_| arena.alloc()).collect();
  assert_eq!(arena.subarena_count(), 1);

  for &ptr in &ptrs {
    arena.dealloc(ptr);
  }
  assert_eq!(arena.item_count(), 0);

  let reused: Vec<_> = (0..ELEMENTS_PER_SUBARENA).map(|_| arena.alloc()).collect();
  assert_eq!(arena.subarena_count(), 1, "reuse must not allocate a new subarena");
  assert_eq!(arena.item_count(), ELEMENTS_PER_SUBARENA);

  // The free-list is LIFO, so cells come back in reverse order of freeing.
  let mut expected: Vec<_> = ptrs.iter().map(|p| p.as_ptr()).collect();
  expected.reverse();
  let actual: Vec<_> = reused.iter().map(|p| p.as_ptr()).collect();
  assert_eq!(actual, expected);
}

#[test]
fn free_list_entries_are_disjoint_from_live_cells() {
  let mut arena = Arena::<u32>::init("u32");
  let a = arena.alloc();
  let b = arena.alloc();
  let c = arena.alloc();
  arena.dealloc(b);

  let recycled = arena.alloc();
  assert_eq!(recycled.as_ptr(), b.as_ptr());
  assert_ne!(recycled.as_ptr(), a.as_ptr());
  assert_ne!(recycled.as_ptr(), c.as_ptr());
}

#[test]
fn finalize_resets_accounting() {
  let mut arena = Arena::<u64>::init("u64");
  for _ in 0..10 {
    arena.alloc();
  }
  arena.finalize();
  assert_eq!(arena.item_count(), 0);
  assert_eq!(arena.capacity(), 0);
  assert_eq!(arena.subarena_count(), 0);
}

#[test]
#[should_panic(expected = "alloc() called after finalize()")]
fn alloc_after_finalize_is_fatal() {
  let mut arena = Arena::<u64>::init("u64");
  arena.finalize();
  arena.alloc();
}

#[test]
fn item_size_reflects_the_instantiated_type() {
  let arena = Arena::<[u8; 40]>::init("forty_bytes");
  assert_eq!(arena.item_size(), 40);
}

#[test]
fn zero_sized_descriptor_rounding_is_well_aligned() {
  // A type whose alignment exceeds the descriptor's forces the payload
  // offset, not just the cell stride, to be rounded up.
  #[repr(align(32))]
  struct OverAligned(u8);

  let mut arena = Arena::<OverAligned>::init("over_aligned");
  let ptr = arena.alloc();
  assert_eq!(ptr.as_ptr() as usize % 32, 0);
}
