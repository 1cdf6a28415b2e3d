/*!

# Arena Allocator

A slab allocator for one fixed object size `T`. An [`Arena<T>`] holds a
singly-linked chain of **subarenas** — each a contiguous block holding a
fixed number ([`ELEMENTS_PER_SUBARENA`], 128) of cells — plus a bump cursor
into the newest subarena and an intrusive LIFO free-list of previously
freed cells.

Each cell is a [`Descriptor`] immediately followed by `T`-sized payload
bytes; the descriptor and payload are contiguous, so `dealloc` recovers a
cell's descriptor from its payload pointer by pointer arithmetic in O(1).
While a cell is free, its descriptor's `prev_freed` field links it onto
`last_freed`; while a cell is live, that memory belongs to the caller's
`T`.

Subarenas are never amortized by doubling: each one is the same fixed
size, because churn is absorbed by the free-list and subarena memory is
only released in bulk, at [`Arena::finalize`] (or `Drop`).

*/

use std::alloc::Layout;
use std::marker::PhantomData;
use std::ptr::NonNull;

use crate::abstractions::byte_alloc::{ByteAllocator, SystemByteAllocator};
use crate::fatal;

#[cfg(test)]
mod tests;

/// Cells per subarena. A design constant trading internal fragmentation
/// for allocation speed; subarenas are never resized or amortized by
/// doubling.
pub const ELEMENTS_PER_SUBARENA: usize = 128;

/// Per-cell header. While a cell is on the free-list, `prev_freed` points
/// at the descriptor of the next-most-recently-freed cell (or is null for
/// the bottom of the stack). While a cell is live, this memory is
/// logically owned by the cell's `T` value and `prev_freed` is never read.
#[repr(C)]
struct Descriptor {
  prev_freed: *mut Descriptor,
}

/// One contiguous block of `ELEMENTS_PER_SUBARENA` cells, plus a link to
/// the previous (older) subarena. Only the newest subarena in the chain is
/// ever bump-allocated from.
struct Subarena<A: ByteAllocator> {
  block: NonNull<u8>,
  layout: Layout,
  allocator: A,
  prev: Option<Box<Subarena<A>>>,
}

impl<A: ByteAllocator> Drop for Subarena<A> {
  fn drop(&mut self) {
    unsafe {
      self.allocator.dealloc(self.block, self.layout);
    }
  }
}

/// A slab allocator specialized to objects of type `T`, served from a
/// growable chain of subarenas with free-list reuse of deallocated cells.
///
/// `Arena<T>` hands out `NonNull<T>` pointers to **uninitialized** memory:
/// it knows nothing about constructing or destroying `T` values, mirroring
/// the original's untyped `void*` slab (`alloc`/`dealloc` never call a
/// constructor or destructor). Callers write a `T` into the returned
/// pointer and are responsible for dropping it in place before calling
/// [`Arena::dealloc`], exactly as [`crate::graph::Graph`] does for `Node`
/// and `Edge`.
pub struct Arena<T, A: ByteAllocator + Copy = SystemByteAllocator> {
  name: &'static str,
  allocator: A,
  /// Size, in bytes, of one descriptor+payload cell, rounded so that both
  /// the descriptor and the payload land on a properly aligned offset.
  alloc_size: usize,
  align: usize,
  descriptor_stride: usize,

  last: Option<Box<Subarena<A>>>,
  subarena_count: u32,
  /// Bump cursor: next unused cell in the newest subarena.
  next: *mut u8,
  /// One past the last cell of the newest subarena.
  end: *mut u8,
  last_freed: *mut Descriptor,
  item_count: usize,
  finalized: bool,

  _marker: PhantomData<T>,
}

impl<T> Arena<T, SystemByteAllocator> {
  /// Prepares an empty arena for objects of type `T` backed by the system
  /// allocator. `name` is diagnostic only (surfaced through `Debug` and,
  /// with the `gc_debug` feature, through `tracing` events).
  pub fn init(name: &'static str) -> Self {
    Self::with_allocator(name, SystemByteAllocator)
  }
}

impl<T, A: ByteAllocator + Copy> Arena<T, A> {
  /// Prepares an empty arena backed by a caller-supplied [`ByteAllocator`].
  pub fn with_allocator(name: &'static str, allocator: A) -> Self {
    let descriptor_align = std::mem::align_of::<Descriptor>();
    let item_align = std::mem::align_of::<T>().max(1);
    let align = descriptor_align.max(item_align);

    let descriptor_stride = round_up(std::mem::size_of::<Descriptor>(), align);
    let alloc_size = round_up(descriptor_stride + std::mem::size_of::<T>().max(1), align);

    crate::abstractions::log::trace!(1, "Arena::init({name}): alloc_size={alloc_size} align={align}");

    Arena {
      name,
      allocator,
      alloc_size,
      align,
      descriptor_stride,
      last: None,
      subarena_count: 0,
      next: std::ptr::null_mut(),
      end: std::ptr::null_mut(),
      last_freed: std::ptr::null_mut(),
      item_count: 0,
      finalized: false,
      _marker: PhantomData,
    }
  }

  /// The caller-visible object size in bytes.
  pub fn item_size(&self) -> usize {
    std::mem::size_of::<T>()
  }

  /// Current live object count: allocations minus deallocations.
  pub fn item_count(&self) -> usize {
    self.item_count
  }

  /// Total cell capacity across all subarenas: `subarena_count * 128`.
  pub fn capacity(&self) -> usize {
    self.subarena_count as usize * ELEMENTS_PER_SUBARENA
  }

  pub fn subarena_count(&self) -> u32 {
    self.subarena_count
  }

  pub fn name(&self) -> &'static str {
    self.name
  }

  /// Returns a pointer to an uninitialized `T`-sized region. If a freed
  /// descriptor exists, its payload is reused (LIFO); otherwise bump-
  /// allocates from the current subarena, allocating a new subarena first
  /// if the cursor has reached the end of the block.
  pub fn alloc(&mut self) -> NonNull<T> {
    if self.finalized {
      fatal!("Arena({}): alloc() called after finalize()", self.name);
    }

    self.item_count += 1;

    if !self.last_freed.is_null() {
      let descriptor = self.last_freed;
      unsafe {
        self.last_freed = (*descriptor).prev_freed;
        return self.payload_from_descriptor(descriptor);
      }
    }

    if self.next == self.end {
      self.allocate_new_subarena();
    }

    let descriptor = self.next as *mut Descriptor;
    self.next = unsafe { self.next.add(self.alloc_size) };
    unsafe { self.payload_from_descriptor(descriptor) }
  }

  /// Links `ptr`'s descriptor onto the head of the free-list.
  ///
  /// # Safety / precondition
  /// `ptr` must have been returned by this arena's `alloc` and not already
  /// freed; violating this is undetected misuse (`spec.md` §7).
  pub fn dealloc(&mut self, ptr: NonNull<T>) {
    if self.finalized {
      fatal!("Arena({}): dealloc() called after finalize()", self.name);
    }

    let descriptor = self.descriptor_from_payload(ptr);
    unsafe {
      (*descriptor).prev_freed = self.last_freed;
    }
    self.last_freed = descriptor;
    self.item_count -= 1;
  }

  /// Releases every subarena's block. Does not invoke any destructor on
  /// outstanding `T` values — it is the caller's (the graph's)
  /// responsibility to have dropped/deleted them first.
  pub fn finalize(&mut self) {
    crate::abstractions::log::debug!(
      1,
      "Arena({}): finalize() subarena_count={} item_count={}",
      self.name,
      self.subarena_count,
      self.item_count
    );
    self.last = None; // recursively drops the whole subarena chain
    self.next = std::ptr::null_mut();
    self.end = std::ptr::null_mut();
    self.last_freed = std::ptr::null_mut();
    self.item_count = 0;
    self.subarena_count = 0;
    self.finalized = true;
  }

  fn allocate_new_subarena(&mut self) {
    let layout = Layout::from_size_align(self.alloc_size * ELEMENTS_PER_SUBARENA, self.align)
        .expect("subarena layout overflow");
    let block = self.allocator.alloc_uninit(layout);

    crate::abstractions::log::trace!(
      2,
      "Arena({}): allocating subarena #{} ({} bytes)",
      self.name,
      self.subarena_count + 1,
      layout.size()
    );

    let subarena = Box::new(Subarena {
      block,
      layout,
      allocator: self.allocator,
      prev: self.last.take(),
    });

    self.next = subarena.block.as_ptr();
    self.end = unsafe { subarena.block.as_ptr().add(layout.size()) };
    self.last = Some(subarena);
    self.subarena_count += 1;
  }

  #[inline(always)]
  unsafe fn payload_from_descriptor(&self, descriptor: *mut Descriptor) -> NonNull<T> {
    let payload = (descriptor as *mut u8).add(self.descriptor_stride) as *mut T;
    NonNull::new_unchecked(payload)
  }

  #[inline(always)]
  fn descriptor_from_payload(&self, ptr: NonNull<T>) -> *mut Descriptor {
    unsafe { (ptr.as_ptr() as *mut u8).sub(self.descriptor_stride) as *mut Descriptor }
  }
}

impl<T, A: ByteAllocator + Copy> Drop for Arena<T, A> {
  fn drop(&mut self) {
    if !self.finalized {
      self.finalize();
    }
  }
}

impl<T, A: ByteAllocator + Copy> std::fmt::Debug for Arena<T, A> {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("Arena")
        .field("name", &self.name)
        .field("item_size", &self.item_size())
        .field("item_count", &self.item_count)
        .field("capacity", &self.capacity())
        .field("subarena_count", &self.subarena_count)
        .finish()
  }
}

#[inline(always)]
fn round_up(value: usize, align: usize) -> usize {
  (value + align - 1) & !(align - 1)
}
