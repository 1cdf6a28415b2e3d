#![allow(unused_imports)]
/*!

Types that abstract over the implementing backing type for the external
collaborators this crate consumes rather than owns: a raw byte allocator,
a pointer-identity-keyed hash map/set, and a fatal-assert channel.

Nothing in [`crate::arena`] or [`crate::graph`] reaches for
`std::collections::HashMap` or `std::alloc` directly; they go through the
seams defined here, so a future caller can swap in a different backing
hash table or allocator without touching the graph or arena logic. This
mirrors the way the logging backend (`tracing`) is kept behind the `log`
module's own small macro surface.

*/

pub mod byte_alloc;
pub mod fatal;
pub mod ptr_collections;

// Logging
pub mod log;

pub use byte_alloc::{ByteAllocator, SystemByteAllocator};
pub use ptr_collections::{IdentityHasher, PtrMap, PtrSet};
