/*!

The hashed associative container and hashed set collaborators
(`spec.md` §1/§6): insert, lookup, remove, size, iterate, keyed by pointer
identity with a pointer-identity hash. `Graph`'s `children`/`parents` maps
and node/root sets are built on these aliases rather than on
`std::collections::HashMap`/`HashSet` directly, so the backing hash table
is a swappable dependency of the graph, not baked into it.

*/

use std::collections::{HashMap, HashSet};
use std::hash::{BuildHasherDefault, Hasher};

/// A `Hasher` that trusts its input to already look like a good hash: it is
/// used only with keys that are themselves pointer-derived (`NonNull<_>`
/// wrapped in a `Hash` impl that forwards the pointer's bit pattern), so the
/// bit pattern of the pointer address *is* the hash. This is the Rust
/// equivalent of the original's `default_hasher`, which hashes a `void*` by
/// its address.
#[derive(Default)]
pub struct IdentityHasher(u64);

impl Hasher for IdentityHasher {
  fn finish(&self) -> u64 {
    self.0
  }

  fn write(&mut self, bytes: &[u8]) {
    // Keys are always written as a single native-width integer (the
    // pointer's address via `write_usize`); this path only exists to
    // satisfy the `Hasher` trait and should not be exercised in practice.
    for &byte in bytes {
      self.0 = self.0.rotate_left(8) ^ (byte as u64);
    }
  }

  fn write_usize(&mut self, i: usize) {
    self.0 = i as u64;
  }

  fn write_u64(&mut self, i: u64) {
    self.0 = i;
  }
}

/// `BuildHasher` for [`IdentityHasher`].
pub type IdentityBuildHasher = BuildHasherDefault<IdentityHasher>;

/// A hashed associative container keyed by pointer identity, the only kind
/// of key `memgraph` ever uses (node and edge handles).
pub type PtrMap<K, V> = HashMap<K, V, IdentityBuildHasher>;

/// A hashed set keyed by pointer identity.
pub type PtrSet<K> = HashSet<K, IdentityBuildHasher>;

/// Constructs a [`PtrMap`] with the given initial bucket-count hint. Mirrors
/// the original's per-node children/parents maps, which are created with a
/// small fixed initial table size (design constant: 17) to bound per-node
/// overhead for the common case of few edges.
pub fn ptr_map_with_capacity<K, V>(capacity: usize) -> PtrMap<K, V> {
  HashMap::with_capacity_and_hasher(capacity, IdentityBuildHasher::default())
}

/// Constructs a [`PtrSet`] with the given initial bucket-count hint.
pub fn ptr_set_with_capacity<K>(capacity: usize) -> PtrSet<K> {
  HashSet::with_capacity_and_hasher(capacity, IdentityBuildHasher::default())
}
