/*!

Node storage. A [`Node`] pairs a caller-owned payload pointer with the
function that knows how to destroy it, plus the adjacency maps that make
up the reachability graph's edges. Nodes live in [`crate::arena::Arena`]
cells; [`Graph`](super::Graph) is the only thing that ever dereferences
the raw [`NodeRef`] handles it hands back to callers.

*/

use std::ffi::c_void;
use std::hash::{Hash, Hasher};
use std::ptr::NonNull;

use crate::abstractions::ptr_collections::PtrMap;

use super::edge::EdgeRef;

/// Initial bucket-count hint for a node's `children`/`parents` maps: most
/// nodes have few edges, so a small fixed table bounds per-node overhead.
pub(super) const CHILDREN_TABLE_CAPACITY: usize = 17;

/// A function that destroys the entity at `ptr`, given the graph's
/// configured `ctx`. Called at most once per node, during [`super::Graph::collect`]
/// or when the owning graph itself is dropped.
pub type Deleter = unsafe fn(ptr: *mut c_void, ctx: *mut c_void);

pub(super) struct Node {
  pub(super) id: u64,
  pub(super) ptr: *mut c_void,
  pub(super) deleter: Option<Deleter>,
  pub(super) children: PtrMap<NodeRef, EdgeRef>,
  pub(super) parents: PtrMap<NodeRef, EdgeRef>,
}

impl Node {
  pub(super) fn new(id: u64, ptr: *mut c_void, deleter: Deleter) -> Self {
    Node {
      id,
      ptr,
      deleter: Some(deleter),
      children: crate::abstractions::ptr_collections::ptr_map_with_capacity(CHILDREN_TABLE_CAPACITY),
      parents: crate::abstractions::ptr_collections::ptr_map_with_capacity(CHILDREN_TABLE_CAPACITY),
    }
  }
}

/// An opaque handle to a node, returned by [`super::Graph::insert`] and
/// accepted back by every other `Graph` operation. Equality and hashing are
/// by pointer identity, never by the wrapped node's contents.
#[derive(Copy, Clone)]
pub struct NodeRef(pub(super) NonNull<Node>);

impl NodeRef {
  pub(super) fn as_ptr(self) -> *mut Node {
    self.0.as_ptr()
  }
}

impl PartialEq for NodeRef {
  fn eq(&self, other: &Self) -> bool {
    self.0 == other.0
  }
}

impl Eq for NodeRef {}

impl Hash for NodeRef {
  fn hash<H: Hasher>(&self, state: &mut H) {
    state.write_usize(self.0.as_ptr() as usize);
  }
}

impl std::fmt::Debug for NodeRef {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    write!(f, "NodeRef({:p})", self.0.as_ptr())
  }
}
