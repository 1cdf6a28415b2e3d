/*!

# Reachability Graph

A [`Graph`] tracks reference relationships between externally owned
entities and reclaims them with mark-and-sweep [`Graph::collect`]: every
node reachable from a [root](Graph::root) by following edges with a
positive reference count survives; everything else is deleted, its
deleter invoked exactly once.

Nodes and edges are served from two [`crate::arena::Arena`]s owned by the
graph, so the graph — not the global allocator — controls their layout
and reuse. A `Graph` is not `Sync`: it is meant to be owned and driven by
a single thread, exactly like [`crate::arena::Arena`].

*/

mod edge;
mod node;


use std::ffi::c_void;

use crate::abstractions::byte_alloc::{ByteAllocator, SystemByteAllocator};
use crate::abstractions::ptr_collections::{ptr_set_with_capacity, PtrSet};
use crate::fatal;

use edge::{Edge, EdgeRef};
pub use node::Deleter;
use node::Node;
pub use node::NodeRef;

use crate::arena::Arena;

/// Tells a [`Graph`] how eagerly to release memory when a node is deleted,
/// and what context pointer to hand every [`Deleter`] call.
///
/// `eager_delete_edges`/`eager_delete_nodes` only control whether the
/// corresponding arena cells are put back on their free-list for reuse;
/// either way, the deleted node's `children`/`parents` maps are always
/// torn down immediately, since those are ordinary heap allocations the
/// arena knows nothing about.
#[derive(Copy, Clone, Debug)]
pub struct GraphConfig {
  /// Return a deleted node's edge cells to the edge arena's free-list.
  pub eager_delete_edges: bool,
  /// Return a deleted node's cell to the node arena's free-list.
  pub eager_delete_nodes: bool,
  /// Passed verbatim to every [`Deleter`] call.
  pub ctx: *mut c_void,
}

impl Default for GraphConfig {
  fn default() -> Self {
    GraphConfig {
      eager_delete_edges: false,
      eager_delete_nodes: false,
      ctx: std::ptr::null_mut(),
    }
  }
}

/// A considerably-large prime, used to size the `marked` set during
/// [`Graph::collect`] relative to the live node count.
const MARK_SET_CAPACITY_FACTOR: usize = 2;

pub struct Graph<A: ByteAllocator + Copy = SystemByteAllocator> {
  config: GraphConfig,
  node_arena: Arena<Node, A>,
  edge_arena: Arena<Edge, A>,
  nodes: PtrSet<NodeRef>,
  roots: PtrSet<NodeRef>,
  next_id: u64,
}

impl Graph<SystemByteAllocator> {
  /// Creates an empty graph backed by the system allocator.
  pub fn new(config: GraphConfig) -> Self {
    Self::with_allocator(config, SystemByteAllocator)
  }
}

impl<A: ByteAllocator + Copy> Graph<A> {
  /// Creates an empty graph backed by a caller-supplied [`ByteAllocator`].
  pub fn with_allocator(config: GraphConfig, allocator: A) -> Self {
    Graph {
      config,
      node_arena: Arena::with_allocator("Node", allocator),
      edge_arena: Arena::with_allocator("Edge", allocator),
      nodes: ptr_set_with_capacity(997),
      roots: ptr_set_with_capacity(997),
      next_id: 0,
    }
  }

  /// Hands the graph exclusive ownership of `ptr`'s lifecycle: `deleter`
  /// will be invoked exactly once, either during a future [`Graph::collect`]
  /// that finds this node unreachable, or when the graph itself is
  /// dropped. The caller must not delete `ptr` by any other means.
  pub fn insert(&mut self, ptr: *mut c_void, deleter: Deleter) -> NodeRef {
    if ptr.is_null() {
      fatal!("Graph::insert(): ptr must not be null");
    }
    let id = self.next_id;
    self.next_id += 1;

    let cell = self.node_arena.alloc();
    unsafe {
      cell.as_ptr().write(Node::new(id, ptr, deleter));
    }
    let node = NodeRef(cell);
    self.nodes.insert(node);
    node
  }

  /// Marks `node` as a root: reachable unconditionally, regardless of its
  /// incoming edges.
  pub fn root(&mut self, node: NodeRef) {
    self.roots.insert(node);
  }

  /// Removes `node` from the root set, if present. Returns whether it was
  /// a root. Does not touch `node`'s edges: a node that remains reachable
  /// through some other root is unaffected by the next `collect`.
  pub fn unroot(&mut self, node: NodeRef) -> bool {
    self.roots.remove(&node)
  }

  /// Records a reference from `parent` to `child`: increments the existing
  /// parent→child and child→parent edges, or creates them (at `ref_count`
  /// 1) if this is the first reference between the two.
  pub fn inc(&mut self, parent: NodeRef, child: NodeRef) {
    unsafe {
      let parent_node = &mut *parent.as_ptr();
      match parent_node.children.get(&child) {
        Some(edge) => (*edge.0.as_ptr()).ref_count += 1,
        None => {
          let edge = self.create_edge();
          (&mut *parent.as_ptr()).children.insert(child, edge);
        }
      }

      let child_node = &mut *child.as_ptr();
      match child_node.parents.get(&parent) {
        Some(edge) => (*edge.0.as_ptr()).ref_count += 1,
        None => {
          let edge = self.create_edge();
          (&mut *child.as_ptr()).parents.insert(parent, edge);
        }
      }
    }
  }

  /// Removes one reference from `parent` to `child`. Fatal if no
  /// reference existed to remove: `dec` must always be paired with a
  /// matching prior `inc`.
  pub fn dec(&mut self, parent: NodeRef, child: NodeRef) {
    unsafe {
      let parent_node = &mut *parent.as_ptr();
      match parent_node.children.get(&child) {
        Some(edge) if (*edge.0.as_ptr()).ref_count >= 1 => {
          (*edge.0.as_ptr()).ref_count -= 1;
        }
        _ => fatal!(
          "Graph::dec({:p}, {:p}): parent -> child edge has no matching inc",
          parent.as_ptr(),
          child.as_ptr()
        ),
      }

      let child_node = &mut *child.as_ptr();
      match child_node.parents.get(&parent) {
        Some(edge) if (*edge.0.as_ptr()).ref_count >= 1 => {
          (*edge.0.as_ptr()).ref_count -= 1;
        }
        _ => fatal!(
          "Graph::dec({:p}, {:p}): child -> parent edge has no matching inc",
          child.as_ptr(),
          parent.as_ptr()
        ),
      }
    }
  }

  /// Marks every node reachable from a root via a positive-ref-count edge,
  /// then deletes every unmarked node, invoking its deleter exactly once.
  /// Returns the number of nodes deleted.
  pub fn collect(&mut self) -> u32 {
    let mut marked = ptr_set_with_capacity(self.nodes.len() * MARK_SET_CAPACITY_FACTOR + 1);
    for &root in self.roots.iter() {
      Self::mark(root, &mut marked);
    }

    #[cfg(feature = "gc_debug")]
    crate::abstractions::log::debug!(
      2,
      "Graph::collect(): {} nodes, {} roots, {} reachable",
      self.nodes.len(),
      self.roots.len(),
      marked.len()
    );

    let candidates: Vec<NodeRef> = self.nodes.iter().copied().collect();
    let mut deleted_count = 0u32;
    for node in candidates {
      if marked.contains(&node) {
        continue;
      }
      self.delete_node(node, self.config.eager_delete_edges, self.config.eager_delete_nodes);
      self.nodes.remove(&node);
      deleted_count += 1;
    }

    #[cfg(feature = "gc_debug")]
    crate::abstractions::log::debug!(
      2,
      "Graph::collect(): deleted {deleted_count} nodes; node_arena={:?} edge_arena={:?}",
      self.node_arena,
      self.edge_arena
    );

    deleted_count
  }

  /// Number of nodes currently tracked by the graph.
  pub fn node_count(&self) -> usize {
    self.nodes.len()
  }

  /// The payload pointer handed to [`Graph::insert`] for `node`.
  pub fn node_ptr(&self, node: NodeRef) -> *mut c_void {
    unsafe { (*node.as_ptr()).ptr }
  }

  /// Every node currently tracked by the graph, live or not-yet-collected.
  pub fn nodes(&self) -> impl Iterator<Item = NodeRef> + '_ {
    self.nodes.iter().copied()
  }

  fn create_edge(&mut self) -> EdgeRef {
    let cell = self.edge_arena.alloc();
    unsafe {
      cell.as_ptr().write(Edge { ref_count: 1 });
    }
    EdgeRef(cell)
  }

  /// Depth-first marks `node` and every node reachable from it through a
  /// positive-ref-count child edge. Idempotent: a node already in `marked`
  /// short-circuits the recursion.
  fn mark(node: NodeRef, marked: &mut PtrSet<NodeRef>) {
    if !marked.insert(node) {
      return;
    }
    unsafe {
      for (&child, &edge) in (*node.as_ptr()).children.iter() {
        if (*edge.0.as_ptr()).ref_count > 0 {
          Self::mark(child, marked);
        }
      }
    }
  }

  /// Invokes `node`'s deleter, tears down its adjacency maps, and
  /// optionally returns its edge and node cells to their arenas'
  /// free-lists.
  fn delete_node(&mut self, node: NodeRef, delete_edges: bool, delete_node: bool) {
    unsafe {
      let node_mut = &mut *node.as_ptr();
      if let Some(deleter) = node_mut.deleter.take() {
        deleter(node_mut.ptr, self.config.ctx);
      }

      if delete_edges {
        for &edge in node_mut.children.values() {
          self.edge_arena.dealloc(edge.0);
        }
        for &edge in node_mut.parents.values() {
          self.edge_arena.dealloc(edge.0);
        }
      }

      std::ptr::drop_in_place(&mut node_mut.children);
      std::ptr::drop_in_place(&mut node_mut.parents);

      if delete_node {
        self.node_arena.dealloc(node.0);
      }
    }
  }
}

impl<A: ByteAllocator + Copy> Drop for Graph<A> {
  fn drop(&mut self) {
    let nodes: Vec<NodeRef> = self.nodes.iter().copied().collect();
    for node in nodes {
      self.delete_node(node, false, false);
    }
  }
}

// `NodeRef`/`EdgeRef` wrap raw pointers into arena-owned memory, and
// `Arena`'s bump cursor and free-list head are raw pointers too: both
// types are `!Send`/`!Sync` automatically, with no `unsafe impl` needed.
// A `Graph` (and the handles it hands out) must stay on the thread that
// created it.
