/*!

A slab-allocated, mark-and-sweep tracked-reference memory manager.

[`arena`] provides the fixed-size object slab ([`arena::Arena`]) that backs
every node and edge. [`graph`] builds a reachability graph of tracked
references on top of two such arenas: callers `insert` externally owned
objects as nodes, connect them with reference-counted edges, mark a subset
of nodes as roots, and call [`graph::Graph::collect`] to reclaim everything
unreachable from a root.

*/

#![allow(dead_code)]

pub mod abstractions;
pub mod arena;
pub mod graph;

// Re-export the logging module so the `critical!`/`error!`/.../`trace!`
// macros (which expand to `$crate::log::...` paths) resolve from any
// module in this crate, the same way the teacher crate this grew out of
// re-exports its own logging module at the crate root.
pub use abstractions::log;
