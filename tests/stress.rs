//! Randomized stress test for `memgraph::graph::Graph`.
//!
//! Builds a random graph of nodes with random parent -> child references
//! (ported from the teacher's `build_random_tree` pattern of recursively
//! growing a random tree with `rand`, generalized here to a random DAG with
//! occasional back-edges so cycles are exercised too), randomly `dec`s some
//! of the edges, then checks that `collect()` keeps exactly the set of
//! nodes reachable from the roots and deletes everything else exactly
//! once.

use std::collections::{HashMap, HashSet};
use std::ffi::c_void;
use std::sync::atomic::{AtomicU32, Ordering};

use rand::Rng;

use memgraph::graph::{Graph, GraphConfig, NodeRef};

struct Payload(u32);

unsafe fn counting_deleter(ptr: *mut c_void, ctx: *mut c_void) {
  let counter = &*(ctx as *const AtomicU32);
  counter.fetch_add(1, Ordering::SeqCst);
  drop(Box::from_raw(ptr as *mut Payload));
}

const NODE_COUNT: usize = 200;
const ROUNDS: usize = 6;

#[test]
fn randomized_graphs_collect_exactly_the_unreachable_set() {
  let deleted = AtomicU32::new(0);
  let ctx = &deleted as *const AtomicU32 as *mut c_void;

  for round in 0..ROUNDS {
    let mut rng = rand::rng();
    let mut graph = Graph::new(GraphConfig::default());

    let nodes: Vec<NodeRef> = (0..NODE_COUNT)
        .map(|i| {
          let payload = Box::into_raw(Box::new(Payload(i as u32))) as *mut c_void;
          graph.insert(payload, counting_deleter)
        })
        .collect();

    // Shadow adjacency list mirroring every `inc` the graph sees, so the
    // expected reachable set can be computed independently of `Graph`'s own
    // bookkeeping.
    let mut ref_counts: HashMap<(usize, usize), u32> = HashMap::new();

    // Random DAG-ish edges, with an occasional back-edge to exercise cycles.
    for child in 1..NODE_COUNT {
      let edge_count = rng.random_range(0..3);
      for _ in 0..edge_count {
        let parent = rng.random_range(0..NODE_COUNT);
        if parent == child {
          continue;
        }
        graph.inc(nodes[parent], nodes[child]);
        *ref_counts.entry((parent, child)).or_insert(0) += 1;
      }
    }

    // Random root selection.
    let root_count = rng.random_range(1..10);
    let mut roots = HashSet::new();
    for _ in 0..root_count {
      let r = rng.random_range(0..NODE_COUNT);
      if roots.insert(r) {
        graph.root(nodes[r]);
      }
    }

    // Random churn: drop some edges entirely.
    let edges: Vec<(usize, usize)> = ref_counts.keys().copied().collect();
    for &(parent, child) in &edges {
      if rng.random_bool(0.3) {
        let count = ref_counts.get_mut(&(parent, child)).unwrap();
        graph.dec(nodes[parent], nodes[child]);
        *count -= 1;
      }
    }

    let expected_reachable = reachable_set(&roots, &ref_counts);
    let expected_deleted = NODE_COUNT - expected_reachable.len();

    let before = deleted.load(Ordering::SeqCst);
    let actually_deleted = graph.collect();
    let after = deleted.load(Ordering::SeqCst);

    assert_eq!(
      actually_deleted as usize, expected_deleted,
      "round {round}: collect() reported an unexpected deletion count"
    );
    assert_eq!(
      (after - before) as usize, expected_deleted,
      "round {round}: every deleted node's deleter must run exactly once"
    );
    assert_eq!(graph.node_count(), expected_reachable.len(), "round {round}: survivor count mismatch");

    // Collecting again with nothing changed must be a no-op.
    assert_eq!(graph.collect(), 0, "round {round}: a second collect() found more garbage");
  }
}

fn reachable_set(roots: &HashSet<usize>, ref_counts: &HashMap<(usize, usize), u32>) -> HashSet<usize> {
  let mut marked = HashSet::new();
  let mut stack: Vec<usize> = roots.iter().copied().collect();
  while let Some(node) = stack.pop() {
    if !marked.insert(node) {
      continue;
    }
    for (&(parent, child), &count) in ref_counts.iter() {
      if parent == node && count > 0 {
        stack.push(child);
      }
    }
  }
  marked
}
