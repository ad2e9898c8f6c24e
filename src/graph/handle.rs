//! Stable node handles.

use std::fmt;
use std::sync::atomic::{AtomicU32, Ordering};

static NEXT_GRAPH_ID: AtomicU32 = AtomicU32::new(0);

/// Allocate a process-wide unique graph id.
pub(crate) fn next_graph_id() -> u32 {
    NEXT_GRAPH_ID.fetch_add(1, Ordering::Relaxed)
}

/// Handle to a node owned by an [`OwnedGraph`](super::OwnedGraph).
///
/// `NodeId` is `Copy` and cheap to pass around. It stays valid until the node
/// is removed; growing the graph never invalidates it.
///
/// Layout: `u32 graph` + `u32 index` + `u32 generation`.
///
/// - **graph**: id of the graph that issued the handle, so a handle from one
///   graph is rejected by another instead of aliasing an unrelated slot
/// - **index**: slot index in the graph's arena
/// - **generation**: bumped every time the slot is freed, so a handle to a
///   removed node never resolves to the node that later reuses its slot
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId {
    graph: u32,
    index: u32,
    generation: u32,
}

impl NodeId {
    pub(crate) fn new(graph: u32, index: u32, generation: u32) -> Self {
        Self {
            graph,
            index,
            generation,
        }
    }

    /// Slot index of this node in its graph.
    #[inline]
    pub fn index(self) -> usize {
        self.index as usize
    }

    /// Generation of the slot when this handle was issued.
    #[inline]
    pub fn generation(self) -> u32 {
        self.generation
    }

    #[inline]
    pub(crate) fn graph(self) -> u32 {
        self.graph
    }
}

impl fmt::Debug for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Node({}v{}@g{})", self.index, self.generation, self.graph)
    }
}
