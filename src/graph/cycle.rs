//! Reachability search used to reject edges that would close a cycle.

use std::collections::HashMap;

use super::{GraphNode, NodeId, OwnedGraph};

/// Whether edge insertion checks for cycles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CycleCheck {
    /// Reject an edge that would make a node its own ancestor.
    #[default]
    Reject,
    /// Accept every edge. Acyclicity is the caller's responsibility and a
    /// cycle makes frame execution recurse until the stack is exhausted.
    Off,
}

/// Finds a path `from -> ... -> to` following child edges.
///
/// Returns the nodes on the path, both ends included, or `None` if `to` is
/// not reachable. A node trivially reaches itself. Work and memory are
/// bounded by the part of the graph reachable from `from`.
pub(super) fn find_path<T: GraphNode>(
    graph: &OwnedGraph<T>,
    from: NodeId,
    to: NodeId,
) -> Option<Vec<NodeId>> {
    if from == to {
        return Some(vec![from]);
    }

    // Maps each discovered node to the node it was reached from.
    let mut came_from: HashMap<NodeId, NodeId> = HashMap::new();
    let mut stack = vec![from];

    while let Some(current) = stack.pop() {
        let Some(node) = graph.get(current) else {
            continue;
        };
        for &child in node.links().children() {
            if child == from || came_from.contains_key(&child) {
                continue;
            }
            came_from.insert(child, current);
            if child == to {
                let mut path = vec![to];
                let mut cursor = to;
                while let Some(&prev) = came_from.get(&cursor) {
                    path.push(prev);
                    cursor = prev;
                }
                path.reverse();
                return Some(path);
            }
            stack.push(child);
        }
    }

    None
}
