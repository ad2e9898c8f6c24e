//! Owned graph infrastructure.
//!
//! [`OwnedGraph`] owns its nodes in an arena and hands out [`NodeId`]
//! handles. Edges are stored on the nodes themselves as symmetric
//! parent/child lists ([`Links`]), so every node can answer "who do I depend
//! on" and "who depends on me" without scanning the whole graph.
//!
//! # Invariants
//!
//! - A handle returned by [`add_node`](OwnedGraph::add_node) resolves to the
//!   same node until that node is removed.
//! - Edges are symmetric: `p` is in `c`'s parents exactly when `c` is in
//!   `p`'s children. Every mutation below preserves this.
//! - Removing a node unlinks it from every neighbor first, so no remaining
//!   node ever holds a handle to it.
//!
//! # Example
//!
//! ```
//! use framegraph::{Node, OwnedGraph};
//!
//! let mut graph = OwnedGraph::new();
//! let depth = graph.add_node(Node::from_fn("depth_prepass", |_| {}));
//! let lighting = graph.add_node(Node::from_fn("lighting", |_| {}));
//! graph.add_parents(lighting, &[depth]).unwrap();
//!
//! assert_eq!(graph.parents(lighting), &[depth]);
//! assert_eq!(graph.children(depth), &[lighting]);
//!
//! graph.remove_node(depth).unwrap();
//! assert!(graph.parents(lighting).is_empty());
//! ```

mod cycle;
mod handle;

pub use cycle::CycleCheck;
pub use handle::NodeId;

use std::ops::{Index, IndexMut};

use crate::error::{GraphError, GraphResult};

/// Parent/child edge lists of a single node.
///
/// Only [`OwnedGraph`] mutates these, which is what keeps them symmetric.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Links {
    parents: Vec<NodeId>,
    children: Vec<NodeId>,
}

impl Links {
    /// Nodes that must execute before this one, in insertion order.
    pub fn parents(&self) -> &[NodeId] {
        &self.parents
    }

    /// Nodes that depend on this one, in insertion order.
    pub fn children(&self) -> &[NodeId] {
        &self.children
    }

    /// No parents.
    pub fn is_root(&self) -> bool {
        self.parents.is_empty()
    }

    /// No children.
    pub fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }

    /// Neither parents nor children.
    pub fn is_isolated(&self) -> bool {
        self.is_root() && self.is_leaf()
    }
}

/// A value that can live in an [`OwnedGraph`].
pub trait GraphNode {
    /// Name used in logs and error messages.
    fn name(&self) -> &str;

    /// The node's edge lists.
    fn links(&self) -> &Links;

    /// Mutable access to the node's edge lists, for the owning graph.
    fn links_mut(&mut self) -> &mut Links;
}

struct Slot<T> {
    generation: u32,
    value: Option<T>,
    member: bool,
}

/// An arena-backed graph that owns its nodes.
///
/// Nodes come in two kinds:
/// - **members**, added with [`add_node`](Self::add_node), iterated in
///   construction order and counted by [`node_count`](Self::node_count);
/// - **detached** nodes, added with
///   [`add_detached_node`](Self::add_detached_node), which can be linked to
///   members but are neither iterated nor removable. The frame scheduler
///   keeps its root node this way.
pub struct OwnedGraph<T> {
    id: u32,
    slots: Vec<Slot<T>>,
    free: Vec<u32>,
    /// Member handles in construction order.
    order: Vec<NodeId>,
    cycle_check: CycleCheck,
}

impl<T: GraphNode> OwnedGraph<T> {
    /// Create an empty graph that rejects cyclic edges.
    pub fn new() -> Self {
        Self::with_cycle_check(CycleCheck::default())
    }

    /// Create an empty graph with the given cycle policy.
    pub fn with_cycle_check(cycle_check: CycleCheck) -> Self {
        Self {
            id: handle::next_graph_id(),
            slots: Vec::new(),
            free: Vec::new(),
            order: Vec::new(),
            cycle_check,
        }
    }

    /// Current cycle policy.
    pub fn cycle_check(&self) -> CycleCheck {
        self.cycle_check
    }

    /// Take ownership of `value` as a member node.
    pub fn add_node(&mut self, value: T) -> NodeId {
        let id = self.insert(value, true);
        self.order.push(id);
        log::debug!("Added node `{}` as {:?}", self[id].name(), id);
        id
    }

    /// Take ownership of `value` as a detached node.
    pub fn add_detached_node(&mut self, value: T) -> NodeId {
        let id = self.insert(value, false);
        log::debug!("Added detached node `{}` as {:?}", self[id].name(), id);
        id
    }

    /// Remove a member node and hand it back.
    ///
    /// The node is unlinked from all of its parents and children first; their
    /// other edges are untouched. The returned value has empty links.
    ///
    /// Returns [`GraphError::ForeignNode`] if `id` was not issued by this
    /// graph or names a detached node, and [`GraphError::StaleNode`] if it was
    /// already removed.
    pub fn remove_node(&mut self, id: NodeId) -> GraphResult<T> {
        let index = self.resolve(id)?;
        if !self.slots[index].member {
            return Err(GraphError::ForeignNode(id));
        }

        let slot = &mut self.slots[index];
        let Some(mut value) = slot.value.take() else {
            return Err(GraphError::StaleNode(id));
        };
        slot.generation = slot.generation.wrapping_add(1);
        slot.member = false;
        self.free.push(index as u32);
        self.order.retain(|&member| member != id);

        let links = std::mem::take(value.links_mut());
        for parent in links.parents {
            if let Some(node) = self.get_mut(parent) {
                node.links_mut().children.retain(|&child| child != id);
            }
        }
        for child in links.children {
            if let Some(node) = self.get_mut(child) {
                node.links_mut().parents.retain(|&parent| parent != id);
            }
        }

        log::debug!("Removed node `{}` ({:?})", value.name(), id);
        Ok(value)
    }

    /// Number of member nodes.
    pub fn node_count(&self) -> usize {
        self.order.len()
    }

    /// Returns `true` if the graph has no member nodes.
    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Returns `true` if `id` names a live node (member or detached).
    pub fn contains(&self, id: NodeId) -> bool {
        self.resolve(id).is_ok()
    }

    /// Returns `true` if `id` names a live member node.
    pub fn is_member(&self, id: NodeId) -> bool {
        self.resolve(id)
            .map(|index| self.slots[index].member)
            .unwrap_or(false)
    }

    /// Get a node by handle.
    pub fn get(&self, id: NodeId) -> Option<&T> {
        let index = self.resolve(id).ok()?;
        self.slots[index].value.as_ref()
    }

    /// Get a mutable node by handle.
    pub fn get_mut(&mut self, id: NodeId) -> Option<&mut T> {
        let index = self.resolve(id).ok()?;
        self.slots[index].value.as_mut()
    }

    /// Member handles in construction order.
    pub fn ids(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.order.iter().copied()
    }

    /// Member nodes in construction order.
    pub fn iter(&self) -> impl Iterator<Item = (NodeId, &T)> + '_ {
        self.order.iter().map(|&id| (id, &self[id]))
    }

    /// Member handle at `position` in construction order.
    pub fn member_at(&self, position: usize) -> Option<NodeId> {
        self.order.get(position).copied()
    }

    /// Parents of `id`.
    ///
    /// # Panics
    ///
    /// Panics if `id` is not a live node of this graph.
    pub fn parents(&self, id: NodeId) -> &[NodeId] {
        self[id].links().parents()
    }

    /// Children of `id`.
    ///
    /// # Panics
    ///
    /// Panics if `id` is not a live node of this graph.
    pub fn children(&self, id: NodeId) -> &[NodeId] {
        self[id].links().children()
    }

    /// Make every node in `parents` a parent of `node`.
    ///
    /// All handles are validated before any edge is added. If an edge is
    /// rejected, the edges this call already added are removed again, so the
    /// graph is left as it was. Existing edges are kept as-is.
    pub fn add_parents(&mut self, node: NodeId, parents: &[NodeId]) -> GraphResult<()> {
        self.resolve(node)?;
        for &parent in parents {
            self.resolve(parent)?;
        }

        let mut added = Vec::with_capacity(parents.len());
        for &parent in parents {
            match self.link(parent, node) {
                Ok(true) => added.push(parent),
                Ok(false) => {}
                Err(err) => {
                    for &parent in added.iter().rev() {
                        self.unlink(parent, node);
                    }
                    return Err(err);
                }
            }
        }
        Ok(())
    }

    /// Make every node in `children` a child of `node`.
    ///
    /// Same validation and rollback rules as [`add_parents`](Self::add_parents).
    pub fn add_children(&mut self, node: NodeId, children: &[NodeId]) -> GraphResult<()> {
        self.resolve(node)?;
        for &child in children {
            self.resolve(child)?;
        }

        let mut added = Vec::with_capacity(children.len());
        for &child in children {
            match self.link(node, child) {
                Ok(true) => added.push(child),
                Ok(false) => {}
                Err(err) => {
                    for &child in added.iter().rev() {
                        self.unlink(node, child);
                    }
                    return Err(err);
                }
            }
        }
        Ok(())
    }

    /// Remove the edges `parent -> node` for every listed parent.
    ///
    /// Missing edges are ignored.
    pub fn remove_parents(&mut self, node: NodeId, parents: &[NodeId]) -> GraphResult<()> {
        self.resolve(node)?;
        for &parent in parents {
            self.resolve(parent)?;
        }
        for &parent in parents {
            self.unlink(parent, node);
        }
        Ok(())
    }

    /// Remove the edges `node -> child` for every listed child.
    ///
    /// Missing edges are ignored.
    pub fn remove_children(&mut self, node: NodeId, children: &[NodeId]) -> GraphResult<()> {
        self.resolve(node)?;
        for &child in children {
            self.resolve(child)?;
        }
        for &child in children {
            self.unlink(node, child);
        }
        Ok(())
    }

    /// Returns `true` if `child` is a direct child of `parent`.
    pub fn has_edge(&self, parent: NodeId, child: NodeId) -> bool {
        self.get(parent)
            .is_some_and(|node| node.links().children.contains(&child))
    }

    /// Process-wide unique id of this graph, carried by every handle it issues.
    pub(crate) fn graph_id(&self) -> u32 {
        self.id
    }

    /// Number of slots in the arena, live or free. Every live handle's
    /// [`index`](NodeId::index) is below this.
    pub(crate) fn slot_capacity(&self) -> usize {
        self.slots.len()
    }

    /// Fails unless `id` is a live member. Detached nodes are reported as
    /// [`GraphError::ForeignNode`].
    pub(crate) fn require_member(&self, id: NodeId) -> GraphResult<()> {
        let index = self.resolve(id)?;
        if self.slots[index].member {
            Ok(())
        } else {
            Err(GraphError::ForeignNode(id))
        }
    }

    /// Adds `parent -> child`. Returns `Ok(false)` if the edge already exists.
    ///
    /// Both handles must already be resolved.
    fn link(&mut self, parent: NodeId, child: NodeId) -> GraphResult<bool> {
        if self.has_edge(parent, child) {
            return Ok(false);
        }

        if self.cycle_check == CycleCheck::Reject {
            if let Some(path) = cycle::find_path(self, child, parent) {
                let involved: Vec<String> = path
                    .iter()
                    .map(|&id| self[id].name().to_string())
                    .collect();
                log::warn!(
                    "Rejected edge `{}` -> `{}`: it would close a cycle",
                    self[parent].name(),
                    self[child].name()
                );
                return Err(GraphError::CyclicDependency { involved });
            }
        }

        self[parent].links_mut().children.push(child);
        self[child].links_mut().parents.push(parent);
        log::debug!(
            "Linked `{}` -> `{}`",
            self[parent].name(),
            self[child].name()
        );
        Ok(true)
    }

    /// Removes `parent -> child` from both endpoints. Returns whether it existed.
    fn unlink(&mut self, parent: NodeId, child: NodeId) -> bool {
        let existed = self.has_edge(parent, child);
        if let Some(node) = self.get_mut(parent) {
            node.links_mut().children.retain(|&c| c != child);
        }
        if let Some(node) = self.get_mut(child) {
            node.links_mut().parents.retain(|&p| p != parent);
        }
        existed
    }

    fn insert(&mut self, value: T, member: bool) -> NodeId {
        if let Some(index) = self.free.pop() {
            let slot = &mut self.slots[index as usize];
            slot.value = Some(value);
            slot.member = member;
            NodeId::new(self.id, index, slot.generation)
        } else {
            let index = self.slots.len() as u32;
            self.slots.push(Slot {
                generation: 0,
                value: Some(value),
                member,
            });
            NodeId::new(self.id, index, 0)
        }
    }

    /// Maps a handle to its slot index if it names a live node of this graph.
    fn resolve(&self, id: NodeId) -> GraphResult<usize> {
        if id.graph() != self.id {
            return Err(GraphError::ForeignNode(id));
        }
        let slot = self
            .slots
            .get(id.index())
            .ok_or(GraphError::ForeignNode(id))?;
        if slot.generation != id.generation() || slot.value.is_none() {
            return Err(GraphError::StaleNode(id));
        }
        Ok(id.index())
    }
}

impl<T: GraphNode> Default for OwnedGraph<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: GraphNode> Index<NodeId> for OwnedGraph<T> {
    type Output = T;

    fn index(&self, id: NodeId) -> &T {
        self.get(id)
            .unwrap_or_else(|| panic!("{id:?} is not a live node of this graph"))
    }
}

impl<T: GraphNode> IndexMut<NodeId> for OwnedGraph<T> {
    fn index_mut(&mut self, id: NodeId) -> &mut T {
        self.get_mut(id)
            .unwrap_or_else(|| panic!("{id:?} is not a live node of this graph"))
    }
}

impl<T: GraphNode> std::fmt::Debug for OwnedGraph<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OwnedGraph")
            .field("id", &self.id)
            .field("members", &self.order.len())
            .field("slots", &self.slots.len())
            .field("cycle_check", &self.cycle_check)
            .finish()
    }
}
