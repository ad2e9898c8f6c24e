//! Composite processes.
//!
//! A process groups 1..N nodes of the scheduler's graph behind a single
//! attach point. The rest of the graph only ever connects to its **entry**
//! node (incoming edges) and its **exit** node (outgoing edges), so a
//! two-pass blur and a single tonemapping pass are wired the same way.
//!
//! # Endpoint dispatch
//!
//! Edges to a process are described with [`Endpoint`]. When both sides are
//! processes, the other process decides which of its own nodes receives the
//! edge:
//!
//! | Call | Edge created |
//! |------|--------------|
//! | `p.add_parent(Node(n))` | `n -> p.entry` |
//! | `p.add_parent(Process(q))` | `q.add_child(Node(p.entry))`, i.e. `q.exit -> p.entry` |
//! | `p.add_child(Node(n))` | `p.exit -> n` |
//! | `p.add_child(Process(q))` | `q.add_parent(Node(p.exit))`, i.e. `p.exit -> q.entry` |
//!
//! No process ever needs to know another's node count or layout.

use std::fmt;
use std::time::Duration;

use crate::error::{GraphError, GraphResult};
use crate::graph::{NodeId, OwnedGraph};
use crate::node::Node;
use crate::types::Extent;

/// Handle to a process registered with a [`FrameScheduler`](crate::FrameScheduler).
///
/// Like [`NodeId`], the handle carries the id of the graph it was issued for,
/// so a scheduler rejects handles from another scheduler with
/// [`GraphError::UnknownProcess`].
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct ProcessId {
    graph: u32,
    index: u32,
}

impl ProcessId {
    pub(crate) fn new(graph: u32, index: usize) -> Self {
        Self {
            graph,
            index: index as u32,
        }
    }

    /// Registration index of this process.
    pub fn index(self) -> usize {
        self.index as usize
    }
}

impl fmt::Debug for ProcessId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Process({}@g{})", self.index, self.graph)
    }
}

/// One side of an edge: a plain node or a whole process.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Endpoint {
    Node(NodeId),
    Process(ProcessId),
}

impl From<NodeId> for Endpoint {
    fn from(id: NodeId) -> Self {
        Self::Node(id)
    }
}

impl From<ProcessId> for Endpoint {
    fn from(id: ProcessId) -> Self {
        Self::Process(id)
    }
}

/// A group of graph nodes presented as one attachable unit.
///
/// Implementors describe their layout; the forwarding behavior (enable,
/// attach, resize, timing) is provided by [`ProcessMut`]. The node list and
/// the edges between those nodes are fixed once the process is registered.
pub trait Process {
    /// Name used in logs and timing reports.
    fn name(&self) -> &str;

    /// All internal nodes, entry first.
    fn nodes(&self) -> &[NodeId];

    /// Node that receives incoming edges.
    fn entry(&self) -> NodeId;

    /// Node that outgoing edges leave from.
    fn exit(&self) -> NodeId;

    /// Resize resources the process owns outside its nodes, such as
    /// intermediate targets shared between its passes.
    fn resize_resources(&mut self, _extent: Extent) {}
}

/// A process wrapping exactly one node. Every call forwards to that node.
#[derive(Debug, Clone)]
pub struct SingleNodeProcess {
    name: String,
    node: [NodeId; 1],
}

impl SingleNodeProcess {
    /// Wrap an existing node.
    pub fn new(name: impl Into<String>, node: NodeId) -> Self {
        Self {
            name: name.into(),
            node: [node],
        }
    }
}

impl Process for SingleNodeProcess {
    fn name(&self) -> &str {
        &self.name
    }

    fn nodes(&self) -> &[NodeId] {
        &self.node
    }

    fn entry(&self) -> NodeId {
        self.node[0]
    }

    fn exit(&self) -> NodeId {
        self.node[0]
    }
}

/// A process whose nodes run as a chain: `n0 -> n1 -> ... -> nN`.
///
/// The first node is the entry, the last the exit.
#[derive(Debug, Clone)]
pub struct ChainProcess {
    name: String,
    nodes: Vec<NodeId>,
}

impl ChainProcess {
    /// Add `nodes` to `graph` as members and link them in order.
    pub(crate) fn build(
        name: impl Into<String>,
        graph: &mut OwnedGraph<Node>,
        nodes: Vec<Node>,
    ) -> GraphResult<Self> {
        let name = name.into();
        if nodes.is_empty() {
            return Err(GraphError::EmptyProcess(name));
        }

        let ids: Vec<NodeId> = nodes.into_iter().map(|node| graph.add_node(node)).collect();
        for pair in ids.windows(2) {
            graph.add_children(pair[0], &[pair[1]])?;
        }

        log::debug!("Built chain process `{}` with {} node(s)", name, ids.len());
        Ok(Self { name, nodes: ids })
    }
}

impl Process for ChainProcess {
    fn name(&self) -> &str {
        &self.name
    }

    fn nodes(&self) -> &[NodeId] {
        &self.nodes
    }

    fn entry(&self) -> NodeId {
        self.nodes[0]
    }

    fn exit(&self) -> NodeId {
        self.nodes[self.nodes.len() - 1]
    }
}

/// Mutable view of a registered process, exposing the node-like surface.
///
/// Obtained from [`FrameScheduler::process_mut`](crate::FrameScheduler::process_mut).
pub struct ProcessMut<'a> {
    id: ProcessId,
    graph: &'a mut OwnedGraph<Node>,
    processes: &'a mut [Box<dyn Process>],
}

impl<'a> ProcessMut<'a> {
    pub(crate) fn new(
        id: ProcessId,
        graph: &'a mut OwnedGraph<Node>,
        processes: &'a mut [Box<dyn Process>],
    ) -> GraphResult<Self> {
        lookup(graph, processes, id)?;
        Ok(Self {
            id,
            graph,
            processes,
        })
    }

    /// Handle of this process.
    pub fn id(&self) -> ProcessId {
        self.id
    }

    /// Process name.
    pub fn name(&self) -> &str {
        self.process().name()
    }

    /// Enabled flag, read from the entry node.
    pub fn is_enabled(&self) -> bool {
        self.graph
            .get(self.process().entry())
            .is_some_and(Node::is_enabled)
    }

    /// Set the enabled flag on every internal node.
    pub fn set_state(&mut self, enabled: bool) {
        let process = &self.processes[self.id.index()];
        for &id in process.nodes() {
            if let Some(node) = self.graph.get_mut(id) {
                node.enable(enabled);
            }
        }
    }

    /// Attach an external predecessor to the entry node.
    pub fn add_parent(&mut self, parent: impl Into<Endpoint>) -> GraphResult<()> {
        attach_parent(self.graph, self.processes, self.id, parent.into())
    }

    /// Make the exit node a predecessor of an external successor.
    pub fn add_child(&mut self, child: impl Into<Endpoint>) -> GraphResult<()> {
        attach_child(self.graph, self.processes, self.id, child.into())
    }

    /// Resize every internal node, then the process's own resources.
    pub fn resize(&mut self, extent: Extent) {
        let process = &mut self.processes[self.id.index()];
        for &id in process.nodes() {
            if let Some(node) = self.graph.get_mut(id) {
                node.resize(extent);
            }
        }
        process.resize_resources(extent);
    }

    /// Sum of the last recorded execution time of every internal node.
    pub fn recover_elapsed_time(&self) -> Duration {
        elapsed_time(self.graph, self.process())
    }

    fn process(&self) -> &dyn Process {
        self.processes[self.id.index()].as_ref()
    }
}

pub(crate) fn lookup<'a>(
    graph: &OwnedGraph<Node>,
    processes: &'a [Box<dyn Process>],
    id: ProcessId,
) -> GraphResult<&'a dyn Process> {
    if id.graph != graph.graph_id() {
        return Err(GraphError::UnknownProcess(id));
    }
    processes
        .get(id.index())
        .map(|process| process.as_ref())
        .ok_or(GraphError::UnknownProcess(id))
}

/// Returns `true` if some registered process owns both `a` and `b`.
pub(crate) fn share_process(processes: &[Box<dyn Process>], a: NodeId, b: NodeId) -> bool {
    processes
        .iter()
        .any(|process| process.nodes().contains(&a) && process.nodes().contains(&b))
}

/// Adds `parent -> child` unless it would be a new edge inside a process.
pub(crate) fn link_external(
    graph: &mut OwnedGraph<Node>,
    processes: &[Box<dyn Process>],
    parent: NodeId,
    child: NodeId,
) -> GraphResult<()> {
    if share_process(processes, parent, child) && !graph.has_edge(parent, child) {
        return Err(GraphError::ProcessOwned(child));
    }
    graph.add_children(parent, &[child])
}

pub(crate) fn elapsed_time(graph: &OwnedGraph<Node>, process: &dyn Process) -> Duration {
    process
        .nodes()
        .iter()
        .filter_map(|&id| graph.get(id))
        .map(Node::elapsed)
        .sum()
}

/// `parent -> process.entry`, letting a parent process choose its own exit.
pub(crate) fn attach_parent(
    graph: &mut OwnedGraph<Node>,
    processes: &[Box<dyn Process>],
    process: ProcessId,
    parent: Endpoint,
) -> GraphResult<()> {
    let entry = lookup(graph, processes, process)?.entry();
    match parent {
        Endpoint::Node(node) => link_external(graph, processes, node, entry),
        Endpoint::Process(other) => attach_child(graph, processes, other, Endpoint::Node(entry)),
    }
}

/// `process.exit -> child`, letting a child process choose its own entry.
pub(crate) fn attach_child(
    graph: &mut OwnedGraph<Node>,
    processes: &[Box<dyn Process>],
    process: ProcessId,
    child: Endpoint,
) -> GraphResult<()> {
    let exit = lookup(graph, processes, process)?.exit();
    match child {
        Endpoint::Node(node) => link_external(graph, processes, exit, node),
        Endpoint::Process(other) => attach_parent(graph, processes, other, Endpoint::Node(exit)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // Lets tests call `unwrap_err()` on results carrying `&dyn Process`.
    impl std::fmt::Debug for dyn Process + '_ {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            f.debug_struct("Process").field("name", &self.name()).finish()
        }
    }

    fn noop(name: &str) -> Node {
        Node::from_fn(name.to_string(), |_| {})
    }

    #[test]
    fn test_chain_links_in_order() {
        let mut graph = OwnedGraph::new();
        let chain =
            ChainProcess::build("blur", &mut graph, vec![noop("blur_h"), noop("blur_v")]).unwrap();

        let (entry, exit) = (chain.entry(), chain.exit());
        assert_eq!(chain.nodes(), &[entry, exit]);
        assert_eq!(graph.children(entry), &[exit]);
        assert_eq!(graph[entry].name(), "blur_h");
        assert_eq!(graph[exit].name(), "blur_v");
    }

    #[test]
    fn test_empty_chain_rejected() {
        let mut graph = OwnedGraph::new();
        let err = ChainProcess::build("nothing", &mut graph, Vec::new()).unwrap_err();
        assert_eq!(err, GraphError::EmptyProcess("nothing".to_string()));
        assert!(graph.is_empty());
    }

    #[test]
    fn test_single_node_process_forwards() {
        let mut graph = OwnedGraph::new();
        let id = graph.add_node(noop("tonemap"));
        let single = SingleNodeProcess::new("tonemap", id);
        assert_eq!(single.entry(), id);
        assert_eq!(single.exit(), id);
        assert_eq!(single.nodes(), &[id]);
    }

    #[test]
    fn test_process_to_process_dispatch() {
        let mut graph = OwnedGraph::new();
        let first = ChainProcess::build("a", &mut graph, vec![noop("a0"), noop("a1")]).unwrap();
        let second = ChainProcess::build("b", &mut graph, vec![noop("b0"), noop("b1")]).unwrap();
        let (a_exit, b_entry) = (first.exit(), second.entry());
        let processes: Vec<Box<dyn Process>> = vec![Box::new(first), Box::new(second)];

        let (first_id, second_id) = (
            ProcessId::new(graph.graph_id(), 0),
            ProcessId::new(graph.graph_id(), 1),
        );
        attach_parent(&mut graph, &processes, second_id, Endpoint::Process(first_id)).unwrap();

        assert_eq!(graph.parents(b_entry), &[a_exit]);
    }

    #[test]
    fn test_unknown_process() {
        let mut graph = OwnedGraph::new();
        let node = graph.add_node(noop("n"));
        let processes: Vec<Box<dyn Process>> = Vec::new();
        let missing = ProcessId::new(graph.graph_id(), 3);
        assert_eq!(
            attach_child(&mut graph, &processes, missing, Endpoint::Node(node)).unwrap_err(),
            GraphError::UnknownProcess(missing)
        );
    }

    #[test]
    fn test_process_id_from_other_graph() {
        let mut graph = OwnedGraph::new();
        let single = SingleNodeProcess::new("a", graph.add_node(noop("a")));
        let processes: Vec<Box<dyn Process>> = vec![Box::new(single)];
        let other: OwnedGraph<Node> = OwnedGraph::new();

        let foreign = ProcessId::new(other.graph_id(), 0);
        assert_eq!(
            lookup(&graph, &processes, foreign).unwrap_err(),
            GraphError::UnknownProcess(foreign)
        );
        assert!(lookup(&graph, &processes, ProcessId::new(graph.graph_id(), 0)).is_ok());
    }

    #[test]
    fn test_link_external_refuses_new_internal_edge() {
        let mut graph = OwnedGraph::new();
        let chain =
            ChainProcess::build("c", &mut graph, vec![noop("c0"), noop("c1"), noop("c2")]).unwrap();
        let ids = chain.nodes().to_vec();
        let outside = graph.add_node(noop("outside"));
        let processes: Vec<Box<dyn Process>> = vec![Box::new(chain)];

        assert_eq!(
            link_external(&mut graph, &processes, ids[0], ids[2]).unwrap_err(),
            GraphError::ProcessOwned(ids[2])
        );
        // Re-adding an existing internal edge stays a no-op.
        link_external(&mut graph, &processes, ids[0], ids[1]).unwrap();
        link_external(&mut graph, &processes, outside, ids[0]).unwrap();
        assert_eq!(graph.parents(ids[2]), &[ids[1]]);
        assert_eq!(graph.parents(ids[0]), &[outside]);
    }
}
