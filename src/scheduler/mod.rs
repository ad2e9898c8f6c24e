//! Frame scheduling.
//!
//! [`FrameScheduler`] owns a mandatory root node, an [`OwnedGraph`] of the
//! remaining nodes and the registered [`Process`]es. Each call to
//! [`execute`](FrameScheduler::execute) runs one frame:
//!
//! ```text
//! root ──► for each member (construction order):
//!            ensure(n) = if visited: return
//!                        ensure(p) for each parent p
//!                        n.execute()
//!                        mark n visited
//! ```
//!
//! Every node runs exactly once per frame, every parent finishes before any
//! of its children starts, and unrelated nodes run in construction order.
//! The order is deterministic but not a minimal topological order.
//!
//! # Disabled nodes
//!
//! The traversal does **not** skip disabled nodes. Each node's work unit
//! receives its flag through [`ExecuteContext::is_enabled`](crate::ExecuteContext::is_enabled)
//! and is expected to return early when disabled.
//!
//! # Example
//!
//! ```
//! use framegraph::{Extent, FrameClock, FrameScheduler, Node};
//!
//! let mut scheduler = FrameScheduler::new(Node::from_fn("begin_frame", |_| {}));
//! let geometry = scheduler.add_node(Node::from_fn("geometry", |_| {}));
//! let lighting = scheduler.add_node(Node::from_fn("lighting", |_| {}));
//! scheduler.add_parents(lighting, &[geometry]).unwrap();
//!
//! let mut clock = FrameClock::new(Extent::new(1280, 720));
//! scheduler.execute(&clock.tick());
//! assert_eq!(scheduler.node(lighting).unwrap().execution_count(), 1);
//! ```

mod report;

pub use report::{NodeTiming, ProcessTiming, TimingReport};

use fixedbitset::FixedBitSet;

use crate::error::{GraphError, GraphResult};
use crate::graph::{CycleCheck, NodeId, OwnedGraph};
use crate::node::Node;
use crate::process::{
    self, ChainProcess, Endpoint, Process, ProcessId, ProcessMut, SingleNodeProcess,
};
use crate::profiling::profile_scope;
use crate::types::{Extent, FrameContext};

/// Configuration for a [`FrameScheduler`].
#[derive(Debug, Clone, Default)]
pub struct SchedulerConfig {
    /// Cycle policy for edge insertion.
    ///
    /// `Reject` (default) refuses edges that would close a cycle. `Off`
    /// accepts them, in which case a cycle makes `execute` recurse until the
    /// stack overflows.
    pub cycle_check: CycleCheck,
    /// Log the [`TimingReport`] at debug level after every frame.
    pub log_timings: bool,
}

/// Runs a root node and a dependency graph of nodes once per frame.
pub struct FrameScheduler {
    graph: OwnedGraph<Node>,
    root: NodeId,
    processes: Vec<Box<dyn Process>>,
    config: SchedulerConfig,
    frames: u64,
}

impl FrameScheduler {
    /// Create a scheduler with the default configuration.
    pub fn new(root: Node) -> Self {
        Self::with_config(root, SchedulerConfig::default())
    }

    /// Create a scheduler with an explicit configuration.
    pub fn with_config(root: Node, config: SchedulerConfig) -> Self {
        let mut graph = OwnedGraph::with_cycle_check(config.cycle_check);
        let root = graph.add_detached_node(root);
        Self {
            graph,
            root,
            processes: Vec::new(),
            config,
            frames: 0,
        }
    }

    /// Active configuration.
    pub fn config(&self) -> &SchedulerConfig {
        &self.config
    }

    /// Handle of the root node. Graph nodes may list it as a parent.
    pub fn root(&self) -> NodeId {
        self.root
    }

    /// Read-only access to the graph.
    pub fn graph(&self) -> &OwnedGraph<Node> {
        &self.graph
    }

    /// Get a node (root or member).
    pub fn node(&self, id: NodeId) -> Option<&Node> {
        self.graph.get(id)
    }

    /// Get a mutable node (root or member), e.g. to toggle it.
    pub fn node_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        self.graph.get_mut(id)
    }

    /// Number of graph members. The root is not counted.
    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    /// Number of frames executed so far.
    pub fn frame_index(&self) -> u64 {
        self.frames
    }

    /// Add a node to the graph. It runs every frame after the root.
    pub fn add_node(&mut self, node: Node) -> NodeId {
        self.graph.add_node(node)
    }

    /// Remove a node and hand it back.
    ///
    /// Fails with [`GraphError::ForeignNode`] for the root or handles of other
    /// graphs, and with [`GraphError::ProcessOwned`] for nodes of a process.
    pub fn remove_node(&mut self, id: NodeId) -> GraphResult<Node> {
        if self.is_process_node(id) {
            return Err(GraphError::ProcessOwned(id));
        }
        self.graph.remove_node(id)
    }

    /// See [`OwnedGraph::add_parents`].
    ///
    /// New edges between two nodes of the same process are rejected with
    /// [`GraphError::ProcessOwned`].
    pub fn add_parents(&mut self, node: NodeId, parents: &[NodeId]) -> GraphResult<()> {
        for &parent in parents {
            self.check_external(parent, node)?;
        }
        self.graph.add_parents(node, parents)
    }

    /// See [`OwnedGraph::add_children`].
    ///
    /// New edges between two nodes of the same process are rejected with
    /// [`GraphError::ProcessOwned`].
    pub fn add_children(&mut self, node: NodeId, children: &[NodeId]) -> GraphResult<()> {
        for &child in children {
            self.check_external(node, child)?;
        }
        self.graph.add_children(node, children)
    }

    /// See [`OwnedGraph::remove_parents`].
    ///
    /// Edges between two nodes of the same process cannot be removed.
    pub fn remove_parents(&mut self, node: NodeId, parents: &[NodeId]) -> GraphResult<()> {
        for &parent in parents {
            self.check_unsealed(parent, node)?;
        }
        self.graph.remove_parents(node, parents)
    }

    /// See [`OwnedGraph::remove_children`].
    ///
    /// Edges between two nodes of the same process cannot be removed.
    pub fn remove_children(&mut self, node: NodeId, children: &[NodeId]) -> GraphResult<()> {
        for &child in children {
            self.check_unsealed(node, child)?;
        }
        self.graph.remove_children(node, children)
    }

    /// Register a process whose nodes are already graph members.
    ///
    /// From here on its internal nodes cannot be removed and the edges
    /// between them can be neither added nor cut. A node may belong to
    /// several processes.
    pub fn add_process(&mut self, process: impl Process + 'static) -> GraphResult<ProcessId> {
        if process.nodes().is_empty() {
            return Err(GraphError::EmptyProcess(process.name().to_string()));
        }
        for &id in process.nodes() {
            self.graph.require_member(id)?;
        }

        Ok(self.register(Box::new(process)))
    }

    /// Add `node` to the graph and register it as a single-node process.
    pub fn add_single_process(&mut self, node: Node) -> ProcessId {
        let name = node.name().to_string();
        let id = self.graph.add_node(node);
        self.register(Box::new(SingleNodeProcess::new(name, id)))
    }

    /// Add `nodes` to the graph, chain them in order and register the chain.
    pub fn add_chain_process(
        &mut self,
        name: impl Into<String>,
        nodes: Vec<Node>,
    ) -> GraphResult<ProcessId> {
        let chain = ChainProcess::build(name, &mut self.graph, nodes)?;
        self.add_process(chain)
    }

    /// Get a registered process.
    pub fn process(&self, id: ProcessId) -> Option<&dyn Process> {
        process::lookup(&self.graph, &self.processes, id).ok()
    }

    /// Node-like access to a registered process.
    pub fn process_mut(&mut self, id: ProcessId) -> GraphResult<ProcessMut<'_>> {
        ProcessMut::new(id, &mut self.graph, &mut self.processes)
    }

    /// Number of registered processes.
    pub fn process_count(&self) -> usize {
        self.processes.len()
    }

    /// Registered processes in registration order.
    pub fn processes(&self) -> impl Iterator<Item = (ProcessId, &dyn Process)> + '_ {
        let graph = self.graph.graph_id();
        self.processes
            .iter()
            .enumerate()
            .map(move |(index, process)| (ProcessId::new(graph, index), process.as_ref()))
    }

    /// Add an edge between any two endpoints.
    ///
    /// Processes decide which of their nodes take the edge: a parent process
    /// contributes its exit node, a child process its entry node.
    pub fn connect(
        &mut self,
        parent: impl Into<Endpoint>,
        child: impl Into<Endpoint>,
    ) -> GraphResult<()> {
        match (parent.into(), child.into()) {
            (Endpoint::Node(parent), Endpoint::Node(child)) => {
                process::link_external(&mut self.graph, &self.processes, parent, child)
            }
            (parent, Endpoint::Process(child)) => {
                process::attach_parent(&mut self.graph, &self.processes, child, parent)
            }
            (Endpoint::Process(parent), child) => {
                process::attach_child(&mut self.graph, &self.processes, parent, child)
            }
        }
    }

    /// Execute one frame.
    ///
    /// Runs the root with `ctx`, then every graph member exactly once with
    /// all of its parents before it. Disabled nodes are executed too.
    pub fn execute(&mut self, ctx: &FrameContext) {
        profile_scope!("frame_graph");

        let mut visited = FixedBitSet::with_capacity(self.graph.slot_capacity());
        self.graph[self.root].execute(Some(ctx));
        visited.insert(self.root.index());

        let mut position = 0;
        while let Some(id) = self.graph.member_at(position) {
            self.ensure_executed(id, &mut visited);
            position += 1;
        }

        self.frames += 1;
        if self.config.log_timings {
            log::debug!("{}", self.timing_report());
        }
    }

    /// Returns `true` if the root and every graph member report themselves
    /// valid. Never called by [`execute`](Self::execute).
    pub fn is_valid(&self) -> bool {
        let mut valid = true;
        let root = (self.root, &self.graph[self.root]);
        for (id, node) in std::iter::once(root).chain(self.graph.iter()) {
            if !node.is_valid() {
                log::debug!("Node `{}` ({:?}) is not valid", node.name(), id);
                valid = false;
            }
        }
        valid
    }

    /// Propagate a new extent to the root, every graph member and every
    /// registered process's own resources. Each receives it exactly once.
    pub fn resize(&mut self, extent: Extent) {
        log::debug!("Resizing frame graph to {}", extent);
        self.graph[self.root].resize(extent);

        let mut position = 0;
        while let Some(id) = self.graph.member_at(position) {
            self.graph[id].resize(extent);
            position += 1;
        }

        for process in &mut self.processes {
            process.resize_resources(extent);
        }
    }

    /// Timings recorded by the last frame.
    pub fn timing_report(&self) -> TimingReport {
        let root = &self.graph[self.root];
        let nodes = std::iter::once(root)
            .chain(self.graph.iter().map(|(_, node)| node))
            .map(|node| NodeTiming {
                name: node.name().to_string(),
                elapsed: node.elapsed(),
                enabled: node.is_enabled(),
            })
            .collect();
        let processes = self
            .processes
            .iter()
            .map(|process| ProcessTiming {
                name: process.name().to_string(),
                elapsed: process::elapsed_time(&self.graph, process.as_ref()),
            })
            .collect();

        TimingReport {
            frames: self.frames,
            nodes,
            processes,
        }
    }

    fn ensure_executed(&mut self, id: NodeId, visited: &mut FixedBitSet) {
        if visited.contains(id.index()) {
            return;
        }

        // Parents are re-read by position because executing them needs `&mut self`.
        let mut position = 0;
        loop {
            let Some(&parent) = self.graph[id].parents().get(position) else {
                break;
            };
            self.ensure_executed(parent, visited);
            position += 1;
        }

        self.graph[id].execute(None);
        visited.insert(id.index());
    }

    fn register(&mut self, process: Box<dyn Process>) -> ProcessId {
        let id = ProcessId::new(self.graph.graph_id(), self.processes.len());
        log::debug!(
            "Registered process `{}` as {:?} ({} node(s))",
            process.name(),
            id,
            process.nodes().len()
        );
        self.processes.push(process);
        id
    }

    fn is_process_node(&self, id: NodeId) -> bool {
        self.processes
            .iter()
            .any(|process| process.nodes().contains(&id))
    }

    fn check_unsealed(&self, parent: NodeId, child: NodeId) -> GraphResult<()> {
        if process::share_process(&self.processes, parent, child)
            && self.graph.has_edge(parent, child)
        {
            return Err(GraphError::ProcessOwned(child));
        }
        Ok(())
    }

    fn check_external(&self, parent: NodeId, child: NodeId) -> GraphResult<()> {
        if process::share_process(&self.processes, parent, child)
            && !self.graph.has_edge(parent, child)
        {
            return Err(GraphError::ProcessOwned(child));
        }
        Ok(())
    }
}

impl std::fmt::Debug for FrameScheduler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FrameScheduler")
            .field("root", &self.root)
            .field("graph", &self.graph)
            .field("processes", &self.processes.len())
            .field("frames", &self.frames)
            .finish()
    }
}
