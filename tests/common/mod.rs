//! Shared helpers for the integration tests.

#![allow(dead_code)]

use std::cell::{Cell, RefCell};
use std::rc::Rc;
use std::time::Duration;

use framegraph::{
    ExecuteContext, Extent, FrameContext, FrameScheduler, Node, NodeId, Process, WorkUnit,
};

/// Execution log shared between work units and the test body.
#[derive(Clone, Default)]
pub struct Trace(Rc<RefCell<Vec<String>>>);

impl Trace {
    pub fn names(&self) -> Vec<String> {
        self.0.borrow().clone()
    }

    pub fn count(&self, name: &str) -> usize {
        self.0.borrow().iter().filter(|n| n.as_str() == name).count()
    }

    /// Position of the first execution of `name`.
    pub fn position(&self, name: &str) -> usize {
        self.0
            .borrow()
            .iter()
            .position(|n| n == name)
            .unwrap_or_else(|| panic!("`{}` never executed", name))
    }

    pub fn clear(&self) {
        self.0.borrow_mut().clear();
    }

    fn push(&self, name: &str) {
        self.0.borrow_mut().push(name.to_string());
    }
}

/// Work unit that records its execution, resizes and enabled flag.
pub struct Recorder {
    trace: Trace,
    pub resizes: Rc<Cell<u32>>,
    pub last_enabled: Rc<Cell<Option<bool>>>,
    pub valid: bool,
}

impl WorkUnit for Recorder {
    fn execute(&mut self, ctx: &ExecuteContext<'_>) {
        self.trace.push(ctx.name());
        self.last_enabled.set(Some(ctx.is_enabled()));
    }

    fn is_valid(&self) -> bool {
        self.valid
    }

    fn resize(&mut self, _extent: Extent) {
        self.resizes.set(self.resizes.get() + 1);
    }
}

/// Probes that stay with the test after the recorder moves into a node.
#[derive(Clone, Default)]
pub struct Probe {
    pub resizes: Rc<Cell<u32>>,
    pub last_enabled: Rc<Cell<Option<bool>>>,
}

pub fn recorder(trace: &Trace) -> (Recorder, Probe) {
    let probe = Probe::default();
    let recorder = Recorder {
        trace: trace.clone(),
        resizes: probe.resizes.clone(),
        last_enabled: probe.last_enabled.clone(),
        valid: true,
    };
    (recorder, probe)
}

/// Node that appends its name to `trace` whenever it executes.
pub fn node(name: &str, trace: &Trace) -> Node {
    Node::new(name, recorder(trace).0)
}

/// Like [`node`], also returning the probe.
pub fn probed(name: &str, trace: &Trace) -> (Node, Probe) {
    let (recorder, probe) = recorder(trace);
    (Node::new(name, recorder), probe)
}

/// Route `log` output through the test harness. Safe to call repeatedly.
pub fn init_logging() {
    let _ = env_logger::builder()
        .is_test(true)
        .filter_level(log::LevelFilter::Debug)
        .try_init();
}

pub fn scheduler(trace: &Trace) -> FrameScheduler {
    init_logging();
    FrameScheduler::new(node("root", trace))
}

pub fn frame(index: u64) -> FrameContext {
    FrameContext::new(
        index,
        Duration::from_millis(16),
        Duration::from_millis(16 * index),
        Extent::new(800, 600),
    )
}

/// Process over existing nodes, counting its own resource resizes.
pub struct Group {
    pub name: String,
    pub nodes: Vec<NodeId>,
    pub resizes: Rc<Cell<u32>>,
}

impl Group {
    pub fn new(name: &str, nodes: Vec<NodeId>) -> (Self, Rc<Cell<u32>>) {
        let resizes = Rc::new(Cell::new(0));
        let group = Self {
            name: name.to_string(),
            nodes,
            resizes: resizes.clone(),
        };
        (group, resizes)
    }
}

impl Process for Group {
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

    fn resize_resources(&mut self, _extent: Extent) {
        self.resizes.set(self.resizes.get() + 1);
    }
}

/// Asserts that every edge in the scheduler's graph is mirrored and points
/// at a live node (or the root).
pub fn assert_consistent(scheduler: &FrameScheduler) {
    let graph = scheduler.graph();
    let live = |id: NodeId| id == scheduler.root() || graph.is_member(id);
    for (id, node) in graph.iter() {
        for &parent in node.parents() {
            assert!(live(parent), "{:?} has dangling parent {:?}", id, parent);
            assert!(graph.has_edge(parent, id));
        }
        for &child in node.children() {
            assert!(live(child), "{:?} has dangling child {:?}", id, child);
            assert!(graph[child].parents().contains(&id));
        }
    }
}
