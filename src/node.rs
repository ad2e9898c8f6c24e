//! Schedulable nodes and the work unit contract.
//!
//! A [`Node`] wraps an opaque [`WorkUnit`] with an enabled flag, a timer and
//! the edge lists the [`OwnedGraph`](crate::OwnedGraph) maintains. Nodes never
//! run their parents themselves; ordering belongs to the
//! [`FrameScheduler`](crate::FrameScheduler).

use std::fmt;
use std::time::{Duration, Instant};

use crate::graph::{GraphNode, Links, NodeId};
use crate::profiling::profile_scope_dynamic;
use crate::types::{Extent, FrameContext};

/// What a work unit sees while it executes.
pub struct ExecuteContext<'a> {
    name: &'a str,
    enabled: bool,
    frame: Option<&'a FrameContext>,
}

impl<'a> ExecuteContext<'a> {
    /// Name of the node being executed.
    pub fn name(&self) -> &'a str {
        self.name
    }

    /// The node's enabled flag.
    ///
    /// The scheduler executes disabled nodes too; a disabled work unit is
    /// expected to check this and return without doing anything.
    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// The frame context. Only the scheduler's root node receives one.
    pub fn frame(&self) -> Option<&'a FrameContext> {
        self.frame
    }
}

/// Contract a collaborator implements for each node.
///
/// The core never inspects what happens inside [`execute`](Self::execute).
pub trait WorkUnit {
    /// Record or submit this unit's work for the current frame.
    fn execute(&mut self, ctx: &ExecuteContext<'_>);

    /// Whether the unit is internally consistent (e.g. all inputs bound).
    fn is_valid(&self) -> bool {
        true
    }

    /// React to a new surface size, e.g. by recreating size-dependent targets.
    fn resize(&mut self, _extent: Extent) {}
}

/// Adapts a closure into a [`WorkUnit`]. See [`Node::from_fn`].
pub struct FnWork<F>(F);

impl<F> WorkUnit for FnWork<F>
where
    F: FnMut(&ExecuteContext<'_>),
{
    fn execute(&mut self, ctx: &ExecuteContext<'_>) {
        (self.0)(ctx)
    }
}

/// A single schedulable unit of work.
pub struct Node {
    name: String,
    work: Box<dyn WorkUnit>,
    enabled: bool,
    /// Wall-clock time of the most recent `execute`.
    elapsed: Duration,
    execution_count: u64,
    links: Links,
}

impl Node {
    /// Create an enabled node around `work`.
    pub fn new(name: impl Into<String>, work: impl WorkUnit + 'static) -> Self {
        Self {
            name: name.into(),
            work: Box::new(work),
            enabled: true,
            elapsed: Duration::ZERO,
            execution_count: 0,
            links: Links::default(),
        }
    }

    /// Create an enabled node whose work is a closure.
    ///
    /// ```
    /// use framegraph::Node;
    ///
    /// let node = Node::from_fn("tonemap", |ctx| {
    ///     if !ctx.is_enabled() {
    ///         return;
    ///     }
    ///     // record tonemapping commands...
    /// });
    /// assert!(node.is_enabled());
    /// ```
    pub fn from_fn<F>(name: impl Into<String>, work: F) -> Self
    where
        F: FnMut(&ExecuteContext<'_>) + 'static,
    {
        Self::new(name, FnWork(work))
    }

    /// Builder-style variant of [`enable`](Self::enable).
    pub fn with_enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    /// Node name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Set the enabled flag handed to the work unit.
    pub fn enable(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    /// Current enabled flag.
    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Duration of the most recent execution.
    pub fn elapsed(&self) -> Duration {
        self.elapsed
    }

    /// Number of times this node has executed.
    pub fn execution_count(&self) -> u64 {
        self.execution_count
    }

    /// Parents of this node.
    pub fn parents(&self) -> &[NodeId] {
        self.links.parents()
    }

    /// Children of this node.
    pub fn children(&self) -> &[NodeId] {
        self.links.children()
    }

    /// No parents.
    pub fn is_root(&self) -> bool {
        self.links.is_root()
    }

    /// No children.
    pub fn is_leaf(&self) -> bool {
        self.links.is_leaf()
    }

    /// Neither parents nor children.
    pub fn is_isolated(&self) -> bool {
        self.links.is_isolated()
    }

    /// Run the work unit once and record how long it took.
    ///
    /// Does not touch parents; the scheduler guarantees they already ran.
    pub fn execute(&mut self, frame: Option<&FrameContext>) {
        profile_scope_dynamic!(self.name.as_str());
        let start = Instant::now();
        let ctx = ExecuteContext {
            name: &self.name,
            enabled: self.enabled,
            frame,
        };
        self.work.execute(&ctx);
        self.elapsed = start.elapsed();
        self.execution_count += 1;
        log::trace!("Executed `{}` in {:.2?}", self.name, self.elapsed);
    }

    /// Forward the validity check to the work unit.
    pub fn is_valid(&self) -> bool {
        self.work.is_valid()
    }

    /// Forward a resize to the work unit.
    pub fn resize(&mut self, extent: Extent) {
        log::debug!("Resizing `{}` to {}", self.name, extent);
        self.work.resize(extent);
    }
}

impl GraphNode for Node {
    fn name(&self) -> &str {
        &self.name
    }

    fn links(&self) -> &Links {
        &self.links
    }

    fn links_mut(&mut self) -> &mut Links {
        &mut self.links
    }
}

impl fmt::Debug for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Node")
            .field("name", &self.name)
            .field("enabled", &self.enabled)
            .field("elapsed", &self.elapsed)
            .field("parents", &self.links.parents())
            .field("children", &self.links.children())
            .finish()
    }
}
