//! framegraph - a per-frame dependency scheduler for render work
//!
//! Rendering work is split into [`Node`]s, each wrapping an opaque
//! [`WorkUnit`]. Nodes are wired into a dependency graph and executed once per
//! frame by a [`FrameScheduler`], parents before children.
//!
//! # Features
//! - Arena-backed [`OwnedGraph`] with generational [`NodeId`] handles
//! - Symmetric parent/child edges, optional cycle rejection
//! - Composite [`Process`]es that attach to the graph through one entry and
//!   one exit node
//! - Resize broadcast and per-frame timing reports
//! - Optional Tracy instrumentation (`profiling` feature)
//!
//! # Example
//!
//! ```
//! use framegraph::{Extent, FrameClock, FrameScheduler, Node};
//!
//! framegraph::init();
//!
//! let mut scheduler = FrameScheduler::new(Node::from_fn("begin_frame", |_| {}));
//! let bloom = scheduler
//!     .add_chain_process(
//!         "bloom",
//!         vec![
//!             Node::from_fn("bloom_downsample", |_| {}),
//!             Node::from_fn("bloom_upsample", |_| {}),
//!         ],
//!     )
//!     .unwrap();
//! let tonemap = scheduler.add_node(Node::from_fn("tonemap", |_| {}));
//! scheduler.connect(bloom, tonemap).unwrap();
//!
//! let mut clock = FrameClock::new(Extent::new(1920, 1080));
//! scheduler.execute(&clock.tick());
//! ```

pub mod error;
pub mod graph;
pub mod node;
pub mod process;
pub mod profiling;
pub mod scheduler;
pub mod types;

pub use error::{GraphError, GraphResult};
pub use graph::{CycleCheck, GraphNode, Links, NodeId, OwnedGraph};
pub use node::{ExecuteContext, FnWork, Node, WorkUnit};
pub use process::{ChainProcess, Endpoint, Process, ProcessId, ProcessMut, SingleNodeProcess};
pub use scheduler::{FrameScheduler, NodeTiming, ProcessTiming, SchedulerConfig, TimingReport};
pub use types::{Extent, FrameClock, FrameContext};

/// Crate version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Log the crate version. Installing a logger is left to the caller.
pub fn init() {
    log::info!("framegraph v{} initialized", VERSION);
}
