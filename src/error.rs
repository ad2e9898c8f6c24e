//! Frame graph error types.

use crate::graph::NodeId;
use crate::process::ProcessId;

/// Result alias used throughout the crate.
pub type GraphResult<T> = Result<T, GraphError>;

/// Errors that can occur while building or editing a frame graph.
///
/// All variants describe construction-time misuse. Frame execution itself
/// never fails: a work unit that cannot run is expected to return early.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GraphError {
    /// The handle was not issued by this graph, or names a detached node
    /// that cannot be edited through the member API.
    #[error("node {0:?} does not belong to this graph")]
    ForeignNode(NodeId),
    /// The handle was issued by this graph but the node has been removed.
    #[error("node {0:?} has been removed")]
    StaleNode(NodeId),
    /// Adding the edge would close a dependency cycle.
    #[error("dependency cycle detected among: {}", .involved.join(", "))]
    CyclicDependency {
        /// Names of the nodes on the cycle, starting at the new child.
        involved: Vec<String>,
    },
    /// The node or edge is internal to a composite process and is fixed.
    #[error("node {0:?} is owned by a composite process")]
    ProcessOwned(NodeId),
    /// The process handle is not registered with this scheduler.
    #[error("unknown process {0:?}")]
    UnknownProcess(ProcessId),
    /// A composite process was built without any internal nodes.
    #[error("process `{0}` has no internal nodes")]
    EmptyProcess(String),
}
