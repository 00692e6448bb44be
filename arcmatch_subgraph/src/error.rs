//! Graph construction and infeasibility errors.

use arcmatch_common::{EdgeId, VertexId};
use thiserror::Error;

/// Malformed graph input, rejected when the graph is built.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum GraphError {
    /// An edge names a vertex id outside `[0, vertex_count)`.
    #[error("edge {from} -> {to} references a vertex outside 0..{vertex_count}")]
    DanglingEdge {
        /// Tail of the offending edge.
        from: VertexId,
        /// Head of the offending edge.
        to: VertexId,
        /// Number of vertices in the graph.
        vertex_count: usize,
    },
    /// The in-adjacency of a vertex does not mirror the out-adjacency lists.
    #[error("in-adjacency of vertex {vertex} does not mirror the out-adjacency lists")]
    InconsistentAdjacency {
        /// The vertex whose in-list disagrees.
        vertex: VertexId,
    },
    /// Attribute and adjacency tables have different lengths.
    #[error("{vertices} vertex attributes but {lists} adjacency lists")]
    ShapeMismatch {
        /// Number of vertex attributes supplied.
        vertices: usize,
        /// Number of adjacency lists supplied.
        lists: usize,
    },
    /// More vertices or edges than a `u32` id can address.
    #[error("{vertices} vertices and {edges} edges exceed the u32 id range")]
    TooLarge {
        /// Number of vertices supplied.
        vertices: usize,
        /// Number of edges supplied.
        edges: usize,
    },
}

/// The pattern cannot occur in the target: some domain became empty.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Infeasible {
    /// No target vertex is left for this pattern vertex.
    #[error("node domain of pattern vertex {0} is empty")]
    EmptyNodeDomain(VertexId),
    /// No target edge is left for this pattern edge.
    #[error("edge domain of pattern edge {0} is empty")]
    EmptyEdgeDomain(EdgeId),
}
