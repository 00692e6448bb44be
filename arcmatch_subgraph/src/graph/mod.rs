//! Static attributed directed graph.
//!
//! Vertices are dense ids in `[0, n)`. Adjacency is stored in both
//! directions and is immutable once built, so pattern and target can be
//! shared by reference across every phase of a run.

mod builder;

pub use builder::GraphBuilder;

use arcmatch_common::{EdgeId, VertexId};
use itertools::Itertools;

use crate::error::GraphError;

/// Ordered out-list of a vertex: `(head, edge attribute)`.
type OutList<E> = Vec<(VertexId, E)>;

/// Attributed directed graph with mirrored in/out adjacency.
#[derive(Clone, Debug)]
pub struct Graph<N, E> {
    /// Per-vertex attributes.
    vertex_attrs: Vec<N>,
    /// Out-edges in insertion order, with their attributes.
    out_adj: Vec<OutList<E>>,
    /// In-edges as `(tail, position in the tail's out-list)`.
    in_adj: Vec<Vec<(VertexId, usize)>>,
    /// Distinct heads of each vertex, first occurrence order.
    successors: Vec<Vec<VertexId>>,
    /// Distinct tails of each vertex, first occurrence order.
    predecessors: Vec<Vec<VertexId>>,
    edge_count: usize,
}

impl<N, E> Graph<N, E> {
    /// Start an empty builder.
    pub fn builder() -> GraphBuilder<N, E> {
        GraphBuilder::new()
    }

    /// Build a graph from explicit out- and in-adjacency lists.
    ///
    /// `in_lists[v]` must contain every `u` with `v` in `out_lists[u]`, once
    /// per such edge, in any order.
    ///
    /// # Errors
    ///
    /// Returns [`GraphError`] when the tables have different lengths, an
    /// edge points outside the vertex range, or an in-list does not mirror
    /// the out-lists.
    pub fn from_adjacency(
        vertex_attrs: Vec<N>,
        out_lists: Vec<OutList<E>>,
        in_lists: Vec<Vec<VertexId>>,
    ) -> Result<Self, GraphError> {
        let n = vertex_attrs.len();
        if out_lists.len() != n || in_lists.len() != n {
            return Err(GraphError::ShapeMismatch {
                vertices: n,
                lists: out_lists.len().max(in_lists.len()),
            });
        }

        let graph = Self::assemble(vertex_attrs, out_lists)?;

        for (v, given) in in_lists.into_iter().enumerate() {
            let derived = graph.in_adj[v].iter().map(|(u, _)| *u).sorted_unstable();
            if !derived.eq(given.into_iter().sorted_unstable()) {
                return Err(GraphError::InconsistentAdjacency {
                    vertex: VertexId::from(v),
                });
            }
        }

        Ok(graph)
    }

    /// Validate out-lists and derive every other adjacency table from them.
    fn assemble(vertex_attrs: Vec<N>, out_adj: Vec<OutList<E>>) -> Result<Self, GraphError> {
        let n = vertex_attrs.len();
        let edges: usize = out_adj.iter().map(Vec::len).sum();
        if !VertexId::fits(n) || !EdgeId::fits(edges) {
            return Err(GraphError::TooLarge { vertices: n, edges });
        }
        let mut in_adj: Vec<Vec<(VertexId, usize)>> = vec![Vec::new(); n];
        let mut edge_count = 0;

        for (u, outs) in out_adj.iter().enumerate() {
            for (pos, (v, _)) in outs.iter().enumerate() {
                if v.as_usize() >= n {
                    return Err(GraphError::DanglingEdge {
                        from: VertexId::from(u),
                        to: *v,
                        vertex_count: n,
                    });
                }
                in_adj[v.as_usize()].push((VertexId::from(u), pos));
                edge_count += 1;
            }
        }

        let successors = out_adj
            .iter()
            .map(|outs| outs.iter().map(|(v, _)| *v).unique().collect())
            .collect();
        let predecessors = in_adj
            .iter()
            .map(|ins| ins.iter().map(|(u, _)| *u).unique().collect())
            .collect();

        Ok(Self {
            vertex_attrs,
            out_adj,
            in_adj,
            successors,
            predecessors,
            edge_count,
        })
    }

    /// Number of vertices.
    #[must_use]
    pub fn vertex_count(&self) -> usize {
        self.vertex_attrs.len()
    }

    /// Number of edges, parallel edges counted separately.
    #[must_use]
    pub const fn edge_count(&self) -> usize {
        self.edge_count
    }

    /// True if the graph has no vertices.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.vertex_attrs.is_empty()
    }

    /// All vertex ids in ascending order.
    pub fn vertices(&self) -> impl Iterator<Item = VertexId> {
        (0..self.vertex_count()).map(VertexId::from)
    }

    /// Attribute of a vertex.
    #[must_use]
    pub fn attr(&self, v: VertexId) -> &N {
        &self.vertex_attrs[v.as_usize()]
    }

    /// Out-edges of `v` in insertion order.
    pub fn out_edges(&self, v: VertexId) -> impl Iterator<Item = (VertexId, &E)> {
        self.out_adj[v.as_usize()].iter().map(|(w, e)| (*w, e))
    }

    /// In-edges of `v` as `(tail, attribute)`.
    pub fn in_edges(&self, v: VertexId) -> impl Iterator<Item = (VertexId, &E)> {
        self.in_adj[v.as_usize()]
            .iter()
            .map(|&(u, pos)| (u, &self.out_adj[u.as_usize()][pos].1))
    }

    /// The `pos`-th out-edge of `v`.
    #[must_use]
    pub fn out_edge(&self, v: VertexId, pos: usize) -> (VertexId, &E) {
        let (w, e) = &self.out_adj[v.as_usize()][pos];
        (*w, e)
    }

    /// Distinct heads of `v`'s out-edges.
    #[must_use]
    pub fn successors(&self, v: VertexId) -> &[VertexId] {
        &self.successors[v.as_usize()]
    }

    /// Distinct tails of `v`'s in-edges.
    #[must_use]
    pub fn predecessors(&self, v: VertexId) -> &[VertexId] {
        &self.predecessors[v.as_usize()]
    }

    /// Number of out-edges of `v`.
    #[must_use]
    pub fn out_degree(&self, v: VertexId) -> usize {
        self.out_adj[v.as_usize()].len()
    }

    /// Number of in-edges of `v`.
    #[must_use]
    pub fn in_degree(&self, v: VertexId) -> usize {
        self.in_adj[v.as_usize()].len()
    }

    /// In-degree plus out-degree; a self-loop counts twice.
    #[must_use]
    pub fn degree(&self, v: VertexId) -> usize {
        self.out_degree(v) + self.in_degree(v)
    }

    /// Attributes of every edge `from -> to`.
    pub fn edges_between(&self, from: VertexId, to: VertexId) -> impl Iterator<Item = &E> {
        self.out_adj[from.as_usize()]
            .iter()
            .filter(move |(w, _)| *w == to)
            .map(|(_, e)| e)
    }

    /// True if at least one edge `from -> to` exists.
    #[must_use]
    pub fn has_edge(&self, from: VertexId, to: VertexId) -> bool {
        self.edges_between(from, to).next().is_some()
    }

    /// True if `v` has an edge to itself.
    #[must_use]
    pub fn has_self_loop(&self, v: VertexId) -> bool {
        self.has_edge(v, v)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn v(i: u32) -> VertexId {
        VertexId::new(i)
    }

    #[test]
    fn in_adjacency_mirrors_out_adjacency() {
        let mut b = Graph::builder();
        let a = b.add_vertex('a');
        let c = b.add_vertex('c');
        let d = b.add_vertex('d');
        b.add_edge(a, c, 1);
        b.add_edge(a, d, 2);
        b.add_edge(d, c, 3);
        let g = b.build().expect("valid graph");

        assert_eq!(g.edge_count(), 3);
        assert_eq!(g.successors(a), &[c, d]);
        assert_eq!(g.predecessors(c), &[a, d]);
        let into_c: Vec<_> = g.in_edges(c).map(|(u, e)| (u, *e)).collect();
        assert_eq!(into_c, vec![(a, 1), (d, 3)]);
        assert_eq!(g.degree(d), 2);
    }

    #[test]
    fn parallel_edges_are_kept_but_neighbours_are_distinct() {
        let mut b = Graph::builder();
        let a = b.add_vertex(());
        let c = b.add_vertex(());
        b.add_edge(a, c, 'x');
        b.add_edge(a, c, 'y');
        let g = b.build().expect("valid graph");

        assert_eq!(g.out_degree(a), 2);
        assert_eq!(g.successors(a), &[c]);
        let labels: Vec<char> = g.edges_between(a, c).copied().collect();
        assert_eq!(labels, vec!['x', 'y']);
        assert!(!g.has_edge(c, a));
    }

    #[test]
    fn self_loop_counts_on_both_sides() {
        let mut b = Graph::builder();
        let a = b.add_vertex(());
        b.add_edge(a, a, ());
        let g = b.build().expect("valid graph");

        assert!(g.has_self_loop(a));
        assert_eq!(g.out_degree(a), 1);
        assert_eq!(g.in_degree(a), 1);
    }

    #[test]
    fn from_adjacency_accepts_mirrored_lists() {
        let g = Graph::from_adjacency(
            vec![0, 1, 2],
            vec![vec![(v(1), ())], vec![(v(2), ())], vec![(v(0), ())]],
            vec![vec![v(2)], vec![v(0)], vec![v(1)]],
        )
        .expect("consistent adjacency");
        assert_eq!(g.vertex_count(), 3);
        assert_eq!(g.predecessors(v(0)), &[v(2)]);
    }

    #[test]
    fn from_adjacency_rejects_unmirrored_lists() {
        let err = Graph::from_adjacency(
            vec![0, 1],
            vec![vec![(v(1), ())], vec![]],
            vec![vec![], vec![]],
        )
        .unwrap_err();
        assert_eq!(err, GraphError::InconsistentAdjacency { vertex: v(1) });
    }

    #[test]
    fn from_adjacency_rejects_dangling_heads() {
        let err = Graph::from_adjacency(vec![0], vec![vec![(v(4), ())]], vec![vec![]]).unwrap_err();
        assert_eq!(
            err,
            GraphError::DanglingEdge {
                from: v(0),
                to: v(4),
                vertex_count: 1
            }
        );
    }

    #[test]
    fn from_adjacency_rejects_short_tables() {
        let err = Graph::<u8, ()>::from_adjacency(vec![0, 1], vec![vec![]], vec![vec![], vec![]])
            .unwrap_err();
        assert!(matches!(err, GraphError::ShapeMismatch { vertices: 2, .. }));
    }
}
