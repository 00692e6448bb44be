use arcmatch_common::VertexId;

use super::{Graph, OutList};
use crate::error::GraphError;

/// Incremental constructor for [`Graph`].
///
/// Vertex ids are handed out densely by [`GraphBuilder::add_vertex`]; edges
/// are only validated in [`GraphBuilder::build`].
#[derive(Clone, Debug)]
pub struct GraphBuilder<N, E> {
    vertex_attrs: Vec<N>,
    edges: Vec<(VertexId, VertexId, E)>,
}

impl<N, E> Default for GraphBuilder<N, E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<N, E> GraphBuilder<N, E> {
    /// Empty builder.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            vertex_attrs: Vec::new(),
            edges: Vec::new(),
        }
    }

    /// Builder pre-populated with one vertex per attribute, ids in order.
    pub fn with_vertices(attrs: impl IntoIterator<Item = N>) -> Self {
        Self {
            vertex_attrs: attrs.into_iter().collect(),
            edges: Vec::new(),
        }
    }

    /// Add a vertex and return its id.
    pub fn add_vertex(&mut self, attr: N) -> VertexId {
        self.vertex_attrs.push(attr);
        VertexId::from(self.vertex_attrs.len() - 1)
    }

    /// Add a directed edge. Out-adjacency keeps insertion order.
    pub fn add_edge(&mut self, from: VertexId, to: VertexId, attr: E) -> &mut Self {
        self.edges.push((from, to, attr));
        self
    }

    /// Number of vertices added so far.
    #[must_use]
    pub fn vertex_count(&self) -> usize {
        self.vertex_attrs.len()
    }

    /// Freeze into an immutable graph.
    ///
    /// # Errors
    ///
    /// Returns [`GraphError::DanglingEdge`] if any edge endpoint was never
    /// added as a vertex.
    pub fn build(self) -> Result<Graph<N, E>, GraphError> {
        let n = self.vertex_attrs.len();
        let mut out_adj: Vec<OutList<E>> = (0..n).map(|_| Vec::new()).collect();

        for (from, to, attr) in self.edges {
            if from.as_usize() >= n || to.as_usize() >= n {
                return Err(GraphError::DanglingEdge {
                    from,
                    to,
                    vertex_count: n,
                });
            }
            out_adj[from.as_usize()].push((to, attr));
        }

        Graph::assemble(self.vertex_attrs, out_adj)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_are_dense_and_ordered() {
        let mut b: GraphBuilder<&str, ()> = GraphBuilder::new();
        assert_eq!(b.add_vertex("a"), VertexId::new(0));
        assert_eq!(b.add_vertex("b"), VertexId::new(1));
        assert_eq!(b.vertex_count(), 2);
    }

    #[test]
    fn dangling_tail_is_rejected() {
        let mut b = GraphBuilder::with_vertices([1u8, 2]);
        b.add_edge(VertexId::new(5), VertexId::new(0), ());
        assert_eq!(
            b.build().unwrap_err(),
            GraphError::DanglingEdge {
                from: VertexId::new(5),
                to: VertexId::new(0),
                vertex_count: 2,
            }
        );
    }

    #[test]
    fn chained_edges_preserve_order() {
        let mut b = GraphBuilder::with_vertices([(), (), ()]);
        let [x, y, z] = [0, 1, 2].map(VertexId::new);
        b.add_edge(x, z, 'p').add_edge(x, y, 'q');
        let g = b.build().expect("valid graph");
        assert_eq!(g.successors(x), &[z, y]);
        assert_eq!(g.out_edge(x, 1), (y, &'q'));
    }
}
