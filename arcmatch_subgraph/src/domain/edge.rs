use std::collections::BTreeSet;
use std::fmt;

use arcmatch_common::{EdgeId, VertexId};
use itertools::Itertools;
use tracing::debug;

use super::NodeDomains;
use crate::compare::AttributeComparator;
use crate::error::Infeasible;
use crate::graph::Graph;

/// A pattern edge resolved to its endpoints and out-list slot.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct PatternEdge {
    /// Tail vertex.
    pub source: VertexId,
    /// Head vertex.
    pub target: VertexId,
    /// Index of the edge in the tail's out-list.
    pub position: usize,
}

impl PatternEdge {
    /// True for `q -> q`.
    #[must_use]
    pub fn is_self_loop(&self) -> bool {
        self.source == self.target
    }
}

/// Dense numbering of pattern edges, in out-adjacency order.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PatternEdgeIndex {
    edges: Vec<PatternEdge>,
    out_eids: Vec<Vec<EdgeId>>,
    in_eids: Vec<Vec<EdgeId>>,
}

impl PatternEdgeIndex {
    /// Number every edge of `pattern` by walking each vertex's out-list.
    #[must_use]
    pub fn build<N, E>(pattern: &Graph<N, E>) -> Self {
        let n = pattern.vertex_count();
        let mut edges = Vec::with_capacity(pattern.edge_count());
        let mut out_eids = vec![Vec::new(); n];
        let mut in_eids = vec![Vec::new(); n];

        for source in pattern.vertices() {
            for (position, (target, _)) in pattern.out_edges(source).enumerate() {
                let id = EdgeId::from(edges.len());
                edges.push(PatternEdge {
                    source,
                    target,
                    position,
                });
                out_eids[source.as_usize()].push(id);
                in_eids[target.as_usize()].push(id);
            }
        }

        Self {
            edges,
            out_eids,
            in_eids,
        }
    }

    /// Number of pattern edges.
    #[must_use]
    pub fn len(&self) -> usize {
        self.edges.len()
    }

    /// True if the pattern has no edges.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.edges.is_empty()
    }

    /// Number of pattern vertices indexed.
    #[must_use]
    pub fn vertex_count(&self) -> usize {
        self.out_eids.len()
    }

    /// Endpoints of edge `e`.
    #[must_use]
    pub fn get(&self, e: EdgeId) -> PatternEdge {
        self.edges[e.as_usize()]
    }

    /// Every edge with its id.
    pub fn iter(&self) -> impl Iterator<Item = (EdgeId, PatternEdge)> {
        self.edges
            .iter()
            .enumerate()
            .map(|(i, pe)| (EdgeId::from(i), *pe))
    }

    /// Ids of the edges leaving `q`.
    #[must_use]
    pub fn out_edges(&self, q: VertexId) -> &[EdgeId] {
        &self.out_eids[q.as_usize()]
    }

    /// Ids of the edges entering `q`.
    #[must_use]
    pub fn in_edges(&self, q: VertexId) -> &[EdgeId] {
        &self.in_eids[q.as_usize()]
    }

    /// Edges between `q` and another vertex, paired with that vertex.
    /// Self-loops are skipped.
    pub fn incident(&self, q: VertexId) -> impl Iterator<Item = (EdgeId, VertexId)> {
        let outs = self.out_edges(q).iter().map(|&e| (e, self.get(e).target));
        let ins = self.in_edges(q).iter().map(|&e| (e, self.get(e).source));
        outs.chain(ins).filter(move |&(_, other)| other != q)
    }

    /// Self-loops of `q`.
    pub fn self_loops(&self, q: VertexId) -> impl Iterator<Item = EdgeId> {
        self.out_edges(q)
            .iter()
            .copied()
            .filter(|&e| self.get(e).is_self_loop())
    }

    /// Total degree of `q`; a self-loop counts twice.
    #[must_use]
    pub fn degree(&self, q: VertexId) -> usize {
        self.out_eids[q.as_usize()].len() + self.in_eids[q.as_usize()].len()
    }

    /// Attribute of edge `e` in the graph the index was built from.
    #[must_use]
    pub fn attr<'g, N, E>(&self, pattern: &'g Graph<N, E>, e: EdgeId) -> &'g E {
        let pe = self.get(e);
        pattern.out_edge(pe.source, pe.position).1
    }
}

/// Target edge candidates per pattern edge, as ordered `(tail, head)` pairs.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EdgeDomains {
    pairs: Vec<BTreeSet<(VertexId, VertexId)>>,
}

impl EdgeDomains {
    /// Number of pattern edges covered.
    #[must_use]
    pub fn edge_count(&self) -> usize {
        self.pairs.len()
    }

    /// Number of pairs left for `e`.
    #[must_use]
    pub fn len(&self, e: EdgeId) -> usize {
        self.pairs[e.as_usize()].len()
    }

    /// True if no pair is left for `e`.
    #[must_use]
    pub fn is_empty(&self, e: EdgeId) -> bool {
        self.pairs[e.as_usize()].is_empty()
    }

    /// Pair counts for every pattern edge.
    #[must_use]
    pub fn sizes(&self) -> Vec<usize> {
        self.pairs.iter().map(BTreeSet::len).collect()
    }

    /// True if `tail -> head` is still a candidate for `e`.
    #[must_use]
    pub fn contains(&self, e: EdgeId, tail: VertexId, head: VertexId) -> bool {
        self.pairs[e.as_usize()].contains(&(tail, head))
    }

    /// Every pair of `e` in lexicographic order.
    #[must_use]
    pub fn pairs(&self, e: EdgeId) -> &BTreeSet<(VertexId, VertexId)> {
        &self.pairs[e.as_usize()]
    }

    /// Heads paired with `tail` in the domain of `e`, ascending.
    pub fn heads_from(&self, e: EdgeId, tail: VertexId) -> impl Iterator<Item = VertexId> {
        self.pairs[e.as_usize()]
            .range((tail, VertexId::new(0))..=(tail, VertexId::new(u32::MAX)))
            .map(|&(_, head)| head)
    }

    /// Keep only pairs satisfying `keep`; returns whether anything was removed.
    pub fn retain(&mut self, e: EdgeId, mut keep: impl FnMut(VertexId, VertexId) -> bool) -> bool {
        let set = &mut self.pairs[e.as_usize()];
        let before = set.len();
        set.retain(|&(t, h)| keep(t, h));
        set.len() != before
    }

    pub(super) fn check(&self) -> Result<(), Infeasible> {
        match self.pairs.iter().position(BTreeSet::is_empty) {
            Some(e) => Err(Infeasible::EmptyEdgeDomain(EdgeId::from(e))),
            None => Ok(()),
        }
    }
}

impl fmt::Display for EdgeDomains {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (e, set) in self.pairs.iter().enumerate() {
            writeln!(
                f,
                "{} [{}]: {{{}}}",
                EdgeId::from(e),
                set.len(),
                set.iter().map(|(t, h)| format!("({t}, {h})")).join(", ")
            )?;
        }
        Ok(())
    }
}

/// Collect, for every pattern edge, the target edges joining two current
/// candidates of its endpoints with a compatible attribute.
///
/// A pattern self-loop only accepts target self-loops and any other edge
/// only accepts pairs of distinct vertices.
///
/// # Errors
///
/// Returns [`Infeasible::EmptyEdgeDomain`] if some pattern edge has no
/// candidate pair.
pub fn init_edge_domains<N, E, EC>(
    pattern: &Graph<N, E>,
    target: &Graph<N, E>,
    index: &PatternEdgeIndex,
    nodes: &NodeDomains,
    edge_cmp: &EC,
) -> Result<EdgeDomains, Infeasible>
where
    EC: AttributeComparator<E> + ?Sized,
{
    let mut pairs = Vec::with_capacity(index.len());

    for (e, pe) in index.iter() {
        let pattern_attr = index.attr(pattern, e);
        let mut set = BTreeSet::new();
        for ts in nodes.members(pe.source) {
            for (tt, target_attr) in target.out_edges(ts) {
                if (ts == tt) != pe.is_self_loop() || !nodes.contains(pe.target, tt) {
                    continue;
                }
                if edge_cmp.compatible(pattern_attr, target_attr) {
                    set.insert((ts, tt));
                }
            }
        }
        pairs.push(set);
    }

    let domains = EdgeDomains { pairs };
    domains.check()?;
    debug!("edge domains: {:?}", domains.sizes());
    Ok(domains)
}
