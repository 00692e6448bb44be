//! Propagation between node and edge domains, and bounded path pruning.

use std::fmt;
use std::ops::ControlFlow;

use arcmatch_common::{EdgeId, MatchMode, Propagation, VertexId};
use contracts::debug_ensures;
use fixedbitset::FixedBitSet;
use tracing::{debug, trace};

use super::{EdgeDomains, NodeDomains, PatternEdgeIndex, init_domains, init_edge_domains};
use crate::compare::AttributeComparator;
use crate::error::Infeasible;
use crate::graph::Graph;

/// Node domains, edge domains and the pattern edge numbering they share.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DomainSet {
    index: PatternEdgeIndex,
    nodes: NodeDomains,
    edges: EdgeDomains,
    edge_fixpoint: bool,
}

impl DomainSet {
    /// Bundle already computed domains.
    ///
    /// With `edge_fixpoint`, every [`DomainSet::refine`] also runs node/edge
    /// support to convergence.
    #[must_use]
    pub const fn new(
        index: PatternEdgeIndex,
        nodes: NodeDomains,
        edges: EdgeDomains,
        edge_fixpoint: bool,
    ) -> Self {
        Self {
            index,
            nodes,
            edges,
            edge_fixpoint,
        }
    }

    /// Run the whole propagation pipeline for `pattern` against `target`.
    ///
    /// # Errors
    ///
    /// Returns [`Infeasible`] as soon as any domain becomes empty.
    pub fn compute<N, E, NC, EC>(
        pattern: &Graph<N, E>,
        target: &Graph<N, E>,
        node_cmp: &NC,
        edge_cmp: &EC,
        mode: MatchMode,
        propagation: Propagation,
    ) -> Result<Self, Infeasible>
    where
        NC: AttributeComparator<N> + ?Sized,
        EC: AttributeComparator<E> + ?Sized,
    {
        let nodes = init_domains(
            pattern,
            target,
            node_cmp,
            edge_cmp,
            mode,
            propagation.node_fixpoint,
        )?;
        let index = PatternEdgeIndex::build(pattern);
        let edges = init_edge_domains(pattern, target, &index, &nodes, edge_cmp)?;
        let mut domains = Self::new(index, nodes, edges, propagation.edge_fixpoint);

        if propagation.edge_fixpoint {
            domains.support_fixpoint()?;
        }
        loop {
            domains.reduce_by_paths(propagation.max_path_length)?;
            if !domains.final_refinement()? {
                break;
            }
        }

        debug!("final node domains: {:?}", domains.nodes.sizes());
        debug!("final edge domains: {:?}", domains.edges.sizes());
        Ok(domains)
    }

    /// Node domains.
    #[must_use]
    pub const fn nodes(&self) -> &NodeDomains {
        &self.nodes
    }

    /// Edge domains.
    #[must_use]
    pub const fn edges(&self) -> &EdgeDomains {
        &self.edges
    }

    /// Pattern edge numbering.
    #[must_use]
    pub const fn index(&self) -> &PatternEdgeIndex {
        &self.index
    }

    /// Evict `r` from the domain of `q` and propagate to incident edges.
    ///
    /// # Errors
    ///
    /// Returns [`Infeasible`] if a domain becomes empty.
    pub fn evict(&mut self, q: VertexId, r: VertexId) -> Result<bool, Infeasible> {
        if !self.nodes.remove(q, r) {
            return Ok(false);
        }
        self.nodes.check()?;
        self.refine(q)?;
        Ok(true)
    }

    /// Drop tuples of edges incident to `changed` whose endpoint left its
    /// node domain. Returns whether any edge domain shrank.
    ///
    /// # Errors
    ///
    /// Returns [`Infeasible`] if a domain becomes empty.
    pub fn refine(&mut self, changed: VertexId) -> Result<bool, Infeasible> {
        let mut shrunk = false;

        for &e in self.index.out_edges(changed) {
            let nodes = &self.nodes;
            shrunk |= self.edges.retain(e, |t, _| nodes.contains(changed, t));
        }
        for &e in self.index.in_edges(changed) {
            let nodes = &self.nodes;
            shrunk |= self.edges.retain(e, |_, h| nodes.contains(changed, h));
        }
        self.edges.check()?;

        if self.edge_fixpoint {
            shrunk |= self.support_fixpoint()?;
        }
        Ok(shrunk)
    }

    /// Drop every edge tuple with an endpoint outside its node domain.
    fn prune_edges(&mut self) -> Result<bool, Infeasible> {
        let mut shrunk = false;
        for (e, pe) in self.index.iter() {
            let nodes = &self.nodes;
            shrunk |= self.edges.retain(e, |t, h| {
                nodes.contains(pe.source, t) && nodes.contains(pe.target, h)
            });
        }
        self.edges.check()?;
        Ok(shrunk)
    }

    /// Alternate edge pruning and node re-derivation from edge support until
    /// neither changes. Returns whether anything shrank.
    #[debug_ensures(ret.is_err() || self.is_arc_consistent())]
    fn support_fixpoint(&mut self) -> Result<bool, Infeasible> {
        let mut shrunk = self.prune_edges()?;
        let target_count = self.nodes.target_count();

        loop {
            let mut changed = false;
            for q in (0..self.nodes.len()).map(VertexId::from) {
                let mut support: Option<FixedBitSet> = None;
                let sides = self.index.out_edges(q).iter().map(|&e| (e, true));
                let sides = sides.chain(self.index.in_edges(q).iter().map(|&e| (e, false)));
                for (e, as_tail) in sides {
                    let mut seen = FixedBitSet::with_capacity(target_count);
                    for &(t, h) in self.edges.pairs(e) {
                        let end = if as_tail { t } else { h };
                        seen.insert(end.as_usize());
                    }
                    match support.as_mut() {
                        Some(acc) => acc.intersect_with(&seen),
                        None => support = Some(seen),
                    }
                }
                if let Some(keep) = support {
                    changed |= self.nodes.restrict(q, &keep);
                }
            }
            if !changed {
                break;
            }
            shrunk = true;
            self.nodes.check()?;
            self.prune_edges()?;
        }

        Ok(shrunk)
    }

    /// Every node value is backed by a tuple in every incident edge domain
    /// and every tuple's endpoints lie in their node domains.
    fn is_arc_consistent(&self) -> bool {
        self.index.iter().all(|(e, pe)| {
            self.edges
                .pairs(e)
                .iter()
                .all(|&(t, h)| {
                    self.nodes.contains(pe.source, t) && self.nodes.contains(pe.target, h)
                })
                && self
                    .nodes
                    .members(pe.source)
                    .all(|t| self.edges.heads_from(e, t).next().is_some())
                && self
                    .nodes
                    .members(pe.target)
                    .all(|h| self.edges.pairs(e).iter().any(|&(_, x)| x == h))
        })
    }

    /// Evict root candidates that cannot start some pattern path of length
    /// at most `max_len`, repeating until nothing changes.
    ///
    /// Paths follow pattern out-edges, visit distinct pattern vertices and
    /// may end by returning to the root. A root candidate survives only if
    /// every such path has an instantiation through the edge domains that
    /// uses distinct target vertices. `max_len == 0` disables the pass.
    ///
    /// # Errors
    ///
    /// Returns [`Infeasible`] if a domain becomes empty.
    pub fn reduce_by_paths(&mut self, max_len: usize) -> Result<bool, Infeasible> {
        if max_len == 0 || self.index.is_empty() {
            return Ok(false);
        }

        let roots: Vec<VertexId> = (0..self.nodes.len()).map(VertexId::from).collect();

        let mut evicted_any = false;
        let mut round = 0;
        loop {
            round += 1;
            let mut evicted = 0usize;
            for &q in &roots {
                let doomed: Vec<VertexId> = self
                    .nodes
                    .members(q)
                    .filter(|&r| !self.starts_every_path(q, r, max_len))
                    .collect();
                if doomed.is_empty() {
                    continue;
                }
                for &r in &doomed {
                    trace!("path pruning evicts {r} from {q}");
                    self.nodes.remove(q, r);
                }
                evicted += doomed.len();
                self.nodes.check()?;
                self.refine(q)?;
            }
            debug!("path pruning round {round}: {evicted} candidate(s) evicted");
            if evicted == 0 {
                break;
            }
            evicted_any = true;
        }

        Ok(evicted_any)
    }

    /// True if every maximal pattern path from `q` can be walked from
    /// target vertex `r`. Stops at the first path that cannot.
    fn starts_every_path(&self, q: VertexId, r: VertexId, max_len: usize) -> bool {
        let mut trail = Vec::with_capacity(max_len + 1);
        for_each_path(&self.index, q, max_len, |edges, closed| {
            trail.clear();
            trail.push(r);
            if self.walk(edges, closed, r, &mut trail) {
                ControlFlow::Continue(())
            } else {
                trace!(
                    "{r} cannot start a path of {} edge(s) from {q}",
                    edges.len()
                );
                ControlFlow::Break(())
            }
        })
        .is_continue()
    }

    /// Depth-first instantiation of `edges` from `at` through the edge
    /// domains. `trail` holds the target vertices used so far.
    fn walk(
        &self,
        edges: &[EdgeId],
        closed: bool,
        at: VertexId,
        trail: &mut Vec<VertexId>,
    ) -> bool {
        let Some((&e, rest)) = edges.split_first() else {
            return true;
        };
        let closing = closed && rest.is_empty();
        let next_vertex = self.index.get(e).target;

        for head in self.edges.heads_from(e, at) {
            if closing {
                if head == trail[0] {
                    return true;
                }
                continue;
            }
            if trail.contains(&head) || !self.nodes.contains(next_vertex, head) {
                continue;
            }
            trail.push(head);
            if self.walk(rest, closed, head, trail) {
                return true;
            }
            trail.pop();
        }
        false
    }

    /// Last sweep: every node value must be supported by every incident edge
    /// domain. Runs to convergence; returns whether anything shrank.
    ///
    /// # Errors
    ///
    /// Returns [`Infeasible`] if a domain becomes empty.
    pub fn final_refinement(&mut self) -> Result<bool, Infeasible> {
        self.support_fixpoint()
    }
}

impl fmt::Display for DomainSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "node domains:")?;
        write!(f, "{}", self.nodes)?;
        writeln!(f, "edge domains:")?;
        for (e, pe) in self.index.iter() {
            writeln!(
                f,
                "{e} ({} -> {}): {} pair(s)",
                pe.source,
                pe.target,
                self.edges.len(e)
            )?;
        }
        Ok(())
    }
}

/// Visit the maximal out-edge walks from `root` with at most `max_len`
/// edges, depth-first, until `visit` breaks.
///
/// A walk is visited when it cannot be extended or when it closes back on
/// the root (the `bool` argument); its prefixes are implied. Only the
/// current walk is held in memory.
fn for_each_path<F>(
    index: &PatternEdgeIndex,
    root: VertexId,
    max_len: usize,
    mut visit: F,
) -> ControlFlow<()>
where
    F: FnMut(&[EdgeId], bool) -> ControlFlow<()>,
{
    let mut edges = Vec::with_capacity(max_len);
    let mut visited = vec![root];
    extend_path(
        index,
        root,
        root,
        max_len,
        &mut edges,
        &mut visited,
        &mut visit,
    )
}

fn extend_path<F>(
    index: &PatternEdgeIndex,
    root: VertexId,
    at: VertexId,
    max_len: usize,
    edges: &mut Vec<EdgeId>,
    visited: &mut Vec<VertexId>,
    visit: &mut F,
) -> ControlFlow<()>
where
    F: FnMut(&[EdgeId], bool) -> ControlFlow<()>,
{
    let mut extended = false;
    if edges.len() < max_len {
        for &e in index.out_edges(at) {
            let next = index.get(e).target;
            if next == root {
                edges.push(e);
                let flow = visit(edges, true);
                edges.pop();
                flow?;
                continue;
            }
            if visited.contains(&next) {
                continue;
            }
            extended = true;
            edges.push(e);
            visited.push(next);
            let flow = extend_path(index, root, next, max_len, edges, visited, visit);
            visited.pop();
            edges.pop();
            flow?;
        }
    }
    if !extended && !edges.is_empty() {
        visit(edges, false)?;
    }
    ControlFlow::Continue(())
}
