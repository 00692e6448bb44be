//! Candidate domains for pattern vertices and pattern edges.
//!
//! A node domain is a bitset over target vertex ids; an edge domain is an
//! ordered set of target vertex pairs. Both are conservative: a value that
//! takes part in some valid match is never removed. Domains only shrink,
//! and an empty domain means the pattern cannot occur in the target.

mod edge;
mod reduction;

pub use edge::{EdgeDomains, PatternEdge, PatternEdgeIndex, init_edge_domains};
pub use reduction::DomainSet;

use std::fmt;

use arcmatch_common::{MatchMode, VertexId};
use fixedbitset::FixedBitSet;
use itertools::Itertools;
use tracing::{debug, trace};

use crate::compare::AttributeComparator;
use crate::error::Infeasible;
use crate::graph::Graph;

/// One bitset of target vertices per pattern vertex.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NodeDomains {
    sets: Vec<FixedBitSet>,
    target_count: usize,
}

impl NodeDomains {
    /// Empty domains for `pattern_count` vertices over `target_count` values.
    #[must_use]
    pub fn empty(pattern_count: usize, target_count: usize) -> Self {
        Self {
            sets: vec![FixedBitSet::with_capacity(target_count); pattern_count],
            target_count,
        }
    }

    /// Number of pattern vertices.
    #[must_use]
    pub fn len(&self) -> usize {
        self.sets.len()
    }

    /// True for an empty pattern.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.sets.is_empty()
    }

    /// Number of target vertices the bitsets range over.
    #[must_use]
    pub const fn target_count(&self) -> usize {
        self.target_count
    }

    /// Raw bitset of pattern vertex `q`.
    #[must_use]
    pub fn get(&self, q: VertexId) -> &FixedBitSet {
        &self.sets[q.as_usize()]
    }

    /// True if `r` is still a candidate for `q`.
    #[must_use]
    pub fn contains(&self, q: VertexId, r: VertexId) -> bool {
        self.sets[q.as_usize()].contains(r.as_usize())
    }

    /// Candidates of `q` in ascending order.
    pub fn members(&self, q: VertexId) -> impl Iterator<Item = VertexId> {
        self.sets[q.as_usize()].ones().map(VertexId::from)
    }

    /// Number of candidates of `q`.
    #[must_use]
    pub fn size(&self, q: VertexId) -> usize {
        self.sets[q.as_usize()].count_ones(..)
    }

    /// Candidate counts for every pattern vertex.
    #[must_use]
    pub fn sizes(&self) -> Vec<usize> {
        self.sets.iter().map(|s| s.count_ones(..)).collect()
    }

    /// True if `q` has exactly one candidate left.
    #[must_use]
    pub fn is_singleton(&self, q: VertexId) -> bool {
        self.size(q) == 1
    }

    /// Insert `r` into the domain of `q`.
    pub fn insert(&mut self, q: VertexId, r: VertexId) {
        self.sets[q.as_usize()].insert(r.as_usize());
    }

    /// Remove `r` from the domain of `q`; returns whether it was present.
    pub fn remove(&mut self, q: VertexId, r: VertexId) -> bool {
        let set = &mut self.sets[q.as_usize()];
        let present = set.contains(r.as_usize());
        set.set(r.as_usize(), false);
        present
    }

    /// Intersect the domain of `q` with `keep`; returns whether it shrank.
    pub fn restrict(&mut self, q: VertexId, keep: &FixedBitSet) -> bool {
        let set = &mut self.sets[q.as_usize()];
        let before = set.count_ones(..);
        set.intersect_with(keep);
        set.count_ones(..) != before
    }

    /// First pattern vertex whose domain is empty, if any.
    #[must_use]
    pub fn first_empty(&self) -> Option<VertexId> {
        self.sets
            .iter()
            .position(FixedBitSet::is_clear)
            .map(VertexId::from)
    }

    fn check(&self) -> Result<(), Infeasible> {
        match self.first_empty() {
            Some(q) => Err(Infeasible::EmptyNodeDomain(q)),
            None => Ok(()),
        }
    }
}

impl fmt::Display for NodeDomains {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (q, set) in self.sets.iter().enumerate() {
            writeln!(
                f,
                "{} [{}]: {{{}}}",
                VertexId::from(q),
                set.count_ones(..),
                set.ones().map(VertexId::from).join(", ")
            )?;
        }
        Ok(())
    }
}

/// Seed node domains by degree and attribute, then run the neighbourhood
/// pass once or to a fixpoint.
///
/// # Errors
///
/// Returns [`Infeasible::EmptyNodeDomain`] if some pattern vertex has no
/// candidate left.
pub fn init_domains<N, E, NC, EC>(
    pattern: &Graph<N, E>,
    target: &Graph<N, E>,
    node_cmp: &NC,
    edge_cmp: &EC,
    mode: MatchMode,
    fixpoint: bool,
) -> Result<NodeDomains, Infeasible>
where
    NC: AttributeComparator<N> + ?Sized,
    EC: AttributeComparator<E> + ?Sized,
{
    let mut domains = NodeDomains::empty(pattern.vertex_count(), target.vertex_count());

    for q in pattern.vertices() {
        let (q_out, q_in) = (pattern.out_degree(q), pattern.in_degree(q));
        for r in target.vertices() {
            let (r_out, r_in) = (target.out_degree(r), target.in_degree(r));
            let degrees_fit = match mode {
                MatchMode::Isomorphism => r_out == q_out && r_in == q_in,
                MatchMode::Monomorphism => r_out >= q_out && r_in >= q_in,
            };
            if degrees_fit && node_cmp.compatible(pattern.attr(q), target.attr(r)) {
                domains.insert(q, r);
            }
        }
    }
    domains.check()?;
    debug!("seeded node domains: {:?}", domains.sizes());

    let mut rounds = 1;
    while neighbourhood_pass(pattern, target, edge_cmp, &mut domains) && fixpoint {
        rounds += 1;
    }
    domains.check()?;
    debug!(
        "neighbourhood consistency after {rounds} round(s): {:?}",
        domains.sizes()
    );

    Ok(domains)
}

/// One sweep of out-edge support checks, evicting in place.
///
/// A candidate `r` of `q` survives if every pattern out-edge `q -> qb` has a
/// compatible target out-edge `r -> rb` with `rb` in the domain of `qb`.
/// Returns whether anything was evicted.
fn neighbourhood_pass<N, E, EC>(
    pattern: &Graph<N, E>,
    target: &Graph<N, E>,
    edge_cmp: &EC,
    domains: &mut NodeDomains,
) -> bool
where
    EC: AttributeComparator<E> + ?Sized,
{
    let mut changed = false;

    for q in pattern.vertices() {
        let candidates: Vec<VertexId> = domains.members(q).collect();
        for r in candidates {
            let supported = pattern.out_edges(q).all(|(qb, pe)| {
                target.out_edges(r).any(|(rb, te)| {
                    let loop_ok = (qb == q) == (rb == r);
                    loop_ok && domains.contains(qb, rb) && edge_cmp.compatible(pe, te)
                })
            });
            if !supported {
                trace!("evict {r} from {q}: unsupported out-edge");
                domains.remove(q, r);
                changed = true;
            }
        }
    }

    changed
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compare::{Equal, Wildcard};
    use crate::graph::GraphBuilder;

    fn graph(labels: &[u8], edges: &[(u32, u32)]) -> Graph<u8, ()> {
        let mut b = GraphBuilder::with_vertices(labels.iter().copied());
        for &(s, t) in edges {
            b.add_edge(VertexId::new(s), VertexId::new(t), ());
        }
        b.build().expect("valid graph")
    }

    fn members(d: &NodeDomains, q: u32) -> Vec<u32> {
        d.members(VertexId::new(q)).map(u32::from).collect()
    }

    #[test]
    fn monomorphism_keeps_higher_degree_targets() {
        let pattern = graph(&[0, 0], &[(0, 1)]);
        let target = graph(&[0, 0, 0], &[(0, 1), (0, 2), (1, 2)]);

        let d = init_domains(
            &pattern,
            &target,
            &Wildcard,
            &Wildcard,
            MatchMode::Monomorphism,
            true,
        )
        .expect("feasible");
        assert_eq!(members(&d, 0), vec![0, 1]);
        assert_eq!(members(&d, 1), vec![1, 2]);
    }

    #[test]
    fn isomorphism_requires_equal_degrees() {
        let pattern = graph(&[0, 0], &[(0, 1)]);
        let target = graph(&[0, 0, 0], &[(0, 1), (0, 2), (1, 2)]);

        let err = init_domains(
            &pattern,
            &target,
            &Wildcard,
            &Wildcard,
            MatchMode::Isomorphism,
            true,
        )
        .unwrap_err();
        assert_eq!(err, Infeasible::EmptyNodeDomain(VertexId::new(0)));
    }

    #[test]
    fn labels_filter_candidates() {
        let pattern = graph(&[7], &[]);
        let target = graph(&[7, 3, 7], &[]);

        let d = init_domains(
            &pattern,
            &target,
            &Equal,
            &Wildcard,
            MatchMode::Monomorphism,
            false,
        )
        .expect("feasible");
        assert_eq!(members(&d, 0), vec![0, 2]);
        assert_eq!(d.sizes(), vec![2]);
    }

    #[test]
    fn fixpoint_prunes_what_one_pass_misses() {
        // Pattern a -> b -> c with labels 1, 2, 3.
        // Target chain 0:1 -> 1:2 -> 2:3 plus a decoy 3:1 -> 4:2 -> 5:9 whose
        // tail lacks the right label. The decoy `3` is only unsupported once
        // `4` has been evicted, and `4` is visited after `3`.
        let pattern = graph(&[1, 2, 3], &[(0, 1), (1, 2)]);
        let target = graph(&[1, 2, 3, 1, 2, 9], &[(0, 1), (1, 2), (3, 4), (4, 5)]);

        let single = init_domains(
            &pattern,
            &target,
            &Equal,
            &Wildcard,
            MatchMode::Monomorphism,
            false,
        )
        .expect("feasible");
        assert_eq!(members(&single, 0), vec![0, 3]);
        assert_eq!(members(&single, 1), vec![1]);

        let full = init_domains(
            &pattern,
            &target,
            &Equal,
            &Wildcard,
            MatchMode::Monomorphism,
            true,
        )
        .expect("feasible");
        assert_eq!(members(&full, 0), vec![0]);
        assert_eq!(members(&full, 1), vec![1]);
        assert_eq!(members(&full, 2), vec![2]);
    }

    #[test]
    fn pattern_self_loop_needs_target_self_loop() {
        let pattern = graph(&[0], &[(0, 0)]);
        let target = graph(&[0, 0, 0], &[(0, 1), (1, 0), (2, 2)]);

        let d = init_domains(
            &pattern,
            &target,
            &Wildcard,
            &Wildcard,
            MatchMode::Monomorphism,
            true,
        )
        .expect("feasible");
        assert_eq!(members(&d, 0), vec![2]);
    }

    #[test]
    fn remove_and_restrict_report_changes() {
        let mut d = NodeDomains::empty(1, 4);
        let q = VertexId::new(0);
        for r in 0..4 {
            d.insert(q, VertexId::new(r));
        }
        assert!(d.remove(q, VertexId::new(1)));
        assert!(!d.remove(q, VertexId::new(1)));

        let mut keep = FixedBitSet::with_capacity(4);
        keep.insert(0);
        keep.insert(3);
        assert!(d.restrict(q, &keep));
        assert!(!d.restrict(q, &keep));
        assert_eq!(members(&d, 0), vec![0, 3]);
    }

    #[test]
    fn display_lists_members() {
        let mut d = NodeDomains::empty(1, 3);
        d.insert(VertexId::new(0), VertexId::new(2));
        assert_eq!(d.to_string(), "v0 [1]: {v2}\n");
    }
}
