//! Edge domains as sorted runs, for candidate generation by anchor.

use arcmatch_common::{EdgeId, VertexId};

use crate::domain::EdgeDomains;
use crate::machine::{CheckEdge, Direction};

/// Edge domains flattened into sorted arrays keyed by either endpoint, so
/// the candidates for one anchor value are a contiguous run.
#[derive(Clone, Debug, Default)]
pub(crate) struct OrderedEdgeDomains {
    /// `(tail, head)` pairs sorted by tail.
    by_tail: Vec<Vec<(VertexId, VertexId)>>,
    /// `(head, tail)` pairs sorted by head.
    by_head: Vec<Vec<(VertexId, VertexId)>>,
}

impl OrderedEdgeDomains {
    pub(crate) fn new(edges: &EdgeDomains) -> Self {
        let ids = (0..edges.edge_count()).map(EdgeId::from);
        let by_tail = ids
            .clone()
            .map(|e| edges.pairs(e).iter().copied().collect())
            .collect();
        let by_head = ids
            .map(|e| {
                let mut swapped: Vec<_> = edges.pairs(e).iter().map(|&(t, h)| (h, t)).collect();
                swapped.sort_unstable();
                swapped
            })
            .collect();
        Self { by_tail, by_head }
    }

    /// Pairs of `edge` keyed by the endpoint an anchor of `direction` binds.
    pub(crate) fn sorted(&self, edge: EdgeId, direction: Direction) -> &[(VertexId, VertexId)] {
        match direction {
            Direction::Out => &self.by_tail[edge.as_usize()],
            Direction::In => &self.by_head[edge.as_usize()],
        }
    }

    /// Index range of the run keyed by `anchor`.
    pub(crate) fn range(&self, check: &CheckEdge, anchor: VertexId) -> (usize, usize) {
        let pairs = self.sorted(check.edge, check.direction);
        let start = pairs.partition_point(|&(key, _)| key < anchor);
        let end = start + pairs[start..].partition_point(|&(key, _)| key == anchor);
        (start, end)
    }

    /// Candidates that `check` allows once its earlier state holds `anchor`.
    pub(crate) fn candidates(
        &self,
        check: &CheckEdge,
        anchor: VertexId,
    ) -> impl Iterator<Item = VertexId> {
        let (start, end) = self.range(check, anchor);
        self.sorted(check.edge, check.direction)[start..end]
            .iter()
            .map(|&(_, candidate)| candidate)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compare::Wildcard;
    use crate::domain::{PatternEdgeIndex, init_domains, init_edge_domains};
    use crate::graph::GraphBuilder;
    use arcmatch_common::{MatchMode, StateId};

    fn v(i: u32) -> VertexId {
        VertexId::new(i)
    }

    fn fan_domains() -> EdgeDomains {
        // Pattern a -> b over a target where 0 fans out to 1, 2, 3 and
        // 4 points at 2.
        let mut p = GraphBuilder::with_vertices([(), ()]);
        p.add_edge(v(0), v(1), ());
        let pattern = p.build().expect("valid graph");
        let mut t = GraphBuilder::with_vertices([(); 5]);
        for (s, h) in [(0, 1), (0, 2), (0, 3), (4, 2)] {
            t.add_edge(v(s), v(h), ());
        }
        let target = t.build().expect("valid graph");

        let nodes = init_domains(
            &pattern,
            &target,
            &Wildcard,
            &Wildcard,
            MatchMode::Monomorphism,
            true,
        )
        .expect("feasible");
        let index = PatternEdgeIndex::build(&pattern);
        init_edge_domains(&pattern, &target, &index, &nodes, &Wildcard).expect("feasible")
    }

    fn check(direction: Direction) -> CheckEdge {
        CheckEdge {
            edge: EdgeId::new(0),
            other: StateId::new(0),
            direction,
        }
    }

    #[test]
    fn runs_by_tail() {
        let ordered = OrderedEdgeDomains::new(&fan_domains());
        let out = check(Direction::Out);
        let heads = |tail| ordered.candidates(&out, tail).collect::<Vec<_>>();

        assert_eq!(heads(v(0)), vec![v(1), v(2), v(3)]);
        assert_eq!(heads(v(4)), vec![v(2)]);
        assert_eq!(ordered.range(&out, v(2)), (3, 3));
    }

    #[test]
    fn runs_by_head() {
        let ordered = OrderedEdgeDomains::new(&fan_domains());
        let inward = check(Direction::In);
        let tails = |head| ordered.candidates(&inward, head).collect::<Vec<_>>();

        assert_eq!(tails(v(2)), vec![v(0), v(4)]);
        assert_eq!(tails(v(1)), vec![v(0)]);
        assert_eq!(ordered.candidates(&inward, v(0)).count(), 0);
    }
}
