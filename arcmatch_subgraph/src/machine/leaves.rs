use arcmatch_common::VertexId;

use super::MachineState;
use crate::domain::{NodeDomains, PatternEdgeIndex};

/// Pattern vertices that can be postponed to the end of the order.
///
/// A leaf has a single incident edge, no self-loop and more than one
/// candidate, and its only neighbour is not itself of degree one. Returned in
/// ascending id order.
pub(super) fn deferrable_leaves(index: &PatternEdgeIndex, nodes: &NodeDomains) -> Vec<VertexId> {
    (0..index.vertex_count())
        .map(VertexId::from)
        .filter(|&q| {
            if index.degree(q) != 1 || nodes.is_singleton(q) {
                return false;
            }
            index
                .incident(q)
                .next()
                .is_some_and(|(_, neighbour)| index.degree(neighbour) != 1)
        })
        .collect()
}

/// Length of the trailing run of states with exactly one check edge, no
/// self-loop and a pattern vertex of degree one.
pub(super) fn trailing_leaf_count(states: &[MachineState], index: &PatternEdgeIndex) -> usize {
    states
        .iter()
        .rev()
        .take_while(|s| {
            s.checks.len() == 1 && s.self_loops.is_empty() && index.degree(s.vertex) == 1
        })
        .count()
}
