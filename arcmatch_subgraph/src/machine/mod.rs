//! Matching machine: the search order and per-state verification plan.
//!
//! States are bound one after another by the solver. Each state knows which
//! pattern edges tie it to earlier states (its check edges), which one of
//! those generates candidates (its parent) and which self-loops it carries.
//! A trailing run of leaf states can be counted combinatorially.

mod heuristics;
mod leaves;

use std::fmt;

use arcmatch_common::{EdgeId, PlannerHeuristic, StateId, VertexId};
use contracts::debug_ensures;
use itertools::Itertools;
use tracing::debug;

use crate::domain::{DomainSet, PatternEdgeIndex};

/// Orientation of a check edge relative to the earlier state it references.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Direction {
    /// The edge runs from the earlier state's vertex into this one, so
    /// candidates are successors of the earlier value.
    Out,
    /// The edge runs from this state's vertex into the earlier one, so
    /// candidates are predecessors of the earlier value.
    In,
}

/// A pattern edge between a state and a strictly earlier state.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct CheckEdge {
    /// Pattern edge id, the key into edge domains.
    pub edge: EdgeId,
    /// The earlier endpoint.
    pub other: StateId,
    /// Orientation relative to `other`.
    pub direction: Direction,
}

impl CheckEdge {
    /// `(tail, head)` of the target edge this check requires, given the
    /// value bound to `other` and a candidate for the current state.
    #[must_use]
    pub const fn oriented(&self, anchor: VertexId, candidate: VertexId) -> (VertexId, VertexId) {
        match self.direction {
            Direction::Out => (anchor, candidate),
            Direction::In => (candidate, anchor),
        }
    }
}

/// One position of the search order.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MachineState {
    /// Pattern vertex bound at this state.
    pub vertex: VertexId,
    /// Edges to earlier states, ordered by edge id.
    pub checks: Vec<CheckEdge>,
    /// Self-loops of `vertex`, verified against the candidate itself.
    pub self_loops: Vec<EdgeId>,
    /// The check edge used to generate candidates; `None` for a root.
    pub parent: Option<CheckEdge>,
}

impl MachineState {
    /// True if candidates come from the node domain.
    #[must_use]
    pub const fn is_root(&self) -> bool {
        self.parent.is_none()
    }
}

/// Search order over pattern vertices plus verification metadata.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MatchingMachine {
    states: Vec<MachineState>,
    state_to_vertex: Vec<VertexId>,
    vertex_to_state: Vec<StateId>,
    leaf_count: usize,
}

impl MatchingMachine {
    /// Plan the search order for the pattern described by `domains`.
    ///
    /// Singleton-domain vertices come first in ascending id order, then the
    /// chosen heuristic orders the rest. With `defer_leaves`, eligible leaf
    /// vertices are withheld and appended last in ascending id order.
    #[must_use]
    #[debug_ensures(ret.is_well_formed())]
    pub fn plan(domains: &DomainSet, heuristic: PlannerHeuristic, defer_leaves: bool) -> Self {
        let index = domains.index();
        let withheld = if defer_leaves {
            leaves::deferrable_leaves(index, domains.nodes())
        } else {
            Vec::new()
        };

        let ctx = heuristics::PlanContext::new(domains, &withheld);
        let mut order = match heuristic {
            PlannerHeuristic::NodeSets => heuristics::node_sets(&ctx),
            PlannerHeuristic::EdgeWeights => heuristics::edge_weights(&ctx),
            PlannerHeuristic::AngularCoefficient => heuristics::angular_coefficient(&ctx),
            PlannerHeuristic::NodeSetsCascade => heuristics::node_sets_cascade(&ctx),
        };
        order.extend(withheld.iter().map(|&q| (q, None)));

        let machine = Self::assemble(index, domains, &order);
        debug!(
            "planned {} state(s) with {:?}, {} leaf state(s)",
            machine.len(),
            heuristic,
            machine.leaf_count
        );
        machine
    }

    /// Turn an ordered list of `(vertex, preferred parent vertex)` into states.
    fn assemble(
        index: &PatternEdgeIndex,
        domains: &DomainSet,
        order: &[(VertexId, Option<VertexId>)],
    ) -> Self {
        let n = order.len();
        let mut vertex_to_state = vec![StateId::new(0); n];
        for (i, &(q, _)) in order.iter().enumerate() {
            vertex_to_state[q.as_usize()] = StateId::from(i);
        }
        let ed_size = |c: &CheckEdge| domains.edges().len(c.edge);

        let states: Vec<MachineState> = order
            .iter()
            .enumerate()
            .map(|(i, &(q, preferred))| {
                let outs = index.out_edges(q).iter().filter_map(|&e| {
                    let other = vertex_to_state[index.get(e).target.as_usize()];
                    (other.as_usize() < i).then_some(CheckEdge {
                        edge: e,
                        other,
                        direction: Direction::In,
                    })
                });
                let ins = index.in_edges(q).iter().filter_map(|&e| {
                    let other = vertex_to_state[index.get(e).source.as_usize()];
                    (other.as_usize() < i).then_some(CheckEdge {
                        edge: e,
                        other,
                        direction: Direction::Out,
                    })
                });
                let checks: Vec<CheckEdge> = outs.chain(ins).sorted_by_key(|c| c.edge).collect();

                let preferred_parent = preferred.and_then(|p| {
                    let ps = vertex_to_state[p.as_usize()];
                    checks.iter().filter(|c| c.other == ps).min_by_key(|c| ed_size(*c))
                });
                let parent = preferred_parent
                    .or_else(|| checks.iter().min_by_key(|c| ed_size(*c)))
                    .copied();

                MachineState {
                    vertex: q,
                    checks,
                    self_loops: index.self_loops(q).collect(),
                    parent,
                }
            })
            .collect();

        let leaf_count = leaves::trailing_leaf_count(&states, index);
        Self {
            state_to_vertex: order.iter().map(|&(q, _)| q).collect(),
            states,
            vertex_to_state,
            leaf_count,
        }
    }

    /// Number of states.
    #[must_use]
    pub fn len(&self) -> usize {
        self.states.len()
    }

    /// True for an empty pattern.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }

    /// State at position `s`.
    #[must_use]
    pub fn state(&self, s: StateId) -> &MachineState {
        &self.states[s.as_usize()]
    }

    /// Every state in search order.
    #[must_use]
    pub fn states(&self) -> &[MachineState] {
        &self.states
    }

    /// Pattern vertex of each state.
    #[must_use]
    pub fn state_to_vertex(&self) -> &[VertexId] {
        &self.state_to_vertex
    }

    /// State of each pattern vertex.
    #[must_use]
    pub fn vertex_to_state(&self) -> &[StateId] {
        &self.vertex_to_state
    }

    /// Length of the trailing run of leaf states.
    #[must_use]
    pub const fn leaf_count(&self) -> usize {
        self.leaf_count
    }

    /// Position of the first leaf state; equals `len()` without leaves.
    #[must_use]
    pub fn leaf_start(&self) -> usize {
        self.states.len() - self.leaf_count
    }

    /// The order is a permutation, every check edge points strictly
    /// backwards and every parent is one of its state's check edges.
    #[must_use]
    pub fn is_well_formed(&self) -> bool {
        let n = self.states.len();
        let permutation = self.state_to_vertex.iter().enumerate().all(|(i, q)| {
            q.as_usize() < n && self.vertex_to_state[q.as_usize()].as_usize() == i
        });
        let backwards = self.states.iter().enumerate().all(|(i, s)| {
            s.checks.iter().all(|c| c.other.as_usize() < i)
                && s.parent.is_none_or(|p| s.checks.contains(&p))
                && s.parent.is_some() == !s.checks.is_empty()
        });
        permutation && backwards && self.leaf_count <= n
    }
}

impl fmt::Display for MatchingMachine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, s) in self.states.iter().enumerate() {
            let parent = match s.parent {
                Some(p) => format!("parent {} via {} ({:?})", p.other, p.edge, p.direction),
                None => "root".to_owned(),
            };
            let checks = s
                .checks
                .iter()
                .map(|c| format!("{}:{}", c.edge, c.other))
                .join(" ");
            write!(
                f,
                "{} = {} {parent} checks [{checks}]",
                StateId::from(i),
                s.vertex
            )?;
            if !s.self_loops.is_empty() {
                write!(f, " loops [{}]", s.self_loops.iter().join(" "))?;
            }
            writeln!(f)?;
        }
        writeln!(f, "leaves: {}", self.leaf_count)
    }
}
