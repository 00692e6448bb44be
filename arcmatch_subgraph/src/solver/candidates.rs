//! Candidate generation and verification per strategy.

use arcmatch_common::{EdgeId, SolverStrategy, StateId, VertexId};

use super::Solver;
use crate::assignment::Assignment;
use crate::compare::AttributeComparator;
use crate::machine::{CheckEdge, Direction, MachineState};
use crate::outcome::SearchStats;

/// Where a cursor pulls its candidates from.
#[derive(Clone, Copy, Debug)]
enum Source {
    /// Nothing left to try.
    Exhausted,
    /// The node domain of a pattern vertex.
    Domain(VertexId),
    /// Target successors of an anchor value.
    Successors(VertexId),
    /// Target predecessors of an anchor value.
    Predecessors(VertexId),
    /// A sorted edge-domain run.
    Tuples { edge: EdgeId, direction: Direction },
}

/// Position inside one state's candidate stream.
#[derive(Clone, Copy, Debug)]
pub(super) struct Cursor {
    source: Source,
    pos: usize,
    end: usize,
    /// Index of the check edge that generated the stream; implied by
    /// construction and skipped during verification.
    generator: Option<usize>,
}

impl Cursor {
    const fn exhausted() -> Self {
        Self {
            source: Source::Exhausted,
            pos: 0,
            end: 0,
            generator: None,
        }
    }
}

impl<N, E, EC> Solver<'_, N, E, EC>
where
    EC: AttributeComparator<E> + ?Sized,
{
    /// Open the candidate stream for state `s` given the bound prefix.
    pub(super) fn open(&self, s: StateId, assignment: &Assignment) -> Cursor {
        let state = self.machine.state(s);
        match self.strategy {
            SolverStrategy::Plain => match state.parent {
                None => self.domain_cursor(state.vertex),
                Some(parent) => {
                    let anchor = assignment.value(parent.other);
                    let (source, end) = match parent.direction {
                        Direction::Out => (
                            Source::Successors(anchor),
                            self.target.successors(anchor).len(),
                        ),
                        Direction::In => (
                            Source::Predecessors(anchor),
                            self.target.predecessors(anchor).len(),
                        ),
                    };
                    Cursor {
                        source,
                        pos: 0,
                        end,
                        generator: None,
                    }
                }
            },
            SolverStrategy::EdgeDomain => match state.parent {
                None => self.domain_cursor(state.vertex),
                Some(parent) => {
                    let generator = state.checks.iter().position(|c| *c == parent);
                    self.tuple_cursor(&parent, generator, assignment)
                }
            },
            SolverStrategy::RankedParent | SolverStrategy::LeafBatched => {
                if state.checks.is_empty() {
                    return self.domain_cursor(state.vertex);
                }
                // The check with the largest run generates; every other
                // check is verified per candidate.
                let mut best: Option<(usize, usize)> = None;
                for (i, check) in state.checks.iter().enumerate() {
                    let anchor = assignment.value(check.other);
                    let (start, end) = self.ordered.range(check, anchor);
                    if start == end {
                        return Cursor::exhausted();
                    }
                    if best.is_none_or(|(_, size)| end - start > size) {
                        best = Some((i, end - start));
                    }
                }
                match best {
                    Some((i, _)) => self.tuple_cursor(&state.checks[i], Some(i), assignment),
                    None => Cursor::exhausted(),
                }
            }
        }
    }

    fn domain_cursor(&self, q: VertexId) -> Cursor {
        Cursor {
            source: Source::Domain(q),
            pos: 0,
            end: self.members[q.as_usize()].len(),
            generator: None,
        }
    }

    fn tuple_cursor(
        &self,
        check: &CheckEdge,
        generator: Option<usize>,
        assignment: &Assignment,
    ) -> Cursor {
        let (pos, end) = self.ordered.range(check, assignment.value(check.other));
        Cursor {
            source: Source::Tuples {
                edge: check.edge,
                direction: check.direction,
            },
            pos,
            end,
            generator,
        }
    }

    fn fetch(&self, cursor: &Cursor) -> Option<VertexId> {
        let pos = cursor.pos;
        match cursor.source {
            Source::Exhausted => None,
            Source::Domain(q) => self.members[q.as_usize()].get(pos).copied(),
            Source::Successors(anchor) => self.target.successors(anchor).get(pos).copied(),
            Source::Predecessors(anchor) => self.target.predecessors(anchor).get(pos).copied(),
            Source::Tuples { edge, direction } => self
                .ordered
                .sorted(edge, direction)
                .get(pos)
                .map(|&(_, candidate)| candidate),
        }
    }

    /// Pull the next candidate of state `s` that passes every check.
    pub(super) fn next_candidate(
        &self,
        s: StateId,
        cursor: &mut Cursor,
        assignment: &Assignment,
        stats: &mut SearchStats,
    ) -> Option<VertexId> {
        let state = self.machine.state(s);
        while cursor.pos < cursor.end {
            let v = self.fetch(cursor)?;
            cursor.pos += 1;
            stats.tried_candidates += 1;

            if assignment.is_used(v) || !self.domains.nodes().contains(state.vertex, v) {
                continue;
            }
            if self.verify(state, v, cursor.generator, assignment) {
                return Some(v);
            }
        }
        None
    }

    /// Every check edge except the generator, then every self-loop.
    fn verify(
        &self,
        state: &MachineState,
        v: VertexId,
        generator: Option<usize>,
        assignment: &Assignment,
    ) -> bool {
        let checks_hold = state
            .checks
            .iter()
            .enumerate()
            .filter(|&(i, _)| Some(i) != generator)
            .all(|(_, check)| {
                let (tail, head) = check.oriented(assignment.value(check.other), v);
                self.edge_holds(check.edge, tail, head)
            });
        checks_hold && state.self_loops.iter().all(|&e| self.edge_holds(e, v, v))
    }

    /// True if pattern edge `e` may map onto the target edge `tail -> head`.
    fn edge_holds(&self, e: EdgeId, tail: VertexId, head: VertexId) -> bool {
        if self.strategy == SolverStrategy::Plain {
            let attr = self.domains.index().attr(self.pattern, e);
            self.target
                .edges_between(tail, head)
                .any(|target_attr| self.edge_cmp.compatible(attr, target_attr))
        } else {
            self.domains.edges().contains(e, tail, head)
        }
    }

    /// Leaf candidates of state `s`: the run of its only check edge,
    /// minus used vertices.
    pub(super) fn leaf_candidates(&self, s: StateId, assignment: &Assignment) -> Vec<VertexId> {
        let state = self.machine.state(s);
        state
            .checks
            .first()
            .map(|check| {
                self.ordered
                    .candidates(check, assignment.value(check.other))
                    .filter(|&v| {
                        !assignment.is_used(v) && self.domains.nodes().contains(state.vertex, v)
                    })
                    .collect()
            })
            .unwrap_or_default()
    }
}
