//! Backtracking search over a matching machine.
//!
//! The solver binds states in machine order, pulling candidates from a
//! per-state cursor whose source depends on the [`SolverStrategy`]. It keeps
//! an explicit cursor stack instead of recursing so that deep patterns do
//! not grow the call stack.

mod candidates;
mod leaf;
mod ordered;

use std::ops::ControlFlow;

use arcmatch_common::{MatchLimit, SolverStrategy, StateId, VertexId};
use tracing::{debug, trace};

use crate::assignment::Assignment;
use crate::cancel::CancelToken;
use crate::compare::AttributeComparator;
use crate::domain::DomainSet;
use crate::graph::Graph;
use crate::listener::{Match, MatchListener};
use crate::machine::MatchingMachine;
use crate::outcome::{SearchOutcome, SearchStats, SearchStatus};
use crate::profiling::{Phase, Timer};

use candidates::Cursor;
pub use leaf::LeafGroup;
use ordered::OrderedEdgeDomains;

/// Enumerates the matches of one planned pattern against one target.
pub struct Solver<'a, N, E, EC: ?Sized> {
    pattern: &'a Graph<N, E>,
    target: &'a Graph<N, E>,
    edge_cmp: &'a EC,
    domains: &'a DomainSet,
    machine: &'a MatchingMachine,
    strategy: SolverStrategy,
    limit: MatchLimit,
    cancel: Option<&'a CancelToken>,
    /// Node domain members per pattern vertex, for root cursors.
    members: Vec<Vec<VertexId>>,
    /// Sorted edge domains; left empty for the plain strategy.
    ordered: OrderedEdgeDomains,
}

impl<'a, N, E, EC> Solver<'a, N, E, EC>
where
    EC: AttributeComparator<E> + ?Sized,
{
    /// Prepare a solver. `domains` and `machine` must come from the same
    /// pattern and target.
    pub fn new(
        pattern: &'a Graph<N, E>,
        target: &'a Graph<N, E>,
        edge_cmp: &'a EC,
        domains: &'a DomainSet,
        machine: &'a MatchingMachine,
        strategy: SolverStrategy,
    ) -> Self {
        let nodes = domains.nodes();
        let members = (0..nodes.len())
            .map(|q| nodes.members(VertexId::from(q)).collect())
            .collect();
        let ordered = match strategy {
            SolverStrategy::Plain => OrderedEdgeDomains::default(),
            _ => OrderedEdgeDomains::new(domains.edges()),
        };
        Self {
            pattern,
            target,
            edge_cmp,
            domains,
            machine,
            strategy,
            limit: MatchLimit::All,
            cancel: None,
            members,
            ordered,
        }
    }

    /// Stop after the given number of matches.
    #[must_use]
    pub const fn with_limit(mut self, limit: MatchLimit) -> Self {
        self.limit = limit;
        self
    }

    /// Poll `token` once per iteration.
    #[must_use]
    pub const fn with_cancel(mut self, token: &'a CancelToken) -> Self {
        self.cancel = Some(token);
        self
    }

    /// Run the search, reporting matches to `listener`.
    pub fn solve<L: MatchListener + ?Sized>(&self, listener: &mut L) -> SearchOutcome {
        let _timer = Timer::new(Phase::Solve);
        let mut stats = SearchStats::default();
        let status = self.search(listener, &mut stats);
        debug!(
            "search {status}: {} match(es), {} step(s), {} candidate(s) tried",
            stats.matches, stats.steps, stats.tried_candidates
        );
        SearchOutcome {
            status,
            matches: stats.matches,
            stats,
        }
    }

    fn search<L: MatchListener + ?Sized>(
        &self,
        listener: &mut L,
        stats: &mut SearchStats,
    ) -> SearchStatus {
        let k = self.machine.len();
        let ceiling = self.limit.ceiling();
        if k == 0 {
            return SearchStatus::Exhausted;
        }
        if ceiling == Some(0) {
            return SearchStatus::LimitReached;
        }

        let batch_from = match self.strategy {
            SolverStrategy::LeafBatched if self.machine.leaf_count() > 0 => {
                self.machine.leaf_start()
            }
            _ => k,
        };
        let mut assignment = Assignment::new(k, self.target.vertex_count());
        let mut cursors: Vec<Cursor> = Vec::with_capacity(k);
        cursors.push(self.open(StateId::new(0), &assignment));

        loop {
            if self.cancel.is_some_and(CancelToken::is_cancelled) {
                return SearchStatus::Cancelled;
            }
            stats.steps += 1;

            let Some(si) = cursors.len().checked_sub(1) else {
                return SearchStatus::Exhausted;
            };
            let state = StateId::from(si);
            let Some(v) = self.next_candidate(state, &mut cursors[si], &assignment, stats) else {
                cursors.pop();
                if cursors.is_empty() {
                    return SearchStatus::Exhausted;
                }
                assignment.unbind();
                continue;
            };

            assignment.bind(v);
            stats.matched_couples += 1;
            trace!("{state} <- {v}");

            if si + 1 == k {
                listener.on_match(&Match::new(self.machine, assignment.as_slice()));
                stats.matches += 1;
                assignment.unbind();
                if ceiling.is_some_and(|c| stats.matches >= c) {
                    return SearchStatus::LimitReached;
                }
            } else if si + 1 == batch_from {
                let flow = self.report_leaves(listener, &assignment, ceiling, stats);
                assignment.unbind();
                if flow.is_break() {
                    return SearchStatus::LimitReached;
                }
            } else {
                cursors.push(self.open(StateId::from(si + 1), &assignment));
            }
        }
    }

    /// Hand the leaf completions of the current core binding to the
    /// listener. Breaks once the match ceiling is reached.
    fn report_leaves<L: MatchListener + ?Sized>(
        &self,
        listener: &mut L,
        assignment: &Assignment,
        ceiling: Option<u64>,
        stats: &mut SearchStats,
    ) -> ControlFlow<()> {
        let sets: Vec<Vec<VertexId>> = (self.machine.leaf_start()..self.machine.len())
            .map(|s| self.leaf_candidates(StateId::from(s), assignment))
            .collect();
        let group = LeafGroup::new(self.machine, assignment.as_slice(), sets);
        if group.count() == 0 {
            return ControlFlow::Continue(());
        }
        stats.leaf_groups += 1;

        match ceiling {
            None => {
                listener.on_match_group(&group);
                stats.matches = stats.matches.saturating_add(group.count());
                ControlFlow::Continue(())
            }
            Some(c) => group.for_each_tuple(|full| {
                listener.on_match(&Match::new(self.machine, full));
                stats.matches += 1;
                if stats.matches >= c {
                    ControlFlow::Break(())
                } else {
                    ControlFlow::Continue(())
                }
            }),
        }
    }
}
