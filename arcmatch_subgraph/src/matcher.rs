//! Entry point tying the phases together.
//!
//! A run computes domains, plans the matching machine and solves, logging
//! each phase boundary. Infeasibility found during propagation ends the run
//! before the solver starts.

use std::time::Instant;

use arcmatch_common::Config;
use tracing::{debug, info};

#[cfg(feature = "rayon")]
use rayon::prelude::*;

use crate::cancel::CancelToken;
use crate::compare::AttributeComparator;
use crate::domain::DomainSet;
use crate::error::Infeasible;
use crate::graph::Graph;
use crate::listener::{Mapping, MatchCollector, MatchCounter, MatchListener};
use crate::machine::MatchingMachine;
use crate::outcome::SearchOutcome;
use crate::profiling::{self, Phase, Timer};
use crate::solver::Solver;

/// Propagated domains plus the machine planned from them.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MatchPlan {
    domains: DomainSet,
    machine: MatchingMachine,
}

impl MatchPlan {
    /// Frozen node and edge domains.
    #[must_use]
    pub const fn domains(&self) -> &DomainSet {
        &self.domains
    }

    /// The search order.
    #[must_use]
    pub const fn machine(&self) -> &MatchingMachine {
        &self.machine
    }
}

/// Finds the occurrences of `pattern` in `target`.
pub struct SubgraphMatcher<'a, N, E, NC: ?Sized, EC: ?Sized> {
    pattern: &'a Graph<N, E>,
    target: &'a Graph<N, E>,
    node_cmp: &'a NC,
    edge_cmp: &'a EC,
    config: &'a Config,
    cancel: Option<CancelToken>,
}

impl<'a, N, E, NC, EC> SubgraphMatcher<'a, N, E, NC, EC>
where
    NC: AttributeComparator<N> + ?Sized,
    EC: AttributeComparator<E> + ?Sized,
{
    /// A matcher for one pattern/target pair.
    #[must_use]
    pub const fn new(
        pattern: &'a Graph<N, E>,
        target: &'a Graph<N, E>,
        node_cmp: &'a NC,
        edge_cmp: &'a EC,
        config: &'a Config,
    ) -> Self {
        Self {
            pattern,
            target,
            node_cmp,
            edge_cmp,
            config,
            cancel: None,
        }
    }

    /// Let `token` stop the search from a listener or another thread.
    #[must_use]
    pub fn with_cancel(mut self, token: CancelToken) -> Self {
        self.cancel = Some(token);
        self
    }

    /// Compute domains and plan the search without solving.
    ///
    /// # Errors
    ///
    /// Returns [`Infeasible`] when propagation empties a domain.
    pub fn prepare(&self) -> Result<MatchPlan, Infeasible> {
        let _timer = Timer::new(Phase::Prepare);
        let start = Instant::now();

        let domains = {
            let _timer = Timer::new(Phase::Domains);
            DomainSet::compute(
                self.pattern,
                self.target,
                self.node_cmp,
                self.edge_cmp,
                self.config.mode,
                self.config.propagation,
            )?
        };
        info!(
            "domains ready in {:?}: {} pattern vertices, {} pattern edges",
            start.elapsed(),
            domains.nodes().len(),
            domains.index().len()
        );
        debug!("domains:\n{domains}");

        let machine = {
            let _timer = Timer::new(Phase::Plan);
            MatchingMachine::plan(&domains, self.config.planner, self.config.leaves_deferred())
        };
        info!(
            "planned {} state(s) with {:?}, {} leaf state(s)",
            machine.len(),
            self.config.planner,
            machine.leaf_count()
        );
        debug!("matching machine:\n{machine}");

        Ok(MatchPlan { domains, machine })
    }

    /// Solve an already prepared plan.
    pub fn run_plan<L: MatchListener + ?Sized>(
        &self,
        plan: &MatchPlan,
        listener: &mut L,
    ) -> SearchOutcome {
        let mut solver = Solver::new(
            self.pattern,
            self.target,
            self.edge_cmp,
            &plan.domains,
            &plan.machine,
            self.config.strategy,
        )
        .with_limit(self.config.limit);
        if let Some(token) = &self.cancel {
            solver = solver.with_cancel(token);
        }
        solver.solve(listener)
    }

    /// Run every phase, reporting matches to `listener`.
    pub fn run<L: MatchListener + ?Sized>(&self, listener: &mut L) -> SearchOutcome {
        let start = Instant::now();
        let plan = match self.prepare() {
            Ok(plan) => plan,
            Err(reason) => {
                info!("pattern is infeasible: {reason}");
                return SearchOutcome::infeasible(reason);
            }
        };

        let outcome = self.run_plan(&plan, listener);
        info!(
            "search {} with {} match(es) in {:?} ({:?})",
            outcome.status,
            outcome.matches,
            start.elapsed(),
            self.config.strategy
        );
        profiling::report();
        outcome
    }

    /// Run and materialize every match.
    #[must_use]
    pub fn collect(&self) -> (SearchOutcome, Vec<Mapping>) {
        let mut collector = MatchCollector::new();
        let outcome = self.run(&mut collector);
        (outcome, collector.into_matches())
    }

    /// Run and only count matches.
    #[must_use]
    pub fn count(&self) -> SearchOutcome {
        self.run(&mut MatchCounter::new())
    }

    /// Count the matches of every pattern against one target, one
    /// independent run per pattern. Runs in parallel with the `rayon`
    /// feature.
    #[must_use]
    pub fn count_many(
        patterns: &'a [Graph<N, E>],
        target: &'a Graph<N, E>,
        node_cmp: &'a NC,
        edge_cmp: &'a EC,
        config: &'a Config,
    ) -> Vec<SearchOutcome>
    where
        N: Sync,
        E: Sync,
        NC: Sync,
        EC: Sync,
    {
        #[cfg(feature = "rayon")]
        let iter = patterns.par_iter();
        #[cfg(not(feature = "rayon"))]
        let iter = patterns.iter();

        iter.map(|pattern| {
            SubgraphMatcher::new(pattern, target, node_cmp, edge_cmp, config).count()
        })
        .collect()
    }
}
