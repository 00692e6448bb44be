//! Wall-clock totals per matching phase.
//!
//! With the `profiling` feature every [`Timer`] adds its lifetime to a
//! process-wide table keyed by [`Phase`]. Without it timers are zero-sized
//! and [`snapshot`] is always empty.

use std::fmt;
use std::time::Duration;

/// A timed step of a matcher run.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Phase {
    /// Domains plus planning.
    Prepare,
    /// [`DomainSet::compute`](crate::domain::DomainSet::compute).
    Domains,
    /// [`MatchingMachine::plan`](crate::machine::MatchingMachine::plan).
    Plan,
    /// [`Solver::solve`](crate::solver::Solver::solve).
    Solve,
}

impl Phase {
    /// Name used in reports.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Prepare => "matcher::prepare",
            Self::Domains => "domain::compute",
            Self::Plan => "machine::plan",
            Self::Solve => "solver::solve",
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.label())
    }
}

/// Samples accumulated for one phase.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PhaseTotals {
    /// Number of timed calls.
    pub calls: u64,
    /// Summed wall-clock time.
    pub total: Duration,
}

impl PhaseTotals {
    /// Mean time per call; zero before the first sample.
    #[must_use]
    pub fn mean(&self) -> Duration {
        let calls = u32::try_from(self.calls).unwrap_or(u32::MAX);
        self.total.checked_div(calls).unwrap_or_default()
    }

    /// Fold in one sample.
    fn add(&mut self, elapsed: Duration) {
        self.calls += 1;
        self.total = self.total.saturating_add(elapsed);
    }
}

#[cfg(feature = "profiling")]
mod enabled {
    use std::sync::OnceLock;
    use std::time::{Duration, Instant};

    use dashmap::DashMap;

    use super::{Phase, PhaseTotals};

    static TOTALS: OnceLock<DashMap<Phase, PhaseTotals>> = OnceLock::new();

    /// Process-wide table, created on first use.
    fn totals() -> &'static DashMap<Phase, PhaseTotals> {
        TOTALS.get_or_init(DashMap::new)
    }

    /// Adds its lifetime to the totals of a phase when dropped.
    #[derive(Debug)]
    pub struct Timer {
        phase: Phase,
        start: Instant,
    }

    impl Timer {
        /// Start timing `phase`.
        #[inline]
        #[must_use]
        pub fn new(phase: Phase) -> Self {
            Self {
                phase,
                start: Instant::now(),
            }
        }
    }

    impl Drop for Timer {
        fn drop(&mut self) {
            record(self.phase, self.start.elapsed());
        }
    }

    /// Add one sample to `phase`.
    pub fn record(phase: Phase, elapsed: Duration) {
        totals().entry(phase).or_default().add(elapsed);
    }

    /// Every phase seen so far, longest total first.
    #[must_use]
    pub fn snapshot() -> Vec<(Phase, PhaseTotals)> {
        let mut rows: Vec<(Phase, PhaseTotals)> =
            totals().iter().map(|kv| (*kv.key(), *kv.value())).collect();
        rows.sort_by(|a, b| b.1.total.cmp(&a.1.total).then(a.0.cmp(&b.0)));
        rows
    }
}

#[cfg(not(feature = "profiling"))]
mod disabled {
    use std::time::Duration;

    use super::{Phase, PhaseTotals};

    /// Zero-sized stand-in.
    #[derive(Clone, Copy, Debug)]
    pub struct Timer;

    impl Timer {
        /// Does nothing.
        #[inline]
        #[must_use]
        pub const fn new(_: Phase) -> Self {
            Self
        }
    }

    /// Does nothing.
    pub const fn record(_: Phase, _: Duration) {}

    /// Always empty.
    #[must_use]
    pub const fn snapshot() -> Vec<(Phase, PhaseTotals)> {
        Vec::new()
    }
}

#[cfg(feature = "profiling")]
pub use enabled::{Timer, record, snapshot};

#[cfg(not(feature = "profiling"))]
pub use disabled::{Timer, record, snapshot};

/// Log the current totals at debug level.
pub fn report() {
    for (phase, totals) in snapshot() {
        tracing::debug!(
            "{phase:<18} calls={:<8} total={:>10.3?} mean={:>10.3?}",
            totals.calls,
            totals.total,
            totals.mean()
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mean_of_no_samples_is_zero() {
        assert_eq!(PhaseTotals::default().mean(), Duration::ZERO);

        let mut totals = PhaseTotals::default();
        totals.add(Duration::from_millis(3));
        totals.add(Duration::from_millis(5));
        assert_eq!(totals.calls, 2);
        assert_eq!(totals.mean(), Duration::from_millis(4));
    }

    #[test]
    fn labels_name_the_phase_owner() {
        assert_eq!(Phase::Domains.to_string(), "domain::compute");
        assert_eq!(Phase::Plan.label(), "machine::plan");
    }

    #[cfg(not(feature = "profiling"))]
    #[test]
    fn disabled_timers_record_nothing() {
        drop(Timer::new(Phase::Solve));
        record(Phase::Solve, Duration::from_secs(1));
        assert!(snapshot().is_empty());
    }

    #[cfg(feature = "profiling")]
    #[test]
    fn a_run_records_every_phase() {
        use crate::compare::Wildcard;
        use crate::graph::GraphBuilder;
        use crate::matcher::SubgraphMatcher;
        use arcmatch_common::{Config, VertexId};

        let mut t = GraphBuilder::with_vertices([(); 3]);
        t.add_edge(VertexId::new(0), VertexId::new(1), ())
            .add_edge(VertexId::new(1), VertexId::new(2), ());
        let target = t.build().expect("valid graph");
        let config = Config::default();
        let matcher = SubgraphMatcher::new(&target, &target, &Wildcard, &Wildcard, &config);
        let outcome = matcher.count();
        assert_eq!(outcome.matches, 1);

        let phases: Vec<Phase> = snapshot().into_iter().map(|(phase, _)| phase).collect();
        for phase in [Phase::Prepare, Phase::Domains, Phase::Plan, Phase::Solve] {
            assert!(phases.contains(&phase), "{phase} missing from {phases:?}");
        }
        assert!(snapshot().iter().all(|(_, totals)| totals.calls >= 1));
    }
}
