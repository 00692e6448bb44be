//! Match reporting.
//!
//! The solver hands every complete match to a [`MatchListener`]. The
//! leaf-batched strategy may instead hand over a whole [`LeafGroup`]; the
//! default [`MatchListener::on_match_group`] expands it into single matches.

use arcmatch_common::VertexId;

use crate::machine::MatchingMachine;
use crate::solver::LeafGroup;

/// Sorted `(pattern vertex, target vertex)` pairs of one match.
pub type Mapping = Vec<(VertexId, VertexId)>;

/// One complete match, indexed by state.
#[derive(Clone, Copy, Debug)]
pub struct Match<'a> {
    machine: &'a MatchingMachine,
    assignment: &'a [VertexId],
}

impl<'a> Match<'a> {
    pub(crate) fn new(machine: &'a MatchingMachine, assignment: &'a [VertexId]) -> Self {
        debug_assert_eq!(machine.len(), assignment.len());
        Self {
            machine,
            assignment,
        }
    }

    /// Number of pattern vertices.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.assignment.len()
    }

    /// True for the match of an empty pattern.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.assignment.is_empty()
    }

    /// Target vertex per state.
    #[must_use]
    pub const fn assignment(&self) -> &'a [VertexId] {
        self.assignment
    }

    /// Pattern vertex per state.
    #[must_use]
    pub fn state_to_vertex(&self) -> &'a [VertexId] {
        self.machine.state_to_vertex()
    }

    /// Target vertex matched to pattern vertex `q`.
    #[must_use]
    pub fn get(&self, q: VertexId) -> VertexId {
        self.assignment[self.machine.vertex_to_state()[q.as_usize()].as_usize()]
    }

    /// The match as pattern-to-target pairs ordered by pattern vertex.
    #[must_use]
    pub fn to_mapping(&self) -> Mapping {
        let mut pairs: Mapping = self
            .state_to_vertex()
            .iter()
            .copied()
            .zip(self.assignment.iter().copied())
            .collect();
        pairs.sort_unstable();
        pairs
    }
}

/// Receives matches from the solver.
pub trait MatchListener {
    /// Called once per complete match.
    fn on_match(&mut self, m: &Match<'_>);

    /// Called with a group of matches sharing every non-leaf binding.
    fn on_match_group(&mut self, group: &LeafGroup<'_>) {
        group.for_each_match(|m| self.on_match(m));
    }
}

impl<F> MatchListener for F
where
    F: FnMut(&Match<'_>),
{
    fn on_match(&mut self, m: &Match<'_>) {
        self(m);
    }
}

/// Materializes every match as a [`Mapping`].
#[derive(Clone, Debug, Default)]
pub struct MatchCollector {
    matches: Vec<Mapping>,
}

impl MatchCollector {
    /// Empty collector.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Matches collected so far, in report order.
    #[must_use]
    pub fn matches(&self) -> &[Mapping] {
        &self.matches
    }

    /// Take the collected matches.
    #[must_use]
    pub fn into_matches(self) -> Vec<Mapping> {
        self.matches
    }
}

impl MatchListener for MatchCollector {
    fn on_match(&mut self, m: &Match<'_>) {
        self.matches.push(m.to_mapping());
    }
}

/// Counts matches without materializing them.
#[derive(Clone, Copy, Debug, Default)]
pub struct MatchCounter {
    count: u64,
}

impl MatchCounter {
    /// Zeroed counter.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Matches seen so far.
    #[must_use]
    pub const fn count(&self) -> u64 {
        self.count
    }
}

impl MatchListener for MatchCounter {
    fn on_match(&mut self, _: &Match<'_>) {
        self.count += 1;
    }

    fn on_match_group(&mut self, group: &LeafGroup<'_>) {
        self.count = self.count.saturating_add(group.count());
    }
}
