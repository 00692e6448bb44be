//! How a search ended, and what it counted on the way.

use std::fmt;

use crate::error::Infeasible;

/// Counters collected while solving.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SearchStats {
    /// Solver loop iterations.
    pub steps: u64,
    /// Candidates pulled from a cursor, before any filtering.
    pub tried_candidates: u64,
    /// Candidates that passed every check and were bound.
    pub matched_couples: u64,
    /// Matches reported, leaf groups counted in full.
    pub matches: u64,
    /// Leaf groups reported in bulk or expanded.
    pub leaf_groups: u64,
}

/// How a search ended.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SearchStatus {
    /// Every match was enumerated.
    Exhausted,
    /// The configured match ceiling was reached.
    LimitReached,
    /// A [`crate::CancelToken`] stopped the search.
    Cancelled,
    /// Propagation proved that no match exists; the solver never ran.
    Infeasible(Infeasible),
}

impl fmt::Display for SearchStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Exhausted => write!(f, "exhausted"),
            Self::LimitReached => write!(f, "limit reached"),
            Self::Cancelled => write!(f, "cancelled"),
            Self::Infeasible(reason) => write!(f, "infeasible ({reason})"),
        }
    }
}

/// Final report of a matching run, out of band from the match stream.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SearchOutcome {
    /// Why the search stopped.
    pub status: SearchStatus,
    /// Number of matches reported.
    pub matches: u64,
    /// Solver counters.
    pub stats: SearchStats,
}

impl SearchOutcome {
    pub(crate) fn infeasible(reason: Infeasible) -> Self {
        Self {
            status: SearchStatus::Infeasible(reason),
            matches: 0,
            stats: SearchStats::default(),
        }
    }

    /// True if the search ran to the end without being cut short.
    #[must_use]
    pub const fn is_complete(&self) -> bool {
        matches!(
            self.status,
            SearchStatus::Exhausted | SearchStatus::Infeasible(_)
        )
    }
}
