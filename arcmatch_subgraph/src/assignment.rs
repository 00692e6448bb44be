//! Partial mapping from matching-machine states to target vertices.

use arcmatch_common::{StateId, VertexId};
use contracts::{debug_ensures, debug_requires};
use fixedbitset::FixedBitSet;

/// Values bound to the states `[0, len)` plus the set of used target
/// vertices. The bound states always form a prefix of the search order.
#[derive(Clone, Debug)]
pub(crate) struct Assignment {
    /// Target vertex per bound state, in state order.
    solution: Vec<VertexId>,
    /// Target vertices taken by some bound state.
    used: FixedBitSet,
}

impl Assignment {
    pub(crate) fn new(state_count: usize, target_count: usize) -> Self {
        Self {
            solution: Vec::with_capacity(state_count),
            used: FixedBitSet::with_capacity(target_count),
        }
    }

    /// Every bound value is marked used and no value is bound twice.
    pub(crate) fn is_consistent(&self) -> bool {
        self.used.count_ones(..) == self.solution.len()
            && self.solution.iter().all(|v| self.used.contains(v.as_usize()))
    }

    /// Number of bound states.
    pub(crate) fn len(&self) -> usize {
        self.solution.len()
    }

    /// Value bound to an earlier state.
    #[debug_requires(state.as_usize() < self.len(), "state is not bound yet")]
    pub(crate) fn value(&self, state: StateId) -> VertexId {
        self.solution[state.as_usize()]
    }

    /// True if some bound state already uses `v`.
    pub(crate) fn is_used(&self, v: VertexId) -> bool {
        self.used.contains(v.as_usize())
    }

    /// Bind the next state to `v`.
    #[debug_requires(!self.is_used(v), "target vertex is already bound")]
    #[debug_ensures(self.len() == old(self.len()) + 1)]
    #[debug_ensures(self.is_consistent())]
    pub(crate) fn bind(&mut self, v: VertexId) {
        self.used.insert(v.as_usize());
        self.solution.push(v);
    }

    /// Release the most recently bound state.
    #[debug_ensures(self.is_consistent())]
    pub(crate) fn unbind(&mut self) -> Option<VertexId> {
        let v = self.solution.pop()?;
        self.used.set(v.as_usize(), false);
        Some(v)
    }

    /// Bound values in state order.
    pub(crate) fn as_slice(&self) -> &[VertexId] {
        &self.solution
    }
}
