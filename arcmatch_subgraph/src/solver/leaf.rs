//! Combinatorial handling of the trailing leaf states.
//!
//! Once every non-leaf state is bound, each leaf has a fixed candidate set
//! and leaves only interact through injectivity. Leaves whose sets share no
//! vertex are independent and contribute a plain product.

use std::collections::HashMap;
use std::ops::ControlFlow;

use arcmatch_common::VertexId;
use itertools::Itertools;

use crate::listener::Match;
use crate::machine::MatchingMachine;

/// All matches that extend one binding of the non-leaf states.
#[derive(Clone, Debug)]
pub struct LeafGroup<'a> {
    machine: &'a MatchingMachine,
    core: &'a [VertexId],
    sets: Vec<Vec<VertexId>>,
    count: u64,
}

impl<'a> LeafGroup<'a> {
    pub(crate) fn new(
        machine: &'a MatchingMachine,
        core: &'a [VertexId],
        sets: Vec<Vec<VertexId>>,
    ) -> Self {
        debug_assert_eq!(core.len() + sets.len(), machine.len());
        let count = injective_count(&sets);
        Self {
            machine,
            core,
            sets,
            count,
        }
    }

    /// Number of injective leaf completions, saturating at `u64::MAX`.
    #[must_use]
    pub const fn count(&self) -> u64 {
        self.count
    }

    /// State of the first leaf.
    #[must_use]
    pub const fn leaf_start(&self) -> usize {
        self.core.len()
    }

    /// Values bound to the non-leaf states.
    #[must_use]
    pub const fn core(&self) -> &'a [VertexId] {
        self.core
    }

    /// Candidate set of each leaf state, already filtered against the core.
    #[must_use]
    pub fn candidate_sets(&self) -> &[Vec<VertexId>] {
        &self.sets
    }

    /// Visit every complete assignment of the group in lexicographic order
    /// of leaf candidate positions.
    pub fn for_each_tuple(
        &self,
        mut visit: impl FnMut(&[VertexId]) -> ControlFlow<()>,
    ) -> ControlFlow<()> {
        let mut full = self.core.to_vec();
        injective_tuples(&self.sets, |leaves| {
            full.truncate(self.core.len());
            full.extend_from_slice(leaves);
            visit(&full)
        })
    }

    /// Visit every match of the group.
    pub fn for_each_match(&self, mut visit: impl FnMut(&Match<'_>)) {
        let _ = self.for_each_tuple(|full| {
            visit(&Match::new(self.machine, full));
            ControlFlow::Continue(())
        });
    }
}

/// Enumerate injective tuples picking one vertex from each set.
fn injective_tuples(
    sets: &[Vec<VertexId>],
    mut visit: impl FnMut(&[VertexId]) -> ControlFlow<()>,
) -> ControlFlow<()> {
    let k = sets.len();
    if k == 0 {
        return visit(&[]);
    }
    let mut positions = vec![0usize; k];
    let mut tuple: Vec<VertexId> = Vec::with_capacity(k);
    let mut depth = 0;

    loop {
        // Advance the cursor at `depth` to the next vertex not in the prefix.
        let set = &sets[depth];
        while positions[depth] < set.len() && tuple.contains(&set[positions[depth]]) {
            positions[depth] += 1;
        }

        if positions[depth] == set.len() {
            if depth == 0 {
                return ControlFlow::Continue(());
            }
            positions[depth] = 0;
            depth -= 1;
            tuple.pop();
            positions[depth] += 1;
            continue;
        }

        tuple.push(set[positions[depth]]);
        if depth + 1 == k {
            visit(&tuple)?;
            tuple.pop();
            positions[depth] += 1;
        } else {
            depth += 1;
        }
    }
}

fn find(parent: &mut [usize], mut i: usize) -> usize {
    while parent[i] != i {
        parent[i] = parent[parent[i]];
        i = parent[i];
    }
    i
}

/// Exact number of injective tuples over `sets`.
///
/// Leaves are clustered by shared candidates; singleton clusters contribute
/// their set size and larger clusters are enumerated.
fn injective_count(sets: &[Vec<VertexId>]) -> u64 {
    if sets.iter().any(Vec::is_empty) {
        return 0;
    }

    let mut parent: Vec<usize> = (0..sets.len()).collect();
    let mut owner: HashMap<VertexId, usize> = HashMap::new();
    for (i, set) in sets.iter().enumerate() {
        for &v in set {
            if let Some(&j) = owner.get(&v) {
                let (a, b) = (find(&mut parent, i), find(&mut parent, j));
                parent[a.max(b)] = a.min(b);
            } else {
                owner.insert(v, i);
            }
        }
    }

    let roots: Vec<usize> = (0..sets.len()).map(|i| find(&mut parent, i)).collect();
    let clusters = (0..sets.len()).into_group_map_by(|&i| roots[i]);
    clusters.values().fold(1u64, |acc, members| {
        let factor = match members.as_slice() {
            [only] => sets[*only].len() as u64,
            _ => {
                let cluster: Vec<Vec<VertexId>> =
                    members.iter().map(|&i| sets[i].clone()).collect();
                let mut n = 0u64;
                let _ = injective_tuples(&cluster, |_| {
                    n = n.saturating_add(1);
                    ControlFlow::Continue(())
                });
                n
            }
        };
        acc.saturating_mul(factor)
    })
}
