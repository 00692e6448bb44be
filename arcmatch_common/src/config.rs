//! Configuration for a matching run.
//!
//! This module exposes the knobs that parameterize the three phases of a run:
//! domain propagation, matching-machine planning and the backtracking solver.
//!
//! The main concepts are:
//! - mode: exact degree matching (isomorphism) or degree-at-least matching
//!   (monomorphism).
//! - propagation: how hard the domain engine works before planning.
//! - planner / strategy: which search-order heuristic and which candidate
//!   generation strategy to use. Every combination reports the same set of
//!   matches; they only differ in cost.
//! - limit: stop after the first match, after N matches, or never.
//!
//! Quick examples
//!
//! Defaults (monomorphism, full propagation, leaf-batched solver):
//! ```ignore
//! use arcmatch_common::Config;
//! let cfg = Config::default();
//! ```
//!
//! Exact isomorphism with the simplest solver, stopping at the first match:
//! ```ignore
//! use arcmatch_common::{Config, MatchLimit, MatchMode, SolverStrategy};
//! let cfg = Config::builder()
//!     .mode(MatchMode::Isomorphism)
//!     .strategy(SolverStrategy::Plain)
//!     .limit(MatchLimit::First)
//!     .build();
//! ```

use serde::{Deserialize, Serialize};

/// Global run configuration.
///
/// - mode: degree rule used when seeding node domains.
/// - propagation: which consistency passes run and how far path pruning looks.
/// - planner: heuristic used to order the pattern vertices.
/// - strategy: candidate generation strategy of the solver.
/// - limit: early-exit policy of the solver.
/// - defer_leaves: whether degree-one pattern vertices are moved to the end
///   of the search order. `None` defers them exactly when the strategy is
///   [`SolverStrategy::LeafBatched`].
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    /// Degree rule used when seeding node domains.
    pub mode: MatchMode,
    /// Domain propagation settings.
    pub propagation: Propagation,
    /// Search-order heuristic.
    pub planner: PlannerHeuristic,
    /// Candidate generation strategy.
    pub strategy: SolverStrategy,
    /// Early-exit policy.
    pub limit: MatchLimit,
    /// Explicit override of leaf deferral in the planner.
    pub defer_leaves: Option<bool>,
}

impl Config {
    /// Start building a configuration from the defaults.
    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::default()
    }

    /// Whether the planner should move leaf vertices to the end of the order.
    pub fn leaves_deferred(&self) -> bool {
        self.defer_leaves
            .unwrap_or(self.strategy == SolverStrategy::LeafBatched)
    }

    /// Map one of the sixteen numbered control presets onto a configuration.
    ///
    /// Presets 1-7 run the single neighbourhood pass, 8-16 iterate it to a
    /// fixpoint; 15 and 16 also iterate edge-domain refinement. Unknown
    /// numbers return `None`.
    pub fn preset(n: u8) -> Option<Self> {
        use PlannerHeuristic::{EdgeWeights, NodeSets};
        use SolverStrategy::{EdgeDomain, LeafBatched, Plain, RankedParent};

        // (node fixpoint, edge fixpoint, path length, planner, strategy)
        let (node_fixpoint, edge_fixpoint, max_path_length, planner, strategy) = match n {
            1 => (false, false, 0, EdgeWeights, Plain),
            2 => (false, false, 0, EdgeWeights, EdgeDomain),
            3 => (false, false, 0, EdgeWeights, RankedParent),
            4 => (false, false, 0, NodeSets, RankedParent),
            5 => (false, false, 6, NodeSets, RankedParent),
            6 => (false, false, 0, NodeSets, LeafBatched),
            7 => (false, false, 6, NodeSets, LeafBatched),
            8 => (true, false, 0, EdgeWeights, Plain),
            9 => (true, false, 0, EdgeWeights, EdgeDomain),
            10 => (true, false, 0, EdgeWeights, RankedParent),
            11 => (true, false, 0, NodeSets, RankedParent),
            12 => (true, false, 6, EdgeWeights, Plain),
            13 => (true, false, 0, NodeSets, LeafBatched),
            14 => (true, false, 6, NodeSets, LeafBatched),
            15 => (true, true, 0, NodeSets, RankedParent),
            16 => (true, true, 0, NodeSets, LeafBatched),
            _ => return None,
        };

        Some(Self {
            mode: MatchMode::default(),
            propagation: Propagation {
                node_fixpoint,
                edge_fixpoint,
                max_path_length,
            },
            planner,
            strategy,
            limit: MatchLimit::All,
            defer_leaves: None,
        })
    }
}

impl Default for Config {
    /// Default configuration mirrors control preset 14: node fixpoint,
    /// path pruning up to length 6, leaf-aware node-set planning and the
    /// leaf-batched solver, in monomorphism mode.
    fn default() -> Self {
        Self {
            mode: MatchMode::Monomorphism,
            propagation: Propagation::default(),
            planner: PlannerHeuristic::NodeSets,
            strategy: SolverStrategy::LeafBatched,
            limit: MatchLimit::All,
            defer_leaves: None,
        }
    }
}

/// Degree rule applied when node domains are seeded.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MatchMode {
    /// Target vertex in/out degrees must equal the pattern vertex degrees.
    Isomorphism,
    /// Target vertex in/out degrees must be at least the pattern degrees.
    #[default]
    Monomorphism,
}

/// Domain propagation settings.
///
/// - node_fixpoint:
///     - true  => repeat the neighbourhood-consistency pass until nothing
///       changes (exact up to arc-consistency).
///     - false => run it once (cheaper approximation).
/// - edge_fixpoint: after any refinement, alternate edge-tuple pruning and
///   node re-derivation from edge support until convergence.
/// - max_path_length: bound on path-consistency pruning; 0 disables it.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Propagation {
    /// Iterate the neighbourhood pass to a fixpoint.
    pub node_fixpoint: bool,
    /// Iterate node/edge domain refinement to a fixpoint.
    pub edge_fixpoint: bool,
    /// Longest pattern path verified by path pruning.
    pub max_path_length: usize,
}

impl Default for Propagation {
    fn default() -> Self {
        Self {
            node_fixpoint: true,
            edge_fixpoint: false,
            max_path_length: 6,
        }
    }
}

/// Heuristic used to order pattern vertices into matching-machine states.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PlannerHeuristic {
    /// Integer greedy over core / neighbour / unvisited neighbour counts.
    #[default]
    NodeSets,
    /// Queue of core neighbours ranked by accumulated edge weights.
    EdgeWeights,
    /// Weighted score using inverse edge-domain cardinalities.
    AngularCoefficient,
    /// [`PlannerHeuristic::NodeSets`], but each pick is followed by its
    /// twins: adjacent vertices with the same node domain and the same
    /// bound neighbours.
    NodeSetsCascade,
}

/// Candidate generation strategy of the solver.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SolverStrategy {
    /// Scan the parent's target adjacency list.
    Plain,
    /// Scan the parent edge's edge-domain tuples.
    EdgeDomain,
    /// Pick the most populated check edge at solve time.
    RankedParent,
    /// Ranked parent plus combinatorial counting of trailing leaf states.
    #[default]
    LeafBatched,
}

/// Early-exit policy of the solver.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MatchLimit {
    /// Enumerate every match.
    #[default]
    All,
    /// Stop after the first match.
    First,
    /// Stop once this many matches have been reported.
    AtMost(u64),
}

impl MatchLimit {
    /// The match ceiling, if any.
    pub const fn ceiling(self) -> Option<u64> {
        match self {
            Self::All => None,
            Self::First => Some(1),
            Self::AtMost(n) => Some(n),
        }
    }
}

/// Builder for [`Config`].
#[derive(Clone, Debug, Default)]
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    /// Set the degree rule.
    pub const fn mode(mut self, mode: MatchMode) -> Self {
        self.config.mode = mode;
        self
    }

    /// Enable or disable the node-domain fixpoint.
    pub const fn node_fixpoint(mut self, enabled: bool) -> Self {
        self.config.propagation.node_fixpoint = enabled;
        self
    }

    /// Enable or disable the edge-domain fixpoint.
    pub const fn edge_fixpoint(mut self, enabled: bool) -> Self {
        self.config.propagation.edge_fixpoint = enabled;
        self
    }

    /// Set the path pruning bound (0 disables path pruning).
    pub const fn max_path_length(mut self, len: usize) -> Self {
        self.config.propagation.max_path_length = len;
        self
    }

    /// Replace all propagation settings at once.
    pub const fn propagation(mut self, propagation: Propagation) -> Self {
        self.config.propagation = propagation;
        self
    }

    /// Set the planner heuristic.
    pub const fn planner(mut self, planner: PlannerHeuristic) -> Self {
        self.config.planner = planner;
        self
    }

    /// Set the solver strategy.
    pub const fn strategy(mut self, strategy: SolverStrategy) -> Self {
        self.config.strategy = strategy;
        self
    }

    /// Set the early-exit policy.
    pub const fn limit(mut self, limit: MatchLimit) -> Self {
        self.config.limit = limit;
        self
    }

    /// Force leaf deferral on or off regardless of the strategy.
    pub const fn defer_leaves(mut self, defer: bool) -> Self {
        self.config.defer_leaves = Some(defer);
        self
    }

    /// Finish building.
    pub fn build(self) -> Config {
        self.config
    }
}
