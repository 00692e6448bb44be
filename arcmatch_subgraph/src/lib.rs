//! Directed, attributed subgraph isomorphism and monomorphism.
//!
//! Matching runs in three phases:
//!
//! 1. [`DomainSet::compute`] bounds the candidates of every pattern vertex
//!    and edge and prunes them by neighbourhood, edge support and bounded
//!    path consistency.
//! 2. [`MatchingMachine::plan`] orders the pattern vertices and records, per
//!    state, the check edges against earlier states.
//! 3. [`Solver`] backtracks over the machine and hands each match to a
//!    [`MatchListener`].
//!
//! [`SubgraphMatcher`] runs all three from one [`Config`].
//!
//! ```
//! use arcmatch_subgraph::{Config, GraphBuilder, SubgraphMatcher, VertexId, Wildcard};
//!
//! let mut t = GraphBuilder::with_vertices([(); 3]);
//! t.add_edge(VertexId::new(0), VertexId::new(1), ())
//!     .add_edge(VertexId::new(1), VertexId::new(2), ())
//!     .add_edge(VertexId::new(2), VertexId::new(0), ());
//! let target = t.build()?;
//!
//! let mut p = GraphBuilder::with_vertices([(); 2]);
//! p.add_edge(VertexId::new(0), VertexId::new(1), ());
//! let pattern = p.build()?;
//!
//! let config = Config::default();
//! let matcher = SubgraphMatcher::new(&pattern, &target, &Wildcard, &Wildcard, &config);
//! let (outcome, matches) = matcher.collect();
//! assert_eq!(outcome.matches, 3);
//! assert_eq!(matches.len(), 3);
//! # Ok::<(), arcmatch_subgraph::GraphError>(())
//! ```

mod assignment;
pub mod cancel;
pub mod compare;
pub mod domain;
pub mod error;
pub mod graph;
pub mod listener;
pub mod machine;
pub mod matcher;
pub mod outcome;
pub mod profiling;
pub mod solver;

pub use arcmatch_common::{
    Config, ConfigBuilder, EdgeId, MatchLimit, MatchMode, PlannerHeuristic, Propagation,
    SolverStrategy, StateId, VertexId,
};

pub use crate::cancel::CancelToken;
pub use crate::compare::{AttributeComparator, Equal, Wildcard};
pub use crate::domain::{DomainSet, EdgeDomains, NodeDomains, PatternEdgeIndex};
pub use crate::error::{GraphError, Infeasible};
pub use crate::graph::{Graph, GraphBuilder};
pub use crate::listener::{Mapping, Match, MatchCollector, MatchCounter, MatchListener};
pub use crate::machine::{CheckEdge, Direction, MachineState, MatchingMachine};
pub use crate::matcher::{MatchPlan, SubgraphMatcher};
pub use crate::outcome::{SearchOutcome, SearchStats, SearchStatus};
pub use crate::solver::{LeafGroup, Solver};
