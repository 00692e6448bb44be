//! Search-order heuristics.
//!
//! Every heuristic starts from the same seed (singleton-domain vertices in
//! ascending id order) and grows the bound set one vertex at a time,
//! preferring vertices adjacent to what is already bound. They differ only
//! in how a candidate is scored. Every score ends with the vertex id so the
//! choice is deterministic: on equal scores the smaller id wins.

use std::cmp::{Ordering, Reverse};

use arcmatch_common::{EdgeId, VertexId};

use crate::domain::DomainSet;

/// Where a vertex stands while the order is being grown.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Flag {
    /// Not bound and not adjacent to a bound vertex.
    Unvisited,
    /// Adjacent to a bound vertex.
    Neighbour,
    /// Already bound.
    Core,
    /// Deferred leaf, placed after the heuristic has finished.
    Withheld,
}

/// Read-only view of the pattern used by every heuristic.
pub(super) struct PlanContext<'a> {
    domains: &'a DomainSet,
    /// Distinct adjacent vertices, ignoring direction and self-loops.
    neighbours: Vec<Vec<VertexId>>,
    withheld: Vec<bool>,
}

impl<'a> PlanContext<'a> {
    pub(super) fn new(domains: &'a DomainSet, withheld: &[VertexId]) -> Self {
        let n = domains.nodes().len();
        let index = domains.index();

        let neighbours = (0..n)
            .map(VertexId::from)
            .map(|q| {
                let mut adj: Vec<VertexId> = index.incident(q).map(|(_, w)| w).collect();
                adj.sort_unstable();
                adj.dedup();
                adj
            })
            .collect();

        let mut flags = vec![false; n];
        for q in withheld {
            flags[q.as_usize()] = true;
        }

        Self {
            domains,
            neighbours,
            withheld: flags,
        }
    }

    fn vertex_count(&self) -> usize {
        self.neighbours.len()
    }

    fn domain_size(&self, q: VertexId) -> usize {
        self.domains.nodes().size(q)
    }

    fn edge_domain_size(&self, e: EdgeId) -> usize {
        self.domains.edges().len(e).max(1)
    }

    fn incident(&self, q: VertexId) -> impl Iterator<Item = (EdgeId, VertexId)> {
        self.domains.index().incident(q)
    }
}

/// Growing order plus the flag of every vertex.
struct Frontier {
    flags: Vec<Flag>,
    /// First bound vertex that flagged each vertex as a neighbour.
    discovered_by: Vec<Option<VertexId>>,
    order: Vec<(VertexId, Option<VertexId>)>,
    remaining: usize,
}

impl Frontier {
    /// Flag withheld leaves and bind every singleton-domain vertex.
    fn seeded(ctx: &PlanContext<'_>) -> Self {
        let n = ctx.vertex_count();
        let flags: Vec<Flag> = ctx
            .withheld
            .iter()
            .map(|&w| if w { Flag::Withheld } else { Flag::Unvisited })
            .collect();
        let remaining = flags.iter().filter(|&&f| f == Flag::Unvisited).count();

        let mut frontier = Self {
            flags,
            discovered_by: vec![None; n],
            order: Vec::with_capacity(n),
            remaining,
        };
        for q in (0..n).map(VertexId::from) {
            if frontier.flag(q) == Flag::Unvisited && ctx.domains.nodes().is_singleton(q) {
                frontier.bind(ctx, q, None);
            }
        }
        frontier
    }

    fn flag(&self, q: VertexId) -> Flag {
        self.flags[q.as_usize()]
    }

    fn bind(&mut self, ctx: &PlanContext<'_>, q: VertexId, parent: Option<VertexId>) {
        debug_assert!(matches!(self.flag(q), Flag::Unvisited | Flag::Neighbour));
        self.flags[q.as_usize()] = Flag::Core;
        self.order.push((q, parent));
        self.remaining -= 1;
        for &w in &ctx.neighbours[q.as_usize()] {
            if self.flag(w) == Flag::Unvisited {
                self.flags[w.as_usize()] = Flag::Neighbour;
                self.discovered_by[w.as_usize()] = Some(q);
            }
        }
    }

    /// Vertices adjacent to the bound set, or, when there are none, every
    /// unvisited vertex (a new component). `None` once everything is bound.
    fn pool(&self) -> Option<(Flag, Vec<VertexId>)> {
        if self.remaining == 0 {
            return None;
        }
        let with = |flag: Flag| -> Vec<VertexId> {
            (0..self.flags.len())
                .map(VertexId::from)
                .filter(|&q| self.flag(q) == flag)
                .collect()
        };
        let neighbours = with(Flag::Neighbour);
        if neighbours.is_empty() {
            Some((Flag::Unvisited, with(Flag::Unvisited)))
        } else {
            Some((Flag::Neighbour, neighbours))
        }
    }

    /// Distinct neighbours of `q` that are bound, adjacent and unvisited.
    fn neighbour_counts(&self, ctx: &PlanContext<'_>, q: VertexId) -> (usize, usize, usize) {
        ctx.neighbours[q.as_usize()]
            .iter()
            .fold((0, 0, 0), |(c, n, u), &w| match self.flag(w) {
                Flag::Core => (c + 1, n, u),
                Flag::Neighbour => (c, n + 1, u),
                Flag::Unvisited => (c, n, u + 1),
                Flag::Withheld => (c, n, u),
            })
    }
}

/// Node-sets score of `q`: (bound neighbours, adjacent neighbours,
/// unvisited neighbours, all neighbours) largest first, then the smallest
/// domain, then the smallest id.
fn node_sets_score(
    ctx: &PlanContext<'_>,
    frontier: &Frontier,
    q: VertexId,
) -> (usize, usize, usize, usize, Reverse<usize>, Reverse<VertexId>) {
    let (core, adjacent, unvisited) = frontier.neighbour_counts(ctx, q);
    (
        core,
        adjacent,
        unvisited,
        ctx.neighbours[q.as_usize()].len(),
        Reverse(ctx.domain_size(q)),
        Reverse(q),
    )
}

/// Integer greedy over distinct neighbour counts.
pub(super) fn node_sets(ctx: &PlanContext<'_>) -> Vec<(VertexId, Option<VertexId>)> {
    let mut frontier = Frontier::seeded(ctx);

    while let Some((_, pool)) = frontier.pool() {
        let best = pool
            .into_iter()
            .max_by_key(|&q| node_sets_score(ctx, &frontier, q));
        let Some(q) = best else { break };
        frontier.bind(ctx, q, None);
    }

    frontier.order
}

/// True if `w` can stand in for `q` against the current bound set: same
/// node domain, and every edge between `q` and a bound vertex has a
/// same-direction counterpart at `w`.
fn is_twin(ctx: &PlanContext<'_>, frontier: &Frontier, q: VertexId, w: VertexId) -> bool {
    let nodes = ctx.domains.nodes();
    if !nodes.members(q).eq(nodes.members(w)) {
        return false;
    }
    let index = ctx.domains.index();
    let heads = |v: VertexId| index.out_edges(v).iter().map(move |&e| index.get(e).target);
    let tails = |v: VertexId| index.in_edges(v).iter().map(move |&e| index.get(e).source);
    let bound = |c: &VertexId| frontier.flag(*c) == Flag::Core;

    heads(q).filter(bound).all(|c| heads(w).any(|x| x == c))
        && tails(q).filter(bound).all(|c| tails(w).any(|x| x == c))
}

/// [`node_sets`] where a pick with bound neighbours pulls its adjacent
/// twins (see [`is_twin`]) in right after it, ascending by id, with the
/// pick as their preferred parent.
pub(super) fn node_sets_cascade(ctx: &PlanContext<'_>) -> Vec<(VertexId, Option<VertexId>)> {
    let mut frontier = Frontier::seeded(ctx);

    while let Some((flag, pool)) = frontier.pool() {
        let best = pool
            .iter()
            .copied()
            .max_by_key(|&q| node_sets_score(ctx, &frontier, q));
        let Some(q) = best else { break };

        let has_bound_neighbour = frontier.neighbour_counts(ctx, q).0 > 0;
        let twins: Vec<VertexId> = if flag == Flag::Neighbour && has_bound_neighbour {
            pool.into_iter()
                .filter(|&w| w != q && is_twin(ctx, &frontier, q, w))
                .collect()
        } else {
            Vec::new()
        };

        frontier.bind(ctx, q, None);
        for w in twins {
            frontier.bind(ctx, w, Some(q));
        }
    }

    frontier.order
}

/// Edge counts of `q` towards bound, adjacent and all other vertices.
fn edge_weights_of(
    ctx: &PlanContext<'_>,
    frontier: &Frontier,
    q: VertexId,
) -> (usize, usize, usize) {
    ctx.incident(q)
        .fold((0, 0, 0), |(c, n, t), (_, w)| match frontier.flag(w) {
            Flag::Core => (c + 1, n, t + 1),
            Flag::Neighbour => (c, n + 1, t + 1),
            Flag::Unvisited | Flag::Withheld => (c, n, t + 1),
        })
}

/// Queue-driven order: adjacent vertices are ranked by how many edges tie
/// them to the bound set, then to other adjacent vertices, then overall.
/// The recorded parent is the vertex that first made it adjacent. A new
/// component starts at the unvisited vertex with the most edges. Equal
/// scores go to the smaller id.
pub(super) fn edge_weights(ctx: &PlanContext<'_>) -> Vec<(VertexId, Option<VertexId>)> {
    let mut frontier = Frontier::seeded(ctx);

    while let Some((flag, pool)) = frontier.pool() {
        let picked = if flag == Flag::Neighbour {
            pool.into_iter()
                .max_by_key(|&q| {
                    let (core, adjacent, total) = edge_weights_of(ctx, &frontier, q);
                    (core, adjacent, total, Reverse(q))
                })
                .map(|q| (q, frontier.discovered_by[q.as_usize()]))
        } else {
            pool.into_iter()
                .max_by_key(|&q| (edge_weights_of(ctx, &frontier, q).2, Reverse(q)))
                .map(|q| (q, None))
        };
        let Some((q, parent)) = picked else { break };
        frontier.bind(ctx, q, parent);
    }

    frontier.order
}

/// `n^2 / sum(1 / |edge domain|)` over a group of edges; 0 for none.
fn weighted_term(count: usize, inverse_sum: f64) -> f64 {
    if count == 0 {
        0.0
    } else {
        (count * count) as f64 / inverse_sum
    }
}

/// Angular score of an adjacent vertex and its unvisited-edge tiebreaker.
fn angular_score(ctx: &PlanContext<'_>, frontier: &Frontier, q: VertexId) -> (f64, f64) {
    let mut groups = [(0usize, 0.0f64); 3];
    for (e, w) in ctx.incident(q) {
        let slot = match frontier.flag(w) {
            Flag::Core => 0,
            Flag::Neighbour => 1,
            Flag::Unvisited => 2,
            Flag::Withheld => continue,
        };
        groups[slot].0 += 1;
        groups[slot].1 += 1.0 / ctx.edge_domain_size(e) as f64;
    }
    let [core, adjacent, unvisited] = groups.map(|(n, s)| weighted_term(n, s));
    let score = core.hypot(adjacent) / ctx.domain_size(q).max(1) as f64;
    (score, unvisited)
}

/// Score of a vertex as the root of a new component.
fn root_score(ctx: &PlanContext<'_>, q: VertexId) -> f64 {
    let (count, inverse_sum) = ctx.incident(q).fold((0, 0.0), |(n, s), (e, _)| {
        (n + 1, s + 1.0 / ctx.edge_domain_size(e) as f64)
    });
    weighted_term(count, inverse_sum)
}

/// Weighted greedy favouring adjacent vertices whose edges to the bound set
/// have small edge domains, normalized by the vertex's own domain size.
/// Scores are compared with `total_cmp`; equal scores go to the smaller id.
pub(super) fn angular_coefficient(ctx: &PlanContext<'_>) -> Vec<(VertexId, Option<VertexId>)> {
    let mut frontier = Frontier::seeded(ctx);

    while let Some((flag, pool)) = frontier.pool() {
        let picked = if flag == Flag::Neighbour {
            pool.into_iter()
                .map(|q| (q, angular_score(ctx, &frontier, q)))
                .max_by(|(qa, (sa, ua)), (qb, (sb, ub))| {
                    sa.total_cmp(sb)
                        .then(ua.total_cmp(ub))
                        .then(qb.cmp(qa))
                })
                .map(|(q, _)| q)
        } else {
            pool.into_iter()
                .map(|q| (q, root_score(ctx, q)))
                .max_by(|(qa, sa), (qb, sb)| match sa.total_cmp(sb) {
                    Ordering::Equal => qb.cmp(qa),
                    other => other,
                })
                .map(|(q, _)| q)
        };
        let Some(q) = picked else { break };
        frontier.bind(ctx, q, None);
    }

    frontier.order
}
