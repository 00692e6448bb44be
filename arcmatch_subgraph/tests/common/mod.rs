#![allow(dead_code)]

use std::collections::BTreeSet;
use std::sync::Once;

use arcmatch_subgraph::{Graph, GraphBuilder, Mapping, MatchMode, VertexId};

static INIT: Once = Once::new();

/// Configures logging for the test runner.
pub fn setup_test_logging() {
    INIT.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_test_writer()
            .try_init();
    });
}

pub fn v(i: u32) -> VertexId {
    VertexId::new(i)
}

/// Vertex-labelled graph with unit edge attributes.
pub fn labelled(labels: &[u8], edges: &[(u32, u32)]) -> Graph<u8, ()> {
    let mut b = GraphBuilder::with_vertices(labels.iter().copied());
    for &(s, t) in edges {
        b.add_edge(v(s), v(t), ());
    }
    b.build().expect("valid graph")
}

/// Graph labelled on both vertices and edges.
pub fn fully_labelled(labels: &[u8], edges: &[(u32, u32, u8)]) -> Graph<u8, u8> {
    let mut b = GraphBuilder::with_vertices(labels.iter().copied());
    for &(s, t, a) in edges {
        b.add_edge(v(s), v(t), a);
    }
    b.build().expect("valid graph")
}

/// Directed cycle over `n` vertices with uniform labels.
pub fn cycle(n: u32) -> Graph<u8, ()> {
    let edges: Vec<(u32, u32)> = (0..n).map(|i| (i, (i + 1) % n)).collect();
    labelled(&vec![0; n as usize], &edges)
}

/// Every injective map from pattern to target vertices that respects the
/// node predicate, the degree rule of `mode` and maps each pattern edge
/// onto some compatible target edge. Mappings are sorted by pattern vertex.
pub fn brute_force<N, E>(
    pattern: &Graph<N, E>,
    target: &Graph<N, E>,
    node_ok: impl Fn(&N, &N) -> bool,
    edge_ok: impl Fn(&E, &E) -> bool,
    mode: MatchMode,
) -> BTreeSet<Mapping> {
    let mut found = BTreeSet::new();
    let mut partial: Vec<VertexId> = Vec::with_capacity(pattern.vertex_count());
    extend(
        pattern,
        target,
        &node_ok,
        &edge_ok,
        mode,
        &mut partial,
        &mut found,
    );
    found
}

fn extend<N, E>(
    pattern: &Graph<N, E>,
    target: &Graph<N, E>,
    node_ok: &impl Fn(&N, &N) -> bool,
    edge_ok: &impl Fn(&E, &E) -> bool,
    mode: MatchMode,
    partial: &mut Vec<VertexId>,
    found: &mut BTreeSet<Mapping>,
) {
    let q = VertexId::from(partial.len());
    if q.as_usize() == pattern.vertex_count() {
        found.insert(pattern.vertices().zip(partial.iter().copied()).collect());
        return;
    }

    for r in target.vertices() {
        if partial.contains(&r) || !node_ok(pattern.attr(q), target.attr(r)) {
            continue;
        }
        let degrees = match mode {
            MatchMode::Isomorphism => {
                target.out_degree(r) == pattern.out_degree(q)
                    && target.in_degree(r) == pattern.in_degree(q)
            }
            MatchMode::Monomorphism => {
                target.out_degree(r) >= pattern.out_degree(q)
                    && target.in_degree(r) >= pattern.in_degree(q)
            }
        };
        if !degrees {
            continue;
        }

        partial.push(r);
        let image = |w: VertexId| partial[w.as_usize()];
        let outs_ok = pattern
            .out_edges(q)
            .filter(|(w, _)| *w <= q)
            .all(|(w, pe)| target.edges_between(r, image(w)).any(|te| edge_ok(pe, te)));
        let ins_ok = pattern
            .in_edges(q)
            .filter(|(w, _)| *w < q)
            .all(|(w, pe)| target.edges_between(image(w), r).any(|te| edge_ok(pe, te)));
        if outs_ok && ins_ok {
            extend(pattern, target, node_ok, edge_ok, mode, partial, found);
        }
        partial.pop();
    }
}

/// True if no target vertex appears twice in `m`.
pub fn is_injective(m: &Mapping) -> bool {
    let targets: BTreeSet<VertexId> = m.iter().map(|&(_, t)| t).collect();
    targets.len() == m.len()
}
