mod common;

use std::collections::BTreeSet;

use arcmatch_subgraph::{
    AttributeComparator, CancelToken, Config, Equal, Graph, GraphBuilder, Infeasible, Mapping,
    Match, MatchCounter, MatchLimit, MatchMode, PlannerHeuristic, SearchOutcome, SearchStatus,
    SolverStrategy, SubgraphMatcher, Wildcard,
};
use common::{brute_force, cycle, fully_labelled, is_injective, labelled, setup_test_logging, v};
use rstest::rstest;

const PLANNERS: [PlannerHeuristic; 4] = [
    PlannerHeuristic::NodeSets,
    PlannerHeuristic::EdgeWeights,
    PlannerHeuristic::AngularCoefficient,
    PlannerHeuristic::NodeSetsCascade,
];

lazy_static::lazy_static! {
    static ref TRIANGLE: Graph<u8, ()> = cycle(3);
    static ref SINGLE_EDGE: Graph<u8, ()> = labelled(&[0, 0], &[(0, 1)]);
}

fn config(strategy: SolverStrategy, planner: PlannerHeuristic) -> Config {
    Config::builder().strategy(strategy).planner(planner).build()
}

fn run<N, E, NC, EC>(
    pattern: &Graph<N, E>,
    target: &Graph<N, E>,
    node_cmp: &NC,
    edge_cmp: &EC,
    config: &Config,
) -> (SearchOutcome, BTreeSet<Mapping>)
where
    NC: AttributeComparator<N> + ?Sized,
    EC: AttributeComparator<E> + ?Sized,
{
    let (outcome, matches) =
        SubgraphMatcher::new(pattern, target, node_cmp, edge_cmp, config).collect();
    assert!(matches.iter().all(is_injective));
    let unique: BTreeSet<Mapping> = matches.iter().cloned().collect();
    assert_eq!(unique.len(), matches.len(), "a match was reported twice");
    (outcome, unique)
}

#[rstest]
#[case::plain(SolverStrategy::Plain)]
#[case::edge_domain(SolverStrategy::EdgeDomain)]
#[case::ranked(SolverStrategy::RankedParent)]
#[case::leaf_batched(SolverStrategy::LeafBatched)]
fn single_edge_in_a_triangle(#[case] strategy: SolverStrategy) {
    setup_test_logging();
    let expected: BTreeSet<Mapping> = [
        vec![(v(0), v(0)), (v(1), v(1))],
        vec![(v(0), v(1)), (v(1), v(2))],
        vec![(v(0), v(2)), (v(1), v(0))],
    ]
    .into_iter()
    .collect();

    for planner in PLANNERS {
        let cfg = config(strategy, planner);
        let (outcome, matches) = run(&*SINGLE_EDGE, &*TRIANGLE, &Wildcard, &Wildcard, &cfg);
        assert_eq!(outcome.status, SearchStatus::Exhausted);
        assert_eq!(outcome.matches, 3);
        assert_eq!(matches, expected, "{planner:?}");
    }
}

#[rstest]
#[case::plain(SolverStrategy::Plain)]
#[case::edge_domain(SolverStrategy::EdgeDomain)]
#[case::ranked(SolverStrategy::RankedParent)]
#[case::leaf_batched(SolverStrategy::LeafBatched)]
fn ascending_edges_of_a_tournament(#[case] strategy: SolverStrategy) {
    setup_test_logging();
    // One direction per pair of a 4-clique; each edge carries the
    // attributes of its endpoints. Only 0->1, 1->2 and 2->3 ascend.
    let attrs = [10u8, 20, 30, 40];
    let edges: Vec<(u32, u32)> = vec![(0, 1), (1, 2), (2, 3), (3, 0), (2, 0), (3, 1)];
    let mut t = GraphBuilder::with_vertices(attrs);
    for &(s, h) in &edges {
        t.add_edge(v(s), v(h), (attrs[s as usize], attrs[h as usize]));
    }
    let target = t.build().expect("valid graph");
    let mut p = GraphBuilder::with_vertices([0u8, 0]);
    p.add_edge(v(0), v(1), (0, 0));
    let pattern = p.build().expect("valid graph");

    let ascending = |_: &(u8, u8), t: &(u8, u8)| t.0 < t.1;
    let cfg = config(strategy, PlannerHeuristic::NodeSets);
    let (outcome, matches) = run(&pattern, &target, &Wildcard, &ascending, &cfg);

    let expected: BTreeSet<Mapping> = [
        vec![(v(0), v(0)), (v(1), v(1))],
        vec![(v(0), v(1)), (v(1), v(2))],
        vec![(v(0), v(2)), (v(1), v(3))],
    ]
    .into_iter()
    .collect();
    assert_eq!(outcome.matches, 3);
    assert_eq!(matches, expected);
}

#[rstest]
#[case::plain(SolverStrategy::Plain)]
#[case::edge_domain(SolverStrategy::EdgeDomain)]
#[case::ranked(SolverStrategy::RankedParent)]
#[case::leaf_batched(SolverStrategy::LeafBatched)]
fn disconnected_pattern_takes_the_product(#[case] strategy: SolverStrategy) {
    setup_test_logging();
    // Components {0 -> 1} and {2}; label 1 only fits target 3 and 4.
    let pattern = labelled(&[0, 0, 1], &[(0, 1)]);
    let target = labelled(&[0, 0, 0, 1, 1], &[(0, 1), (1, 2)]);

    for planner in PLANNERS {
        let cfg = config(strategy, planner);
        let matcher = SubgraphMatcher::new(&pattern, &target, &Equal, &Wildcard, &cfg);
        let plan = matcher.prepare().expect("feasible");
        let machine = plan.machine();
        let lone = machine.state(machine.vertex_to_state()[2]);
        assert!(lone.is_root(), "{machine}");
        assert_eq!(machine.states().iter().filter(|s| s.is_root()).count(), 2);

        let (outcome, matches) = run(&pattern, &target, &Equal, &Wildcard, &cfg);
        assert_eq!(outcome.matches, 4);
        let edge_images: BTreeSet<_> = matches.iter().map(|m| (m[0].1, m[1].1)).collect();
        let lone_images: BTreeSet<_> = matches.iter().map(|m| m[2].1).collect();
        assert_eq!(
            edge_images,
            [(v(0), v(1)), (v(1), v(2))].into_iter().collect()
        );
        assert_eq!(lone_images, [v(3), v(4)].into_iter().collect());
    }
}

#[test]
fn isomorphism_requires_equal_degrees() {
    setup_test_logging();
    // A plain triangle and a triangle 3 -> 4 -> 5 -> 3 with chord 3 -> 5.
    let target = labelled(
        &[0; 6],
        &[(0, 1), (1, 2), (2, 0), (3, 4), (4, 5), (5, 3), (3, 5)],
    );
    let pattern = cycle(3);

    let mono = Config::builder().mode(MatchMode::Monomorphism).build();
    let iso = Config::builder().mode(MatchMode::Isomorphism).build();
    let (mono_outcome, mono_matches) = run(&pattern, &target, &Wildcard, &Wildcard, &mono);
    let (iso_outcome, iso_matches) = run(&pattern, &target, &Wildcard, &Wildcard, &iso);

    assert_eq!(mono_outcome.matches, 6);
    assert_eq!(iso_outcome.matches, 3);
    assert!(iso_matches.is_subset(&mono_matches));
    let inside_triangle = |m: &Mapping| m.iter().all(|&(_, t)| t.as_usize() < 3);
    assert!(iso_matches.iter().all(inside_triangle));
}

#[rstest]
#[case::plain(SolverStrategy::Plain)]
#[case::edge_domain(SolverStrategy::EdgeDomain)]
#[case::ranked(SolverStrategy::RankedParent)]
#[case::leaf_batched(SolverStrategy::LeafBatched)]
fn self_loops_map_onto_self_loops(#[case] strategy: SolverStrategy) {
    setup_test_logging();
    let pattern = labelled(&[0, 0], &[(0, 0), (0, 1)]);
    let target = labelled(&[0; 4], &[(0, 0), (0, 1), (1, 2), (2, 2), (2, 3), (3, 0)]);

    let cfg = config(strategy, PlannerHeuristic::NodeSets);
    let (outcome, matches) = run(&pattern, &target, &Wildcard, &Wildcard, &cfg);
    let expected = brute_force(
        &pattern,
        &target,
        |_, _| true,
        |_, _| true,
        MatchMode::Monomorphism,
    );
    assert_eq!(outcome.matches, 2);
    assert_eq!(matches, expected);
}

#[rstest]
#[case::plain(SolverStrategy::Plain)]
#[case::edge_domain(SolverStrategy::EdgeDomain)]
#[case::ranked(SolverStrategy::RankedParent)]
#[case::leaf_batched(SolverStrategy::LeafBatched)]
fn colliding_leaves_are_not_overcounted(#[case] strategy: SolverStrategy) {
    setup_test_logging();
    // Both spokes of the pattern hub compete for the same two targets.
    let pattern = labelled(&[1, 0, 0, 2], &[(0, 1), (0, 2), (3, 0)]);
    let target = labelled(&[1, 0, 0, 2, 0], &[(0, 1), (0, 2), (3, 0), (3, 4)]);

    let cfg = config(strategy, PlannerHeuristic::NodeSets);
    let outcome = SubgraphMatcher::new(&pattern, &target, &Equal, &Wildcard, &cfg).count();
    let (_, matches) = run(&pattern, &target, &Equal, &Wildcard, &cfg);
    let expected = brute_force(
        &pattern,
        &target,
        |a, b| a == b,
        |_, _| true,
        MatchMode::Monomorphism,
    );

    assert_eq!(expected.len(), 2);
    assert_eq!(outcome.matches, 2);
    assert_eq!(matches, expected);
}

#[rstest]
#[case::plain(SolverStrategy::Plain)]
#[case::edge_domain(SolverStrategy::EdgeDomain)]
#[case::ranked(SolverStrategy::RankedParent)]
#[case::leaf_batched(SolverStrategy::LeafBatched)]
fn limits_cap_the_match_stream(#[case] strategy: SolverStrategy) {
    setup_test_logging();
    let pattern = labelled(&[0; 3], &[(0, 1), (0, 2)]);
    let target = labelled(&[0; 6], &[(0, 1), (0, 2), (0, 3), (0, 4), (0, 5)]);

    for (limit, expected) in [
        (MatchLimit::First, 1),
        (MatchLimit::AtMost(7), 7),
        (MatchLimit::AtMost(100), 20),
    ] {
        let cfg = Config::builder().strategy(strategy).limit(limit).build();
        let (outcome, matches) = run(&pattern, &target, &Wildcard, &Wildcard, &cfg);
        assert_eq!(matches.len(), expected, "{limit:?}");
        assert_eq!(outcome.matches, expected as u64);
        let status = if expected == 20 {
            SearchStatus::Exhausted
        } else {
            SearchStatus::LimitReached
        };
        assert_eq!(outcome.status, status);
    }
}

#[test]
fn listener_can_cancel_the_search() {
    setup_test_logging();
    let pattern = labelled(&[0; 2], &[(0, 1)]);
    let target = cycle(6);
    let cfg = Config::default();
    let token = CancelToken::new();
    let matcher = SubgraphMatcher::new(&pattern, &target, &Wildcard, &Wildcard, &cfg)
        .with_cancel(token.clone());

    let mut seen = 0u64;
    let mut stop_after_two = |_: &Match<'_>| {
        seen += 1;
        if seen == 2 {
            token.cancel();
        }
    };
    let outcome = matcher.run(&mut stop_after_two);

    assert_eq!(outcome.status, SearchStatus::Cancelled);
    assert_eq!(outcome.matches, 2);
    assert!(!outcome.is_complete());
}

#[test]
fn infeasible_edge_attributes_are_reported_once() {
    setup_test_logging();
    let pattern = fully_labelled(&[0, 0], &[(0, 1, 9)]);
    let target = fully_labelled(&[0, 0, 0], &[(0, 1, 1), (1, 2, 2)]);
    let cfg = Config::default();

    let mut counter = MatchCounter::new();
    let outcome =
        SubgraphMatcher::new(&pattern, &target, &Wildcard, &Equal, &cfg).run(&mut counter);

    let SearchStatus::Infeasible(reason) = &outcome.status else {
        panic!("expected an infeasible search, got {:?}", outcome.status);
    };
    assert!(matches!(reason, Infeasible::EmptyNodeDomain(_)));
    assert_eq!(counter.count(), 0);
    assert_eq!(outcome.matches, 0);
}

#[test]
fn every_preset_agrees_with_brute_force() {
    setup_test_logging();
    let pattern = fully_labelled(&[0, 1, 0, 0], &[(0, 1, 0), (1, 2, 1), (2, 0, 0), (1, 3, 0)]);
    let target = fully_labelled(
        &[0, 1, 0, 0, 1, 0, 0],
        &[
            (0, 1, 0),
            (1, 2, 1),
            (2, 0, 0),
            (1, 3, 0),
            (1, 5, 0),
            (3, 4, 0),
            (4, 5, 1),
            (5, 3, 0),
            (4, 6, 0),
            (4, 0, 0),
        ],
    );
    let expected = brute_force(
        &pattern,
        &target,
        |a, b| a == b,
        |a, b| a == b,
        MatchMode::Monomorphism,
    );
    assert!(!expected.is_empty());

    for n in 1..=16 {
        let cfg = Config::preset(n).expect("known preset");
        let (outcome, matches) = run(&pattern, &target, &Equal, &Equal, &cfg);
        assert_eq!(matches, expected, "preset {n}");
        assert_eq!(outcome.matches, expected.len() as u64, "preset {n}");
    }
}
