//! Convergence lock tests.
//!
//! Proves that after `initialize` + `compute_shortest_path`:
//! 1. `estimate(start)` equals the from-scratch Dijkstra cost-to-goal
//! 2. the start is locally consistent and the policy path realizes that cost
//! 3. unreachable starts keep `lookahead = infinity` (no-path detection)
//! 4. informed grid heuristics give the same answer as the zero heuristic

use lock_tests::fixtures::{checked_policy, grid, random_graph, TRUE_MAP};
use replan_harness::reference::distances_to_goal;
use replan_harness::worlds::GridWorld;
use replan_kernel::cost::{is_infinite, Cost};
use replan_search::contract::GraphProvider;
use replan_search::engine::{RepairOutcome, Replanner};
use replan_search::node::NodeId;

fn path_cost(world: &dyn GraphProvider, path: &[NodeId]) -> Cost {
    path.iter().skip(1).map(|&n| world.cost(n)).sum()
}

fn assert_converged_to_oracle(world: &dyn GraphProvider, start: NodeId, goal: NodeId, label: &str) {
    let oracle = distances_to_goal(world, goal).unwrap();
    let mut engine = Replanner::new(world, start, goal, checked_policy()).unwrap();
    engine.initialize().unwrap();
    let outcome = engine.compute_shortest_path().unwrap();
    assert!(matches!(outcome, RepairOutcome::Converged { .. }), "{label}: {outcome:?}");

    let node = engine.node(start).unwrap();
    assert_eq!(node.estimate(), oracle[start.index()], "{label}: estimate(start)");
    assert_eq!(node.lookahead(), oracle[start.index()], "{label}: lookahead(start)");
    engine.check_invariants().unwrap();

    match engine.extract_path().unwrap() {
        Some(path) => {
            assert_eq!(path.first(), Some(&start), "{label}");
            assert_eq!(path.last(), Some(&goal), "{label}");
            assert_eq!(path_cost(world, &path), oracle[start.index()], "{label}: path cost");
        }
        None => assert!(is_infinite(oracle[start.index()]), "{label}: path missing"),
    }
}

#[test]
fn random_graphs_match_dijkstra() {
    for seed in 0..60 {
        let fixture = random_graph(seed, 40, 60, 0.15).unwrap();
        assert_converged_to_oracle(
            &fixture.world,
            fixture.start,
            fixture.goal,
            &format!("seed {seed}"),
        );
    }
}

#[test]
fn sparse_walled_graphs_detect_no_path() {
    let mut unreachable = 0;
    for seed in 100..160 {
        let fixture = random_graph(seed, 25, 0, 0.35).unwrap();
        let oracle = distances_to_goal(&fixture.world, fixture.goal).unwrap();
        if is_infinite(oracle[fixture.start.index()]) {
            unreachable += 1;
        }
        assert_converged_to_oracle(
            &fixture.world,
            fixture.start,
            fixture.goal,
            &format!("seed {seed}"),
        );
    }
    assert!(unreachable > 0, "fixture family should include unreachable starts");
}

#[test]
fn grid_heuristic_matches_zero_heuristic() {
    let parsed = grid(TRUE_MAP).unwrap();
    let flat = parsed.world.clone().with_heuristic_scale(0.0).unwrap();
    assert_converged_to_oracle(&parsed.world, parsed.start, parsed.goal, "manhattan");
    assert_converged_to_oracle(&flat, parsed.start, parsed.goal, "zero");
}

#[test]
fn every_start_on_a_grid_converges() {
    let world = GridWorld::parse(
        "
        S..#....
        .#.#.##.
        .#...#..
        .####.#.
        ......#G
        ",
        replan_harness::worlds::Connectivity::Eight,
    )
    .unwrap();
    for start in 0..world.world.node_count() {
        assert_converged_to_oracle(
            &world.world,
            NodeId(start),
            world.goal,
            &format!("start {start}"),
        );
    }
}
