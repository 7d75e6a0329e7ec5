//! Incremental repair lock tests.
//!
//! After any batch of cost changes, seeding the repair with
//! `apply_cost_changes` and re-running `compute_shortest_path` must produce
//! the same start estimate as a fresh engine built on the changed world, and
//! the same cost as the Dijkstra oracle. Covers cost increases, decreases,
//! changes to and from `infinity`, and changes on the goal itself.
//!
//! Stepping with a tiny expansion budget must never turn an unfinished
//! repair into a no-path verdict or a move on stale labels.

use lock_tests::fixtures::{apply_to_world, checked_policy, random_changes, random_graph, rng};
use replan_harness::reference::{distances_to_goal, distances_with_costs};
use replan_harness::sensor::ScriptedChanges;
use replan_harness::worlds::AdjacencyWorld;
use replan_kernel::cost::{is_infinite, Cost, INFINITE_COST};
use replan_search::contract::CostChange;
use replan_search::engine::{Replanner, StepOutcome};
use replan_search::node::NodeId;
use replan_search::policy::ReplanPolicyV1;

fn from_scratch(world: &AdjacencyWorld, start: NodeId, goal: NodeId) -> Cost {
    let mut engine = Replanner::new(world, start, goal, checked_policy()).unwrap();
    engine.initialize().unwrap();
    engine.compute_shortest_path().unwrap();
    engine.node(start).unwrap().estimate()
}

#[test]
fn random_batches_match_from_scratch() {
    for seed in 0..40 {
        let fixture = random_graph(seed, 30, 45, 0.1).unwrap();
        let (start, goal) = (fixture.start, fixture.goal);
        let mut shadow = fixture.world.clone();
        let mut engine = Replanner::new(&fixture.world, start, goal, checked_policy()).unwrap();
        engine.initialize().unwrap();
        engine.compute_shortest_path().unwrap();

        let mut changes_rng = rng(seed ^ 0xC0FF_EE00);
        for round in 0..8 {
            let batch = random_changes(&mut changes_rng, 30, 1 + round % 4, 0.2);
            engine.apply_cost_changes(&batch).unwrap();
            engine.compute_shortest_path().unwrap();
            engine.check_invariants().unwrap();
            apply_to_world(&mut shadow, &batch).unwrap();

            let label = format!("seed {seed} round {round}");
            let oracle = distances_to_goal(&shadow, goal).unwrap();
            let incremental = engine.node(start).unwrap().estimate();
            assert_eq!(incremental, oracle[start.index()], "{label}: oracle");
            assert_eq!(incremental, from_scratch(&shadow, start, goal), "{label}: fresh engine");
        }
    }
}

#[test]
fn increase_decrease_and_block_on_a_diamond() {
    //   1
    //  / \
    // 0   3 (goal)
    //  \ /
    //   2
    let world = AdjacencyWorld::new(vec![1.0, 2.0, 3.0, 1.0], &[(0, 1), (0, 2), (1, 3), (2, 3)]).unwrap();
    let mut engine = Replanner::new(&world, NodeId(0), NodeId(3), checked_policy()).unwrap();
    engine.initialize().unwrap();
    engine.compute_shortest_path().unwrap();
    let estimate = |e: &Replanner<'_>| e.node(NodeId(0)).unwrap().estimate();
    assert_eq!(estimate(&engine), 3.0);

    // (node, new cost, expected estimate(0))
    let steps: [(usize, Cost, Cost); 5] = [
        (1, 9.0, 4.0),
        (2, 0.0, 1.0),
        (2, INFINITE_COST, 10.0),
        (1, INFINITE_COST, INFINITE_COST),
        (1, 2.0, 3.0),
    ];
    for (node, cost, expected) in steps {
        engine
            .apply_cost_changes(&[CostChange {
                node: NodeId(node),
                cost,
            }])
            .unwrap();
        engine.compute_shortest_path().unwrap();
        engine.check_invariants().unwrap();
        assert_eq!(estimate(&engine), expected, "after cost({node}) = {cost}");
    }
}

#[test]
fn goal_cost_change_affects_every_route() {
    let world = AdjacencyWorld::line(vec![1.0, 1.0, 1.0, 1.0]);
    let mut engine = Replanner::new(&world, NodeId(0), NodeId(3), checked_policy()).unwrap();
    engine.initialize().unwrap();
    engine.compute_shortest_path().unwrap();
    assert_eq!(engine.node(NodeId(0)).unwrap().estimate(), 3.0);

    engine
        .apply_cost_changes(&[CostChange {
            node: NodeId(3),
            cost: 5.0,
        }])
        .unwrap();
    engine.compute_shortest_path().unwrap();
    assert_eq!(engine.node(NodeId(0)).unwrap().estimate(), 7.0);
    assert_eq!(engine.node(NodeId(3)).unwrap().lookahead(), 0.0);
}

#[test]
fn repair_after_a_small_change_expands_less_than_a_fresh_search() {
    let fixture = random_graph(7, 400, 600, 0.0).unwrap();
    let (start, goal) = (fixture.start, fixture.goal);
    let mut engine = Replanner::new(&fixture.world, start, goal, checked_policy()).unwrap();
    engine.initialize().unwrap();
    engine.compute_shortest_path().unwrap();
    let initial = engine.trace().metadata.total_expansions;

    // Raise a node that no shortest route needs: one far from both ends.
    let oracle = distances_to_goal(&fixture.world, goal).unwrap();
    let far = (0..400)
        .map(NodeId)
        .filter(|&n| n != start && n != goal)
        .max_by(|a, b| oracle[a.index()].total_cmp(&oracle[b.index()]).then(b.cmp(a)))
        .unwrap();
    engine
        .apply_cost_changes(&[CostChange {
            node: far,
            cost: 9.0 + engine.node(far).unwrap().cost(),
        }])
        .unwrap();
    engine.compute_shortest_path().unwrap();
    let repair = engine.trace().metadata.total_expansions - initial;
    assert!(repair < initial, "repair expanded {repair}, fresh search {initial}");
}

const STARVED_TICKS: u64 = 12;
const STEP_LIMIT: usize = 10_000;

fn current_costs(engine: &Replanner<'_>) -> Vec<Cost> {
    engine.table().iter().map(|(_, n)| n.cost()).collect()
}

#[test]
fn starved_repairs_never_report_a_false_no_path() {
    let policy = ReplanPolicyV1 {
        max_expansions_per_repair: 2,
        ..checked_policy()
    };
    let mut interrupted = 0;
    for seed in 0..120 {
        let fixture = random_graph(seed, 30, 20, 0.1).unwrap();
        let (start, goal) = (fixture.start, fixture.goal);
        let mut changes_rng = rng(seed ^ 0xA5A5);
        let mut source = ScriptedChanges::new();
        for tick in 1..=STARVED_TICKS {
            source = source.at(tick, random_changes(&mut changes_rng, 30, 4, 0.2));
        }

        let mut engine = Replanner::new(&fixture.world, start, goal, policy.clone()).unwrap();
        engine.initialize().unwrap();
        engine.compute_shortest_path().unwrap();

        let mut finished = false;
        for step in 0..STEP_LIMIT {
            let outcome = engine.step(&mut source).unwrap();
            let label = format!("seed {seed} step {step}");
            let at = engine.start();
            let oracle = distances_with_costs(&fixture.world, &current_costs(&engine), goal).unwrap();
            match outcome {
                StepOutcome::NotConverged => {
                    interrupted += 1;
                    assert!(engine.repair_pending(), "{label}");
                }
                StepOutcome::Moved { to } => {
                    assert_eq!(to, at, "{label}");
                    assert!(!engine.repair_pending(), "{label}");
                    assert_eq!(engine.node(at).unwrap().estimate(), oracle[at.index()], "{label}");
                }
                StepOutcome::NoPathExists => {
                    assert!(
                        is_infinite(oracle[at.index()]),
                        "{label}: no path reported at {at} but true distance is {}",
                        oracle[at.index()]
                    );
                    finished = true;
                    break;
                }
                StepOutcome::Arrived => {
                    finished = true;
                    break;
                }
            }
        }
        assert!(finished, "seed {seed}: no terminal outcome within {STEP_LIMIT} steps");
    }
    assert!(interrupted > 0, "budget of 2 should interrupt some repairs");
}
