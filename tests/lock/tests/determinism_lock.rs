//! Determinism lock tests.
//!
//! - N=10 in-process episodes yield identical trace digests and events
//! - both open-list implementations make the same decisions
//! - the trace digest is sensitive to the policy and to the world
//! - disabling event recording keeps every counter

use lock_tests::fixtures::{canonical_episode, checked_policy, grid, random_graph, BELIEVED_MAP, TRUE_MAP};
use replan_harness::contract::WorldFixtureV1;
use replan_harness::runner::run_episode;
use replan_harness::sensor::{RevealingSensor, ScriptedChanges};
use replan_kernel::proof::canon::canonical_json_bytes;
use replan_search::contract::{ChangeSource, CostChange};
use replan_search::engine::Replanner;
use replan_search::frontier::{BinaryHeapFrontier, OrderedFrontier, PriorityQueue};
use replan_search::node::NodeId;
use replan_search::policy::ReplanPolicyV1;
use replan_search::trace::ReplanTraceV1;

#[test]
fn canonical_episode_is_deterministic_n10() {
    let first = canonical_episode().unwrap();
    let first_bytes = first.trace.to_canonical_json_bytes().unwrap();
    for i in 1..=10 {
        let again = canonical_episode().unwrap();
        assert_eq!(again.trace_digest, first.trace_digest, "run {i}: digest drifted");
        assert_eq!(again.fixture_digest, first.fixture_digest, "run {i}: fixture drifted");
        assert_eq!(
            again.trace.to_canonical_json_bytes().unwrap(),
            first_bytes,
            "run {i}: canonical bytes drifted"
        );
    }
}

#[test]
fn trace_bytes_are_canonical() {
    let report = canonical_episode().unwrap();
    let value = report.trace.to_json_value();
    let recanonicalized = canonical_json_bytes(&value).unwrap();
    assert_eq!(recanonicalized, report.trace.to_canonical_json_bytes().unwrap());
    assert!(report.trace_digest.as_str().starts_with("sha256:"));
}

#[test]
fn canonical_bytes_parse_back_to_the_same_trace() {
    let report = canonical_episode().unwrap();
    let bytes = report.trace.to_canonical_json_bytes().unwrap();
    let parsed: serde_json::Value = serde_json::from_slice(&bytes).unwrap();

    let events = parsed["events"].as_array().unwrap();
    assert_eq!(events.len(), report.trace.events.len());
    assert_eq!(events[0]["type"], "initialized");
    assert_eq!(
        parsed["metadata"]["total_moves"].as_u64(),
        Some(report.trace.metadata.total_moves)
    );
    assert_eq!(parsed["metadata"]["termination_reason"]["type"], "goal_reached");
}

fn run_with<Q: PriorityQueue>(queue: Q, source: &mut dyn ChangeSource) -> ReplanTraceV1 {
    let believed = grid(BELIEVED_MAP).unwrap();
    let mut engine = Replanner::with_queue(
        &believed.world,
        believed.start,
        believed.goal,
        queue,
        checked_policy(),
    )
    .unwrap();
    engine.run(source).unwrap();
    engine.trace()
}

#[test]
fn heap_and_ordered_frontiers_make_identical_decisions() {
    let believed = grid(BELIEVED_MAP).unwrap();
    let truth = grid(TRUE_MAP).unwrap();
    let mut heap_sensor = RevealingSensor::new(&believed.world, &truth.world, 2).unwrap();
    let mut ordered_sensor = heap_sensor.clone();

    let heap = run_with(BinaryHeapFrontier::new(), &mut heap_sensor);
    let ordered = run_with(OrderedFrontier::new(), &mut ordered_sensor);
    assert_eq!(heap.events, ordered.events);
    assert_eq!(heap.metadata.total_expansions, ordered.metadata.total_expansions);
    assert_eq!(heap.metadata.termination_reason, ordered.metadata.termination_reason);
}

#[test]
fn digest_binds_policy_and_world() {
    let fixture = random_graph(3, 20, 20, 0.0).unwrap();
    let run = |world: &dyn replan_search::contract::GraphProvider, policy: ReplanPolicyV1| {
        let mut source = ScriptedChanges::new().at(
            1,
            [CostChange {
                node: NodeId(5),
                cost: 4.0,
            }],
        );
        run_episode(world, fixture.start, fixture.goal, &mut source, policy)
            .unwrap()
            .trace_digest
    };

    let baseline = run(&fixture.world, checked_policy());
    assert_eq!(baseline, run(&fixture.world, checked_policy()));

    let other_policy = ReplanPolicyV1 {
        max_moves: 7_777,
        ..checked_policy()
    };
    assert_ne!(baseline, run(&fixture.world, other_policy));

    let mut other_world = fixture.world.clone();
    other_world.set_cost(fixture.goal, 2.0).unwrap();
    assert_ne!(fixture.world.fixture_digest().unwrap(), other_world.fixture_digest().unwrap());
}

#[test]
fn disabling_events_keeps_counters() {
    let believed = grid(BELIEVED_MAP).unwrap();
    let truth = grid(TRUE_MAP).unwrap();
    let quiet_policy = ReplanPolicyV1 {
        record_events: false,
        ..checked_policy()
    };
    let mut loud = RevealingSensor::new(&believed.world, &truth.world, 2).unwrap();
    let mut quiet = loud.clone();

    let full = run_episode(&believed.world, believed.start, believed.goal, &mut loud, checked_policy()).unwrap();
    let bare = run_episode(&believed.world, believed.start, believed.goal, &mut quiet, quiet_policy).unwrap();

    assert!(bare.trace.events.is_empty());
    assert!(!full.trace.events.is_empty());
    assert_eq!(bare.travelled, full.travelled);
    assert_eq!(bare.trace.metadata.total_expansions, full.trace.metadata.total_expansions);
    assert_eq!(bare.trace.metadata.total_moves, full.trace.metadata.total_moves);
    assert_eq!(bare.trace.metadata.total_cost_changes, full.trace.metadata.total_cost_changes);
}
