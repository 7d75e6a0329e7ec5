//! Open-list contract lock tests.
//!
//! Drives `BinaryHeapFrontier` and `OrderedFrontier` with the same random
//! operation sequence and asserts they agree after every operation: same
//! membership, same top element and key, same errors. The heap variant's lazy
//! deletion must never surface a removed or superseded entry.

use lock_tests::fixtures::rng;
use rand::Rng;
use replan_search::frontier::{BinaryHeapFrontier, OrderedFrontier, PriorityQueue, QueueError};
use replan_search::key::PriorityKey;
use replan_search::node::NodeId;

fn random_key(rng: &mut rand::rngs::StdRng) -> PriorityKey {
    // Small integer range so ties on both components are common.
    let second = f64::from(rng.gen_range(0u8..4));
    PriorityKey::new(second + f64::from(rng.gen_range(0u8..4)), second)
}

fn assert_agree(heap: &BinaryHeapFrontier, ordered: &OrderedFrontier, nodes: usize, step: usize) {
    assert_eq!(heap.len(), ordered.len(), "step {step}: len");
    assert_eq!(heap.top_element(), ordered.top_element(), "step {step}: top element");
    assert_eq!(heap.top_key(), ordered.top_key(), "step {step}: top key");
    for n in (0..nodes).map(NodeId) {
        assert_eq!(heap.contains(n), ordered.contains(n), "step {step}: contains {n}");
        assert_eq!(heap.key_of(n), ordered.key_of(n), "step {step}: key of {n}");
    }
}

#[test]
fn implementations_agree_under_random_operations() {
    const NODES: usize = 24;
    for seed in 0..20 {
        let mut rng = rng(seed);
        let mut heap = BinaryHeapFrontier::new();
        let mut ordered = OrderedFrontier::new();

        for step in 0..2_000 {
            let node = NodeId(rng.gen_range(0..NODES));
            let key = random_key(&mut rng);
            let (a, b): (Result<(), QueueError>, Result<(), QueueError>) = match rng.gen_range(0..5) {
                0 | 1 => (heap.insert(node, key), ordered.insert(node, key)),
                2 => (heap.update(node, key), ordered.update(node, key)),
                3 => (heap.remove(node), ordered.remove(node)),
                _ => (
                    heap.remove_min().map(|_| ()),
                    ordered.remove_min().map(|_| ()),
                ),
            };
            assert_eq!(a, b, "seed {seed} step {step}: results differ");
            assert_agree(&heap, &ordered, NODES, step);
        }
        assert!(heap.high_water() <= NODES);
        assert_eq!(heap.high_water(), ordered.high_water());
    }
}

#[test]
fn drained_queues_pop_in_key_then_handle_order() {
    let mut rng = rng(99);
    let mut heap = BinaryHeapFrontier::new();
    let mut ordered = OrderedFrontier::new();
    for n in 0..64 {
        let key = random_key(&mut rng);
        heap.insert(NodeId(n), key).unwrap();
        ordered.insert(NodeId(n), key).unwrap();
    }

    let mut previous: Option<(PriorityKey, NodeId)> = None;
    while !heap.is_empty() {
        let key = heap.top_key().unwrap();
        let node = heap.remove_min().unwrap();
        assert_eq!(ordered.remove_min(), Ok(node));
        if let Some(prev) = previous {
            assert!(prev < (key, node), "{prev:?} popped before {:?}", (key, node));
        }
        previous = Some((key, node));
    }
    assert_eq!(heap.remove_min(), Err(QueueError::Empty));
    assert_eq!(ordered.top_key(), Err(QueueError::Empty));
}
