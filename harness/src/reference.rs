//! From-scratch Dijkstra oracle for checking converged estimates.
//!
//! Uses the same cost model as the engine: the cost of a route is the sum of
//! the entry costs of every node after the first. Distances are computed
//! backwards from the goal, so `d(u) = min over neighbors v of cost(v) + d(v)`.

use std::cmp::Reverse;
use std::collections::BinaryHeap;

use replan_kernel::cost::{Cost, INFINITE_COST};
use replan_search::contract::GraphProvider;
use replan_search::node::NodeId;

use crate::worlds::WorldError;

/// Exact cost-to-goal of every node under the world's current costs.
///
/// # Errors
///
/// [`WorldError::NodeOutOfRange`] if `goal` is not in the world.
pub fn distances_to_goal(world: &dyn GraphProvider, goal: NodeId) -> Result<Vec<Cost>, WorldError> {
    let costs: Vec<Cost> = (0..world.node_count()).map(|i| world.cost(NodeId(i))).collect();
    distances_with_costs(world, &costs, goal)
}

/// Exact cost-to-goal of every node, with `costs` overriding the world's.
///
/// Topology still comes from `world`.
///
/// # Errors
///
/// [`WorldError::NodeOutOfRange`] if `goal` is out of range, or
/// [`WorldError::TopologyMismatch`] if `costs` has the wrong length.
pub fn distances_with_costs(
    world: &dyn GraphProvider,
    costs: &[Cost],
    goal: NodeId,
) -> Result<Vec<Cost>, WorldError> {
    let count = world.node_count();
    if goal.index() >= count {
        return Err(WorldError::NodeOutOfRange { node: goal });
    }
    if costs.len() != count {
        return Err(WorldError::TopologyMismatch {
            detail: "cost vector length differs from node count",
        });
    }

    let mut dist = vec![INFINITE_COST; count];
    let mut settled = vec![false; count];
    // Bit patterns of non-negative floats sort like the floats themselves.
    let mut heap = BinaryHeap::new();
    dist[goal.index()] = 0.0;
    heap.push(Reverse((0.0f64.to_bits(), goal)));

    while let Some(Reverse((_, v))) = heap.pop() {
        if settled[v.index()] {
            continue;
        }
        settled[v.index()] = true;
        let through_v = costs[v.index()] + dist[v.index()];
        if !through_v.is_finite() {
            continue;
        }
        for u in world.neighbors(v) {
            if through_v < dist[u.index()] {
                dist[u.index()] = through_v;
                heap.push(Reverse((through_v.to_bits(), u)));
            }
        }
    }
    Ok(dist)
}
