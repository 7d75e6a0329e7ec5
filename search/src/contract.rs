//! Collaborator contracts: the graph provider and the change source.

use replan_kernel::cost::Cost;

use crate::node::NodeId;

/// Trait for graphs the replanner can run on.
///
/// The provider is consulted once for topology and initial costs when the
/// engine builds its node table, and again for heuristics whenever the start
/// moves. After construction the engine's table is authoritative for costs.
///
/// # Contract
///
/// - Handles are dense: `NodeId(0) .. NodeId(node_count())`.
/// - `neighbors` is symmetric (`b ∈ neighbors(a)` iff `a ∈ neighbors(b)`), has
///   no self-loops or duplicates, and does not change for the lifetime of the
///   engine.
/// - `cost` is the price of entering a node: `>= 0`, or `infinity` when the
///   node is impassable.
/// - `heuristic(from, to)` is a finite, non-negative lower bound on the cost of
///   travelling between the two nodes.
pub trait GraphProvider {
    /// Number of nodes in the graph.
    fn node_count(&self) -> usize;

    /// Symmetric neighbor set of `node`.
    fn neighbors(&self, node: NodeId) -> Vec<NodeId>;

    /// Initial entry cost of `node`.
    fn cost(&self, node: NodeId) -> Cost;

    /// Admissible estimate of the distance between `from` and `to`.
    fn heuristic(&self, from: NodeId, to: NodeId) -> Cost;
}

/// A single entry-cost change observed by a scan.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CostChange {
    pub node: NodeId,
    pub cost: Cost,
}

/// Supplies the cost changes observed since the previous scan.
///
/// Sensors that run concurrently with planning must buffer their
/// observations and hand them over here; the engine never reads costs from
/// anywhere else while a repair is running.
pub trait ChangeSource {
    /// The agent has physically advanced to `position`.
    fn advance(&mut self, position: NodeId) {
        let _ = position;
    }

    /// Changes detected since the last scan, observed from `position`.
    fn scan(&mut self, position: NodeId) -> Vec<CostChange>;
}

/// Change source for a static world: never reports a change.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoChanges;

impl ChangeSource for NoChanges {
    fn scan(&mut self, _position: NodeId) -> Vec<CostChange> {
        Vec::new()
    }
}
