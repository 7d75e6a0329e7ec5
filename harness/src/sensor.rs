//! Change sources used to drive episodes: a fixed schedule and a
//! range-limited sensor over a hidden ground truth.

use std::collections::{BTreeMap, VecDeque};

use replan_kernel::cost::Cost;
use replan_search::contract::{ChangeSource, CostChange, GraphProvider};
use replan_search::node::NodeId;
use tracing::debug;

use crate::worlds::WorldError;

/// Cost changes scheduled by move count.
///
/// Changes registered for tick `t` are observed by the scan that follows the
/// `t`-th move. Ticks that are never reached are simply never observed.
#[derive(Debug, Clone, Default)]
pub struct ScriptedChanges {
    schedule: BTreeMap<u64, Vec<CostChange>>,
    tick: u64,
}

impl ScriptedChanges {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Schedule `changes` for the scan after move `tick`.
    #[must_use]
    pub fn at(mut self, tick: u64, changes: impl IntoIterator<Item = CostChange>) -> Self {
        self.schedule.entry(tick).or_default().extend(changes);
        self
    }

    /// Moves observed so far.
    #[must_use]
    pub fn tick(&self) -> u64 {
        self.tick
    }

    /// Scheduled batches not yet delivered.
    #[must_use]
    pub fn pending(&self) -> usize {
        self.schedule.len()
    }
}

impl ChangeSource for ScriptedChanges {
    fn advance(&mut self, _position: NodeId) {
        self.tick += 1;
    }

    fn scan(&mut self, _position: NodeId) -> Vec<CostChange> {
        self.schedule.remove(&self.tick).unwrap_or_default()
    }
}

/// A sensor that reveals true costs within `radius` hops of the agent.
///
/// The agent plans on a believed map. Every scan walks the neighborhood of
/// the current position and reports each node whose true cost differs from
/// what the agent believes, then updates the belief.
#[derive(Debug, Clone)]
pub struct RevealingSensor {
    truth: Vec<Cost>,
    believed: Vec<Cost>,
    adjacency: Vec<Vec<NodeId>>,
    radius: usize,
    revealed: usize,
}

impl RevealingSensor {
    /// Snapshot the believed and true worlds.
    ///
    /// # Errors
    ///
    /// [`WorldError::TopologyMismatch`] if the worlds differ in node count or
    /// adjacency.
    pub fn new(
        believed: &dyn GraphProvider,
        truth: &dyn GraphProvider,
        radius: usize,
    ) -> Result<Self, WorldError> {
        let count = truth.node_count();
        if believed.node_count() != count {
            return Err(WorldError::TopologyMismatch {
                detail: "node counts differ",
            });
        }
        let mut adjacency = Vec::with_capacity(count);
        for id in (0..count).map(NodeId) {
            let mut seen = believed.neighbors(id);
            let mut actual = truth.neighbors(id);
            seen.sort_unstable();
            actual.sort_unstable();
            if seen != actual {
                return Err(WorldError::TopologyMismatch {
                    detail: "neighbor sets differ",
                });
            }
            adjacency.push(actual);
        }
        Ok(Self {
            truth: (0..count).map(|i| truth.cost(NodeId(i))).collect(),
            believed: (0..count).map(|i| believed.cost(NodeId(i))).collect(),
            adjacency,
            radius,
            revealed: 0,
        })
    }

    /// Changes reported so far.
    #[must_use]
    pub fn revealed(&self) -> usize {
        self.revealed
    }

    /// Nodes within `radius` hops of `position`, in ascending handle order.
    fn neighborhood(&self, position: NodeId) -> Vec<NodeId> {
        let mut depth = vec![usize::MAX; self.truth.len()];
        let mut frontier = VecDeque::new();
        let mut found = Vec::new();
        if position.index() >= self.truth.len() {
            return found;
        }
        depth[position.index()] = 0;
        frontier.push_back(position);
        while let Some(node) = frontier.pop_front() {
            found.push(node);
            let d = depth[node.index()];
            if d == self.radius {
                continue;
            }
            for &next in &self.adjacency[node.index()] {
                if depth[next.index()] == usize::MAX {
                    depth[next.index()] = d + 1;
                    frontier.push_back(next);
                }
            }
        }
        found.sort_unstable();
        found
    }
}

impl ChangeSource for RevealingSensor {
    fn scan(&mut self, position: NodeId) -> Vec<CostChange> {
        let mut changes = Vec::new();
        for node in self.neighborhood(position) {
            let i = node.index();
            // Bitwise: a NaN truth is reported once, not on every scan.
            if self.truth[i].to_bits() != self.believed[i].to_bits() {
                self.believed[i] = self.truth[i];
                changes.push(CostChange {
                    node,
                    cost: self.truth[i],
                });
            }
        }
        if !changes.is_empty() {
            self.revealed += changes.len();
            debug!(position = %position, count = changes.len(), "sensor revealed changes");
        }
        changes
    }
}
