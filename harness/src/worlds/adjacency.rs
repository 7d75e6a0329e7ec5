//! `AdjacencyWorld`: explicit node costs over an undirected edge list.
//!
//! The smallest useful world. The heuristic is zero everywhere unless a
//! `node_count × node_count` table is supplied, which makes the engine behave
//! as an incremental Dijkstra by default.

use replan_kernel::cost::{cost_repr, Cost};
use replan_search::contract::GraphProvider;
use replan_search::node::NodeId;
use serde_json::json;

use super::WorldError;
use crate::contract::WorldFixtureV1;

#[derive(Debug, Clone)]
pub struct AdjacencyWorld {
    costs: Vec<Cost>,
    edges: Vec<(usize, usize)>,
    adjacency: Vec<Vec<NodeId>>,
    /// Row-major `[from][to]`, or `None` for the zero heuristic.
    heuristic: Option<Vec<Cost>>,
}

impl AdjacencyWorld {
    /// Build a world from per-node entry costs and undirected edges.
    ///
    /// Edges are normalized to `(min, max)`; costs are not validated here
    /// (the engine rejects bad costs when it builds its table).
    ///
    /// # Errors
    ///
    /// [`WorldError::EdgeOutOfRange`], [`WorldError::SelfLoop`] or
    /// [`WorldError::DuplicateEdge`].
    pub fn new(costs: Vec<Cost>, edges: &[(usize, usize)]) -> Result<Self, WorldError> {
        let node_count = costs.len();
        let mut normalized: Vec<(usize, usize)> = Vec::with_capacity(edges.len());
        for &(a, b) in edges {
            if a >= node_count || b >= node_count {
                return Err(WorldError::EdgeOutOfRange { a, b, node_count });
            }
            if a == b {
                return Err(WorldError::SelfLoop { node: a });
            }
            normalized.push((a.min(b), a.max(b)));
        }
        normalized.sort_unstable();
        if let Some(w) = normalized.windows(2).find(|w| w[0] == w[1]) {
            return Err(WorldError::DuplicateEdge { a: w[0].0, b: w[0].1 });
        }

        let mut adjacency = vec![Vec::new(); node_count];
        for &(a, b) in &normalized {
            adjacency[a].push(NodeId(b));
            adjacency[b].push(NodeId(a));
        }
        for list in &mut adjacency {
            list.sort_unstable();
        }
        Ok(Self {
            costs,
            edges: normalized,
            adjacency,
            heuristic: None,
        })
    }

    /// A path graph `0 - 1 - ... - (n-1)`.
    #[must_use]
    pub fn line(costs: Vec<Cost>) -> Self {
        let n = costs.len();
        let edges: Vec<(usize, usize)> = (1..n).map(|i| (i - 1, i)).collect();
        let mut adjacency = vec![Vec::new(); n];
        for &(a, b) in &edges {
            adjacency[a].push(NodeId(b));
            adjacency[b].push(NodeId(a));
        }
        Self {
            costs,
            edges,
            adjacency,
            heuristic: None,
        }
    }

    /// Attach an explicit heuristic table indexed `[from][to]`.
    ///
    /// # Errors
    ///
    /// [`WorldError::HeuristicShape`] for a non-square table,
    /// [`WorldError::InvalidHeuristic`] for a negative or non-finite entry.
    pub fn with_heuristic(mut self, table: &[Vec<Cost>]) -> Result<Self, WorldError> {
        let n = self.costs.len();
        if table.len() != n {
            return Err(WorldError::HeuristicShape {
                expected: n,
                row: table.len(),
                actual: 0,
            });
        }
        let mut flat = Vec::with_capacity(n * n);
        for (from, row) in table.iter().enumerate() {
            if row.len() != n {
                return Err(WorldError::HeuristicShape {
                    expected: n,
                    row: from,
                    actual: row.len(),
                });
            }
            for (to, &value) in row.iter().enumerate() {
                if !value.is_finite() || value < 0.0 {
                    return Err(WorldError::InvalidHeuristic { from, to, value });
                }
                flat.push(value);
            }
        }
        self.heuristic = Some(flat);
        Ok(self)
    }

    /// Overwrite one node's entry cost (used to build from-scratch comparisons).
    ///
    /// # Errors
    ///
    /// [`WorldError::NodeOutOfRange`] if `node` is not in the world.
    pub fn set_cost(&mut self, node: NodeId, cost: Cost) -> Result<(), WorldError> {
        let slot = self
            .costs
            .get_mut(node.index())
            .ok_or(WorldError::NodeOutOfRange { node })?;
        *slot = cost;
        Ok(())
    }

    #[must_use]
    pub fn costs(&self) -> &[Cost] {
        &self.costs
    }

    /// Normalized `(min, max)` edges in ascending order.
    #[must_use]
    pub fn edges(&self) -> &[(usize, usize)] {
        &self.edges
    }
}

impl GraphProvider for AdjacencyWorld {
    fn node_count(&self) -> usize {
        self.costs.len()
    }

    fn neighbors(&self, node: NodeId) -> Vec<NodeId> {
        self.adjacency.get(node.index()).cloned().unwrap_or_default()
    }

    fn cost(&self, node: NodeId) -> Cost {
        self.costs[node.index()]
    }

    fn heuristic(&self, from: NodeId, to: NodeId) -> Cost {
        let n = self.costs.len();
        self.heuristic
            .as_ref()
            .map_or(0.0, |flat| flat[from.index() * n + to.index()])
    }
}

impl WorldFixtureV1 for AdjacencyWorld {
    fn world_id(&self) -> &str {
        "adjacency"
    }

    fn fixture_json(&self) -> serde_json::Value {
        let costs: Vec<String> = self.costs.iter().map(|&c| cost_repr(c)).collect();
        let edges: Vec<[usize; 2]> = self.edges.iter().map(|&(a, b)| [a, b]).collect();
        let heuristic = self
            .heuristic
            .as_ref()
            .map(|flat| flat.iter().map(|&h| cost_repr(h)).collect::<Vec<_>>());
        json!({
            "world_id": self.world_id(),
            "costs": costs,
            "edges": edges,
            "heuristic": heuristic,
        })
    }
}
