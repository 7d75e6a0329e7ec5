//! Search vertices and the engine-owned node table.
//!
//! Nodes are addressed by dense [`NodeId`] handles; neighbor lists store
//! handles rather than references, so the table is the single owner of all
//! search state. Only the engine mutates `estimate`, `lookahead`, `cost` and
//! `heuristic`; everyone else gets read access.

use replan_kernel::cost::{validate_cost, Cost, INFINITE_COST};

use crate::contract::GraphProvider;
use crate::error::ReplanError;

/// Stable handle of a node in a [`NodeTable`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub usize);

impl NodeId {
    #[must_use]
    pub const fn index(self) -> usize {
        self.0
    }
}

impl std::fmt::Display for NodeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "n{}", self.0)
    }
}

/// Relation between a node's estimate and its lookahead.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Consistency {
    /// `estimate == lookahead`.
    Consistent,
    /// `estimate > lookahead`: a better path was found and must be propagated.
    Overconsistent,
    /// `estimate < lookahead`: the estimate may have been invalidated.
    Underconsistent,
}

/// A search vertex.
#[derive(Debug, Clone)]
pub struct Node {
    cost: Cost,
    estimate: Cost,
    lookahead: Cost,
    heuristic: Cost,
    neighbors: Vec<NodeId>,
}

impl Node {
    /// Cost of entering this node (`infinity` if impassable).
    #[must_use]
    pub fn cost(&self) -> Cost {
        self.cost
    }

    /// `g`: best known cost from this node to the goal.
    #[must_use]
    pub fn estimate(&self) -> Cost {
        self.estimate
    }

    /// `rhs`: one-step lookahead derived from the neighbors' estimates.
    #[must_use]
    pub fn lookahead(&self) -> Cost {
        self.lookahead
    }

    /// `h`: heuristic distance to the current start.
    #[must_use]
    pub fn heuristic(&self) -> Cost {
        self.heuristic
    }

    /// Neighbors, each both predecessor and successor.
    #[must_use]
    pub fn neighbors(&self) -> &[NodeId] {
        &self.neighbors
    }

    #[must_use]
    pub fn is_locally_consistent(&self) -> bool {
        self.estimate == self.lookahead
    }

    #[must_use]
    pub fn consistency(&self) -> Consistency {
        if self.estimate > self.lookahead {
            Consistency::Overconsistent
        } else if self.estimate < self.lookahead {
            Consistency::Underconsistent
        } else {
            Consistency::Consistent
        }
    }

    pub(crate) fn set_cost(&mut self, cost: Cost) {
        self.cost = cost;
    }

    pub(crate) fn set_estimate(&mut self, estimate: Cost) {
        self.estimate = estimate;
    }

    pub(crate) fn set_lookahead(&mut self, lookahead: Cost) {
        self.lookahead = lookahead;
    }

    pub(crate) fn set_heuristic(&mut self, heuristic: Cost) {
        self.heuristic = heuristic;
    }

    /// Reset search state to "nothing known".
    pub(crate) fn reset(&mut self) {
        self.estimate = INFINITE_COST;
        self.lookahead = INFINITE_COST;
    }
}

/// Fixed-topology table of every node in a planning episode.
#[derive(Debug, Clone)]
pub struct NodeTable {
    nodes: Vec<Node>,
}

impl NodeTable {
    /// Snapshot topology and costs from a provider.
    ///
    /// Heuristics start at zero; the engine fills them in relative to its start.
    ///
    /// # Errors
    ///
    /// - [`ReplanError::InvalidTopology`] for out-of-range, self-referencing,
    ///   duplicated, or asymmetric neighbor entries.
    /// - [`ReplanError::InvalidCost`] for a negative or NaN initial cost.
    pub fn from_provider(world: &dyn GraphProvider) -> Result<Self, ReplanError> {
        let count = world.node_count();
        let mut nodes = Vec::with_capacity(count);
        for index in 0..count {
            let id = NodeId(index);
            let cost = validate_cost(world.cost(id))
                .map_err(|source| ReplanError::InvalidCost { node: id, source })?;
            let mut neighbors = world.neighbors(id);
            for &neighbor in &neighbors {
                if neighbor.index() >= count {
                    return Err(ReplanError::InvalidTopology {
                        node: id,
                        neighbor,
                        detail: "neighbor handle out of range",
                    });
                }
                if neighbor == id {
                    return Err(ReplanError::InvalidTopology {
                        node: id,
                        neighbor,
                        detail: "self-loop",
                    });
                }
            }
            neighbors.sort_unstable();
            if let Some(pair) = neighbors.windows(2).find(|w| w[0] == w[1]) {
                return Err(ReplanError::InvalidTopology {
                    node: id,
                    neighbor: pair[0],
                    detail: "duplicate neighbor",
                });
            }
            nodes.push(Node {
                cost,
                estimate: INFINITE_COST,
                lookahead: INFINITE_COST,
                heuristic: 0.0,
                neighbors,
            });
        }

        for (index, node) in nodes.iter().enumerate() {
            let id = NodeId(index);
            for &neighbor in &node.neighbors {
                if nodes[neighbor.index()].neighbors.binary_search(&id).is_err() {
                    return Err(ReplanError::InvalidTopology {
                        node: id,
                        neighbor,
                        detail: "asymmetric adjacency",
                    });
                }
            }
        }

        Ok(Self { nodes })
    }

    /// Number of nodes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    #[must_use]
    pub fn contains(&self, id: NodeId) -> bool {
        id.index() < self.nodes.len()
    }

    /// Look up a node.
    ///
    /// # Errors
    ///
    /// Returns [`ReplanError::InvalidNode`] if `id` is not in the table.
    pub fn node(&self, id: NodeId) -> Result<&Node, ReplanError> {
        self.nodes
            .get(id.index())
            .ok_or(ReplanError::InvalidNode { node: id })
    }

    pub(crate) fn node_mut(&mut self, id: NodeId) -> Result<&mut Node, ReplanError> {
        self.nodes
            .get_mut(id.index())
            .ok_or(ReplanError::InvalidNode { node: id })
    }

    /// All handles in ascending order.
    pub fn ids(&self) -> impl Iterator<Item = NodeId> + '_ {
        (0..self.nodes.len()).map(NodeId)
    }

    /// `(id, node)` pairs in ascending handle order.
    pub fn iter(&self) -> impl Iterator<Item = (NodeId, &Node)> + '_ {
        self.nodes.iter().enumerate().map(|(i, n)| (NodeId(i), n))
    }

    pub(crate) fn nodes_mut(&mut self) -> impl Iterator<Item = (NodeId, &mut Node)> + '_ {
        self.nodes.iter_mut().enumerate().map(|(i, n)| (NodeId(i), n))
    }
}
