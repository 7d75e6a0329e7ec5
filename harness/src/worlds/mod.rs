//! World implementations for the harness runner.

pub mod adjacency;
pub mod grid;

pub use adjacency::AdjacencyWorld;
pub use grid::{Connectivity, GridWorld, ParsedGrid};

use replan_kernel::cost::Cost;
use replan_search::node::NodeId;

/// Typed failure while constructing or editing a world.
#[derive(Debug, Clone, PartialEq)]
pub enum WorldError {
    /// An edge names a node outside `0..node_count`.
    EdgeOutOfRange { a: usize, b: usize, node_count: usize },
    /// An edge connects a node to itself.
    SelfLoop { node: usize },
    /// The same undirected edge was listed twice.
    DuplicateEdge { a: usize, b: usize },
    /// A heuristic table is not `node_count × node_count`.
    HeuristicShape { expected: usize, row: usize, actual: usize },
    /// A heuristic table entry is negative or not finite.
    InvalidHeuristic { from: usize, to: usize, value: Cost },
    /// A node handle is outside the world.
    NodeOutOfRange { node: NodeId },
    /// Two worlds that must share topology do not.
    TopologyMismatch { detail: &'static str },
    /// A grid with zero width or height.
    EmptyGrid,
    /// Grid cell count does not match `width × height`, or a row is ragged.
    GridShape { row: usize, expected: usize, actual: usize },
    /// An ASCII grid contains a character with no cell meaning.
    UnknownCell { x: usize, y: usize, ch: char },
    /// An ASCII grid lacks its `S` or `G` marker.
    MissingMarker { marker: char },
    /// An ASCII grid repeats its `S` or `G` marker.
    DuplicateMarker { marker: char },
}

impl std::fmt::Display for WorldError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EdgeOutOfRange { a, b, node_count } => {
                write!(f, "edge ({a}, {b}) out of range for {node_count} nodes")
            }
            Self::SelfLoop { node } => write!(f, "self-loop on node {node}"),
            Self::DuplicateEdge { a, b } => write!(f, "duplicate edge ({a}, {b})"),
            Self::HeuristicShape {
                expected,
                row,
                actual,
            } => write!(
                f,
                "heuristic row {row} has {actual} entries, expected {expected}"
            ),
            Self::InvalidHeuristic { from, to, value } => {
                write!(f, "heuristic({from}, {to}) = {value} is not a finite non-negative value")
            }
            Self::NodeOutOfRange { node } => write!(f, "node {node} is not in the world"),
            Self::TopologyMismatch { detail } => write!(f, "topology mismatch: {detail}"),
            Self::EmptyGrid => write!(f, "grid has no cells"),
            Self::GridShape {
                row,
                expected,
                actual,
            } => write!(f, "grid row {row} has {actual} cells, expected {expected}"),
            Self::UnknownCell { x, y, ch } => write!(f, "unknown cell {ch:?} at ({x}, {y})"),
            Self::MissingMarker { marker } => write!(f, "grid has no {marker:?} marker"),
            Self::DuplicateMarker { marker } => write!(f, "grid has more than one {marker:?} marker"),
        }
    }
}

impl std::error::Error for WorldError {}
