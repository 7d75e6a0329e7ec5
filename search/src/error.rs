//! Typed replanning errors.
//!
//! `ReplanError` covers configuration and integration failures only. Planning
//! outcomes such as "no path exists" or "not yet converged" are ordinary
//! results, expressed via [`crate::trace::TerminationReasonV1`],
//! [`crate::engine::RepairOutcome`] and [`crate::engine::StepOutcome`].

use replan_kernel::cost::{Cost, CostError};

use crate::frontier::QueueError;
use crate::node::NodeId;

/// Fatal failure of a replanning operation.
#[derive(Debug, Clone, PartialEq)]
pub enum ReplanError {
    /// An operation referenced a node absent from the table.
    InvalidNode { node: NodeId },
    /// The provider's neighbor sets break the fixed-topology contract.
    InvalidTopology {
        node: NodeId,
        neighbor: NodeId,
        detail: &'static str,
    },
    /// A negative or NaN cost was supplied.
    InvalidCost { node: NodeId, source: CostError },
    /// The provider returned a negative, infinite or NaN heuristic.
    InvalidHeuristic { node: NodeId, value: Cost },
    /// The open list rejected an operation whose precondition the engine assumed.
    Queue(QueueError),
    /// The open list disagrees with node consistency at an operation boundary.
    QueueInvariantViolation { node: NodeId, detail: &'static str },
    /// `lookahead(goal)` drifted from zero.
    GoalLookaheadViolation { value: Cost },
    /// A policy option is out of range.
    UnsupportedPolicy { detail: String },
}

impl std::fmt::Display for ReplanError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidNode { node } => write!(f, "node {node} is not in the table"),
            Self::InvalidTopology {
                node,
                neighbor,
                detail,
            } => write!(f, "invalid topology at {node} -> {neighbor}: {detail}"),
            Self::InvalidCost { node, source } => write!(f, "invalid cost for {node}: {source}"),
            Self::InvalidHeuristic { node, value } => {
                write!(f, "invalid heuristic {value} for {node}")
            }
            Self::Queue(err) => write!(f, "open list contract violated: {err}"),
            Self::QueueInvariantViolation { node, detail } => {
                write!(f, "open list invariant violated at {node}: {detail}")
            }
            Self::GoalLookaheadViolation { value } => {
                write!(f, "goal lookahead must be 0, found {value}")
            }
            Self::UnsupportedPolicy { detail } => write!(f, "unsupported policy: {detail}"),
        }
    }
}

impl std::error::Error for ReplanError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::InvalidCost { source, .. } => Some(source),
            Self::Queue(err) => Some(err),
            _ => None,
        }
    }
}

impl From<QueueError> for ReplanError {
    fn from(err: QueueError) -> Self {
        Self::Queue(err)
    }
}
