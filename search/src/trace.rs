//! `ReplanTraceV1`: replanning audit log.
//!
//! The ordered event list records every decision the engine made: which
//! node was popped under which key and which expansion rule fired, every
//! move, every heuristic rebase and every cost change. Metadata carries the
//! counters and the termination reason. Canonical JSON bytes of the trace are
//! deterministic, so two runs over the same inputs have the same digest.

use replan_kernel::cost::{cost_repr, Cost};
use replan_kernel::proof::canon::{canonical_json_bytes, CanonError};
use replan_kernel::proof::hash::{canonical_hash, ContentHash, HashDomain};

use crate::key::PriorityKey;
use crate::node::NodeId;

/// The complete replanning audit trail.
#[derive(Debug, Clone)]
pub struct ReplanTraceV1 {
    /// Ordered events (empty when event recording is disabled).
    pub events: Vec<TraceEventV1>,
    pub metadata: TraceMetadataV1,
}

/// One recorded engine decision.
#[derive(Debug, Clone, PartialEq)]
pub enum TraceEventV1 {
    /// Search state reset; goal seeded into the open list.
    Initialized { start: NodeId, goal: NodeId },
    /// A node was popped from the top of the open list.
    Expanded {
        order: u64,
        node: NodeId,
        pop_key: PriorityKey,
        rule: ExpansionRuleV1,
    },
    /// The agent advanced one node along the current policy.
    Moved { from: NodeId, to: NodeId },
    /// Heuristics were recomputed against a new start and the offset grew.
    Rebased { start: NodeId, offset: Cost },
    /// An entry cost changed.
    CostChanged {
        node: NodeId,
        old_cost: Cost,
        new_cost: Cost,
    },
}

/// Which branch of the expansion step handled a popped node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExpansionRuleV1 {
    /// The stored key was stale; the node was re-queued under its fresh key.
    Rekeyed,
    /// `estimate > lookahead`: estimate lowered, improvement propagated.
    Overconsistent,
    /// `estimate < lookahead`: estimate invalidated, dependents recomputed.
    Underconsistent,
}

impl ExpansionRuleV1 {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Rekeyed => "rekeyed",
            Self::Overconsistent => "overconsistent",
            Self::Underconsistent => "underconsistent",
        }
    }
}

/// Why a `run` ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TerminationReasonV1 {
    /// The agent stands on the goal.
    GoalReached { at: NodeId },
    /// After convergence `lookahead(start)` is infinite.
    NoPathExists { at: NodeId },
    /// A repair hit `max_expansions_per_repair` before converging.
    NotConverged { at: NodeId },
    /// `max_moves` moves were made without reaching the goal.
    MoveBudgetExceeded { at: NodeId },
}

impl TerminationReasonV1 {
    /// Node the agent occupied when the run ended.
    #[must_use]
    pub fn position(self) -> NodeId {
        match self {
            Self::GoalReached { at }
            | Self::NoPathExists { at }
            | Self::NotConverged { at }
            | Self::MoveBudgetExceeded { at } => at,
        }
    }

    #[must_use]
    pub fn is_goal_reached(self) -> bool {
        matches!(self, Self::GoalReached { .. })
    }
}

/// Aggregate counters and bindings.
#[derive(Debug, Clone, PartialEq)]
pub struct TraceMetadataV1 {
    pub origin: NodeId,
    pub goal: NodeId,
    pub node_count: u64,
    pub policy_digest: String,

    // Counters
    pub total_expansions: u64,
    pub total_rekeys: u64,
    pub total_repairs: u64,
    pub total_moves: u64,
    pub total_cost_changes: u64,
    pub frontier_high_water: u64,
    pub final_offset: Cost,
    pub termination_reason: Option<TerminationReasonV1>,
}

// ---------------------------------------------------------------------------
// Recorder
// ---------------------------------------------------------------------------

/// Accumulates events and counters while the engine runs.
#[derive(Debug, Clone)]
pub(crate) struct TraceRecorder {
    record_events: bool,
    events: Vec<TraceEventV1>,
    pub(crate) expansions: u64,
    pub(crate) rekeys: u64,
    pub(crate) repairs: u64,
    pub(crate) moves: u64,
    pub(crate) cost_changes: u64,
    pub(crate) termination: Option<TerminationReasonV1>,
}

impl TraceRecorder {
    pub(crate) fn new(record_events: bool) -> Self {
        Self {
            record_events,
            events: Vec::new(),
            expansions: 0,
            rekeys: 0,
            repairs: 0,
            moves: 0,
            cost_changes: 0,
            termination: None,
        }
    }

    pub(crate) fn record(&mut self, event: TraceEventV1) {
        match &event {
            TraceEventV1::Expanded { rule, .. } => {
                self.expansions += 1;
                if *rule == ExpansionRuleV1::Rekeyed {
                    self.rekeys += 1;
                }
            }
            TraceEventV1::Moved { .. } => self.moves += 1,
            TraceEventV1::CostChanged { .. } => self.cost_changes += 1,
            TraceEventV1::Initialized { .. } | TraceEventV1::Rebased { .. } => {}
        }
        if self.record_events {
            self.events.push(event);
        }
    }

    pub(crate) fn events(&self) -> &[TraceEventV1] {
        &self.events
    }
}

// ---------------------------------------------------------------------------
// Canonical JSON serialization
// ---------------------------------------------------------------------------

impl ReplanTraceV1 {
    /// Serialize the trace to canonical JSON bytes.
    ///
    /// # Errors
    ///
    /// Returns [`CanonError`] if serialization fails.
    pub fn to_canonical_json_bytes(&self) -> Result<Vec<u8>, CanonError> {
        canonical_json_bytes(&self.to_json_value())
    }

    /// Content digest of the canonical trace bytes.
    ///
    /// # Errors
    ///
    /// Returns [`CanonError`] if serialization fails.
    pub fn digest(&self) -> Result<ContentHash, CanonError> {
        let bytes = self.to_canonical_json_bytes()?;
        Ok(canonical_hash(HashDomain::ReplanTrace, &bytes))
    }

    #[must_use]
    pub fn to_json_value(&self) -> serde_json::Value {
        serde_json::json!({
            "events": self.events.iter().map(event_to_json).collect::<Vec<_>>(),
            "metadata": metadata_to_json(&self.metadata),
        })
    }
}

fn key_to_json(key: PriorityKey) -> serde_json::Value {
    serde_json::json!([cost_repr(key.first), cost_repr(key.second)])
}

fn event_to_json(event: &TraceEventV1) -> serde_json::Value {
    match event {
        TraceEventV1::Initialized { start, goal } => {
            serde_json::json!({"goal": goal.index(), "start": start.index(), "type": "initialized"})
        }
        TraceEventV1::Expanded {
            order,
            node,
            pop_key,
            rule,
        } => serde_json::json!({
            "node": node.index(),
            "order": order,
            "pop_key": key_to_json(*pop_key),
            "rule": rule.as_str(),
            "type": "expanded",
        }),
        TraceEventV1::Moved { from, to } => {
            serde_json::json!({"from": from.index(), "to": to.index(), "type": "moved"})
        }
        TraceEventV1::Rebased { start, offset } => serde_json::json!({
            "offset": cost_repr(*offset),
            "start": start.index(),
            "type": "rebased",
        }),
        TraceEventV1::CostChanged {
            node,
            old_cost,
            new_cost,
        } => serde_json::json!({
            "new_cost": cost_repr(*new_cost),
            "node": node.index(),
            "old_cost": cost_repr(*old_cost),
            "type": "cost_changed",
        }),
    }
}

fn termination_reason_to_json(reason: TerminationReasonV1) -> serde_json::Value {
    let kind = match reason {
        TerminationReasonV1::GoalReached { .. } => "goal_reached",
        TerminationReasonV1::NoPathExists { .. } => "no_path_exists",
        TerminationReasonV1::NotConverged { .. } => "not_converged",
        TerminationReasonV1::MoveBudgetExceeded { .. } => "move_budget_exceeded",
    };
    serde_json::json!({"at": reason.position().index(), "type": kind})
}

fn metadata_to_json(m: &TraceMetadataV1) -> serde_json::Value {
    serde_json::json!({
        "final_offset": cost_repr(m.final_offset),
        "frontier_high_water": m.frontier_high_water,
        "goal": m.goal.index(),
        "node_count": m.node_count,
        "origin": m.origin.index(),
        "policy_digest": m.policy_digest,
        "termination_reason": m.termination_reason.map(termination_reason_to_json),
        "total_cost_changes": m.total_cost_changes,
        "total_expansions": m.total_expansions,
        "total_moves": m.total_moves,
        "total_repairs": m.total_repairs,
        "total_rekeys": m.total_rekeys,
    })
}
