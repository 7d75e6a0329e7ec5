//! D* Lite replanning engine.
//!
//! The engine keeps, for every node, an estimate `g` of the cost to the goal
//! and a one-step lookahead `rhs`. The open list holds exactly the nodes where
//! the two disagree. `compute_shortest_path` pops nodes in key order and
//! restores consistency until no queued key can still lower the start's
//! estimate; cost changes only disturb the nodes next to the change, so a
//! repair touches a fraction of what a fresh search would.
//!
//! The start moves while the goal stays fixed, so the search runs backwards
//! from the goal and heuristics measure distance to the start. When the start
//! moves, keys already in the open list were computed under the old heuristic
//! frame; instead of re-keying the whole queue the engine grows `offset` by
//! `h(new_start, last_start)` and lazily re-keys stale entries as they surface.

use replan_kernel::cost::{is_infinite, validate_cost, Cost, INFINITE_COST};
use tracing::{debug, trace, warn};

use crate::contract::{ChangeSource, CostChange, GraphProvider};
use crate::error::ReplanError;
use crate::frontier::{BinaryHeapFrontier, PriorityQueue};
use crate::key::PriorityKey;
use crate::node::{Node, NodeId, NodeTable};
use crate::policy::{InvariantChecksV1, ReplanPolicyV1};
use crate::trace::{
    ExpansionRuleV1, ReplanTraceV1, TerminationReasonV1, TraceEventV1, TraceMetadataV1,
    TraceRecorder,
};

/// Result of one `compute_shortest_path` call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RepairOutcome {
    /// The start is consistent and no queued key can improve it.
    Converged { expansions: u64 },
    /// The expansion budget ran out first. Calling again resumes the repair.
    BudgetExhausted { expansions: u64 },
}

/// Result of one iteration of the top-level loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepOutcome {
    /// The start already is the goal; nothing to do.
    Arrived,
    /// The agent advanced and any observed changes were repaired.
    Moved { to: NodeId },
    /// No finite path leads from the start to the goal.
    NoPathExists,
    /// A repair ran out of budget. The agent may have advanced on this step,
    /// but it does not move again until a later step finishes the repair.
    NotConverged,
}

/// Incremental shortest-path planner for a moving start and a fixed goal.
///
/// The engine owns the node table and the open list for the whole episode;
/// the world is only consulted for topology, initial costs and heuristics.
pub struct Replanner<'w, Q: PriorityQueue = BinaryHeapFrontier> {
    world: &'w dyn GraphProvider,
    table: NodeTable,
    queue: Q,
    offset: Cost,
    origin: NodeId,
    start: NodeId,
    last: NodeId,
    goal: NodeId,
    policy: ReplanPolicyV1,
    policy_digest: String,
    recorder: TraceRecorder,
    travelled: Vec<NodeId>,
    travelled_cost: Cost,
    /// The last repair stopped at its budget; labels are not yet trustworthy.
    pending_repair: bool,
    /// Reused neighbor buffer for expansions and cost updates.
    scratch: Vec<NodeId>,
}

impl<'w> Replanner<'w, BinaryHeapFrontier> {
    /// Build an engine backed by the binary-heap open list.
    ///
    /// # Errors
    ///
    /// See [`Replanner::with_queue`].
    pub fn new(
        world: &'w dyn GraphProvider,
        start: NodeId,
        goal: NodeId,
        policy: ReplanPolicyV1,
    ) -> Result<Self, ReplanError> {
        Self::with_queue(world, start, goal, BinaryHeapFrontier::new(), policy)
    }
}

impl<'w, Q: PriorityQueue> Replanner<'w, Q> {
    /// Build an engine over `world` with a caller-chosen open list.
    ///
    /// The engine is not initialized; call [`Replanner::initialize`] (or
    /// [`Replanner::run`], which does so) before repairing.
    ///
    /// # Errors
    ///
    /// - [`ReplanError::UnsupportedPolicy`] if the policy fails validation.
    /// - [`ReplanError::InvalidTopology`] / [`ReplanError::InvalidCost`] if the
    ///   world breaks the provider contract.
    /// - [`ReplanError::InvalidNode`] if `start` or `goal` is not in the world.
    /// - [`ReplanError::InvalidHeuristic`] for a negative or non-finite heuristic.
    pub fn with_queue(
        world: &'w dyn GraphProvider,
        start: NodeId,
        goal: NodeId,
        mut queue: Q,
        policy: ReplanPolicyV1,
    ) -> Result<Self, ReplanError> {
        policy.validate()?;
        let policy_digest = policy
            .digest()
            .map_err(|e| ReplanError::UnsupportedPolicy {
                detail: e.to_string(),
            })?
            .as_str()
            .to_string();
        let table = NodeTable::from_provider(world)?;
        table.node(start)?;
        table.node(goal)?;
        queue.clear();

        let recorder = TraceRecorder::new(policy.record_events);
        let mut engine = Self {
            world,
            table,
            queue,
            offset: 0.0,
            origin: start,
            start,
            last: start,
            goal,
            policy,
            policy_digest,
            recorder,
            travelled: vec![start],
            travelled_cost: 0.0,
            pending_repair: false,
            scratch: Vec::new(),
        };
        engine.rebase_heuristics()?;
        Ok(engine)
    }

    // -----------------------------------------------------------------------
    // Accessors
    // -----------------------------------------------------------------------

    #[must_use]
    pub fn start(&self) -> NodeId {
        self.start
    }

    #[must_use]
    pub fn goal(&self) -> NodeId {
        self.goal
    }

    /// Accumulated key offset.
    #[must_use]
    pub fn offset(&self) -> Cost {
        self.offset
    }

    #[must_use]
    pub fn table(&self) -> &NodeTable {
        &self.table
    }

    /// Look up a node.
    ///
    /// # Errors
    ///
    /// Returns [`ReplanError::InvalidNode`] if `id` is not in the table.
    pub fn node(&self, id: NodeId) -> Result<&Node, ReplanError> {
        self.table.node(id)
    }

    #[must_use]
    pub fn queue(&self) -> &Q {
        &self.queue
    }

    #[must_use]
    pub fn policy(&self) -> &ReplanPolicyV1 {
        &self.policy
    }

    /// Nodes occupied so far, starting with the origin.
    #[must_use]
    pub fn travelled(&self) -> &[NodeId] {
        &self.travelled
    }

    /// Sum of entry costs paid along [`Replanner::travelled`].
    #[must_use]
    pub fn travelled_cost(&self) -> Cost {
        self.travelled_cost
    }

    /// Whether the last repair stopped at its budget before converging.
    #[must_use]
    pub fn repair_pending(&self) -> bool {
        self.pending_repair
    }

    // -----------------------------------------------------------------------
    // Core operations
    // -----------------------------------------------------------------------

    /// Priority of `node` under the current heuristic frame and offset.
    ///
    /// `first = min(g, rhs) + h + offset`, `second = min(g, rhs)`.
    ///
    /// # Errors
    ///
    /// Returns [`ReplanError::InvalidNode`] if `node` is not in the table.
    pub fn calculate_key(&self, node: NodeId) -> Result<PriorityKey, ReplanError> {
        Ok(self.key_for(self.table.node(node)?))
    }

    fn key_for(&self, node: &Node) -> PriorityKey {
        let best = node.estimate().min(node.lookahead());
        PriorityKey::new(best + node.heuristic() + self.offset, best)
    }

    /// Reset all search state and seed the open list with the goal.
    ///
    /// # Errors
    ///
    /// Propagates heuristic validation and invariant-check failures.
    pub fn initialize(&mut self) -> Result<(), ReplanError> {
        self.queue.clear();
        self.offset = 0.0;
        self.pending_repair = false;
        self.last = self.start;
        self.rebase_heuristics()?;
        for (_, node) in self.table.nodes_mut() {
            node.reset();
        }

        let goal = self.table.node_mut(self.goal)?;
        goal.set_lookahead(0.0);
        let key = PriorityKey::new(goal.heuristic(), 0.0);
        self.queue.insert(self.goal, key)?;

        self.recorder.record(TraceEventV1::Initialized {
            start: self.start,
            goal: self.goal,
        });
        self.check_boundary()
    }

    /// Make `node`'s open-list membership match its consistency.
    ///
    /// Inconsistent nodes are inserted or re-keyed; consistent nodes are
    /// removed if present.
    ///
    /// # Errors
    ///
    /// Returns [`ReplanError::InvalidNode`] if `node` is not in the table.
    pub fn update_node(&mut self, node: NodeId) -> Result<(), ReplanError> {
        let entry = self.table.node(node)?;
        let inconsistent = !entry.is_locally_consistent();
        let queued = self.queue.contains(node);
        match (inconsistent, queued) {
            (true, true) => self.queue.update(node, self.key_for(entry))?,
            (true, false) => self.queue.insert(node, self.key_for(entry))?,
            (false, true) => self.queue.remove(node)?,
            (false, false) => {}
        }
        Ok(())
    }

    /// Expand nodes until the start is consistent and no queued key is
    /// smaller than the start's own key.
    ///
    /// # Errors
    ///
    /// Returns a [`ReplanError`] only for integration failures (open-list
    /// contract breaches, invariant-check failures). Running out of budget is
    /// [`RepairOutcome::BudgetExhausted`].
    pub fn compute_shortest_path(&mut self) -> Result<RepairOutcome, ReplanError> {
        let mut expansions = 0u64;
        let outcome = loop {
            let Ok(top_key) = self.queue.top_key() else {
                break RepairOutcome::Converged { expansions };
            };
            let start = self.table.node(self.start)?;
            let start_key = self.key_for(start);
            if top_key >= start_key && start.is_locally_consistent() {
                break RepairOutcome::Converged { expansions };
            }
            if expansions >= self.policy.max_expansions_per_repair {
                break RepairOutcome::BudgetExhausted { expansions };
            }
            expansions += 1;
            self.expand_top(top_key)?;
        };

        self.recorder.repairs += 1;
        self.pending_repair = matches!(outcome, RepairOutcome::BudgetExhausted { .. });
        match outcome {
            RepairOutcome::Converged { expansions } => debug!(
                expansions,
                start = %self.start,
                queued = self.queue.len(),
                "repair converged"
            ),
            RepairOutcome::BudgetExhausted { expansions } => warn!(
                expansions,
                start = %self.start,
                "repair stopped at expansion budget"
            ),
        }
        self.check_boundary()?;
        Ok(outcome)
    }

    /// Pop-and-expand step for the node at the top of the open list.
    fn expand_top(&mut self, old_key: PriorityKey) -> Result<(), ReplanError> {
        let u = self.queue.top_element()?;
        let node = self.table.node(u)?;
        let new_key = self.key_for(node);
        let order = self.recorder.expansions;

        if old_key < new_key {
            self.queue.update(u, new_key)?;
            self.record_expansion(order, u, old_key, ExpansionRuleV1::Rekeyed);
            return Ok(());
        }

        let (cost, estimate, lookahead) = (node.cost(), node.estimate(), node.lookahead());
        let neighbors = self.load_neighbors(u)?;

        if estimate > lookahead {
            self.record_expansion(order, u, old_key, ExpansionRuleV1::Overconsistent);
            self.table.node_mut(u)?.set_estimate(lookahead);
            self.queue.remove(u)?;

            let through_u = cost + lookahead;
            for &p in &neighbors {
                if p != self.goal {
                    let pred = self.table.node_mut(p)?;
                    if through_u < pred.lookahead() {
                        pred.set_lookahead(through_u);
                    }
                }
                self.update_node(p)?;
            }
        } else {
            self.record_expansion(order, u, old_key, ExpansionRuleV1::Underconsistent);
            self.table.node_mut(u)?.set_estimate(INFINITE_COST);

            let through_u = cost + estimate;
            for &p in neighbors.iter().chain(std::iter::once(&u)) {
                if p != self.goal && self.table.node(p)?.lookahead() == through_u {
                    let best = self.best_lookahead(p)?;
                    self.table.node_mut(p)?.set_lookahead(best);
                }
                self.update_node(p)?;
            }
        }

        self.scratch = neighbors;
        Ok(())
    }

    fn record_expansion(&mut self, order: u64, node: NodeId, pop_key: PriorityKey, rule: ExpansionRuleV1) {
        trace!(order, node = %node, key = %pop_key, rule = rule.as_str(), "expand");
        self.recorder.record(TraceEventV1::Expanded {
            order,
            node,
            pop_key,
            rule,
        });
    }

    /// `min over successors s of (cost(s) + g(s))`, or infinity.
    fn best_lookahead(&self, node: NodeId) -> Result<Cost, ReplanError> {
        let mut best = INFINITE_COST;
        for &s in self.table.node(node)?.neighbors() {
            let succ = self.table.node(s)?;
            let via = succ.cost() + succ.estimate();
            if via < best {
                best = via;
            }
        }
        Ok(best)
    }

    fn load_neighbors(&mut self, node: NodeId) -> Result<Vec<NodeId>, ReplanError> {
        let mut buf = std::mem::take(&mut self.scratch);
        buf.clear();
        buf.extend_from_slice(self.table.node(node)?.neighbors());
        Ok(buf)
    }

    // -----------------------------------------------------------------------
    // Cost changes and heuristic rebasing
    // -----------------------------------------------------------------------

    /// Apply a batch of entry-cost changes and seed the repair.
    ///
    /// Changing `cost(n)` changes every edge `u -> n`, so the lookahead of each
    /// neighbor `u` is updated. The caller runs
    /// [`Replanner::compute_shortest_path`] afterwards. Returns the number of
    /// changes that actually altered a cost.
    ///
    /// # Errors
    ///
    /// The whole batch is validated first: [`ReplanError::InvalidNode`] or
    /// [`ReplanError::InvalidCost`] leaves the table untouched.
    pub fn apply_cost_changes(&mut self, changes: &[CostChange]) -> Result<usize, ReplanError> {
        let batch = self.validate_changes(changes)?;
        self.apply_validated(&batch)
    }

    fn validate_changes(&self, changes: &[CostChange]) -> Result<Vec<(NodeId, Cost)>, ReplanError> {
        changes
            .iter()
            .map(|change| {
                self.table.node(change.node)?;
                let cost = validate_cost(change.cost).map_err(|source| ReplanError::InvalidCost {
                    node: change.node,
                    source,
                })?;
                Ok((change.node, cost))
            })
            .collect()
    }

    fn apply_validated(&mut self, batch: &[(NodeId, Cost)]) -> Result<usize, ReplanError> {
        let mut applied = 0;
        for &(changed, new_cost) in batch {
            let node = self.table.node_mut(changed)?;
            let old_cost = node.cost();
            if old_cost == new_cost {
                continue;
            }
            node.set_cost(new_cost);
            let estimate = node.estimate();
            self.recorder.record(TraceEventV1::CostChanged {
                node: changed,
                old_cost,
                new_cost,
            });
            applied += 1;

            let neighbors = self.load_neighbors(changed)?;
            for &u in &neighbors {
                if u != self.goal {
                    if new_cost < old_cost {
                        let candidate = new_cost + estimate;
                        let entry = self.table.node_mut(u)?;
                        if candidate < entry.lookahead() {
                            entry.set_lookahead(candidate);
                        }
                    } else if self.table.node(u)?.lookahead() == old_cost + estimate {
                        let best = self.best_lookahead(u)?;
                        self.table.node_mut(u)?.set_lookahead(best);
                    }
                }
                self.update_node(u)?;
            }
            self.scratch = neighbors;
        }
        debug!(applied, requested = batch.len(), "cost changes applied");
        self.check_boundary()?;
        Ok(applied)
    }

    /// Recompute every heuristic against the current start.
    fn rebase_heuristics(&mut self) -> Result<(), ReplanError> {
        let world = self.world;
        let start = self.start;
        for (id, node) in self.table.nodes_mut() {
            let value = world.heuristic(start, id);
            if !value.is_finite() || value < 0.0 {
                return Err(ReplanError::InvalidHeuristic { node: id, value });
            }
            node.set_heuristic(value);
        }
        Ok(())
    }

    /// Move the heuristic frame to the current start and grow the offset.
    fn rebase(&mut self) -> Result<(), ReplanError> {
        self.rebase_heuristics()?;
        self.offset += self.table.node(self.last)?.heuristic();
        self.last = self.start;
        self.recorder.record(TraceEventV1::Rebased {
            start: self.start,
            offset: self.offset,
        });
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Policy descent and the top-level loop
    // -----------------------------------------------------------------------

    /// The neighbor of `from` minimizing `cost(n) + g(n)`.
    ///
    /// Ties go to the lowest handle. `None` if every neighbor is unreachable.
    ///
    /// # Errors
    ///
    /// Returns [`ReplanError::InvalidNode`] if `from` is not in the table.
    pub fn next_move(&self, from: NodeId) -> Result<Option<NodeId>, ReplanError> {
        let mut best: Option<(Cost, NodeId)> = None;
        for &n in self.table.node(from)?.neighbors() {
            let node = self.table.node(n)?;
            let via = node.cost() + node.estimate();
            if is_infinite(via) {
                continue;
            }
            match best {
                Some((current, _)) if via >= current => {}
                _ => best = Some((via, n)),
            }
        }
        Ok(best.map(|(_, n)| n))
    }

    /// Follow the policy from the start to the goal.
    ///
    /// `None` if the goal is unreachable from the current labeling. Only
    /// meaningful after a converged repair.
    ///
    /// # Errors
    ///
    /// Returns [`ReplanError::InvalidNode`] on a corrupted table.
    pub fn extract_path(&self) -> Result<Option<Vec<NodeId>>, ReplanError> {
        let mut path = vec![self.start];
        let mut current = self.start;
        while current != self.goal {
            if path.len() > self.table.len() {
                return Ok(None);
            }
            let Some(next) = self.next_move(current)? else {
                return Ok(None);
            };
            path.push(next);
            current = next;
        }
        Ok(Some(path))
    }

    /// One iteration of the top-level loop: advance along the policy, scan
    /// for changes, and repair if any were observed.
    ///
    /// Callers may stop between steps at any time. A repair interrupted by
    /// the expansion budget is resumed first; while it stays unfinished the
    /// step returns [`StepOutcome::NotConverged`] without moving, so neither
    /// the move nor a no-path verdict is taken from half-repaired labels.
    ///
    /// # Errors
    ///
    /// Invalid changes from `source` ([`ReplanError::InvalidCost`],
    /// [`ReplanError::InvalidNode`]) and integration failures. Changes are
    /// scanned after the move, so on an invalid batch the agent has already
    /// advanced (start, travelled path and `Moved` event) while the batch
    /// itself is discarded unapplied.
    pub fn step(&mut self, source: &mut dyn ChangeSource) -> Result<StepOutcome, ReplanError> {
        if self.start == self.goal {
            return Ok(StepOutcome::Arrived);
        }
        if self.pending_repair {
            if let RepairOutcome::BudgetExhausted { .. } = self.compute_shortest_path()? {
                return Ok(StepOutcome::NotConverged);
            }
        }
        if is_infinite(self.table.node(self.start)?.lookahead()) {
            warn!(start = %self.start, "no path to goal");
            return Ok(StepOutcome::NoPathExists);
        }
        let Some(next) = self.next_move(self.start)? else {
            warn!(start = %self.start, "no traversable neighbor");
            return Ok(StepOutcome::NoPathExists);
        };

        let from = self.start;
        self.start = next;
        self.travelled.push(next);
        self.travelled_cost += self.table.node(next)?.cost();
        self.recorder.record(TraceEventV1::Moved { from, to: next });
        source.advance(next);

        let changes = source.scan(next);
        if changes.is_empty() {
            return Ok(StepOutcome::Moved { to: next });
        }
        let batch = self.validate_changes(&changes)?;
        self.rebase()?;
        self.apply_validated(&batch)?;
        match self.compute_shortest_path()? {
            RepairOutcome::Converged { .. } => Ok(StepOutcome::Moved { to: next }),
            RepairOutcome::BudgetExhausted { .. } => Ok(StepOutcome::NotConverged),
        }
    }

    /// Plan from the current start and walk to the goal, repairing after
    /// every observed change.
    ///
    /// Each run starts a fresh trace: events and counters from earlier runs on
    /// the same engine are discarded.
    ///
    /// # Errors
    ///
    /// Only integration failures are errors; every planning outcome is a
    /// [`TerminationReasonV1`].
    pub fn run(&mut self, source: &mut dyn ChangeSource) -> Result<TerminationReasonV1, ReplanError> {
        self.origin = self.start;
        self.travelled = vec![self.start];
        self.travelled_cost = 0.0;
        self.recorder = TraceRecorder::new(self.policy.record_events);
        self.initialize()?;

        let reason = match self.compute_shortest_path()? {
            RepairOutcome::BudgetExhausted { .. } => TerminationReasonV1::NotConverged { at: self.start },
            RepairOutcome::Converged { .. } => self.drive(source)?,
        };
        debug!(?reason, moves = self.travelled.len() - 1, "run finished");
        self.recorder.termination = Some(reason);
        Ok(reason)
    }

    fn drive(&mut self, source: &mut dyn ChangeSource) -> Result<TerminationReasonV1, ReplanError> {
        let mut moves = 0u64;
        loop {
            let at = self.start;
            if at == self.goal {
                return Ok(TerminationReasonV1::GoalReached { at });
            }
            if moves >= self.policy.max_moves {
                return Ok(TerminationReasonV1::MoveBudgetExceeded { at });
            }
            match self.step(source)? {
                StepOutcome::Arrived => return Ok(TerminationReasonV1::GoalReached { at }),
                StepOutcome::Moved { .. } => moves += 1,
                StepOutcome::NoPathExists => return Ok(TerminationReasonV1::NoPathExists { at }),
                StepOutcome::NotConverged => {
                    return Ok(TerminationReasonV1::NotConverged { at: self.start })
                }
            }
        }
    }

    // -----------------------------------------------------------------------
    // Invariants and trace
    // -----------------------------------------------------------------------

    /// Verify `lookahead(goal) == 0` and that the open list holds exactly the
    /// locally inconsistent nodes.
    ///
    /// # Errors
    ///
    /// [`ReplanError::GoalLookaheadViolation`] or
    /// [`ReplanError::QueueInvariantViolation`] naming the first offender.
    pub fn check_invariants(&self) -> Result<(), ReplanError> {
        let goal_lookahead = self.table.node(self.goal)?.lookahead();
        if goal_lookahead != 0.0 {
            return Err(ReplanError::GoalLookaheadViolation {
                value: goal_lookahead,
            });
        }
        for (id, node) in self.table.iter() {
            match (node.is_locally_consistent(), self.queue.contains(id)) {
                (true, true) => {
                    return Err(ReplanError::QueueInvariantViolation {
                        node: id,
                        detail: "locally consistent node is queued",
                    })
                }
                (false, false) => {
                    return Err(ReplanError::QueueInvariantViolation {
                        node: id,
                        detail: "inconsistent node is missing from the open list",
                    })
                }
                _ => {}
            }
        }
        Ok(())
    }

    fn check_boundary(&self) -> Result<(), ReplanError> {
        match self.policy.invariant_checks {
            InvariantChecksV1::Off => Ok(()),
            InvariantChecksV1::Boundaries => self.check_invariants(),
        }
    }

    /// Snapshot of the audit trail so far.
    #[must_use]
    pub fn trace(&self) -> ReplanTraceV1 {
        ReplanTraceV1 {
            events: self.recorder.events().to_vec(),
            metadata: TraceMetadataV1 {
                origin: self.origin,
                goal: self.goal,
                node_count: self.table.len() as u64,
                policy_digest: self.policy_digest.clone(),
                total_expansions: self.recorder.expansions,
                total_rekeys: self.recorder.rekeys,
                total_repairs: self.recorder.repairs,
                total_moves: self.recorder.moves,
                total_cost_changes: self.recorder.cost_changes,
                frontier_high_water: self.queue.high_water() as u64,
                final_offset: self.offset,
                termination_reason: self.recorder.termination,
            },
        }
    }
}
