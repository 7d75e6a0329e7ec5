//! Episode runner: drive a replanner over a world and package the result.
//!
//! # Pipeline
//!
//! ```text
//! Replanner::new() → run(source) → trace() → canonical digest → EpisodeReport
//! ```
//!
//! The runner owns no planning logic; it wires a world and a change source to
//! the engine and binds the outcome to content digests.

use replan_kernel::cost::Cost;
use replan_kernel::proof::canon::CanonError;
use replan_kernel::proof::hash::ContentHash;
use replan_search::contract::{ChangeSource, GraphProvider};
use replan_search::engine::Replanner;
use replan_search::error::ReplanError;
use replan_search::node::NodeId;
use replan_search::policy::ReplanPolicyV1;
use replan_search::trace::{ReplanTraceV1, TerminationReasonV1};
use tracing::info;

use crate::contract::WorldFixtureV1;

/// Error during an episode.
#[derive(Debug, Clone, PartialEq)]
pub enum RunnerError {
    /// The engine rejected its inputs or failed an integration check.
    Replan(ReplanError),
    /// The trace or fixture could not be canonicalized.
    Canon(CanonError),
}

impl std::fmt::Display for RunnerError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Replan(e) => write!(f, "replan error: {e}"),
            Self::Canon(e) => write!(f, "canonicalization error: {e}"),
        }
    }
}

impl std::error::Error for RunnerError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Replan(e) => Some(e),
            Self::Canon(e) => Some(e),
        }
    }
}

impl From<ReplanError> for RunnerError {
    fn from(e: ReplanError) -> Self {
        Self::Replan(e)
    }
}

impl From<CanonError> for RunnerError {
    fn from(e: CanonError) -> Self {
        Self::Canon(e)
    }
}

/// Everything an episode produced.
#[derive(Debug, Clone)]
pub struct EpisodeReport {
    pub termination: TerminationReasonV1,
    /// Occupied nodes, origin first.
    pub travelled: Vec<NodeId>,
    /// Sum of entry costs paid along `travelled`.
    pub travelled_cost: Cost,
    pub trace: ReplanTraceV1,
    pub trace_digest: ContentHash,
    /// Present when the episode ran through [`run_fixture_episode`].
    pub fixture_digest: Option<ContentHash>,
}

/// Run one episode from `start` to `goal`.
///
/// # Errors
///
/// [`RunnerError::Replan`] for invalid worlds, endpoints, policies or
/// changes; [`RunnerError::Canon`] if the trace cannot be digested.
pub fn run_episode(
    world: &dyn GraphProvider,
    start: NodeId,
    goal: NodeId,
    source: &mut dyn ChangeSource,
    policy: ReplanPolicyV1,
) -> Result<EpisodeReport, RunnerError> {
    info!(nodes = world.node_count(), start = %start, goal = %goal, "episode started");
    let mut engine = Replanner::new(world, start, goal, policy)?;
    let termination = engine.run(source)?;

    let trace = engine.trace();
    let trace_digest = trace.digest()?;
    info!(
        ?termination,
        moves = trace.metadata.total_moves,
        expansions = trace.metadata.total_expansions,
        digest = %trace_digest,
        "episode finished"
    );
    Ok(EpisodeReport {
        termination,
        travelled: engine.travelled().to_vec(),
        travelled_cost: engine.travelled_cost(),
        trace,
        trace_digest,
        fixture_digest: None,
    })
}

/// [`run_episode`] for a world that can describe itself, binding the report
/// to the world's fixture digest.
///
/// # Errors
///
/// As [`run_episode`], plus [`RunnerError::Canon`] for an uncanonicalizable
/// fixture.
pub fn run_fixture_episode<W: GraphProvider + WorldFixtureV1>(
    world: &W,
    start: NodeId,
    goal: NodeId,
    source: &mut dyn ChangeSource,
    policy: ReplanPolicyV1,
) -> Result<EpisodeReport, RunnerError> {
    let fixture_digest = world.fixture_digest()?;
    info!(world = world.world_id(), fixture = %fixture_digest, "fixture bound");
    let mut report = run_episode(world, start, goal, source, policy)?;
    report.fixture_digest = Some(fixture_digest);
    Ok(report)
}
