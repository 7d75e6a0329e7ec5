//! Shared regimes for replanning benchmark suites.
//!
//! A regime is a believed grid (what the agent plans on), a true grid (what
//! the sensor reveals), and the endpoints. All regimes are deterministic.

use replan_harness::runner::{run_episode, EpisodeReport, RunnerError};
use replan_harness::sensor::RevealingSensor;
use replan_harness::worlds::{Connectivity, GridWorld, WorldError};
use replan_kernel::cost::{Cost, INFINITE_COST};
use replan_search::contract::CostChange;
use replan_search::engine::Replanner;
use replan_search::node::NodeId;
use replan_search::policy::{InvariantChecksV1, ReplanPolicyV1};

/// Sensor reach for every regime.
pub const SENSOR_RADIUS: usize = 2;

/// Believed and true maps for one benchmark scenario.
pub struct Regime {
    pub name: &'static str,
    pub believed: GridWorld,
    pub truth: GridWorld,
    pub start: NodeId,
    pub goal: NodeId,
}

/// Failure while building or running a regime.
#[derive(Debug)]
pub enum RegimeError {
    World(WorldError),
    Runner(RunnerError),
}

impl From<WorldError> for RegimeError {
    fn from(e: WorldError) -> Self {
        Self::World(e)
    }
}

impl From<RunnerError> for RegimeError {
    fn from(e: RunnerError) -> Self {
        Self::Runner(e)
    }
}

impl std::fmt::Display for RegimeError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::World(e) => write!(f, "world: {e}"),
            Self::Runner(e) => write!(f, "runner: {e}"),
        }
    }
}

impl std::error::Error for RegimeError {}

/// Benchmark policy: release-mode invariant checks off, events recorded.
#[must_use]
pub fn bench_policy() -> ReplanPolicyV1 {
    ReplanPolicyV1 {
        invariant_checks: InvariantChecksV1::Off,
        ..ReplanPolicyV1::default()
    }
}

fn corners(world: &GridWorld) -> Result<(NodeId, NodeId), WorldError> {
    let missing = WorldError::NodeOutOfRange { node: NodeId(0) };
    let start = world.id(0, 0).ok_or_else(|| missing.clone())?;
    let goal = world
        .id(world.width() - 1, world.height() - 1)
        .ok_or(missing)?;
    Ok((start, goal))
}

fn regime(name: &'static str, side: usize, truth_cost: impl Fn(usize, usize) -> Cost) -> Result<Regime, WorldError> {
    let believed = GridWorld::uniform(side, side, Connectivity::Eight)?;
    let cells = (0..side * side)
        .map(|i| truth_cost(i % side, i / side))
        .collect();
    let truth = GridWorld::new(side, side, cells, Connectivity::Eight)?;
    let (start, goal) = corners(&believed)?;
    Ok(Regime {
        name,
        believed,
        truth,
        start,
        goal,
    })
}

/// Nothing hidden: the agent's first plan is final.
///
/// # Errors
///
/// [`WorldError`] for a zero side.
pub fn regime_open(side: usize) -> Result<Regime, WorldError> {
    regime("open", side, |_, _| 1.0)
}

/// Serpentine walls every fourth column, gaps alternating top and bottom.
///
/// # Errors
///
/// [`WorldError`] for a zero side.
pub fn regime_serpentine(side: usize) -> Result<Regime, WorldError> {
    regime("serpentine", side, |x, y| {
        let wall_column = x % 4 == 3 && x + 1 < side;
        let gap_row = if (x / 4) % 2 == 0 { side - 1 } else { 0 };
        if wall_column && y != gap_row {
            INFINITE_COST
        } else {
            1.0
        }
    })
}

/// Terrain costs `1..=9` everywhere, revealed as the agent moves.
///
/// # Errors
///
/// [`WorldError`] for a zero side.
#[allow(clippy::cast_precision_loss)]
pub fn regime_terrain(side: usize) -> Result<Regime, WorldError> {
    regime("terrain", side, |x, y| ((x * 7 + y * 13) % 9 + 1) as Cost)
}

/// Every regime at one size.
///
/// # Errors
///
/// [`WorldError`] for a zero side.
pub fn all_regimes(side: usize) -> Result<Vec<Regime>, WorldError> {
    Ok(vec![
        regime_open(side)?,
        regime_serpentine(side)?,
        regime_terrain(side)?,
    ])
}

/// Run a regime end to end with a revealing sensor.
///
/// # Errors
///
/// [`RegimeError`] if the sensor or the episode fails.
pub fn run_regime(regime: &Regime, policy: ReplanPolicyV1) -> Result<EpisodeReport, RegimeError> {
    let mut sensor = RevealingSensor::new(&regime.believed, &regime.truth, SENSOR_RADIUS)?;
    Ok(run_episode(
        &regime.believed,
        regime.start,
        regime.goal,
        &mut sensor,
        policy,
    )?)
}

/// A converged engine on `world`, ready for a repair.
///
/// # Errors
///
/// Propagates engine construction failures.
pub fn converged<'w>(
    world: &'w GridWorld,
    start: NodeId,
    goal: NodeId,
) -> Result<Replanner<'w>, replan_search::error::ReplanError> {
    let mut engine = Replanner::new(world, start, goal, bench_policy())?;
    engine.initialize()?;
    engine.compute_shortest_path()?;
    Ok(engine)
}

/// A wall across the middle of the current best path, for repair benchmarks.
///
/// # Errors
///
/// Propagates engine failures while extracting the path.
pub fn block_midpath(engine: &Replanner<'_>) -> Result<Vec<CostChange>, replan_search::error::ReplanError> {
    let path = engine.extract_path()?.unwrap_or_default();
    let Some(&mid) = path.get(path.len() / 2) else {
        return Ok(Vec::new());
    };
    if mid == engine.start() || mid == engine.goal() {
        return Ok(Vec::new());
    }
    let mut changes = vec![CostChange {
        node: mid,
        cost: INFINITE_COST,
    }];
    for &n in engine.node(mid)?.neighbors() {
        if n != engine.start() && n != engine.goal() {
            changes.push(CostChange {
                node: n,
                cost: INFINITE_COST,
            });
        }
    }
    Ok(changes)
}
