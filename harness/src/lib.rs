//! Replan Harness: worlds, change sources and episode orchestration.
//!
//! The harness runs a world through the replanning engine
//! (`Replanner::new` → `run` → `trace` → digest) and packages the result as
//! an [`EpisodeReport`](runner::EpisodeReport).
//!
//! The harness does NOT implement planning logic; it delegates to
//! `replan_search`. Worlds provide topology, costs and heuristics only; the
//! harness owns orchestration and digests.

#![forbid(unsafe_code)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]

pub mod contract;
pub mod reference;
pub mod runner;
pub mod sensor;
pub mod worlds;
