//! Replan Search: incremental shortest-path replanning with an auditable trace.
//!
//! This crate provides the planning layer. It depends only on
//! `replan_kernel`; it does NOT depend on `replan_harness`.
//!
//! # Crate dependency graph
//!
//! ```text
//! replan_kernel  ←  replan_search  ←  replan_harness
//! (costs, proof)    (engine, queue)    (worlds, sensors, runner)
//! ```
//!
//! # Key types
//!
//! - [`Replanner`](engine::Replanner) -- D* Lite engine for a moving start and fixed goal
//! - [`PriorityKey`](key::PriorityKey) -- lexicographic two-component queue key
//! - [`PriorityQueue`](frontier::PriorityQueue) -- open-list contract, with
//!   [`BinaryHeapFrontier`](frontier::BinaryHeapFrontier) and
//!   [`OrderedFrontier`](frontier::OrderedFrontier) implementations
//! - [`NodeTable`](node::NodeTable) -- per-node estimate, lookahead, heuristic and cost
//! - [`ReplanTraceV1`](trace::ReplanTraceV1) -- expansion/move audit log
//! - [`ReplanPolicyV1`](policy::ReplanPolicyV1) -- budgets and invariant checking
//! - [`GraphProvider`](contract::GraphProvider) /
//!   [`ChangeSource`](contract::ChangeSource) -- the world-facing seams

#![forbid(unsafe_code)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]

pub mod contract;
pub mod engine;
pub mod error;
pub mod frontier;
pub mod key;
pub mod node;
pub mod policy;
pub mod trace;
