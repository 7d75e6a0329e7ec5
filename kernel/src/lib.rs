//! Replan Kernel: the numeric and proof primitives shared by the planner.
//!
//! # API Surface
//!
//! - [`cost`] -- validated traversal costs (non-negative reals, `infinity` = impassable)
//! - [`proof::canon::canonical_json_bytes`] -- the single canonical JSON serializer
//! - [`proof::hash::canonical_hash`] -- domain-separated SHA-256 content hashing
//!
//! # Module Dependency Direction
//!
//! `cost` ← `proof`
//!
//! `proof` encodes costs for canonical artifacts; `cost` depends on nothing internal.

#![forbid(unsafe_code)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]

pub mod cost;
pub mod proof;
