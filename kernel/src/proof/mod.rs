//! Proof module: canonical serialization and content hashing for audit artifacts.
//!
//! Depends on nothing in `cost`; `cost` encodes itself for canonical bytes.

pub mod canon;
pub mod hash;
pub mod hash_domain;
