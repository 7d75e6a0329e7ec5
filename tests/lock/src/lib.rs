//! Shared fixtures for the replanning lock tests and the cross-process
//! fixture binary.

#![forbid(unsafe_code)]
