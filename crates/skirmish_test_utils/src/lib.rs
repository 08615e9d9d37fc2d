//! # Skirmish Test Utilities
//!
//! Shared testing utilities for all crates:
//! - World and unit fixtures
//! - Recording and failing session connections
//! - Scripted morale gates
//! - Turn-running harness and determinism checks
//! - Property-based testing strategies
//!
//! Kept out of `skirmish_core` so its test doubles never ship in the
//! production dependency graph.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod fixtures;
pub mod harness;

/// Re-export proptest for convenience.
pub use proptest;
