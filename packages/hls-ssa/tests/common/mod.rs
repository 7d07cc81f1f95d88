//! Common test utilities for hls-ssa
//!
//! Program fixtures, module assertions and a straight-line evaluator
//! shared by the integration tests.

#![allow(dead_code)]

mod assertions;
mod fixtures;
mod interp;

// Re-export all utilities
pub use assertions::*;
pub use fixtures::*;
pub use interp::*;
