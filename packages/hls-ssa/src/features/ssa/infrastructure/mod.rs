//! SSA infrastructure
//!
//! Phi placement (Braun et al. 2013), trivial-phi detection and the
//! petgraph-backed structural checks over a finished module.

pub mod cfg_adapter;
pub mod errors;
pub mod memory_ssa;
pub mod phi_optimizer;

pub use cfg_adapter::{verify_module, BlockGraph};
pub use errors::*;
pub use memory_ssa::{BitRange, MemorySsaUpdater};
pub use phi_optimizer::{trivial_phi_replacement, MemorySsaStats};
