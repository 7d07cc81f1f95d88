//! SSA construction feature
//!
//! Hexagonal layout:
//! - domain/         - blocks, values and the module arena
//! - infrastructure/ - memory-SSA updater, trivial-phi detection, graph checks
//! - ports/          - consumer interface for finished modules
//! - application/    - consumers shipped with the crate

pub mod application;
pub mod domain;
pub mod infrastructure;
pub mod ports;

pub use application::{collect_ports, PortCollector, PortUsage};
pub use domain::*;
pub use infrastructure::{
    verify_module, BitRange, BlockGraph, MemorySsaStats, MemorySsaUpdater, SSAError, SSAResult,
};
pub use ports::SsaModuleConsumer;
