//! Statement tree → SSA lowering
//!
//! ## Architecture
//!
//! ```text
//! Program (variables, ports, Stmt tree)
//!   ↓ AstToSsa: blocks created and sealed per construct
//!   ↓ MemorySsaUpdater: on-demand phis, trivial-phi removal
//! SsaModule (blocks, phis, instructions, branches)
//!   ↓ verify_module (finalize)
//! LoweredProgram { module, stats }
//! ```

pub mod application;
pub mod domain;
pub mod infrastructure;

pub use application::{LowerProgramUseCase, LoweringUseCase};
pub use domain::{LoopContext, LoweredProgram, LoweringOptions, ProgramLowering};
pub use infrastructure::{AstToSsa, AstToSsaLowering};
