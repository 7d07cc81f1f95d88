//! SSA domain models

pub mod block;
pub mod ssa_module;
pub mod value;

pub use block::{Block, BlockId, BlockKind, Branch};
pub use ssa_module::SsaModule;
pub use value::{
    Instruction, IoAccess, IoDirection, Opcode, Operand, Phi, User, ValueData, ValueId, ValueKind,
    ValueOrigin,
};
