//! Lowering Domain - Port interface for statement tree → SSA

use crate::features::ssa::domain::{BlockId, SsaModule};
use crate::features::ssa::infrastructure::{MemorySsaStats, SSAResult};
use crate::shared::models::{Program, Stmt, MAX_LITERAL_WIDTH};

/// Program Lowering Trait (Port)
///
/// Transforms a source `Program` into one `SsaModule`
pub trait ProgramLowering {
    fn lower(&self, program: &Program) -> SSAResult<LoweredProgram>;
}

/// Lowering output
#[derive(Debug, Clone)]
pub struct LoweredProgram {
    pub module: SsaModule,
    pub stats: MemorySsaStats,
}

/// Knobs read by the converter
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoweringOptions {
    /// Run the structural post-condition check after lowering
    pub verify_on_finalize: bool,
    /// Name values after the variable they define (`x_0`, `x_1`, ...)
    pub name_values: bool,
    /// Widest literal accepted
    pub max_literal_width: u32,
}

impl Default for LoweringOptions {
    fn default() -> Self {
        Self {
            verify_on_finalize: true,
            name_values: false,
            max_literal_width: MAX_LITERAL_WIDTH,
        }
    }
}

/// Innermost-loop bookkeeping for `break`/`continue`
#[derive(Debug, Clone)]
pub struct LoopContext {
    pub label: String,
    /// Target of `continue` and of the back edge
    pub cond_block: BlockId,
    /// Live blocks that ended in `break`
    pub break_origins: Vec<BlockId>,
    /// `for` step, run before every back edge
    pub step: Vec<Stmt>,
}

impl LoopContext {
    pub fn new(label: impl Into<String>, cond_block: BlockId, step: Vec<Stmt>) -> Self {
        Self {
            label: label.into(),
            cond_block,
            break_origins: Vec::new(),
            step,
        }
    }
}
