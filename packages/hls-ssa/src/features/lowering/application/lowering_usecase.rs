//! Lowering UseCase

use crate::features::lowering::domain::{LoweredProgram, LoweringOptions, ProgramLowering};
use crate::features::lowering::infrastructure::AstToSsaLowering;
use crate::features::ssa::infrastructure::SSAResult;
use crate::shared::models::Program;

/// Lowering UseCase Trait
pub trait LoweringUseCase: Send + Sync {
    fn execute(&self, program: &Program) -> SSAResult<LoweredProgram>;
}

/// Lowering UseCase Implementation
///
/// Generic over the lowering port; logs the phi statistics of every run.
#[derive(Debug, Default)]
pub struct LowerProgramUseCase<L: ProgramLowering = AstToSsaLowering> {
    lowering: L,
}

impl LowerProgramUseCase<AstToSsaLowering> {
    pub fn with_options(options: LoweringOptions) -> Self {
        Self::new(AstToSsaLowering::new(options))
    }
}

impl<L: ProgramLowering> LowerProgramUseCase<L> {
    pub fn new(lowering: L) -> Self {
        Self { lowering }
    }
}

impl<L: ProgramLowering + Send + Sync> LoweringUseCase for LowerProgramUseCase<L> {
    fn execute(&self, program: &Program) -> SSAResult<LoweredProgram> {
        tracing::info!(
            program = %program.name,
            variables = program.variables.len(),
            ports = program.ports.len(),
            statements = program.body.len(),
            "lowering program"
        );
        let lowered = self.lowering.lower(program).map_err(|e| {
            tracing::warn!(program = %program.name, error = %e, "lowering failed");
            e
        })?;

        let stats = lowered.stats;
        tracing::info!(
            program = %program.name,
            blocks = lowered.module.block_count(),
            reachable = lowered.module.reachable_blocks().len(),
            values = lowered.module.live_values().count(),
            phis_created = stats.phis_created,
            phis_removed = stats.phis_removed,
            phis_live = stats.phis_live(),
            phi_removal_ratio = stats.removal_ratio(),
            "program lowered"
        );
        Ok(lowered)
    }
}
