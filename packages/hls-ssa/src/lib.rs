/*
 * HLS SSA - Statement tree to SSA frontend for high-level synthesis
 *
 * Feature-First Hexagonal Architecture:
 * - shared/      : Source program model (variables, ports, Stmt, Expr, literals)
 * - features/    : Vertical slices (expression_builder → ssa → lowering)
 * - config/      : Presets + YAML lowering configuration
 *
 * Phi placement is on demand (Braun et al.): no CFG pre-pass, no dominance.
 */

// Crate-level lint configuration
#![allow(clippy::upper_case_acronyms)] // SSA naming
#![allow(clippy::should_implement_trait)] // from_str naming intentional
#![allow(clippy::derivable_impls)] // Manual impl for documentation
#![allow(clippy::new_without_default)] // Default impl not always needed

/// Shared models and utilities
pub mod shared;

/// Vertical feature slices
pub mod features;

pub mod config;

pub mod errors;

pub use config::{ConfigError, LoweringConfig, Preset};
pub use errors::{HlsError, Result};
pub use features::lowering::{
    AstToSsa, AstToSsaLowering, LowerProgramUseCase, LoweredProgram, LoweringOptions,
    LoweringUseCase, ProgramLowering,
};
pub use features::ssa::domain::SsaModule;
pub use features::ssa::infrastructure::{MemorySsaStats, SSAError, SSAResult};
pub use shared::models::Program;

/// Lower `program` with `config`
///
/// # Errors
///
/// `HlsError::Config` for an out-of-range configuration, `HlsError::Ssa` for
/// any lowering failure.
pub fn lower_program(program: &Program, config: &LoweringConfig) -> Result<LoweredProgram> {
    use config::Validatable;

    config.validate()?;
    let usecase = LowerProgramUseCase::with_options(LoweringOptions::from(config));
    Ok(usecase.execute(program)?)
}
