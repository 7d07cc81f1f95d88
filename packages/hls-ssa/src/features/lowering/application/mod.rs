//! Lowering Application Layer

pub mod lowering_usecase;

pub use lowering_usecase::{LowerProgramUseCase, LoweringUseCase};
