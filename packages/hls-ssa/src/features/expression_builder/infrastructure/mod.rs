pub mod const_fold;
pub mod ssa_builder;

pub use const_fold::fold;
pub use ssa_builder::SsaExpressionBuilder;
