//! Lowering Infrastructure Layer

pub mod ast_to_ssa;

pub use ast_to_ssa::{AstToSsa, AstToSsaLowering};
