//! Shared module - Common types and utilities
//!
//! Source program model (variables, ports, statements, expressions) and the
//! bit-vector literal types shared by every feature.

pub mod models;

// Re-exports for convenience
pub use models::*;
