//! Expression Builder - elaborated expression tree → SSA instructions
//!
//! ## Architecture
//!
//! ```text
//! Expr (shared::models)
//!       ↓ lower_expr (variable reads through the memory-SSA updater)
//! SsaExpressionBuilder ── const_fold
//!       ↓
//! Instructions at the InsertPoint
//! ```

pub mod domain;
pub mod infrastructure;

pub use domain::InsertPoint;
pub use infrastructure::SsaExpressionBuilder;
