//! Shared models

mod bit_type;
mod constant;
pub mod expression;
mod program;
pub mod statement;

pub use bit_type::{BitType, MAX_LITERAL_WIDTH};
pub use constant::Constant;
pub use expression::{BinOp, CompOp, Expr, Index, UnaryOp};
pub use program::{Port, PortDirection, PortId, Program, Variable, VariableId};
pub use statement::{IfArm, Stmt};
