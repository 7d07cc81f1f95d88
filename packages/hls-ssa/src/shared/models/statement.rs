//! Source statement tree
//!
//! Closed set of statement kinds; the lowering matches on it exhaustively.

use serde::{Deserialize, Serialize};

use super::expression::{Expr, Index};
use super::program::{PortId, VariableId};

/// One `if`/`elif` arm
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IfArm {
    pub cond: Expr,
    pub body: Vec<Stmt>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Stmt {
    /// `target = value` or `target[indices] = value`
    Assign {
        target: VariableId,
        indices: Vec<Index>,
        value: Expr,
    },

    /// `target = port.read()`
    Read { port: PortId, target: VariableId },

    /// `port.write(value)`
    Write { port: PortId, value: Expr },

    /// `if`/`elif` chain with optional `else`
    If {
        arms: Vec<IfArm>,
        else_body: Option<Vec<Stmt>>,
    },

    While { cond: Expr, body: Vec<Stmt> },

    /// `for (init; cond; step) body`
    For {
        init: Vec<Stmt>,
        cond: Expr,
        step: Vec<Stmt>,
        body: Vec<Stmt>,
    },

    Break,
    Continue,
}

impl Stmt {
    pub fn assign(target: VariableId, value: Expr) -> Self {
        Stmt::Assign {
            target,
            indices: Vec::new(),
            value,
        }
    }

    pub fn assign_indexed(target: VariableId, index: Index, value: Expr) -> Self {
        Stmt::Assign {
            target,
            indices: vec![index],
            value,
        }
    }

    pub fn read(port: PortId, target: VariableId) -> Self {
        Stmt::Read { port, target }
    }

    pub fn write(port: PortId, value: Expr) -> Self {
        Stmt::Write { port, value }
    }

    pub fn if_then(cond: Expr, body: Vec<Stmt>) -> Self {
        Stmt::If {
            arms: vec![IfArm { cond, body }],
            else_body: None,
        }
    }

    pub fn if_else(cond: Expr, then_body: Vec<Stmt>, else_body: Vec<Stmt>) -> Self {
        Stmt::If {
            arms: vec![IfArm {
                cond,
                body: then_body,
            }],
            else_body: Some(else_body),
        }
    }

    pub fn while_loop(cond: Expr, body: Vec<Stmt>) -> Self {
        Stmt::While { cond, body }
    }

    pub fn for_loop(init: Vec<Stmt>, cond: Expr, step: Vec<Stmt>, body: Vec<Stmt>) -> Self {
        Stmt::For {
            init,
            cond,
            step,
            body,
        }
    }

    /// Statement kind name used in logs and error messages
    pub fn kind_name(&self) -> &'static str {
        match self {
            Stmt::Assign { indices, .. } if indices.is_empty() => "assign",
            Stmt::Assign { .. } => "indexed assign",
            Stmt::Read { .. } => "read",
            Stmt::Write { .. } => "write",
            Stmt::If { .. } => "if",
            Stmt::While { .. } => "while",
            Stmt::For { .. } => "for",
            Stmt::Break => "break",
            Stmt::Continue => "continue",
        }
    }
}
