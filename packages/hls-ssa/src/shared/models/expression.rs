//! Source expression tree
//!
//! Already elaborated: every leaf is a literal or a declared variable, and
//! every operator comes from the closed set below.
//!
//! Concatenation lists its parts **high-bits-first** (`{hi, lo}` order):
//! `Concat([a, b])` places `a` above `b`.

use serde::{Deserialize, Serialize};

use super::bit_type::BitType;
use super::constant::Constant;
use super::program::VariableId;

/// Unary Operation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum UnaryOp {
    /// Bitwise not: `~a`
    Not,
    /// Two's complement negation: `-a`
    Neg,
}

/// Binary Operation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BinOp {
    // Arithmetic
    Add,
    Sub,
    Mul,
    Div,
    Mod,

    // Bitwise
    BitAnd,
    BitOr,
    BitXor,
    LShift,
    RShift,
}

/// Comparison Operation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CompOp {
    Eq,
    NotEq,
    Lt,
    LtE,
    Gt,
    GtE,
}

/// Index into a bit vector: a single bit or a static `[msb:lsb]` range
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Index {
    Bit(Expr),
    Range { msb: Expr, lsb: Expr },
}

impl Index {
    pub fn bit(k: u32) -> Self {
        Index::Bit(Expr::lit(k as u128, BitType::unsigned(32)))
    }

    pub fn range(msb: u32, lsb: u32) -> Self {
        Index::Range {
            msb: Expr::lit(msb as u128, BitType::unsigned(32)),
            lsb: Expr::lit(lsb as u128, BitType::unsigned(32)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Expr {
    /// Literal value
    Const(Constant),

    /// Variable read
    Var(VariableId),

    Unary {
        op: UnaryOp,
        arg: Box<Expr>,
    },

    Binary {
        op: BinOp,
        lhs: Box<Expr>,
        rhs: Box<Expr>,
    },

    Compare {
        op: CompOp,
        lhs: Box<Expr>,
        rhs: Box<Expr>,
    },

    /// Parts high-bits-first
    Concat(Vec<Expr>),

    Index {
        base: Box<Expr>,
        index: Box<Index>,
    },

    /// `cond ? then_value : else_value`
    Ternary {
        cond: Box<Expr>,
        then_value: Box<Expr>,
        else_value: Box<Expr>,
    },

    /// Width/signedness conversion
    Cast {
        arg: Box<Expr>,
        ty: BitType,
    },
}

impl Expr {
    pub fn lit(bits: u128, ty: BitType) -> Self {
        Expr::Const(Constant::new(bits, ty))
    }

    pub fn bool(value: bool) -> Self {
        Expr::Const(Constant::bool(value))
    }

    pub fn var(id: VariableId) -> Self {
        Expr::Var(id)
    }

    pub fn unary(op: UnaryOp, arg: Expr) -> Self {
        Expr::Unary {
            op,
            arg: Box::new(arg),
        }
    }

    pub fn binary(op: BinOp, lhs: Expr, rhs: Expr) -> Self {
        Expr::Binary {
            op,
            lhs: Box::new(lhs),
            rhs: Box::new(rhs),
        }
    }

    pub fn compare(op: CompOp, lhs: Expr, rhs: Expr) -> Self {
        Expr::Compare {
            op,
            lhs: Box::new(lhs),
            rhs: Box::new(rhs),
        }
    }

    pub fn add(lhs: Expr, rhs: Expr) -> Self {
        Self::binary(BinOp::Add, lhs, rhs)
    }

    pub fn sub(lhs: Expr, rhs: Expr) -> Self {
        Self::binary(BinOp::Sub, lhs, rhs)
    }

    pub fn concat(parts: Vec<Expr>) -> Self {
        Expr::Concat(parts)
    }

    pub fn index(base: Expr, index: Index) -> Self {
        Expr::Index {
            base: Box::new(base),
            index: Box::new(index),
        }
    }

    pub fn ternary(cond: Expr, then_value: Expr, else_value: Expr) -> Self {
        Expr::Ternary {
            cond: Box::new(cond),
            then_value: Box::new(then_value),
            else_value: Box::new(else_value),
        }
    }

    pub fn cast(arg: Expr, ty: BitType) -> Self {
        Expr::Cast {
            arg: Box::new(arg),
            ty,
        }
    }

    pub fn as_const(&self) -> Option<&Constant> {
        match self {
            Expr::Const(c) => Some(c),
            _ => None,
        }
    }

    /// Short description used in error messages
    pub fn describe(&self) -> String {
        match self {
            Expr::Const(c) => format!("literal {}", c),
            Expr::Var(id) => format!("read of {}", id),
            Expr::Unary { op, .. } => format!("unary {:?}", op),
            Expr::Binary { op, .. } => format!("binary {:?}", op),
            Expr::Compare { op, .. } => format!("compare {:?}", op),
            Expr::Concat(parts) => format!("concat of {} parts", parts.len()),
            Expr::Index { .. } => "index".to_string(),
            Expr::Ternary { .. } => "ternary".to_string(),
            Expr::Cast { ty, .. } => format!("cast to {}", ty),
        }
    }
}
