//! SSA value model
//!
//! Values live in the module's arena and are referenced by `ValueId`.
//! A value is either an instruction or a phi, and belongs to exactly one
//! block while live; `block == None` marks a detached (removed) value.

use serde::{Deserialize, Serialize};
use std::fmt;

use super::block::BlockId;
use crate::shared::models::{BitType, Constant, PortId, VariableId};

/// Index into the value arena
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ValueId(pub u32);

impl ValueId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for ValueId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "%{}", self.0)
    }
}

/// Instruction / phi / branch operand
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Operand {
    Value(ValueId),
    Const(Constant),
    /// Read of a variable on a path that never defined it
    Undef(BitType),
}

impl Operand {
    pub fn as_value(&self) -> Option<ValueId> {
        match self {
            Operand::Value(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_const(&self) -> Option<&Constant> {
        match self {
            Operand::Const(c) => Some(c),
            _ => None,
        }
    }

    pub fn is_const(&self) -> bool {
        matches!(self, Operand::Const(_))
    }
}

impl From<ValueId> for Operand {
    fn from(value: ValueId) -> Self {
        Operand::Value(value)
    }
}

impl From<Constant> for Operand {
    fn from(value: Constant) -> Self {
        Operand::Const(value)
    }
}

impl fmt::Display for Operand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Operand::Value(v) => write!(f, "{}", v),
            Operand::Const(c) => write!(f, "{}", c),
            Operand::Undef(ty) => write!(f, "undef:{}", ty),
        }
    }
}

/// Closed operator set
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Opcode {
    // Arithmetic
    Add,
    Sub,
    Mul,
    Div,
    Rem,
    Neg,

    // Bitwise / logical
    And,
    Or,
    Xor,
    Not,
    Shl,
    Shr,

    // Compare (1-bit result)
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,

    /// Operands high-bits-first
    Concat,
    /// `[base, bit]`, dynamic single-bit select
    Index,
    /// `[base]`, static `[msb:lsb]`
    Slice { msb: u32, lsb: u32 },
    /// `[cond, then, else]`
    Select,
    /// `[arg]`, width/signedness conversion to the value's type
    Cast,
    /// IO pass-through: no operands for a read, `[data]` for a write
    Assign,
}

impl Opcode {
    pub fn is_compare(&self) -> bool {
        matches!(
            self,
            Opcode::Eq | Opcode::Ne | Opcode::Lt | Opcode::Le | Opcode::Gt | Opcode::Ge
        )
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Opcode::Add => "add",
            Opcode::Sub => "sub",
            Opcode::Mul => "mul",
            Opcode::Div => "div",
            Opcode::Rem => "rem",
            Opcode::Neg => "neg",
            Opcode::And => "and",
            Opcode::Or => "or",
            Opcode::Xor => "xor",
            Opcode::Not => "not",
            Opcode::Shl => "shl",
            Opcode::Shr => "shr",
            Opcode::Eq => "eq",
            Opcode::Ne => "ne",
            Opcode::Lt => "lt",
            Opcode::Le => "le",
            Opcode::Gt => "gt",
            Opcode::Ge => "ge",
            Opcode::Concat => "concat",
            Opcode::Index => "index",
            Opcode::Slice { .. } => "slice",
            Opcode::Select => "select",
            Opcode::Cast => "cast",
            Opcode::Assign => "assign",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum IoDirection {
    Read,
    Write,
}

/// External port touched by an `Assign` instruction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct IoAccess {
    pub port: PortId,
    pub direction: IoDirection,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Instruction {
    pub opcode: Opcode,
    pub operands: Vec<Operand>,
    pub io: Option<IoAccess>,
}

/// Phi: one `(operand, predecessor)` pair per predecessor once complete
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Phi {
    pub variable: VariableId,
    pub operands: Vec<(Operand, BlockId)>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ValueKind {
    Instruction(Instruction),
    Phi(Phi),
}

/// Where a value came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ValueOrigin {
    Expression,
    Phi(VariableId),
    /// Splice of a bit/range write into the whole variable
    PartialWrite(VariableId),
    Io(PortId),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValueData {
    pub id: ValueId,
    pub ty: BitType,
    pub name: Option<String>,
    pub origin: ValueOrigin,
    pub block: Option<BlockId>,
    pub kind: ValueKind,
}

impl ValueData {
    pub fn is_phi(&self) -> bool {
        matches!(self.kind, ValueKind::Phi(_))
    }

    pub fn is_attached(&self) -> bool {
        self.block.is_some()
    }

    pub fn as_phi(&self) -> Option<&Phi> {
        match &self.kind {
            ValueKind::Phi(phi) => Some(phi),
            _ => None,
        }
    }

    pub fn as_instruction(&self) -> Option<&Instruction> {
        match &self.kind {
            ValueKind::Instruction(inst) => Some(inst),
            _ => None,
        }
    }

    pub fn opcode(&self) -> Option<Opcode> {
        self.as_instruction().map(|inst| inst.opcode)
    }

    /// Every operand in order (phi operands without their blocks)
    pub fn operands(&self) -> Vec<Operand> {
        match &self.kind {
            ValueKind::Instruction(inst) => inst.operands.clone(),
            ValueKind::Phi(phi) => phi.operands.iter().map(|(op, _)| *op).collect(),
        }
    }

    /// Rewrite every operand equal to `from`; returns how many slots changed
    pub(crate) fn replace_operand(&mut self, from: &Operand, to: &Operand) -> usize {
        let slots: Vec<&mut Operand> = match &mut self.kind {
            ValueKind::Instruction(inst) => inst.operands.iter_mut().collect(),
            ValueKind::Phi(phi) => phi.operands.iter_mut().map(|(op, _)| op).collect(),
        };
        let mut changed = 0;
        for slot in slots {
            if slot == from {
                *slot = *to;
                changed += 1;
            }
        }
        changed
    }
}

/// Consumer of a value: another value, or a block's branch conditions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum User {
    Value(ValueId),
    Branch(BlockId),
}
