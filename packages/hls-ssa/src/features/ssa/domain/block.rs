//! Basic block and branch model

use serde::{Deserialize, Serialize};
use std::fmt;

use super::value::{Operand, ValueId};

/// Index into the block arena
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct BlockId(pub u32);

impl BlockId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for BlockId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "bb{}", self.0)
    }
}

/// Block kind
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BlockKind {
    Live,
    /// Hosts dead code after `break`/`continue`; branch registration is a no-op
    Unreachable,
}

impl BlockKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            BlockKind::Live => "Live",
            BlockKind::Unreachable => "Unreachable",
        }
    }
}

/// Outgoing edge, evaluated first-match; `cond == None` is the default
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Branch {
    pub cond: Option<Operand>,
    pub target: BlockId,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Block {
    pub id: BlockId,
    pub label: String,
    pub kind: BlockKind,
    pub phis: Vec<ValueId>,
    pub instructions: Vec<ValueId>,
    /// Set semantics, insertion ordered; phi operands follow this order
    pub predecessors: Vec<BlockId>,
    pub branches: Vec<Branch>,
    /// Every predecessor edge is known
    pub sealed: bool,
}

impl Block {
    pub fn new(id: BlockId, label: impl Into<String>, kind: BlockKind) -> Self {
        Self {
            id,
            label: label.into(),
            kind,
            phis: Vec::new(),
            instructions: Vec::new(),
            predecessors: Vec::new(),
            branches: Vec::new(),
            sealed: false,
        }
    }

    pub fn is_unreachable(&self) -> bool {
        self.kind == BlockKind::Unreachable
    }

    /// Distinct branch targets in edge order
    pub fn successors(&self) -> Vec<BlockId> {
        let mut out: Vec<BlockId> = Vec::with_capacity(self.branches.len());
        for branch in &self.branches {
            if !out.contains(&branch.target) {
                out.push(branch.target);
            }
        }
        out
    }

    /// Target of the unconditional edge, if one was added
    pub fn default_target(&self) -> Option<BlockId> {
        self.branches
            .iter()
            .find(|b| b.cond.is_none())
            .map(|b| b.target)
    }

    pub fn has_predecessor(&self, block: BlockId) -> bool {
        self.predecessors.contains(&block)
    }

    pub(crate) fn add_predecessor(&mut self, block: BlockId) {
        if !self.has_predecessor(block) {
            self.predecessors.push(block);
        }
    }
}
