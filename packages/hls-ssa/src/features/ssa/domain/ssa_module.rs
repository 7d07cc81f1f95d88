//! SSA module: block and value arenas plus the use-list index
//!
//! Every operand edit goes through this type so the use-lists stay in
//! step with the operand lists they mirror.

use ahash::AHashMap as HashMap;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use super::block::{Block, BlockId, BlockKind, Branch};
use super::value::{Instruction, Operand, Phi, User, ValueData, ValueId, ValueKind, ValueOrigin};
use crate::features::ssa::infrastructure::errors::{SSAError, SSAResult};
use crate::shared::models::{BitType, VariableId};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SsaModule {
    pub name: String,
    pub entry: BlockId,
    /// Block control reaches after the last top-level statement
    pub exit: Option<BlockId>,
    blocks: Vec<Block>,
    values: Vec<ValueData>,
    users: HashMap<ValueId, BTreeSet<User>>,
    forwards: HashMap<ValueId, Operand>,
}

impl SsaModule {
    /// Create a module holding only its (unsealed) entry block
    pub fn new(name: impl Into<String>) -> Self {
        let entry = BlockId(0);
        Self {
            name: name.into(),
            entry,
            exit: None,
            blocks: vec![Block::new(entry, "entry", BlockKind::Live)],
            values: Vec::new(),
            users: HashMap::new(),
            forwards: HashMap::new(),
        }
    }

    // ----------------------------------------------------------------
    // Blocks
    // ----------------------------------------------------------------

    pub fn add_block(&mut self, label: impl Into<String>, kind: BlockKind) -> BlockId {
        let id = BlockId(self.blocks.len() as u32);
        self.blocks.push(Block::new(id, label, kind));
        id
    }

    pub fn block(&self, id: BlockId) -> SSAResult<&Block> {
        self.blocks
            .get(id.index())
            .ok_or(SSAError::UnknownBlock { block: id })
    }

    pub fn block_mut(&mut self, id: BlockId) -> SSAResult<&mut Block> {
        self.blocks
            .get_mut(id.index())
            .ok_or(SSAError::UnknownBlock { block: id })
    }

    pub fn blocks(&self) -> &[Block] {
        &self.blocks
    }

    pub fn block_count(&self) -> usize {
        self.blocks.len()
    }

    /// Register the edge `from --cond--> target`
    ///
    /// No-op when `from` is an unreachable block.
    pub fn add_target(
        &mut self,
        from: BlockId,
        cond: Option<Operand>,
        target: BlockId,
    ) -> SSAResult<()> {
        if self.block(from)?.is_unreachable() {
            return Ok(());
        }

        let target_block = self.block_mut(target)?;
        if target_block.sealed && !target_block.has_predecessor(from) {
            return Err(SSAError::invariant(format!(
                "edge {} -> {} added after {} was sealed",
                from, target, target
            )));
        }
        target_block.add_predecessor(from);

        self.block_mut(from)?.branches.push(Branch { cond, target });
        if let Some(Operand::Value(v)) = cond {
            self.add_user(v, User::Branch(from));
        }
        Ok(())
    }

    /// Blocks reachable from the entry, in discovery order
    pub fn reachable_blocks(&self) -> Vec<BlockId> {
        let mut seen = vec![false; self.blocks.len()];
        let mut order = Vec::new();
        let mut stack = vec![self.entry];

        while let Some(id) = stack.pop() {
            let Some(block) = self.blocks.get(id.index()) else {
                continue;
            };
            if seen[id.index()] {
                continue;
            }
            seen[id.index()] = true;
            order.push(id);
            for succ in block.successors().into_iter().rev() {
                if !seen[succ.index()] {
                    stack.push(succ);
                }
            }
        }
        order
    }

    // ----------------------------------------------------------------
    // Values
    // ----------------------------------------------------------------

    pub fn value(&self, id: ValueId) -> SSAResult<&ValueData> {
        self.values
            .get(id.index())
            .ok_or_else(|| SSAError::invariant(format!("unknown value {}", id)))
    }

    pub fn value_mut(&mut self, id: ValueId) -> SSAResult<&mut ValueData> {
        self.values
            .get_mut(id.index())
            .ok_or_else(|| SSAError::invariant(format!("unknown value {}", id)))
    }

    pub fn values(&self) -> &[ValueData] {
        &self.values
    }

    /// Values still owned by a block
    pub fn live_values(&self) -> impl Iterator<Item = &ValueData> {
        self.values.iter().filter(|v| v.is_attached())
    }

    pub fn live_phi_count(&self) -> usize {
        self.live_values().filter(|v| v.is_phi()).count()
    }

    pub fn set_value_name(&mut self, id: ValueId, name: impl Into<String>) -> SSAResult<()> {
        let value = self.value_mut(id)?;
        if value.name.is_none() {
            value.name = Some(name.into());
        }
        Ok(())
    }

    fn push_value(
        &mut self,
        ty: BitType,
        origin: ValueOrigin,
        block: BlockId,
        kind: ValueKind,
    ) -> ValueId {
        let id = ValueId(self.values.len() as u32);
        self.values.push(ValueData {
            id,
            ty,
            name: None,
            origin,
            block: Some(block),
            kind,
        });
        id
    }

    /// Insert an instruction into `block` at `position` (`None` appends)
    pub fn insert_instruction(
        &mut self,
        block: BlockId,
        position: Option<usize>,
        ty: BitType,
        origin: ValueOrigin,
        instruction: Instruction,
    ) -> SSAResult<ValueId> {
        let len = self.block(block)?.instructions.len();
        let at = match position {
            Some(p) if p <= len => p,
            Some(p) => {
                return Err(SSAError::invariant(format!(
                    "insert position {} past end of {} ({} instructions)",
                    p, block, len
                )))
            }
            None => len,
        };

        let operands = instruction.operands.clone();
        let id = self.push_value(ty, origin, block, ValueKind::Instruction(instruction));
        self.block_mut(block)?.instructions.insert(at, id);
        for op in operands {
            if let Operand::Value(v) = op {
                self.add_user(v, User::Value(id));
            }
        }
        Ok(id)
    }

    /// Append an operandless phi for `variable` to `block`
    pub fn append_phi(
        &mut self,
        block: BlockId,
        variable: VariableId,
        ty: BitType,
    ) -> SSAResult<ValueId> {
        self.block(block)?;
        let id = self.push_value(
            ty,
            ValueOrigin::Phi(variable),
            block,
            ValueKind::Phi(Phi {
                variable,
                operands: Vec::new(),
            }),
        );
        self.block_mut(block)?.phis.push(id);
        Ok(id)
    }

    pub fn push_phi_operand(
        &mut self,
        phi: ValueId,
        operand: Operand,
        pred: BlockId,
    ) -> SSAResult<()> {
        match &mut self.value_mut(phi)?.kind {
            ValueKind::Phi(data) => data.operands.push((operand, pred)),
            ValueKind::Instruction(_) => {
                return Err(SSAError::invariant(format!("{} is not a phi", phi)))
            }
        }
        if let Operand::Value(v) = operand {
            self.add_user(v, User::Value(phi));
        }
        Ok(())
    }

    /// Type carried by an operand
    pub fn operand_type(&self, operand: &Operand) -> SSAResult<BitType> {
        match operand {
            Operand::Value(v) => Ok(self.value(*v)?.ty),
            Operand::Const(c) => Ok(c.ty()),
            Operand::Undef(ty) => Ok(*ty),
        }
    }

    // ----------------------------------------------------------------
    // Use-lists
    // ----------------------------------------------------------------

    pub fn add_user(&mut self, value: ValueId, user: User) {
        self.users.entry(value).or_default().insert(user);
    }

    pub fn remove_user(&mut self, value: ValueId, user: User) {
        if let Some(set) = self.users.get_mut(&value) {
            set.remove(&user);
            if set.is_empty() {
                self.users.remove(&value);
            }
        }
    }

    /// Current users of `value`, ordered
    pub fn users(&self, value: ValueId) -> Vec<User> {
        self.users
            .get(&value)
            .map(|set| set.iter().copied().collect())
            .unwrap_or_default()
    }

    /// Rewrite every use of `from` to `to`; returns the former users
    pub fn replace_all_uses_with(&mut self, from: ValueId, to: Operand) -> SSAResult<Vec<User>> {
        let former = self.users.remove(&from).unwrap_or_default();
        let old = Operand::Value(from);

        for user in &former {
            match *user {
                User::Value(u) => {
                    self.value_mut(u)?.replace_operand(&old, &to);
                }
                User::Branch(b) => {
                    for branch in &mut self.block_mut(b)?.branches {
                        if branch.cond == Some(old) {
                            branch.cond = Some(to);
                        }
                    }
                }
            }
            if let Operand::Value(t) = to {
                self.add_user(t, *user);
            }
        }
        Ok(former.into_iter().collect())
    }

    /// Remove a value from its block and from its operands' use-lists
    pub fn detach_value(&mut self, id: ValueId) -> SSAResult<()> {
        let (block, is_phi, operands) = {
            let value = self.value(id)?;
            (value.block, value.is_phi(), value.operands())
        };
        let Some(block) = block else {
            return Ok(());
        };

        let owner = self.block_mut(block)?;
        if is_phi {
            owner.phis.retain(|v| *v != id);
        } else {
            owner.instructions.retain(|v| *v != id);
        }
        for op in operands {
            if let Operand::Value(v) = op {
                self.remove_user(v, User::Value(id));
            }
        }
        self.value_mut(id)?.block = None;
        Ok(())
    }

    // ----------------------------------------------------------------
    // Forwarding
    // ----------------------------------------------------------------

    /// Record that the removed value `from` now stands for `to`
    pub fn set_forward(&mut self, from: ValueId, to: Operand) {
        self.forwards.insert(from, to);
    }

    /// Follow forwards from removed values to their live replacement
    pub fn resolve(&self, operand: Operand) -> Operand {
        let mut current = operand;
        while let Operand::Value(v) = current {
            match self.forwards.get(&v) {
                Some(next) if *next != current => current = *next,
                _ => break,
            }
        }
        current
    }
}
