/*
 * Memory-SSA Updater (Braun et al., 2013)
 *
 * Places phis on demand while the AST walk creates blocks:
 * ```
 * def read_variable(var, block):
 *     if var in current_def[block]:
 *         return current_def[block][var]        # local definition
 *     return read_variable_recursive(var, block)
 *
 * def read_variable_recursive(var, block):
 *     if block not sealed:
 *         val = new incomplete phi               # filled by seal_block
 *     elif no predecessors:
 *         val = undef
 *     elif one predecessor:
 *         val = read_variable(var, pred)         # no phi
 *     else:
 *         val = new phi
 *         current_def[block][var] = val          # breaks cycles
 *         val = add_phi_operands(var, val)
 *     current_def[block][var] = val
 *     return val
 * ```
 *
 * The def table is mirrored by a reverse index (value → {(block, var)}) so
 * removing a trivial phi rewrites every entry that still names it.
 */

use ahash::{AHashMap as HashMap, AHashSet as HashSet};
use std::collections::{BTreeMap, BTreeSet};

use crate::features::expression_builder::infrastructure::SsaExpressionBuilder;
use crate::features::ssa::domain::{BlockId, Operand, SsaModule, User, ValueId, ValueOrigin};
use crate::shared::models::{Variable, VariableId};

use super::errors::{SSAError, SSAResult};
use super::phi_optimizer::{trivial_phi_replacement, MemorySsaStats};

/// Static `[msb:lsb]` range of a partial write
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BitRange {
    pub msb: u32,
    pub lsb: u32,
}

impl BitRange {
    pub fn new(msb: u32, lsb: u32) -> Self {
        Self { msb, lsb }
    }

    pub fn bit(k: u32) -> Self {
        Self::new(k, k)
    }

    pub fn width(&self) -> u32 {
        self.msb - self.lsb + 1
    }
}

pub struct MemorySsaUpdater {
    variables: HashMap<VariableId, Variable>,

    // current_def[var][block]
    current_def: HashMap<VariableId, HashMap<BlockId, Operand>>,

    // Reverse index of current_def for values
    def_holders: HashMap<ValueId, BTreeSet<(BlockId, VariableId)>>,

    // Phis created in unsealed blocks, filled by seal_block
    incomplete_phis: HashMap<BlockId, BTreeMap<VariableId, ValueId>>,

    // Phis whose operand list is being filled
    filling: HashSet<ValueId>,

    name_values: bool,
    versions: HashMap<VariableId, u32>,
    stats: MemorySsaStats,
}

impl MemorySsaUpdater {
    pub fn new(variables: &[Variable]) -> Self {
        Self {
            variables: variables.iter().map(|v| (v.id, v.clone())).collect(),
            current_def: HashMap::new(),
            def_holders: HashMap::new(),
            incomplete_phis: HashMap::new(),
            filling: HashSet::new(),
            name_values: false,
            versions: HashMap::new(),
            stats: MemorySsaStats::default(),
        }
    }

    /// Attach `name_N` names to values defining a variable
    pub fn with_value_names(mut self, enabled: bool) -> Self {
        self.name_values = enabled;
        self
    }

    pub fn variable(&self, id: VariableId) -> SSAResult<&Variable> {
        self.variables
            .get(&id)
            .ok_or(SSAError::UnknownVariable { variable: id })
    }

    pub fn stats(&self) -> MemorySsaStats {
        self.stats
    }

    pub fn has_incomplete_phis(&self) -> bool {
        self.incomplete_phis.values().any(|m| !m.is_empty())
    }

    /// Blocks that still hold incomplete phis
    pub fn blocks_with_incomplete_phis(&self) -> Vec<BlockId> {
        let mut blocks: Vec<BlockId> = self
            .incomplete_phis
            .iter()
            .filter(|(_, m)| !m.is_empty())
            .map(|(b, _)| *b)
            .collect();
        blocks.sort();
        blocks
    }

    /// Current definition of `var` recorded for `block`, without resolution
    pub fn current_definition(&self, var: VariableId, block: BlockId) -> Option<Operand> {
        self.current_def
            .get(&var)
            .and_then(|defs| defs.get(&block))
            .copied()
    }

    // ----------------------------------------------------------------
    // Writes
    // ----------------------------------------------------------------

    /// Record `value` as the new definition of `var` in `block`
    ///
    /// With a range, the new whole-variable value is spliced high-first as
    /// `{old[W-1:msb+1], value, old[lsb-1:0]}`; the splice is emitted at the
    /// builder's insertion point, which must be in `block`.
    pub fn write_variable(
        &mut self,
        module: &mut SsaModule,
        builder: &mut SsaExpressionBuilder,
        var: VariableId,
        ranges: &[BitRange],
        block: BlockId,
        value: Operand,
    ) -> SSAResult<Operand> {
        let variable = self.variable(var)?.clone();
        let node = format!("write of {}", variable.name);

        let new_value = match ranges {
            [] => {
                let found = module.operand_type(&value)?;
                if found != variable.ty {
                    return Err(SSAError::type_mismatch(variable.ty, found, node));
                }
                value
            }
            [range] => self.splice(module, builder, &variable, *range, block, value, &node)?,
            _ => {
                return Err(SSAError::not_implemented(
                    "assignment through more than one index",
                    node,
                ))
            }
        };

        #[cfg(feature = "trace")]
        tracing::trace!(variable = %variable.name, %block, value = %new_value, "write_variable");

        self.write_def(var, block, new_value);
        self.name_value(module, var, new_value)?;
        Ok(new_value)
    }

    #[allow(clippy::too_many_arguments)]
    fn splice(
        &mut self,
        module: &mut SsaModule,
        builder: &mut SsaExpressionBuilder,
        variable: &Variable,
        range: BitRange,
        block: BlockId,
        value: Operand,
        node: &str,
    ) -> SSAResult<Operand> {
        if variable.is_array() {
            return Err(SSAError::not_implemented(
                "partial assignment to an array variable",
                node,
            ));
        }
        let width = variable.ty.width;
        if range.lsb > range.msb || range.msb >= width {
            return Err(SSAError::IndexOutOfRange {
                msb: range.msb,
                lsb: range.lsb,
                width,
                node: node.to_string(),
            });
        }
        let found = module.operand_type(&value)?;
        if found.width != range.width() {
            return Err(SSAError::type_mismatch(
                format!("{}-bit value", range.width()),
                found,
                node,
            ));
        }
        if builder.insert_point().block != block {
            return Err(SSAError::invariant(format!(
                "partial write to {} in {} with the cursor in {}",
                variable.name,
                block,
                builder.insert_point().block
            )));
        }

        let old = self.read_variable(module, variable.id, block)?;

        let mut parts = Vec::with_capacity(3);
        if range.msb + 1 < width {
            parts.push(builder.slice(module, old, width - 1, range.msb + 1, node)?);
        }
        parts.push(value);
        if range.lsb > 0 {
            parts.push(builder.slice(module, old, range.lsb - 1, 0, node)?);
        }

        let spliced = builder.concat(module, &parts, node)?;
        let spliced = builder.cast(module, spliced, variable.ty, node)?;
        if let Operand::Value(v) = spliced {
            let data = module.value_mut(v)?;
            if data.origin == ValueOrigin::Expression {
                data.origin = ValueOrigin::PartialWrite(variable.id);
            }
        }
        Ok(spliced)
    }

    fn write_def(&mut self, var: VariableId, block: BlockId, value: Operand) {
        let previous = self
            .current_def
            .entry(var)
            .or_default()
            .insert(block, value);

        if let Some(Operand::Value(old)) = previous {
            if let Some(holders) = self.def_holders.get_mut(&old) {
                holders.remove(&(block, var));
                if holders.is_empty() {
                    self.def_holders.remove(&old);
                }
            }
        }
        if let Operand::Value(v) = value {
            self.def_holders.entry(v).or_default().insert((block, var));
        }
    }

    fn name_value(&mut self, module: &mut SsaModule, var: VariableId, value: Operand) -> SSAResult<()> {
        if !self.name_values {
            return Ok(());
        }
        let Operand::Value(v) = value else {
            return Ok(());
        };
        if module.value(v)?.name.is_some() {
            return Ok(());
        }
        let version = self.versions.get(&var).copied().unwrap_or(0);
        let name = format!("{}_{}", self.variable(var)?.name, version);
        self.versions.insert(var, version + 1);
        module.set_value_name(v, name)
    }

    // ----------------------------------------------------------------
    // Reads
    // ----------------------------------------------------------------

    /// Value of `var` at the end of `block`
    pub fn read_variable(
        &mut self,
        module: &mut SsaModule,
        var: VariableId,
        block: BlockId,
    ) -> SSAResult<Operand> {
        if let Some(op) = self.current_definition(var, block) {
            #[cfg(feature = "trace")]
            tracing::trace!(variable = %var, %block, value = %op, "read_variable (local)");
            return Ok(module.resolve(op));
        }
        self.read_variable_recursive(module, var, block)
    }

    fn read_variable_recursive(
        &mut self,
        module: &mut SsaModule,
        var: VariableId,
        block: BlockId,
    ) -> SSAResult<Operand> {
        let ty = self.variable(var)?.ty;
        let (sealed, predecessors) = {
            let b = module.block(block)?;
            (b.sealed, b.predecessors.clone())
        };

        let value = if !sealed {
            let phi = self.new_phi(module, block, var)?;
            self.incomplete_phis
                .entry(block)
                .or_default()
                .insert(var, phi);
            Operand::Value(phi)
        } else if predecessors.is_empty() {
            Operand::Undef(ty)
        } else if let [pred] = predecessors.as_slice() {
            self.read_variable(module, var, *pred)?
        } else {
            let phi = self.new_phi(module, block, var)?;
            self.write_def(var, block, Operand::Value(phi));
            self.add_phi_operands(module, var, phi)?
        };

        let value = module.resolve(value);
        self.write_def(var, block, value);
        Ok(value)
    }

    fn new_phi(&mut self, module: &mut SsaModule, block: BlockId, var: VariableId) -> SSAResult<ValueId> {
        let ty = self.variable(var)?.ty;
        let phi = module.append_phi(block, var, ty)?;
        self.stats.phis_created += 1;
        self.name_value(module, var, Operand::Value(phi))?;

        tracing::debug!(%phi, %block, variable = %var, "phi created");
        Ok(phi)
    }

    /// Fill `phi` with one operand per predecessor, then try to remove it
    pub fn add_phi_operands(
        &mut self,
        module: &mut SsaModule,
        var: VariableId,
        phi: ValueId,
    ) -> SSAResult<Operand> {
        let block = module
            .value(phi)?
            .block
            .ok_or_else(|| SSAError::invariant(format!("filling detached phi {}", phi)))?;
        let predecessors = module.block(block)?.predecessors.clone();

        self.filling.insert(phi);
        for pred in predecessors {
            let op = self.read_variable(module, var, pred)?;
            module.push_phi_operand(phi, op, pred)?;
        }
        self.filling.remove(&phi);

        self.try_remove_trivial_phi(module, phi)
    }

    /// Remove `phi` if it is trivial; returns the operand that now stands for it
    ///
    /// Removal reroutes every user, rewrites the def table entries naming
    /// the phi and rechecks user phis, which may have become trivial.
    pub fn try_remove_trivial_phi(&mut self, module: &mut SsaModule, phi: ValueId) -> SSAResult<Operand> {
        if !module.value(phi)?.is_attached() {
            return Ok(module.resolve(Operand::Value(phi)));
        }
        let Some(same) = trivial_phi_replacement(module, phi)? else {
            return Ok(Operand::Value(phi));
        };

        let former_users = module.replace_all_uses_with(phi, same)?;
        module.detach_value(phi)?;
        module.set_forward(phi, same);
        if let Some(holders) = self.def_holders.remove(&phi) {
            for (block, var) in holders {
                self.write_def(var, block, same);
            }
        }
        self.stats.phis_removed += 1;

        tracing::debug!(%phi, replacement = %same, "trivial phi removed");

        for user in former_users {
            let User::Value(u) = user else {
                continue;
            };
            if u == phi || self.filling.contains(&u) {
                continue;
            }
            let data = module.value(u)?;
            if data.is_phi() && data.is_attached() {
                self.try_remove_trivial_phi(module, u)?;
            }
        }

        Ok(module.resolve(same))
    }

    // ----------------------------------------------------------------
    // Sealing
    // ----------------------------------------------------------------

    /// Declare that every predecessor of `block` is known
    ///
    /// Fills the block's incomplete phis in ascending variable order.
    pub fn seal_block(&mut self, module: &mut SsaModule, block: BlockId) -> SSAResult<()> {
        if module.block(block)?.sealed {
            return Err(SSAError::invariant(format!("{} sealed twice", block)));
        }

        while let Some((var, phi)) = self
            .incomplete_phis
            .get_mut(&block)
            .and_then(|pending| pending.pop_first())
        {
            self.add_phi_operands(module, var, phi)?;
            self.stats.phis_completed += 1;
        }
        self.incomplete_phis.remove(&block);
        module.block_mut(block)?.sealed = true;

        tracing::debug!(%block, "block sealed");
        Ok(())
    }
}
