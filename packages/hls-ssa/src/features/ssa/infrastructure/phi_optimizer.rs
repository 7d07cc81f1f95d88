/*
 * Trivial Phi Detection
 *
 * A phi is trivial when it merges a single value with itself:
 * - x_2 = Phi(x_1, x_1, x_1)   → x_1
 * - x_2 = Phi(x_1, x_2)        → x_1 (self references ignored)
 * - x_2 = Phi(x_2) / Phi()     → undefined
 *
 * Detection is pure; removal (rerouting users, def table rewrites and the
 * cascade into user phis) lives in the memory-SSA updater, which owns the
 * state that must change with it.
 *
 * References:
 * - "Simple and Efficient Construction of SSA Form" (Braun et al., 2013), Alg. 3
 */

use crate::features::ssa::domain::{Operand, SsaModule, ValueId, ValueKind};

use super::errors::{SSAError, SSAResult};

/// Replacement for `phi` if it is trivial, `None` if it must stay
///
/// Phis whose operand count does not match their block's predecessor count
/// are still being filled and are never reported as trivial.
pub fn trivial_phi_replacement(module: &SsaModule, phi: ValueId) -> SSAResult<Option<Operand>> {
    let value = module.value(phi)?;
    let Some(block) = value.block else {
        return Ok(None);
    };
    let ValueKind::Phi(data) = &value.kind else {
        return Err(SSAError::invariant(format!("{} is not a phi", phi)));
    };
    if data.operands.len() != module.block(block)?.predecessors.len() {
        return Ok(None);
    }

    let itself = Operand::Value(phi);
    let mut same: Option<Operand> = None;
    for (op, _) in &data.operands {
        if *op == itself || Some(*op) == same {
            continue;
        }
        if same.is_some() {
            // Merges at least two values
            return Ok(None);
        }
        same = Some(*op);
    }

    Ok(Some(same.unwrap_or(Operand::Undef(value.ty))))
}

/// Phi bookkeeping counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MemorySsaStats {
    /// Phis allocated (placeholders and incomplete phis included)
    pub phis_created: usize,
    /// Trivial phis removed
    pub phis_removed: usize,
    /// Incomplete phis filled when their block was sealed
    pub phis_completed: usize,
}

impl MemorySsaStats {
    /// Phis that survived elimination
    pub fn phis_live(&self) -> usize {
        self.phis_created.saturating_sub(self.phis_removed)
    }

    /// Share of created phis that were removed
    pub fn removal_ratio(&self) -> f64 {
        if self.phis_created == 0 {
            return 0.0;
        }

        self.phis_removed as f64 / self.phis_created as f64
    }
}
