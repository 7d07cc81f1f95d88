//! Custom assertions for SSA module verification

use hls_ssa::features::ssa::domain::{
    BlockId, IoDirection, Operand, SsaModule, ValueId, ValueKind,
};
use hls_ssa::features::ssa::infrastructure::verify_module;
use hls_ssa::shared::models::PortId;

/// Assert that the structural post-conditions hold
pub fn assert_verified(module: &SsaModule) {
    if let Err(e) = verify_module(module) {
        panic!("module {} failed verification: {}", module.name, e);
    }
}

/// Assert that every value listed in a reachable block is owned by it
pub fn assert_live_values_attached(module: &SsaModule) {
    for id in module.reachable_blocks() {
        let block = module.block(id).unwrap();
        for &v in block.phis.iter().chain(block.instructions.iter()) {
            assert_eq!(
                module.value(v).unwrap().block,
                Some(id),
                "{} listed in {} but owned by {:?}",
                v,
                id,
                module.value(v).unwrap().block
            );
        }
    }
}

/// Assert that no live block lists an unreachable predecessor
pub fn assert_no_dead_predecessors(module: &SsaModule) {
    for block in module.blocks() {
        for &pred in &block.predecessors {
            assert!(
                !module.block(pred).unwrap().is_unreachable(),
                "{} lists unreachable predecessor {}",
                block.id,
                pred
            );
        }
    }
}

/// `(operand, predecessor)` pairs of a phi
pub fn phi_operands(module: &SsaModule, phi: ValueId) -> Vec<(Operand, BlockId)> {
    match &module.value(phi).unwrap().kind {
        ValueKind::Phi(data) => data.operands.clone(),
        other => panic!("{} is not a phi: {:?}", phi, other),
    }
}

/// The single live phi of `block`
pub fn only_phi(module: &SsaModule, block: BlockId) -> ValueId {
    let phis = &module.block(block).unwrap().phis;
    assert_eq!(phis.len(), 1, "expected one phi in {}, got {:?}", block, phis);
    phis[0]
}

/// Data operands of every write to `port` in reachable blocks, in block order
pub fn io_writes(module: &SsaModule, port: PortId) -> Vec<Operand> {
    let mut out = Vec::new();
    for id in module.reachable_blocks() {
        for &v in &module.block(id).unwrap().instructions {
            let value = module.value(v).unwrap();
            let Some(inst) = value.as_instruction() else {
                continue;
            };
            if let Some(io) = inst.io {
                if io.port == port && io.direction == IoDirection::Write {
                    out.push(inst.operands[0]);
                }
            }
        }
    }
    out
}

/// The one write to `port`
pub fn single_write(module: &SsaModule, port: PortId) -> Operand {
    let writes = io_writes(module, port);
    assert_eq!(writes.len(), 1, "expected one write to {}, got {:?}", port, writes);
    writes[0]
}
