//! Straight-line evaluator
//!
//! Computes the literal an operand denotes, given literal values for the IO
//! reads it depends on. Phis are rejected: only acyclic, branch-free
//! dependency chains are evaluated.

use hls_ssa::features::expression_builder::infrastructure::fold;
use hls_ssa::features::ssa::domain::{IoDirection, Operand, SsaModule, ValueKind};
use hls_ssa::shared::models::{Constant, PortId};

pub fn evaluate(module: &SsaModule, op: Operand, inputs: &[(PortId, Constant)]) -> Constant {
    match op {
        Operand::Const(c) => c,
        Operand::Undef(ty) => panic!("evaluating undefined {} value", ty),
        Operand::Value(v) => {
            let value = module.value(v).unwrap();
            let ValueKind::Instruction(inst) = &value.kind else {
                panic!("{} is a phi", v);
            };
            if let Some(io) = inst.io {
                assert_eq!(io.direction, IoDirection::Read, "{} is an IO write", v);
                return inputs
                    .iter()
                    .find(|(p, _)| *p == io.port)
                    .map(|(_, c)| *c)
                    .unwrap_or_else(|| panic!("no input for {}", io.port));
            }
            let args: Vec<Constant> = inst
                .operands
                .iter()
                .map(|&o| evaluate(module, o, inputs))
                .collect();
            fold(inst.opcode, &args, value.ty)
                .unwrap_or_else(|| panic!("{} ({}) does not evaluate", v, inst.opcode.as_str()))
        }
    }
}
