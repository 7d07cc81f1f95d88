//! End-to-end lowering scenarios
//!
//! Each test lowers a small program and checks the phi shape, predecessor
//! lists and definitions the converter leaves behind.

mod common;

use common::*;
use hls_ssa::features::expression_builder::SsaExpressionBuilder;
use hls_ssa::features::lowering::{AstToSsa, AstToSsaLowering, LoweringOptions, ProgramLowering};
use hls_ssa::features::ssa::domain::{BlockKind, Opcode, Operand, SsaModule, ValueOrigin};
use hls_ssa::features::ssa::infrastructure::{MemorySsaUpdater, SSAError};
use hls_ssa::features::ssa::collect_ports;
use hls_ssa::shared::models::{
    BitType, CompOp, Constant, Expr, IfArm, Index, PortDirection, Program, Stmt,
};
use pretty_assertions::assert_eq;

fn lower(program: &Program) -> hls_ssa::LoweredProgram {
    AstToSsaLowering::default()
        .lower(program)
        .unwrap_or_else(|e| panic!("lowering {} failed: {}", program.name, e))
}

// ============================================================================
// Local reads and single predecessors
// ============================================================================

#[test]
fn test_read_after_write_in_same_block() {
    let mut program = Program::new("rw");
    let x = program.add_variable("x", u(8));
    let mut module = SsaModule::new("rw");
    let mut updater = MemorySsaUpdater::new(&program.variables);
    let entry = module.entry;
    let mut builder = SsaExpressionBuilder::new(entry);
    updater.seal_block(&mut module, entry).unwrap();

    let input = program.add_port("in", u(8), PortDirection::In);
    let value = builder.io_read(&mut module, input, u(8)).unwrap();
    updater
        .write_variable(&mut module, &mut builder, x, &[], entry, value)
        .unwrap();

    assert_eq!(updater.read_variable(&mut module, x, entry).unwrap(), value);
    assert_eq!(module.live_phi_count(), 0);
}

#[test]
fn test_single_predecessor_never_gets_phi() {
    let mut program = Program::new("single");
    let input = program.add_port("in", u(8), PortDirection::In);
    let flag = program.add_port("flag", BitType::bit(), PortDirection::In);
    let out = program.add_port("out", u(8), PortDirection::Out);
    let x = program.add_variable("x", u(8));
    let c = program.add_variable("c", BitType::bit());
    program.body = vec![
        Stmt::read(input, x),
        Stmt::read(flag, c),
        Stmt::if_then(Expr::var(c), vec![Stmt::write(out, Expr::var(x))]),
    ];

    let lowered = lower(&program);
    let module = &lowered.module;
    assert_eq!(module.live_phi_count(), 0);
    assert_eq!(lowered.stats.phis_created, 0);

    let written = single_write(module, out);
    let origin = module.value(written.as_value().unwrap()).unwrap().origin;
    assert_eq!(origin, ValueOrigin::Io(input));
}

#[test]
fn test_same_value_from_every_predecessor_is_not_a_phi() {
    let mut program = Program::new("same");
    let input = program.add_port("in", u(8), PortDirection::In);
    let flag = program.add_port("flag", BitType::bit(), PortDirection::In);
    let out = program.add_port("out", u(8), PortDirection::Out);
    let x = program.add_variable("x", u(8));
    let y = program.add_variable("y", u(8));
    let c = program.add_variable("c", BitType::bit());
    program.body = vec![
        Stmt::read(input, x),
        Stmt::read(flag, c),
        Stmt::if_else(
            Expr::var(c),
            vec![Stmt::assign(y, lit(1, 8))],
            vec![Stmt::assign(y, lit(2, 8))],
        ),
        Stmt::write(out, Expr::var(x)),
    ];

    let lowered = lower(&program);
    let module = &lowered.module;
    let exit = module.exit.unwrap();
    assert_eq!(module.block(exit).unwrap().predecessors.len(), 2);
    assert_eq!(module.live_phi_count(), 0);

    let written = single_write(module, out);
    assert_eq!(
        module.value(written.as_value().unwrap()).unwrap().origin,
        ValueOrigin::Io(input)
    );
}

// ============================================================================
// Joins and loops
// ============================================================================

#[test]
fn test_if_else_join_phi() {
    let f = if_else_join();
    let mut converter = AstToSsa::new(&f.program, LoweringOptions::default());
    let exit = converter.lower_program().unwrap();
    converter.finalize().unwrap();

    let module = converter.module();
    let end_if = module.block(exit).unwrap();
    let [then_block, else_block] = end_if.predecessors[..] else {
        panic!("end-if has predecessors {:?}", end_if.predecessors);
    };

    let phi = only_phi(module, exit);
    assert_eq!(
        phi_operands(module, phi),
        vec![
            (Operand::Const(Constant::unsigned(1, 8)), then_block),
            (Operand::Const(Constant::unsigned(2, 8)), else_block),
        ]
    );
    assert_eq!(module.value(phi).unwrap().origin, ValueOrigin::Phi(f.x));
    assert_eq!(
        converter.updater().current_definition(f.y, exit),
        Some(Operand::Value(phi))
    );

    // Both arms hang off the block holding the read of c
    assert_eq!(
        module.block(then_block).unwrap().predecessors,
        vec![module.entry]
    );
    assert_eq!(
        module.block(else_block).unwrap().predecessors,
        vec![module.entry]
    );
}

#[test]
fn test_counter_loop_phi() {
    let f = counter_loop();
    let lowered = lower(&f.program);
    let module = &lowered.module;
    assert_verified(module);

    let entry = module.block(module.entry).unwrap();
    let cond = entry.successors()[0];
    let cond_block = module.block(cond).unwrap();
    assert_eq!(cond_block.predecessors.len(), 2);
    let body = cond_block.predecessors[1];

    let phi = only_phi(module, cond);
    let operands = phi_operands(module, phi);
    assert_eq!(operands[0], (Operand::Const(Constant::unsigned(0, 8)), module.entry));
    assert_eq!(operands[1].1, body);

    let add = operands[1].0.as_value().unwrap();
    let add_value = module.value(add).unwrap();
    assert_eq!(add_value.opcode(), Some(Opcode::Add));
    assert_eq!(add_value.block, Some(body));
    assert_eq!(
        add_value.operands(),
        vec![Operand::Value(phi), Operand::Const(Constant::unsigned(1, 8))]
    );

    // The loop condition reads the same phi
    let cmp = cond_block.branches[0].cond.unwrap().as_value().unwrap();
    assert_eq!(module.value(cmp).unwrap().operands()[0], Operand::Value(phi));
    assert_eq!(lowered.stats.phis_live(), 1);
}

#[test]
fn test_loop_invariant_variable_has_no_phi() {
    let mut program = Program::new("invariant");
    let input = program.add_port("in", u(8), PortDirection::In);
    let out = program.add_port("out", u(8), PortDirection::Out);
    let k = program.add_variable("k", u(8));
    let i = program.add_variable("i", u(8));
    program.body = vec![
        Stmt::read(input, k),
        Stmt::assign(i, lit(0, 8)),
        Stmt::while_loop(
            lt(Expr::var(i), lit(4, 8)),
            vec![Stmt::write(out, Expr::var(k)), incr(i, 8)],
        ),
    ];

    let lowered = lower(&program);
    let module = &lowered.module;
    assert_verified(module);

    // k's placeholder phi in the condition block collapsed to the read
    assert!(lowered.stats.phis_removed >= 1);
    assert_eq!(module.live_phi_count(), 1);
    let written = single_write(module, out);
    assert_eq!(
        module.value(written.as_value().unwrap()).unwrap().origin,
        ValueOrigin::Io(input)
    );
}

#[test]
fn test_nested_loops_verify() {
    let program = nested_loops(3, 8);
    let lowered = lower(&program);
    let module = &lowered.module;
    assert_verified(module);
    assert_live_values_attached(module);

    // One phi per counter, plus the accumulator at every loop header
    assert_eq!(module.live_phi_count(), 3 + 3);
    assert_eq!(lowered.stats.phis_live(), module.live_phi_count());
}

#[test]
fn test_elif_chain_with_literal_true_arm() {
    let mut program = Program::new("elif");
    let flag = program.add_port("flag", BitType::bit(), PortDirection::In);
    let c = program.add_variable("c", BitType::bit());
    let x = program.add_variable("x", u(8));
    program.body = vec![
        Stmt::read(flag, c),
        Stmt::If {
            arms: vec![
                IfArm {
                    cond: Expr::var(c),
                    body: vec![Stmt::assign(x, lit(1, 8))],
                },
                IfArm {
                    cond: Expr::bool(false),
                    body: vec![Stmt::assign(x, lit(2, 8))],
                },
                IfArm {
                    cond: Expr::bool(true),
                    body: vec![Stmt::assign(x, lit(3, 8))],
                },
            ],
            else_body: Some(vec![Stmt::assign(x, lit(4, 8))]),
        },
        Stmt::assign(x, Expr::add(Expr::var(x), lit(1, 8))),
    ];

    let lowered = lower(&program);
    let module = &lowered.module;
    assert_verified(module);

    let entry = module.block(module.entry).unwrap();
    assert_eq!(entry.branches.len(), 2);
    assert!(entry.branches[0].cond.is_some());
    assert_eq!(entry.default_target(), Some(entry.branches[1].target));

    let exit = module.exit.unwrap();
    let phi = only_phi(module, exit);
    let values: Vec<Operand> = phi_operands(module, phi).into_iter().map(|(o, _)| o).collect();
    assert_eq!(
        values,
        vec![
            Operand::Const(Constant::unsigned(1, 8)),
            Operand::Const(Constant::unsigned(3, 8)),
        ]
    );
}

#[test]
fn test_non_bit_condition_compares_with_zero() {
    let mut program = Program::new("cond");
    let input = program.add_port("in", u(4), PortDirection::In);
    let v = program.add_variable("v", u(4));
    let x = program.add_variable("x", u(4));
    program.body = vec![
        Stmt::read(input, v),
        Stmt::if_then(Expr::var(v), vec![Stmt::assign(x, lit(1, 4))]),
    ];

    let lowered = lower(&program);
    let module = &lowered.module;
    let cond = module.block(module.entry).unwrap().branches[0].cond.unwrap();
    let cmp = module.value(cond.as_value().unwrap()).unwrap();
    assert_eq!(cmp.opcode(), Some(Opcode::Ne));
    assert_eq!(cmp.ty, BitType::bit());
}

// ============================================================================
// break / continue and dead code
// ============================================================================

#[test]
fn test_dead_code_after_break() {
    let mut program = Program::new("dead");
    let out = program.add_port("out", u(8), PortDirection::Out);
    let x = program.add_variable("x", u(8));
    program.body = vec![
        Stmt::assign(x, lit(0, 8)),
        Stmt::while_loop(
            lt(Expr::var(x), lit(10, 8)),
            vec![
                Stmt::Break,
                incr(x, 8),
                Stmt::if_else(
                    Expr::var(x),
                    vec![Stmt::Continue],
                    vec![Stmt::write(out, Expr::var(x))],
                ),
                Stmt::while_loop(Expr::bool(true), vec![Stmt::Break]),
            ],
        ),
        Stmt::write(out, Expr::var(x)),
    ];

    let mut converter = AstToSsa::new(&program, LoweringOptions::default());
    converter.lower_program().unwrap();
    converter.finalize().unwrap();

    let module = converter.module();
    assert_no_dead_predecessors(module);
    assert_live_values_attached(module);
    for id in module.reachable_blocks() {
        assert_eq!(module.block(id).unwrap().kind, BlockKind::Live);
    }

    // Only the write after the loop is reachable; x is still 0 there
    assert_eq!(io_writes(module, out), vec![Operand::Const(Constant::unsigned(0, 8))]);
}

#[test]
fn test_break_joins_exit_of_general_loop() {
    let mut program = Program::new("brk");
    let flag = program.add_port("flag", BitType::bit(), PortDirection::In);
    let c = program.add_variable("c", BitType::bit());
    let x = program.add_variable("x", u(8));
    program.body = vec![
        Stmt::assign(x, lit(0, 8)),
        Stmt::while_loop(
            lt(Expr::var(x), lit(10, 8)),
            vec![
                incr(x, 8),
                Stmt::read(flag, c),
                Stmt::if_then(Expr::var(c), vec![Stmt::Break]),
            ],
        ),
        Stmt::assign(x, Expr::add(Expr::var(x), lit(7, 8))),
    ];

    let lowered = lower(&program);
    let module = &lowered.module;
    assert_verified(module);

    let exit = module.exit.unwrap();
    let exit_block = module.block(exit).unwrap();
    assert_eq!(exit_block.predecessors.len(), 2);

    // The loop test sees x before the increment, the break after it
    let phi = only_phi(module, exit);
    let operands = phi_operands(module, phi);
    assert_eq!(operands.len(), 2);
    let header_phi = operands[0].0.as_value().unwrap();
    assert!(module.value(header_phi).unwrap().is_phi());
    let add = operands[1].0.as_value().unwrap();
    assert_eq!(module.value(add).unwrap().opcode(), Some(Opcode::Add));
}

#[test]
fn test_for_continue_advances_induction() {
    let mut program = Program::new("for");
    let out = program.add_port("out", u(8), PortDirection::Out);
    let i = program.add_variable("i", u(8));
    program.body = vec![Stmt::for_loop(
        vec![Stmt::assign(i, lit(0, 8))],
        lt(Expr::var(i), lit(8, 8)),
        vec![incr(i, 8)],
        vec![
            Stmt::if_then(
                Expr::compare(CompOp::Eq, Expr::var(i), lit(3, 8)),
                vec![Stmt::Continue],
            ),
            Stmt::write(out, Expr::var(i)),
        ],
    )];

    let lowered = lower(&program);
    let module = &lowered.module;
    assert_verified(module);

    let cond = module.block(module.entry).unwrap().successors()[0];
    let cond_block = module.block(cond).unwrap();
    // entry, the continue arm and the body end
    assert_eq!(cond_block.predecessors.len(), 3);

    let phi = only_phi(module, cond);
    for (op, pred) in phi_operands(module, phi).into_iter().skip(1) {
        let add = module.value(op.as_value().unwrap()).unwrap();
        assert_eq!(add.opcode(), Some(Opcode::Add), "operand from {}", pred);
        assert_eq!(add.block, Some(pred));
    }
}

#[test]
fn test_all_arms_exit_makes_end_if_unreachable() {
    let mut program = Program::new("arms");
    let flag = program.add_port("flag", BitType::bit(), PortDirection::In);
    let c = program.add_variable("c", BitType::bit());
    let x = program.add_variable("x", u(8));
    program.body = vec![
        Stmt::assign(x, lit(0, 8)),
        Stmt::while_loop(
            lt(Expr::var(x), lit(10, 8)),
            vec![
                Stmt::read(flag, c),
                Stmt::if_else(Expr::var(c), vec![Stmt::Break], vec![Stmt::Continue]),
                incr(x, 8),
            ],
        ),
    ];

    let lowered = lower(&program);
    let module = &lowered.module;
    assert_verified(module);
    assert_no_dead_predecessors(module);

    let adds = module
        .live_values()
        .filter(|v| v.opcode() == Some(Opcode::Add))
        .filter_map(|v| v.block)
        .collect::<Vec<_>>();
    assert_eq!(adds.len(), 1);
    assert!(module.block(adds[0]).unwrap().is_unreachable());
}

// ============================================================================
// Partial writes and unsupported shapes
// ============================================================================

#[test]
fn test_partial_write_splices_high_first() {
    let mut program = Program::new("splice");
    let input = program.add_port("in", u(8), PortDirection::In);
    let out = program.add_port("out", u(8), PortDirection::Out);
    let x = program.add_variable("x", u(8));
    program.body = vec![
        Stmt::read(input, x),
        Stmt::assign_indexed(x, Index::range(5, 2), lit(0b1001, 4)),
        Stmt::write(out, Expr::var(x)),
    ];

    let lowered = lower(&program);
    let module = &lowered.module;
    let written = single_write(module, out);
    let splice = module.value(written.as_value().unwrap()).unwrap();
    assert_eq!(splice.opcode(), Some(Opcode::Concat));
    assert_eq!(splice.origin, ValueOrigin::PartialWrite(x));

    let input_value = Constant::unsigned(0b1110_0111, 8);
    assert_eq!(
        evaluate(module, written, &[(input, input_value)]),
        Constant::unsigned(0b11_1001_11, 8)
    );
}

#[test]
fn test_unsupported_assignments() {
    let mut program = Program::new("unsupported");
    let x = program.add_variable("x", u(8));
    let arr = program.add_array_variable("mem", u(8), vec![4]);

    program.body = vec![Stmt::assign(arr, lit(0, 8))];
    assert!(matches!(
        AstToSsaLowering::default().lower(&program),
        Err(SSAError::NotImplemented { .. })
    ));

    program.body = vec![Stmt::Assign {
        target: x,
        indices: vec![Index::bit(0), Index::bit(1)],
        value: lit(0, 1),
    }];
    assert!(matches!(
        AstToSsaLowering::default().lower(&program),
        Err(SSAError::NotImplemented { .. })
    ));

    program.body = vec![Stmt::assign_indexed(x, Index::Bit(Expr::var(x)), lit(1, 1))];
    assert!(matches!(
        AstToSsaLowering::default().lower(&program),
        Err(SSAError::NotImplemented { .. })
    ));

    program.body = vec![Stmt::assign_indexed(x, Index::range(9, 2), lit(0, 8))];
    assert!(matches!(
        AstToSsaLowering::default().lower(&program),
        Err(SSAError::IndexOutOfRange { msb: 9, lsb: 2, width: 8, .. })
    ));
}

#[test]
fn test_type_mismatch_carries_node() {
    let mut program = Program::new("mismatch");
    let input = program.add_port("in", u(4), PortDirection::In);
    let x = program.add_variable("x", u(8));
    program.body = vec![Stmt::read(input, x)];

    let err = AstToSsaLowering::default().lower(&program).unwrap_err();
    let SSAError::TypeMismatch { node, .. } = err else {
        panic!("expected a type mismatch, got {:?}", err);
    };
    assert!(node.contains("x"));
}

#[test]
fn test_named_values_and_port_collection() {
    let f = if_else_join();
    let options = LoweringOptions {
        name_values: true,
        ..LoweringOptions::default()
    };
    let lowered = AstToSsaLowering::new(options).lower(&f.program).unwrap();
    let module = &lowered.module;

    let exit = module.exit.unwrap();
    let phi = module.value(only_phi(module, exit)).unwrap();
    assert_eq!(phi.name.as_deref(), Some("x_0"));

    let ports = collect_ports(module).unwrap();
    assert_eq!(ports.into_iter().collect::<Vec<_>>(), vec![f.input]);
}
