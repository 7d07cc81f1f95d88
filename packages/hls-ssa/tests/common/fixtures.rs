//! Program fixtures

use hls_ssa::shared::models::{
    BitType, CompOp, Expr, PortDirection, PortId, Program, Stmt, VariableId,
};

pub fn u(width: u32) -> BitType {
    BitType::unsigned(width)
}

pub fn lit(bits: u128, width: u32) -> Expr {
    Expr::lit(bits, u(width))
}

pub fn lt(lhs: Expr, rhs: Expr) -> Expr {
    Expr::compare(CompOp::Lt, lhs, rhs)
}

pub fn incr(var: VariableId, width: u32) -> Stmt {
    Stmt::assign(var, Expr::add(Expr::var(var), lit(1, width)))
}

/// `x = 0; while (x < 10) { x = x + 1 }`
pub struct CounterLoop {
    pub program: Program,
    pub x: VariableId,
}

pub fn counter_loop() -> CounterLoop {
    let mut program = Program::new("counter");
    let x = program.add_variable("x", u(8));
    program.body = vec![
        Stmt::assign(x, lit(0, 8)),
        Stmt::while_loop(lt(Expr::var(x), lit(10, 8)), vec![incr(x, 8)]),
    ];
    CounterLoop { program, x }
}

/// `c = in.read(); if (c) { x = 1 } else { x = 2 }; y = x`
pub struct IfElseJoin {
    pub program: Program,
    pub c: VariableId,
    pub x: VariableId,
    pub y: VariableId,
    pub input: PortId,
}

pub fn if_else_join() -> IfElseJoin {
    let mut program = Program::new("join");
    let input = program.add_port("c_in", BitType::bit(), PortDirection::In);
    let c = program.add_variable("c", BitType::bit());
    let x = program.add_variable("x", u(8));
    let y = program.add_variable("y", u(8));
    program.body = vec![
        Stmt::read(input, c),
        Stmt::if_else(
            Expr::var(c),
            vec![Stmt::assign(x, lit(1, 8))],
            vec![Stmt::assign(x, lit(2, 8))],
        ),
        Stmt::assign(y, Expr::var(x)),
    ];
    IfElseJoin {
        program,
        c,
        x,
        y,
        input,
    }
}

/// `depth` nested counting loops, each bumping an accumulator
pub fn nested_loops(depth: usize, width: u32) -> Program {
    let mut program = Program::new(format!("nested{}", depth));
    let acc = program.add_variable("acc", u(width));
    let out = program.add_port("out", u(width), PortDirection::Out);

    let counters: Vec<VariableId> = (0..depth)
        .map(|i| program.add_variable(format!("i{}", i), u(width)))
        .collect();

    let mut body = vec![incr(acc, width)];
    for &i in counters.iter().rev() {
        body = vec![Stmt::for_loop(
            vec![Stmt::assign(i, lit(0, width))],
            lt(Expr::var(i), lit(4, width)),
            vec![incr(i, width)],
            body,
        )];
    }

    program.body = vec![Stmt::assign(acc, lit(0, width))];
    program.body.extend(body);
    program.body.push(Stmt::write(out, Expr::var(acc)));
    program
}
