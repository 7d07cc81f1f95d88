//! AST → SSA converter
//!
//! Walks the statement tree once, creating and sealing blocks per construct
//! while the memory-SSA updater places phis on demand:
//!
//! ```text
//! while (c) body            if (c0) a elif (c1) b else e
//!
//!   pred                         cond ──c0──▶ arm0 ──┐
//!    │                            │ ──c1──▶ arm1 ──┤
//!    ▼                            │ ─────▶ else ───┤
//!   cond ◀──────┐                 ▼                 ▼
//!    │ c   else │              (end-if, sealed last) ◀┘
//!    ▼     ▼    │
//!  body   exit  │
//!    └──────────┘
//! ```
//!
//! Code after `break`/`continue` lands in an unreachable block; blocks
//! created under an unreachable block are unreachable too, so dead code
//! never adds a predecessor to a live block.

use std::mem;

use crate::features::expression_builder::infrastructure::ssa_builder::static_range;
use crate::features::expression_builder::SsaExpressionBuilder;
use crate::features::lowering::domain::{
    LoopContext, LoweredProgram, LoweringOptions, ProgramLowering,
};
use crate::features::ssa::domain::{BlockId, BlockKind, Operand, SsaModule};
use crate::features::ssa::infrastructure::{
    verify_module, BitRange, MemorySsaUpdater, SSAError, SSAResult,
};
use crate::shared::models::{
    BitType, Expr, IfArm, Index, Port, PortDirection, PortId, Program, Stmt, VariableId,
};

pub struct AstToSsa<'p> {
    program: &'p Program,
    module: SsaModule,
    updater: MemorySsaUpdater,
    builder: SsaExpressionBuilder,
    loops: Vec<LoopContext>,
    next_label: u32,
}

impl<'p> AstToSsa<'p> {
    pub fn new(program: &'p Program, options: LoweringOptions) -> Self {
        let module = SsaModule::new(program.name.clone());
        let builder = SsaExpressionBuilder::new(module.entry)
            .with_max_literal_width(options.max_literal_width);
        let updater =
            MemorySsaUpdater::new(&program.variables).with_value_names(options.name_values);
        Self {
            program,
            module,
            updater,
            builder,
            loops: Vec::new(),
            next_label: 0,
        }
    }

    pub fn module(&self) -> &SsaModule {
        &self.module
    }

    pub fn updater(&self) -> &MemorySsaUpdater {
        &self.updater
    }

    /// Lower the program body; returns the block control falls out of
    pub fn lower_program(&mut self) -> SSAResult<BlockId> {
        let entry = self.module.entry;
        if !self.module.block(entry)?.sealed {
            self.updater.seal_block(&mut self.module, entry)?;
        }

        let program = self.program;
        let exit = self.lower_stmts(&program.body, entry)?;
        self.module.exit = Some(exit);
        Ok(exit)
    }

    /// Post-condition check over the finished module
    ///
    /// Not a repair step: any failure is a lowering defect.
    pub fn finalize(&self) -> SSAResult<()> {
        if let Some(ctx) = self.loops.last() {
            return Err(SSAError::invariant(format!(
                "loop {} still open at finalize",
                ctx.label
            )));
        }
        if self.updater.has_incomplete_phis() {
            return Err(SSAError::invariant(format!(
                "incomplete phis remain in {:?}",
                self.updater.blocks_with_incomplete_phis()
            )));
        }
        verify_module(&self.module)
    }

    pub fn into_lowered(self) -> LoweredProgram {
        LoweredProgram {
            stats: self.updater.stats(),
            module: self.module,
        }
    }

    // ----------------------------------------------------------------
    // Blocks
    // ----------------------------------------------------------------

    fn label(&mut self, construct: &str) -> String {
        let label = format!("{}{}", construct, self.next_label);
        self.next_label += 1;
        label
    }

    /// Fresh block; unreachable when created under an unreachable block
    fn new_block(&mut self, label: String, parent: BlockId) -> SSAResult<BlockId> {
        let kind = if self.module.block(parent)?.is_unreachable() {
            BlockKind::Unreachable
        } else {
            BlockKind::Live
        };
        let id = self.module.add_block(label, kind);
        tracing::debug!(block = %id, kind = kind.as_str(), "block created");
        Ok(id)
    }

    /// Fresh sealed block hosting dead code
    fn unreachable_block(&mut self) -> SSAResult<BlockId> {
        let label = self.label("dead");
        let id = self.module.add_block(label, BlockKind::Unreachable);
        self.seal(id)?;
        Ok(id)
    }

    fn seal(&mut self, block: BlockId) -> SSAResult<()> {
        self.updater.seal_block(&mut self.module, block)
    }

    fn jump(&mut self, from: BlockId, cond: Option<Operand>, to: BlockId) -> SSAResult<()> {
        self.module.add_target(from, cond, to)
    }

    fn enter(&mut self, block: BlockId) {
        self.builder.set_insert_point(block, None);
    }

    fn lower_expr(&mut self, expr: &Expr) -> SSAResult<Operand> {
        self.builder
            .lower_expr(&mut self.module, &mut self.updater, expr)
    }

    fn lower_condition(&mut self, cond: &Expr) -> SSAResult<Operand> {
        let value = self.lower_expr(cond)?;
        self.builder
            .condition(&mut self.module, value, &cond.describe())
    }

    // ----------------------------------------------------------------
    // Statements
    // ----------------------------------------------------------------

    fn lower_stmts(&mut self, stmts: &[Stmt], block: BlockId) -> SSAResult<BlockId> {
        let mut current = block;
        for stmt in stmts {
            current = self.lower_stmt(stmt, current)?;
        }
        Ok(current)
    }

    fn lower_stmt(&mut self, stmt: &Stmt, block: BlockId) -> SSAResult<BlockId> {
        #[cfg(feature = "trace")]
        tracing::trace!(stmt = stmt.kind_name(), %block, "lower_stmt");
        match stmt {
            Stmt::Assign {
                target,
                indices,
                value,
            } => self.lower_assign(*target, indices, value, block),
            Stmt::Read { port, target } => self.lower_read(*port, *target, block),
            Stmt::Write { port, value } => self.lower_write(*port, value, block),
            Stmt::If { arms, else_body } => self.lower_if(arms, else_body.as_deref(), block),
            Stmt::While { cond, body } => self.lower_loop("while", cond, body, &[], block),
            Stmt::For {
                init,
                cond,
                step,
                body,
            } => {
                let block = self.lower_stmts(init, block)?;
                self.lower_loop("for", cond, body, step, block)
            }
            Stmt::Break => self.lower_break(block),
            Stmt::Continue => self.lower_continue(block),
        }
    }

    fn lower_assign(
        &mut self,
        target: VariableId,
        indices: &[Index],
        value: &Expr,
        block: BlockId,
    ) -> SSAResult<BlockId> {
        self.enter(block);
        let variable = self.updater.variable(target)?.clone();
        let node = format!("assignment to {}", variable.name);
        if variable.is_array() {
            return Err(SSAError::not_implemented(
                format!("assignment to array variable {}", variable.name),
                node,
            ));
        }

        let ranges = match indices {
            [] => Vec::new(),
            [index] => vec![self.assignment_range(index, variable.ty.width, &node)?],
            _ => {
                return Err(SSAError::not_implemented(
                    "assignment through more than one index",
                    node,
                ))
            }
        };
        let store_ty = match ranges.first() {
            Some(range) => BitType::unsigned(range.width()),
            None => variable.ty,
        };

        let value = self.lower_expr(value)?;
        let value = self
            .builder
            .coerce_to(&mut self.module, value, store_ty, &node)?;
        self.updater.write_variable(
            &mut self.module,
            &mut self.builder,
            target,
            &ranges,
            block,
            value,
        )?;
        Ok(block)
    }

    /// Static range written by `target[index] = ...`
    fn assignment_range(&self, index: &Index, width: u32, node: &str) -> SSAResult<BitRange> {
        let range = match index {
            Index::Bit(bit) => {
                let k = SsaExpressionBuilder::eval_literal(bit)
                    .and_then(|c| u32::try_from(c.bits()).ok())
                    .ok_or_else(|| {
                        SSAError::not_implemented("non-constant index in assignment", node)
                    })?;
                BitRange::bit(k)
            }
            Index::Range { msb, lsb } => {
                let (msb, lsb) = static_range(msb, lsb, node)?;
                BitRange::new(msb, lsb)
            }
        };
        if range.lsb > range.msb || range.msb >= width {
            return Err(SSAError::IndexOutOfRange {
                msb: range.msb,
                lsb: range.lsb,
                width,
                node: node.to_string(),
            });
        }
        Ok(range)
    }

    fn port(&self, id: PortId, wanted: PortDirection, node: &str) -> SSAResult<Port> {
        let port = self
            .program
            .port(id)
            .ok_or(SSAError::UnknownPort { port: id })?;
        if port.direction != wanted {
            return Err(SSAError::PortDirection {
                port: id,
                access: match wanted {
                    PortDirection::In => "read",
                    PortDirection::Out => "write",
                },
                node: node.to_string(),
            });
        }
        Ok(port.clone())
    }

    fn lower_read(&mut self, port: PortId, target: VariableId, block: BlockId) -> SSAResult<BlockId> {
        self.enter(block);
        let variable = self.updater.variable(target)?.clone();
        let node = format!("read of {} into {}", port, variable.name);
        let port = self.port(port, PortDirection::In, &node)?;
        if variable.is_array() {
            return Err(SSAError::not_implemented(
                format!("read into array variable {}", variable.name),
                node,
            ));
        }

        let value = self.builder.io_read(&mut self.module, port.id, port.ty)?;
        let value = self
            .builder
            .coerce_to(&mut self.module, value, variable.ty, &node)?;
        self.updater.write_variable(
            &mut self.module,
            &mut self.builder,
            target,
            &[],
            block,
            value,
        )?;
        Ok(block)
    }

    fn lower_write(&mut self, port: PortId, value: &Expr, block: BlockId) -> SSAResult<BlockId> {
        self.enter(block);
        let node = format!("write to {}", port);
        let port = self.port(port, PortDirection::Out, &node)?;

        let value = self.lower_expr(value)?;
        let value = self
            .builder
            .coerce_to(&mut self.module, value, port.ty, &node)?;
        self.builder.io_write(&mut self.module, port.id, value)?;
        Ok(block)
    }

    // ----------------------------------------------------------------
    // Control flow
    // ----------------------------------------------------------------

    /// `if`/`elif`/`else`; `block` is the shared condition block
    fn lower_if(
        &mut self,
        arms: &[IfArm],
        else_body: Option<&[Stmt]>,
        block: BlockId,
    ) -> SSAResult<BlockId> {
        let label = self.label("if");
        let end_if = self.new_block(format!("{}.end", label), block)?;
        let mut has_default = false;

        for (i, arm) in arms.iter().enumerate() {
            let literal = self.builder.literal_condition(&arm.cond).map(|c| c.is_true());
            if literal == Some(false) {
                continue;
            }
            let always = literal == Some(true);
            let cond = if always {
                None
            } else {
                self.enter(block);
                Some(self.lower_condition(&arm.cond)?)
            };

            if arm.body.is_empty() {
                self.jump(block, cond, end_if)?;
            } else {
                let arm_block = self.new_block(format!("{}.arm{}", label, i), block)?;
                self.jump(block, cond, arm_block)?;
                self.seal(arm_block)?;
                let end = self.lower_stmts(&arm.body, arm_block)?;
                self.jump(end, None, end_if)?;
            }

            if always {
                has_default = true;
                break;
            }
        }

        if !has_default {
            match else_body {
                Some(body) if !body.is_empty() => {
                    let else_block = self.new_block(format!("{}.else", label), block)?;
                    self.jump(block, None, else_block)?;
                    self.seal(else_block)?;
                    let end = self.lower_stmts(body, else_block)?;
                    self.jump(end, None, end_if)?;
                }
                _ => self.jump(block, None, end_if)?,
            }
        }

        // Every arm ended in break/continue
        if self.module.block(end_if)?.predecessors.is_empty() {
            self.module.block_mut(end_if)?.kind = BlockKind::Unreachable;
        }
        self.seal(end_if)?;
        Ok(end_if)
    }

    /// `while`, and `for` once its init has run (`step` non-empty)
    fn lower_loop(
        &mut self,
        construct: &str,
        cond: &Expr,
        body: &[Stmt],
        step: &[Stmt],
        block: BlockId,
    ) -> SSAResult<BlockId> {
        let literal = self.builder.literal_condition(cond).map(|c| c.is_true());
        if literal == Some(false) {
            return Ok(block);
        }

        let label = self.label(construct);
        let cond_block = self.new_block(format!("{}.cond", label), block)?;
        let body_block = self.new_block(format!("{}.body", label), cond_block)?;
        self.jump(block, None, cond_block)?;

        // General loops pre-allocate the exit and test the condition
        let exit_block = if literal == Some(true) {
            self.jump(cond_block, None, body_block)?;
            None
        } else {
            let exit_block = self.new_block(format!("{}.exit", label), cond_block)?;
            self.enter(cond_block);
            let c = self.lower_condition(cond)?;
            self.jump(cond_block, Some(c), body_block)?;
            self.jump(cond_block, None, exit_block)?;
            Some(exit_block)
        };
        self.seal(body_block)?;

        tracing::debug!(%label, cond = %cond_block, body = %body_block, "loop entered");
        self.loops
            .push(LoopContext::new(label.clone(), cond_block, step.to_vec()));
        let end = self.lower_stmts(body, body_block)?;
        let end = self.lower_step(end)?;
        let ctx = self
            .loops
            .pop()
            .ok_or_else(|| SSAError::invariant(format!("loop stack underflow in {}", label)))?;

        self.jump(end, None, cond_block)?;

        let exit = match exit_block {
            Some(exit) => {
                for origin in &ctx.break_origins {
                    self.jump(*origin, None, exit)?;
                }
                self.seal(cond_block)?;
                exit
            }
            None => {
                self.seal(cond_block)?;
                if ctx.break_origins.is_empty() {
                    let label = format!("{}.exit", label);
                    self.module.add_block(label, BlockKind::Unreachable)
                } else {
                    let exit = self.new_block(format!("{}.exit", label), cond_block)?;
                    for origin in &ctx.break_origins {
                        self.jump(*origin, None, exit)?;
                    }
                    exit
                }
            }
        };
        self.seal(exit)?;
        Ok(exit)
    }

    /// Run the innermost loop's step at the end of `block`
    fn lower_step(&mut self, block: BlockId) -> SSAResult<BlockId> {
        let Some(depth) = self.loops.len().checked_sub(1) else {
            return Ok(block);
        };
        if self.loops[depth].step.is_empty() {
            return Ok(block);
        }
        let step = mem::take(&mut self.loops[depth].step);
        let end = self.lower_stmts(&step, block);
        self.loops[depth].step = step;
        end
    }

    fn lower_break(&mut self, block: BlockId) -> SSAResult<BlockId> {
        let live = !self.module.block(block)?.is_unreachable();
        let ctx = self
            .loops
            .last_mut()
            .ok_or_else(|| SSAError::not_implemented("break outside of a loop", "break"))?;
        if live {
            ctx.break_origins.push(block);
        }
        self.unreachable_block()
    }

    fn lower_continue(&mut self, block: BlockId) -> SSAResult<BlockId> {
        let cond_block = self
            .loops
            .last()
            .map(|ctx| ctx.cond_block)
            .ok_or_else(|| SSAError::not_implemented("continue outside of a loop", "continue"))?;
        let end = self.lower_step(block)?;
        self.jump(end, None, cond_block)?;
        self.unreachable_block()
    }
}

/// `ProgramLowering` adapter around `AstToSsa`
#[derive(Debug, Clone, Copy, Default)]
pub struct AstToSsaLowering {
    options: LoweringOptions,
}

impl AstToSsaLowering {
    pub fn new(options: LoweringOptions) -> Self {
        Self { options }
    }
}

impl ProgramLowering for AstToSsaLowering {
    fn lower(&self, program: &Program) -> SSAResult<LoweredProgram> {
        let mut converter = AstToSsa::new(program, self.options);
        converter.lower_program()?;
        if self.options.verify_on_finalize {
            converter.finalize()?;
        }
        Ok(converter.into_lowered())
    }
}
