//! SSA Expression Builder - elaborated expression tree → SSA instructions
//!
//! - Instructions land at a tracked insertion cursor
//! - All-literal operators fold to literals
//! - Redundant casts, bit-0 of a 1-bit value and whole-value slices return
//!   their operand unchanged
//! - Concatenation operands are high-bits-first

use crate::features::expression_builder::domain::InsertPoint;
use crate::features::ssa::domain::{
    BlockId, Instruction, IoAccess, IoDirection, Opcode, Operand, SsaModule, ValueId, ValueOrigin,
};
use crate::features::ssa::infrastructure::{MemorySsaUpdater, SSAError, SSAResult};
use crate::shared::models::{
    BinOp, BitType, CompOp, Constant, Expr, Index, PortId, UnaryOp, MAX_LITERAL_WIDTH,
};

use super::const_fold::fold;

pub struct SsaExpressionBuilder {
    insert: InsertPoint,
    max_literal_width: u32,
}

impl SsaExpressionBuilder {
    pub fn new(block: BlockId) -> Self {
        Self {
            insert: InsertPoint::append(block),
            max_literal_width: MAX_LITERAL_WIDTH,
        }
    }

    /// Reject literals wider than `width` bits (clamped to 128)
    pub fn with_max_literal_width(mut self, width: u32) -> Self {
        self.max_literal_width = width.min(MAX_LITERAL_WIDTH);
        self
    }

    pub fn insert_point(&self) -> InsertPoint {
        self.insert
    }

    pub fn set_insert_point(&mut self, block: BlockId, position: Option<usize>) {
        self.insert = InsertPoint { block, position };
    }

    fn emit(
        &mut self,
        module: &mut SsaModule,
        ty: BitType,
        opcode: Opcode,
        operands: Vec<Operand>,
        io: Option<IoAccess>,
        origin: ValueOrigin,
    ) -> SSAResult<ValueId> {
        let id = module.insert_instruction(
            self.insert.block,
            self.insert.position,
            ty,
            origin,
            Instruction {
                opcode,
                operands,
                io,
            },
        )?;
        self.insert.advance();
        Ok(id)
    }

    fn fold_or_emit(
        &mut self,
        module: &mut SsaModule,
        ty: BitType,
        opcode: Opcode,
        operands: Vec<Operand>,
    ) -> SSAResult<Operand> {
        let literals: Option<Vec<Constant>> =
            operands.iter().map(|op| op.as_const().copied()).collect();
        if let Some(folded) = literals.and_then(|lits| fold(opcode, &lits, ty)) {
            return Ok(Operand::Const(folded));
        }
        let id = self.emit(module, ty, opcode, operands, None, ValueOrigin::Expression)?;
        Ok(Operand::Value(id))
    }

    // ----------------------------------------------------------------
    // Operators
    // ----------------------------------------------------------------

    pub fn unary(
        &mut self,
        module: &mut SsaModule,
        opcode: Opcode,
        arg: Operand,
        node: &str,
    ) -> SSAResult<Operand> {
        if !matches!(opcode, Opcode::Not | Opcode::Neg) {
            return Err(SSAError::invariant(format!(
                "{} is not a unary operator (at {})",
                opcode.as_str(),
                node
            )));
        }
        let ty = module.operand_type(&arg)?;
        self.fold_or_emit(module, ty, opcode, vec![arg])
    }

    /// Arithmetic, bitwise and shift operators; the result takes the lhs type
    pub fn binary(
        &mut self,
        module: &mut SsaModule,
        opcode: Opcode,
        lhs: Operand,
        rhs: Operand,
        node: &str,
    ) -> SSAResult<Operand> {
        let lt = module.operand_type(&lhs)?;
        let rt = module.operand_type(&rhs)?;
        match opcode {
            Opcode::Shl | Opcode::Shr => {}
            Opcode::Add
            | Opcode::Sub
            | Opcode::Mul
            | Opcode::Div
            | Opcode::Rem
            | Opcode::And
            | Opcode::Or
            | Opcode::Xor => {
                if lt.width != rt.width {
                    return Err(SSAError::type_mismatch(lt, rt, node));
                }
            }
            other => {
                return Err(SSAError::invariant(format!(
                    "{} is not a binary operator (at {})",
                    other.as_str(),
                    node
                )))
            }
        }
        self.fold_or_emit(module, lt, opcode, vec![lhs, rhs])
    }

    pub fn compare(
        &mut self,
        module: &mut SsaModule,
        opcode: Opcode,
        lhs: Operand,
        rhs: Operand,
        node: &str,
    ) -> SSAResult<Operand> {
        if !opcode.is_compare() {
            return Err(SSAError::invariant(format!(
                "{} is not a comparison (at {})",
                opcode.as_str(),
                node
            )));
        }
        let lt = module.operand_type(&lhs)?;
        let rt = module.operand_type(&rhs)?;
        if lt.width != rt.width {
            return Err(SSAError::type_mismatch(lt, rt, node));
        }
        self.fold_or_emit(module, BitType::bit(), opcode, vec![lhs, rhs])
    }

    /// `{parts[0], parts[1], ...}`, `parts[0]` in the most significant bits
    pub fn concat(
        &mut self,
        module: &mut SsaModule,
        parts: &[Operand],
        node: &str,
    ) -> SSAResult<Operand> {
        let mut width: u32 = 0;
        for part in parts {
            width = width.saturating_add(module.operand_type(part)?.width);
        }
        let [first, rest @ ..] = parts else {
            return Err(SSAError::type_mismatch("at least one part", "none", node));
        };
        if rest.is_empty() && !module.operand_type(first)?.signed {
            return Ok(*first);
        }
        self.fold_or_emit(module, BitType::unsigned(width), Opcode::Concat, parts.to_vec())
    }

    /// Single bit of `base`; a literal bit index becomes a static slice
    pub fn index(
        &mut self,
        module: &mut SsaModule,
        base: Operand,
        bit: Operand,
        node: &str,
    ) -> SSAResult<Operand> {
        if let Some(k) = bit.as_const() {
            let k = u32::try_from(k.bits()).unwrap_or(u32::MAX);
            return self.slice(module, base, k, k, node);
        }
        self.fold_or_emit(module, BitType::bit(), Opcode::Index, vec![base, bit])
    }

    /// Static `base[msb:lsb]`, unsigned result
    pub fn slice(
        &mut self,
        module: &mut SsaModule,
        base: Operand,
        msb: u32,
        lsb: u32,
        node: &str,
    ) -> SSAResult<Operand> {
        let bt = module.operand_type(&base)?;
        if lsb > msb || msb >= bt.width {
            return Err(SSAError::IndexOutOfRange {
                msb,
                lsb,
                width: bt.width,
                node: node.to_string(),
            });
        }
        let ty = BitType::unsigned(msb - lsb + 1);
        if ty == bt {
            return Ok(base);
        }
        self.fold_or_emit(module, ty, Opcode::Slice { msb, lsb }, vec![base])
    }

    /// `cond ? then_value : else_value`
    pub fn select(
        &mut self,
        module: &mut SsaModule,
        cond: Operand,
        then_value: Operand,
        else_value: Operand,
        node: &str,
    ) -> SSAResult<Operand> {
        let ct = module.operand_type(&cond)?;
        if !ct.is_bit() {
            return Err(SSAError::type_mismatch(BitType::bit(), ct, node));
        }
        let tt = module.operand_type(&then_value)?;
        let et = module.operand_type(&else_value)?;
        if tt != et {
            return Err(SSAError::type_mismatch(tt, et, node));
        }
        if let Some(c) = cond.as_const() {
            return Ok(if c.is_true() { then_value } else { else_value });
        }
        let id = self.emit(
            module,
            tt,
            Opcode::Select,
            vec![cond, then_value, else_value],
            None,
            ValueOrigin::Expression,
        )?;
        Ok(Operand::Value(id))
    }

    pub fn cast(
        &mut self,
        module: &mut SsaModule,
        arg: Operand,
        ty: BitType,
        node: &str,
    ) -> SSAResult<Operand> {
        if ty.width == 0 {
            return Err(SSAError::type_mismatch("non-empty type", ty, node));
        }
        if module.operand_type(&arg)? == ty {
            return Ok(arg);
        }
        self.fold_or_emit(module, ty, Opcode::Cast, vec![arg])
    }

    // ----------------------------------------------------------------
    // IO
    // ----------------------------------------------------------------

    /// Opaque read of `port`, typed `ty`
    pub fn io_read(&mut self, module: &mut SsaModule, port: PortId, ty: BitType) -> SSAResult<Operand> {
        let id = self.emit(
            module,
            ty,
            Opcode::Assign,
            Vec::new(),
            Some(IoAccess {
                port,
                direction: IoDirection::Read,
            }),
            ValueOrigin::Io(port),
        )?;
        Ok(Operand::Value(id))
    }

    /// Opaque write of `data` to `port`
    pub fn io_write(&mut self, module: &mut SsaModule, port: PortId, data: Operand) -> SSAResult<ValueId> {
        let ty = module.operand_type(&data)?;
        self.emit(
            module,
            ty,
            Opcode::Assign,
            vec![data],
            Some(IoAccess {
                port,
                direction: IoDirection::Write,
            }),
            ValueOrigin::Io(port),
        )
    }

    // ----------------------------------------------------------------
    // Coercion
    // ----------------------------------------------------------------

    /// Bring two operands to a common type
    ///
    /// Literals take the other side's type (rhs first); same-width values of
    /// different signedness get a cast to the lhs type.
    pub fn coerce(
        &mut self,
        module: &mut SsaModule,
        lhs: Operand,
        rhs: Operand,
        node: &str,
    ) -> SSAResult<(Operand, Operand)> {
        let lt = module.operand_type(&lhs)?;
        let rt = module.operand_type(&rhs)?;
        if lt == rt {
            return Ok((lhs, rhs));
        }
        match (lhs.as_const(), rhs.as_const()) {
            (_, Some(c)) => Ok((lhs, Operand::Const(c.resize(lt)))),
            (Some(c), None) => Ok((Operand::Const(c.resize(rt)), rhs)),
            (None, None) if lt.width == rt.width => {
                let rhs = self.cast(module, rhs, lt, node)?;
                Ok((lhs, rhs))
            }
            (None, None) => Err(SSAError::type_mismatch(lt, rt, node)),
        }
    }

    /// Bring `value` to `ty` for a store into a variable or port
    pub fn coerce_to(
        &mut self,
        module: &mut SsaModule,
        value: Operand,
        ty: BitType,
        node: &str,
    ) -> SSAResult<Operand> {
        let found = module.operand_type(&value)?;
        if found == ty {
            return Ok(value);
        }
        match value.as_const() {
            Some(c) => Ok(Operand::Const(c.resize(ty))),
            None if found.width == ty.width => self.cast(module, value, ty, node),
            None => Err(SSAError::type_mismatch(ty, found, node)),
        }
    }

    /// 1-bit truth value of `value` (`value != 0` for wider operands)
    pub fn condition(&mut self, module: &mut SsaModule, value: Operand, node: &str) -> SSAResult<Operand> {
        let ty = module.operand_type(&value)?;
        if ty.is_bit() {
            return Ok(value);
        }
        let zero = Operand::Const(Constant::zero(ty));
        self.compare(module, Opcode::Ne, value, zero, node)
    }

    // ----------------------------------------------------------------
    // Expression trees
    // ----------------------------------------------------------------

    /// Lower `expr` at the cursor, reading variables through `updater`
    pub fn lower_expr(
        &mut self,
        module: &mut SsaModule,
        updater: &mut MemorySsaUpdater,
        expr: &Expr,
    ) -> SSAResult<Operand> {
        let node = expr.describe();
        match expr {
            Expr::Const(c) => {
                if !c.ty().fits_literal() || c.width() > self.max_literal_width {
                    return Err(SSAError::not_implemented(
                        format!("literal wider than {} bits", self.max_literal_width),
                        node,
                    ));
                }
                Ok(Operand::Const(*c))
            }

            Expr::Var(id) => {
                let variable = updater.variable(*id)?;
                if variable.is_array() {
                    return Err(SSAError::not_implemented(
                        format!("array variable {} used as a value", variable.name),
                        node,
                    ));
                }
                updater.read_variable(module, *id, self.insert.block)
            }

            Expr::Unary { op, arg } => {
                let arg = self.lower_expr(module, updater, arg)?;
                let opcode = match op {
                    UnaryOp::Not => Opcode::Not,
                    UnaryOp::Neg => Opcode::Neg,
                };
                self.unary(module, opcode, arg, &node)
            }

            Expr::Binary { op, lhs, rhs } => {
                let lhs = self.lower_expr(module, updater, lhs)?;
                let rhs = self.lower_expr(module, updater, rhs)?;
                let opcode = binop_opcode(*op);
                let (lhs, rhs) = if matches!(opcode, Opcode::Shl | Opcode::Shr) {
                    (lhs, rhs)
                } else {
                    self.coerce(module, lhs, rhs, &node)?
                };
                self.binary(module, opcode, lhs, rhs, &node)
            }

            Expr::Compare { op, lhs, rhs } => {
                let lhs = self.lower_expr(module, updater, lhs)?;
                let rhs = self.lower_expr(module, updater, rhs)?;
                let (lhs, rhs) = self.coerce(module, lhs, rhs, &node)?;
                self.compare(module, compop_opcode(*op), lhs, rhs, &node)
            }

            Expr::Concat(parts) => {
                let mut lowered = Vec::with_capacity(parts.len());
                for part in parts {
                    lowered.push(self.lower_expr(module, updater, part)?);
                }
                self.concat(module, &lowered, &node)
            }

            Expr::Index { base, index } => {
                if let Expr::Var(id) = base.as_ref() {
                    let variable = updater.variable(*id)?;
                    if variable.is_array() {
                        return Err(SSAError::not_implemented(
                            format!("indexing array variable {}", variable.name),
                            node,
                        ));
                    }
                }
                let base = self.lower_expr(module, updater, base)?;
                match index.as_ref() {
                    Index::Bit(bit) => {
                        let bit = self.lower_expr(module, updater, bit)?;
                        self.index(module, base, bit, &node)
                    }
                    Index::Range { msb, lsb } => {
                        let (msb, lsb) = static_range(msb, lsb, &node)?;
                        self.slice(module, base, msb, lsb, &node)
                    }
                }
            }

            Expr::Ternary {
                cond,
                then_value,
                else_value,
            } => {
                let cond = self.lower_expr(module, updater, cond)?;
                let cond = self.condition(module, cond, &node)?;
                let then_value = self.lower_expr(module, updater, then_value)?;
                let else_value = self.lower_expr(module, updater, else_value)?;
                let (then_value, else_value) = self.coerce(module, then_value, else_value, &node)?;
                self.select(module, cond, then_value, else_value, &node)
            }

            Expr::Cast { arg, ty } => {
                let arg = self.lower_expr(module, updater, arg)?;
                self.cast(module, arg, *ty, &node)
            }
        }
    }

    /// Literal-only evaluation: `Some` when `expr` folds to a literal
    /// without reading any variable
    pub fn eval_literal(expr: &Expr) -> Option<Constant> {
        Self::eval_literal_within(expr, MAX_LITERAL_WIDTH)
    }

    /// `eval_literal` under this builder's literal width limit
    ///
    /// A condition holding an over-wide literal is not constant; lowering it
    /// reports the literal instead.
    pub fn literal_condition(&self, expr: &Expr) -> Option<Constant> {
        Self::eval_literal_within(expr, self.max_literal_width)
    }

    fn eval_literal_within(expr: &Expr, max_width: u32) -> Option<Constant> {
        let eval = |e: &Expr| Self::eval_literal_within(e, max_width);
        match expr {
            Expr::Const(c) => {
                if !c.ty().fits_literal() || c.width() > max_width {
                    return None;
                }
                Some(*c)
            }
            Expr::Var(_) => None,
            Expr::Unary { op, arg } => {
                let arg = eval(arg)?;
                let opcode = match op {
                    UnaryOp::Not => Opcode::Not,
                    UnaryOp::Neg => Opcode::Neg,
                };
                fold(opcode, &[arg], arg.ty())
            }
            Expr::Binary { op, lhs, rhs } => {
                let lhs = eval(lhs)?;
                let rhs = eval(rhs)?;
                let opcode = binop_opcode(*op);
                let rhs = if matches!(opcode, Opcode::Shl | Opcode::Shr) {
                    rhs
                } else {
                    rhs.resize(lhs.ty())
                };
                fold(opcode, &[lhs, rhs], lhs.ty())
            }
            Expr::Compare { op, lhs, rhs } => {
                let lhs = eval(lhs)?;
                let rhs = eval(rhs)?.resize(lhs.ty());
                fold(compop_opcode(*op), &[lhs, rhs], BitType::bit())
            }
            Expr::Concat(parts) => {
                let parts: Option<Vec<Constant>> = parts.iter().map(eval).collect();
                let parts = parts?;
                let width = parts
                    .iter()
                    .try_fold(0u32, |acc, p| acc.checked_add(p.width()))?;
                fold(Opcode::Concat, &parts, BitType::unsigned(width))
            }
            Expr::Index { base, index } => {
                let base = eval(base)?;
                match index.as_ref() {
                    Index::Bit(bit) => {
                        let bit = eval(bit)?;
                        fold(Opcode::Index, &[base, bit], BitType::bit())
                    }
                    Index::Range { msb, lsb } => {
                        let msb = u32::try_from(eval(msb)?.bits()).ok()?;
                        let lsb = u32::try_from(eval(lsb)?.bits()).ok()?;
                        if msb >= base.width() {
                            return None;
                        }
                        let width = msb.checked_sub(lsb)?.checked_add(1)?;
                        let ty = BitType::unsigned(width);
                        fold(Opcode::Slice { msb, lsb }, &[base], ty)
                    }
                }
            }
            Expr::Ternary {
                cond,
                then_value,
                else_value,
            } => {
                let cond = eval(cond)?;
                let chosen = if cond.is_true() { then_value } else { else_value };
                eval(chosen)
            }
            Expr::Cast { arg, ty } => {
                let arg = eval(arg)?;
                fold(Opcode::Cast, &[arg], *ty)
            }
        }
    }
}

fn binop_opcode(op: BinOp) -> Opcode {
    match op {
        BinOp::Add => Opcode::Add,
        BinOp::Sub => Opcode::Sub,
        BinOp::Mul => Opcode::Mul,
        BinOp::Div => Opcode::Div,
        BinOp::Mod => Opcode::Rem,
        BinOp::BitAnd => Opcode::And,
        BinOp::BitOr => Opcode::Or,
        BinOp::BitXor => Opcode::Xor,
        BinOp::LShift => Opcode::Shl,
        BinOp::RShift => Opcode::Shr,
    }
}

fn compop_opcode(op: CompOp) -> Opcode {
    match op {
        CompOp::Eq => Opcode::Eq,
        CompOp::NotEq => Opcode::Ne,
        CompOp::Lt => Opcode::Lt,
        CompOp::LtE => Opcode::Le,
        CompOp::Gt => Opcode::Gt,
        CompOp::GtE => Opcode::Ge,
    }
}

/// Literal `[msb:lsb]` bounds
pub(crate) fn static_range(msb: &Expr, lsb: &Expr, node: &str) -> SSAResult<(u32, u32)> {
    let bound = |e: &Expr| {
        SsaExpressionBuilder::eval_literal(e)
            .and_then(|c| u32::try_from(c.bits()).ok())
            .ok_or_else(|| SSAError::not_implemented("non-constant range bound", node))
    };
    Ok((bound(msb)?, bound(lsb)?))
}
