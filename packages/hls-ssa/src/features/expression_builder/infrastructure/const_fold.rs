//! Literal-only evaluation of the opcode set
//!
//! Arithmetic wraps at the result width. Division by zero and results wider
//! than a `u128` are left unfolded (`None`).

use std::cmp::Ordering;

use crate::features::ssa::domain::Opcode;
use crate::shared::models::{BitType, Constant};

/// Evaluate `opcode` over literal operands, producing a `result_ty` literal
pub fn fold(opcode: Opcode, operands: &[Constant], result_ty: BitType) -> Option<Constant> {
    if !result_ty.fits_literal() {
        return None;
    }

    let c = match (opcode, operands) {
        (Opcode::Add, [a, b]) => Constant::new(a.bits().wrapping_add(b.bits()), result_ty),
        (Opcode::Sub, [a, b]) => Constant::new(a.bits().wrapping_sub(b.bits()), result_ty),
        (Opcode::Mul, [a, b]) => Constant::new(a.bits().wrapping_mul(b.bits()), result_ty),
        (Opcode::Div, [a, b]) => {
            if result_ty.signed {
                Constant::from_signed(a.as_signed().checked_div(b.as_signed())?, result_ty)
            } else {
                Constant::new(a.bits().checked_div(b.bits())?, result_ty)
            }
        }
        (Opcode::Rem, [a, b]) => {
            if result_ty.signed {
                Constant::from_signed(a.as_signed().checked_rem(b.as_signed())?, result_ty)
            } else {
                Constant::new(a.bits().checked_rem(b.bits())?, result_ty)
            }
        }
        (Opcode::Neg, [a]) => Constant::new(a.bits().wrapping_neg(), result_ty),

        (Opcode::And, [a, b]) => Constant::new(a.bits() & b.bits(), result_ty),
        (Opcode::Or, [a, b]) => Constant::new(a.bits() | b.bits(), result_ty),
        (Opcode::Xor, [a, b]) => Constant::new(a.bits() ^ b.bits(), result_ty),
        (Opcode::Not, [a]) => Constant::new(!a.bits(), result_ty),
        (Opcode::Shl, [a, amount]) => {
            let amount = amount.bits();
            if amount >= a.width() as u128 {
                Constant::zero(result_ty)
            } else {
                Constant::new(a.bits() << amount, result_ty)
            }
        }
        (Opcode::Shr, [a, amount]) => {
            let amount = amount.bits().min(a.width() as u128) as u32;
            if a.ty().signed {
                let shifted = a.as_signed() >> amount.min(127);
                Constant::from_signed(shifted, result_ty)
            } else if amount >= a.width() {
                Constant::zero(result_ty)
            } else {
                Constant::new(a.bits() >> amount, result_ty)
            }
        }

        (op, [a, b]) if op.is_compare() => {
            let ord = compare(a, b);
            let holds = match op {
                Opcode::Eq => a.bits() == b.bits(),
                Opcode::Ne => a.bits() != b.bits(),
                Opcode::Lt => ord == Ordering::Less,
                Opcode::Le => ord != Ordering::Greater,
                Opcode::Gt => ord == Ordering::Greater,
                _ => ord != Ordering::Less,
            };
            Constant::bool(holds)
        }

        (Opcode::Concat, parts) if !parts.is_empty() => {
            let total = parts
                .iter()
                .try_fold(0u32, |acc, p| acc.checked_add(p.width()))?;
            if total > result_ty.width || total > 128 {
                return None;
            }
            // High-first: operand 0 ends up in the top bits
            let bits = parts.iter().fold(0u128, |acc, part| {
                if part.width() >= 128 {
                    part.bits()
                } else {
                    (acc << part.width()) | part.bits()
                }
            });
            Constant::new(bits, result_ty)
        }
        (Opcode::Index, [base, bit]) => {
            let k = u32::try_from(bit.bits()).ok()?;
            if k >= base.width() {
                return None;
            }
            Constant::bool(base.bit(k))
        }
        (Opcode::Slice { msb, lsb }, [base]) => {
            if lsb > msb || msb >= base.width() {
                return None;
            }
            base.slice(msb, lsb).reinterpret(result_ty)
        }
        (Opcode::Select, [cond, then_value, else_value]) => {
            if cond.is_true() {
                *then_value
            } else {
                *else_value
            }
        }
        (Opcode::Cast, [a]) => a.resize(result_ty),

        _ => return None,
    };
    Some(c)
}

/// Order two literals, signed only when both are signed
fn compare(a: &Constant, b: &Constant) -> Ordering {
    if a.ty().signed && b.ty().signed {
        a.as_signed().cmp(&b.as_signed())
    } else {
        a.bits().cmp(&b.bits())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn u(bits: u128, width: u32) -> Constant {
        Constant::unsigned(bits, width)
    }

    #[test]
    fn test_arithmetic_wraps() {
        let ty = BitType::unsigned(8);
        assert_eq!(fold(Opcode::Add, &[u(250, 8), u(10, 8)], ty), Some(u(4, 8)));
        assert_eq!(fold(Opcode::Sub, &[u(1, 8), u(2, 8)], ty), Some(u(255, 8)));
        assert_eq!(fold(Opcode::Neg, &[u(1, 8)], ty), Some(u(255, 8)));
    }

    #[test]
    fn test_division_by_zero_not_folded() {
        let ty = BitType::unsigned(8);
        assert_eq!(fold(Opcode::Div, &[u(4, 8), u(0, 8)], ty), None);
        assert_eq!(fold(Opcode::Rem, &[u(7, 8), u(4, 8)], ty), Some(u(3, 8)));
    }

    #[test]
    fn test_signed_compare_and_shift() {
        let i8t = BitType::signed(8);
        let minus_one = Constant::from_signed(-1, i8t);
        let one = Constant::from_signed(1, i8t);
        assert_eq!(
            fold(Opcode::Lt, &[minus_one, one], BitType::bit()),
            Some(Constant::bool(true))
        );
        assert_eq!(
            fold(Opcode::Lt, &[u(255, 8), u(1, 8)], BitType::bit()),
            Some(Constant::bool(false))
        );
        assert_eq!(
            fold(Opcode::Shr, &[Constant::from_signed(-8, i8t), u(2, 8)], i8t),
            Some(Constant::from_signed(-2, i8t))
        );
        assert_eq!(fold(Opcode::Shl, &[u(1, 8), u(9, 8)], BitType::unsigned(8)), Some(u(0, 8)));
    }

    #[test]
    fn test_concat_is_high_first() {
        let folded = fold(
            Opcode::Concat,
            &[u(0b10, 2), u(0b0, 1), u(0b111, 3)],
            BitType::unsigned(6),
        );
        assert_eq!(folded, Some(u(0b10_0_111, 6)));
    }

    #[test]
    fn test_slice_index_select_cast() {
        let v = u(0b1101_0010, 8);
        assert_eq!(
            fold(Opcode::Slice { msb: 7, lsb: 4 }, &[v], BitType::unsigned(4)),
            Some(u(0b1101, 4))
        );
        assert_eq!(fold(Opcode::Index, &[v, u(1, 32)], BitType::bit()), Some(Constant::bool(true)));
        assert_eq!(fold(Opcode::Index, &[v, u(8, 32)], BitType::bit()), None);
        assert_eq!(
            fold(Opcode::Select, &[Constant::bool(false), u(1, 8), u(2, 8)], BitType::unsigned(8)),
            Some(u(2, 8))
        );
        assert_eq!(
            fold(Opcode::Cast, &[Constant::from_signed(-1, BitType::signed(4))], BitType::signed(8)),
            Some(Constant::from_signed(-1, BitType::signed(8)))
        );
    }

    #[test]
    fn test_wide_results_not_folded() {
        assert_eq!(
            fold(Opcode::Concat, &[u(1, 100), u(1, 100)], BitType::unsigned(200)),
            None
        );
    }
}
