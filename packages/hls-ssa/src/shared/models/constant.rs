//! Literal bit-vector values
//!
//! Bits are stored zero-extended in a `u128` and always masked to the
//! type's width; `as_signed` reinterprets them through sign extension.

use serde::{Deserialize, Serialize};
use std::fmt;

use super::bit_type::BitType;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Constant {
    bits: u128,
    ty: BitType,
}

impl Constant {
    /// Create a literal, truncating `bits` to the width of `ty`
    pub fn new(bits: u128, ty: BitType) -> Self {
        Self {
            bits: bits & ty.mask(),
            ty,
        }
    }

    /// Create a literal from a two's complement integer
    pub fn from_signed(value: i128, ty: BitType) -> Self {
        Self::new(value as u128, ty)
    }

    pub fn unsigned(bits: u128, width: u32) -> Self {
        Self::new(bits, BitType::unsigned(width))
    }

    pub fn bool(value: bool) -> Self {
        Self::new(value as u128, BitType::bit())
    }

    pub fn zero(ty: BitType) -> Self {
        Self::new(0, ty)
    }

    pub fn ty(&self) -> BitType {
        self.ty
    }

    pub fn width(&self) -> u32 {
        self.ty.width
    }

    /// Raw bits, zero-extended
    pub fn bits(&self) -> u128 {
        self.bits
    }

    /// Value sign-extended from the type's width
    pub fn as_signed(&self) -> i128 {
        let width = self.ty.width.min(128);
        if width == 128 {
            return self.bits as i128;
        }
        let shift = 128 - width;
        ((self.bits << shift) as i128) >> shift
    }

    pub fn is_true(&self) -> bool {
        self.bits != 0
    }

    /// Single bit `k` (0 = least significant)
    pub fn bit(&self, k: u32) -> bool {
        k < self.ty.width && (self.bits >> k) & 1 == 1
    }

    /// Bits `[msb:lsb]` as an unsigned literal
    pub fn slice(&self, msb: u32, lsb: u32) -> Self {
        let width = msb - lsb + 1;
        Self::unsigned(self.bits >> lsb, width)
    }

    /// Convert to another type: sign-extends signed sources, truncates wider ones
    pub fn resize(&self, ty: BitType) -> Self {
        if self.ty.signed {
            Self::from_signed(self.as_signed(), ty)
        } else {
            Self::new(self.bits, ty)
        }
    }

    /// Reinterpret the same bits under another type of equal width
    pub fn reinterpret(&self, ty: BitType) -> Self {
        Self::new(self.bits, ty)
    }
}

impl fmt::Display for Constant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.ty.signed {
            write!(f, "{}:{}", self.as_signed(), self.ty)
        } else {
            write!(f, "{}:{}", self.bits, self.ty)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_masking() {
        let c = Constant::unsigned(0x1ff, 8);
        assert_eq!(c.bits(), 0xff);
    }

    #[test]
    fn test_sign_extension() {
        let c = Constant::new(0xff, BitType::signed(8));
        assert_eq!(c.as_signed(), -1);
    }

    #[test]
    fn test_resize_sign_extends_signed_sources() {
        let c = Constant::from_signed(-2, BitType::signed(4));
        let wide = c.resize(BitType::signed(8));
        assert_eq!(wide.bits(), 0xfe);

        let u = Constant::unsigned(0b1110, 4).resize(BitType::unsigned(8));
        assert_eq!(u.bits(), 0b1110);
    }

    #[test]
    fn test_slice_and_bit() {
        let c = Constant::unsigned(0b1011_0100, 8);
        assert_eq!(c.slice(7, 4).bits(), 0b1011);
        assert_eq!(c.slice(3, 0).bits(), 0b0100);
        assert!(c.bit(2));
        assert!(!c.bit(0));
        assert!(!c.bit(9));
    }
}
