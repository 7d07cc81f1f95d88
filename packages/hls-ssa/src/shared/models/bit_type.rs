//! Fixed-width bit-vector types
//!
//! Every variable, port and SSA value carries one of these.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Widest type whose literals fit in a `u128`
pub const MAX_LITERAL_WIDTH: u32 = 128;

/// Bit-vector type: width in bits + signedness
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct BitType {
    pub width: u32,
    pub signed: bool,
}

impl BitType {
    pub fn new(width: u32, signed: bool) -> Self {
        Self { width, signed }
    }

    pub fn unsigned(width: u32) -> Self {
        Self::new(width, false)
    }

    pub fn signed(width: u32) -> Self {
        Self::new(width, true)
    }

    /// 1-bit unsigned (boolean) type
    pub fn bit() -> Self {
        Self::unsigned(1)
    }

    pub fn is_bit(&self) -> bool {
        self.width == 1 && !self.signed
    }

    /// Mask with the low `width` bits set (saturates at 128 bits)
    pub fn mask(&self) -> u128 {
        if self.width >= MAX_LITERAL_WIDTH {
            u128::MAX
        } else {
            (1u128 << self.width) - 1
        }
    }

    /// Whether literals of this type can be represented
    pub fn fits_literal(&self) -> bool {
        self.width >= 1 && self.width <= MAX_LITERAL_WIDTH
    }
}

impl fmt::Display for BitType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_bit() {
            write!(f, "bit")
        } else if self.signed {
            write!(f, "i{}", self.width)
        } else {
            write!(f, "u{}", self.width)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mask() {
        assert_eq!(BitType::unsigned(1).mask(), 1);
        assert_eq!(BitType::unsigned(8).mask(), 0xff);
        assert_eq!(BitType::unsigned(128).mask(), u128::MAX);
    }

    #[test]
    fn test_display() {
        assert_eq!(BitType::bit().to_string(), "bit");
        assert_eq!(BitType::unsigned(8).to_string(), "u8");
        assert_eq!(BitType::signed(16).to_string(), "i16");
    }
}
