//! Expression Builder Domain - insertion cursor

use crate::features::ssa::domain::BlockId;

/// Where the next instruction lands
///
/// `position == None` appends to the block; `Some(i)` inserts before the
/// instruction currently at index `i` and advances past the new one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InsertPoint {
    pub block: BlockId,
    pub position: Option<usize>,
}

impl InsertPoint {
    pub fn append(block: BlockId) -> Self {
        Self {
            block,
            position: None,
        }
    }

    pub fn before(block: BlockId, index: usize) -> Self {
        Self {
            block,
            position: Some(index),
        }
    }

    /// Move past an instruction just inserted at the cursor
    pub fn advance(&mut self) {
        if let Some(p) = self.position.as_mut() {
            *p += 1;
        }
    }
}
