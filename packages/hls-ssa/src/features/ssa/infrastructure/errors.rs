/*
 * SSA Error Types
 *
 * Every failure carries the offending AST/SSA node:
 * - Unsupported input shapes (explicit "not implemented")
 * - Type errors in the elaborated expression tree
 * - Invariant violations (defects in the lowering sequence)
 */

use thiserror::Error;

use crate::features::ssa::domain::BlockId;
use crate::shared::models::{PortId, VariableId};

/// SSA Error Type
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SSAError {
    /// Input uses a shape the frontend does not lower
    #[error("Not implemented: {feature} (at {node})")]
    NotImplemented { feature: String, node: String },

    /// Operand types do not fit the operator
    #[error("Type mismatch: expected {expected}, found {found} (at {node})")]
    TypeMismatch {
        expected: String,
        found: String,
        node: String,
    },

    /// Static index outside the indexed value
    #[error("Index [{msb}:{lsb}] out of range for {width}-bit value (at {node})")]
    IndexOutOfRange {
        msb: u32,
        lsb: u32,
        width: u32,
        node: String,
    },

    /// Variable not declared in the program
    #[error("Unknown variable {variable}")]
    UnknownVariable { variable: VariableId },

    /// Port not declared in the program
    #[error("Unknown port {port}")]
    UnknownPort { port: PortId },

    /// Block id outside the module's arena
    #[error("Unknown block {block}")]
    UnknownBlock { block: BlockId },

    /// Read from an output port or write to an input port
    #[error("Port {port} is not usable as {access} (at {node})")]
    PortDirection {
        port: PortId,
        access: &'static str,
        node: String,
    },

    /// Lowering sequence defect
    #[error("SSA invariant violated: {message}")]
    Invariant { message: String },
}

impl SSAError {
    pub fn not_implemented(feature: impl Into<String>, node: impl Into<String>) -> Self {
        SSAError::NotImplemented {
            feature: feature.into(),
            node: node.into(),
        }
    }

    pub fn type_mismatch(
        expected: impl ToString,
        found: impl ToString,
        node: impl Into<String>,
    ) -> Self {
        SSAError::TypeMismatch {
            expected: expected.to_string(),
            found: found.to_string(),
            node: node.into(),
        }
    }

    pub fn invariant(message: impl Into<String>) -> Self {
        SSAError::Invariant {
            message: message.into(),
        }
    }
}

/// Result type for SSA operations
pub type SSAResult<T> = Result<T, SSAError>;
