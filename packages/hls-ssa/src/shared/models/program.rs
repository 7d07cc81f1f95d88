//! Program declarations: variables, ports and the top-level statement list

use serde::{Deserialize, Serialize};
use std::fmt;

use super::bit_type::BitType;
use super::statement::Stmt;

/// Stable identity of a source-level variable
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct VariableId(pub u32);

impl VariableId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for VariableId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "var{}", self.0)
    }
}

/// Stable identity of an external IO port
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PortId(pub u32);

impl PortId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for PortId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "port{}", self.0)
    }
}

/// Mutable storage location with a fixed bit type
///
/// `dims` lists unpacked array dimensions; empty for a plain bit vector.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Variable {
    pub id: VariableId,
    pub name: String,
    pub ty: BitType,
    pub dims: Vec<u32>,
}

impl Variable {
    pub fn is_array(&self) -> bool {
        !self.dims.is_empty()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PortDirection {
    In,
    Out,
}

impl PortDirection {
    pub fn as_str(&self) -> &'static str {
        match self {
            PortDirection::In => "in",
            PortDirection::Out => "out",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Port {
    pub id: PortId,
    pub name: String,
    pub ty: BitType,
    pub direction: PortDirection,
}

/// A complete input program
#[derive(Debug, Clone, Default)]
pub struct Program {
    pub name: String,
    pub variables: Vec<Variable>,
    pub ports: Vec<Port>,
    pub body: Vec<Stmt>,
}

impl Program {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    /// Declare a plain bit-vector variable
    pub fn add_variable(&mut self, name: impl Into<String>, ty: BitType) -> VariableId {
        self.add_array_variable(name, ty, Vec::new())
    }

    /// Declare a variable with unpacked array dimensions
    pub fn add_array_variable(
        &mut self,
        name: impl Into<String>,
        ty: BitType,
        dims: Vec<u32>,
    ) -> VariableId {
        let id = VariableId(self.variables.len() as u32);
        self.variables.push(Variable {
            id,
            name: name.into(),
            ty,
            dims,
        });
        id
    }

    pub fn add_port(
        &mut self,
        name: impl Into<String>,
        ty: BitType,
        direction: PortDirection,
    ) -> PortId {
        let id = PortId(self.ports.len() as u32);
        self.ports.push(Port {
            id,
            name: name.into(),
            ty,
            direction,
        });
        id
    }

    pub fn variable(&self, id: VariableId) -> Option<&Variable> {
        self.variables.get(id.index())
    }

    pub fn port(&self, id: PortId) -> Option<&Port> {
        self.ports.get(id.index())
    }

    pub fn with_body(mut self, body: Vec<Stmt>) -> Self {
        self.body = body;
        self
    }
}
