//! This module contains the typed values that flow through the interpreter.
//!
//! The IR is two-typed: every register holds either an integer or a boolean,
//! and the two never coerce implicitly. Comparison results are booleans,
//! arithmetic operands are integers, and using one where the other is
//! required is a fatal error rather than a conversion.

pub mod integer;

use std::fmt::{Display, Formatter};

pub use integer::Int;

use crate::error::execution::Error;

/// A concrete value bound to a register or stored in the heap.
#[derive(Clone, Debug, Eq, Hash, PartialEq)]
pub enum Value {
    /// An integer in the run's arithmetic mode.
    Int(Int),

    /// A boolean, produced by comparisons and consumed by conditional
    /// branches.
    Bool(bool),
}

/// The type of a [`Value`], used for diagnostics when the wrong one turns
/// up.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum ValueKind {
    Int,
    Bool,
}

impl Value {
    /// Gets the type of the value.
    #[must_use]
    pub fn kind(&self) -> ValueKind {
        match self {
            Self::Int(_) => ValueKind::Int,
            Self::Bool(_) => ValueKind::Bool,
        }
    }

    /// Reads the value as an integer, failing if it is not one.
    pub fn as_int(&self) -> Result<&Int, Error> {
        match self {
            Self::Int(value) => Ok(value),
            Self::Bool(_) => Err(Error::NotAnInteger { found: self.kind() }),
        }
    }

    /// Reads the value as a boolean, failing if it is not one.
    pub fn as_bool(&self) -> Result<bool, Error> {
        match self {
            Self::Bool(value) => Ok(*value),
            Self::Int(_) => Err(Error::NotABoolean { found: self.kind() }),
        }
    }
}

impl From<Int> for Value {
    fn from(value: Int) -> Self {
        Self::Int(value)
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl Display for Value {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Int(value) => write!(f, "{value}"),
            Self::Bool(value) => write!(f, "{value}"),
        }
    }
}
