//! This module contains errors pertaining to the concrete interpretation of
//! the control-flow-graph IR.
//!
//! Every variant here is fatal: encountering one means the input IR violated
//! the interpreter's preconditions, and the entire interpretation is aborted
//! rather than continuing with fabricated results. Exhausting the step budget
//! is deliberately _not_ an error; it is reported through the `early_exit`
//! flag on the recorded trace instead.

use thiserror::Error;

use crate::{
    error::location,
    ir::BinOp,
    value::ValueKind,
};

/// Errors that occur while interpreting a program.
#[derive(Clone, Debug, Eq, Error, PartialEq)]
pub enum Error {
    #[error("Integer division or remainder by zero")]
    DivisionByZero,

    #[error("Operands of widths {left:?} and {right:?} used in a width-sensitive operation")]
    WidthMismatch { left: u32, right: u32 },

    #[error("A bounded and an unbounded integer were combined in one operation")]
    ModeMismatch,

    #[error("Cannot convert a value of width {from:?} to width {to:?}")]
    InvalidWidthConversion { from: u32, to: u32 },

    #[error("Shift amount does not fit into a machine word")]
    ShiftAmountTooLarge,

    #[error("Expected an integer value but found {found:?}")]
    NotAnInteger { found: ValueKind },

    #[error("Expected a boolean value but found {found:?}")]
    NotABoolean { found: ValueKind },

    #[error("The value {name:?} was read before being bound")]
    UnboundValue { name: String },

    #[error("A phi node has no incoming value for the predecessor of {block:?}")]
    NoIncomingValue { block: String },

    #[error("The function {name:?} does not exist in the program")]
    UnknownFunction { name: String },

    #[error("{function:?} takes {expected:?} arguments but {actual:?} were supplied")]
    ArityMismatch {
        function: String,
        expected: usize,
        actual:   usize,
    },

    #[error("The block index {index:?} is out of bounds for the current function")]
    NoSuchBlock { index: usize },

    #[error("{function:?} completed without binding a return value")]
    MissingReturnValue { function: String },

    #[error("The operation {op:?} is not supported on boolean operands")]
    UnsupportedBoolOperation { op: BinOp },

    #[error("A heap access of width {width:?} is not a whole number of heap cells")]
    UnsupportedAccessWidth { width: u32 },

    #[error("A heap cell of width {found:?} was read where width {expected:?} was required")]
    MalformedHeapCell { expected: u32, found: u32 },
}

/// An execution error with an associated location in the program.
pub type LocatedError = location::Located<Error>;

/// The result type for methods that may have execution errors.
pub type Result<T> = std::result::Result<T, LocatedError>;

/// Make it possible to attach locations to these errors.
impl location::Locatable for Error {
    type Located = LocatedError;

    fn locate(self, function: &str, block: &str) -> Self::Located {
        location::Located {
            location: location::Location::new(function, block),
            payload:  self,
        }
    }
}
