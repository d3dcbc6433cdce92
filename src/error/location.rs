//! This module contains the wrapper type that attaches an execution location
//! to an error.

use std::fmt::Formatter;

/// A position in the program being interpreted, named by the function and the
/// basic block that were executing when the error arose.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Location {
    /// The name of the function that was being interpreted.
    pub function: String,

    /// The label of the basic block that was being interpreted.
    pub block: String,
}

impl Location {
    /// Constructs a new location from the provided `function` name and `block`
    /// label.
    #[must_use]
    pub fn new(function: impl Into<String>, block: impl Into<String>) -> Self {
        let function = function.into();
        let block = block.into();
        Self { function, block }
    }
}

impl std::fmt::Display for Location {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.function, self.block)
    }
}

/// An error that is localised to a particular function and basic block in the
/// program being interpreted.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Located<E>
where
    E: Clone,
{
    /// Where in the program the error occurred.
    pub location: Location,

    /// The error data.
    pub payload: E,
}

/// Displays the error prefixed with the function name and block label where
/// it occurred.
impl<E> std::fmt::Display for Located<E>
where
    E: std::fmt::Display + Clone,
{
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}]: {}", self.location, self.payload)
    }
}

impl<E> std::error::Error for Located<E> where E: std::error::Error + Clone {}

/// A trait for types that can have an execution location attached to them.
pub trait Locatable
where
    Self: Sized,
{
    /// The return type with the attached location.
    type Located;

    /// Attaches the location described by `function` and `block` to the
    /// error.
    fn locate(self, function: &str, block: &str) -> Self::Located;
}

/// A blanket implementation that allows for attaching a location to any
/// result.
impl<T, E> Locatable for Result<T, E>
where
    E: std::error::Error + Clone,
{
    type Located = Result<T, Located<E>>;

    fn locate(self, function: &str, block: &str) -> Self::Located {
        self.map_err(|e| Located {
            location: Location::new(function, block),
            payload:  e,
        })
    }
}
