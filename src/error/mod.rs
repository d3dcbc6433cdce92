//! This module contains the primary error type for the interpreter's
//! interface. It also re-exports the more specific error types that are
//! subsystem-specific.

pub mod codec;
pub mod execution;
pub mod location;

use thiserror::Error;

/// The interface result type for the library.
///
/// # Usage
///
/// Any function considered to be part of the public interface of the library
/// should return this result type. Subsystems should return the more-specific
/// child error types as appropriate.
pub type Result<T> = std::result::Result<T, Error>;

/// The interface error type for the library.
///
/// All errors returned from the library interface (and hence encountered by
/// the clients of the library) should be members of this enum.
#[derive(Debug, Error)]
pub enum Error {
    /// Errors from the interpretation of a program.
    #[error(transparent)]
    Execution(#[from] execution::LocatedError),

    /// Errors from the trace codec.
    #[error(transparent)]
    Codec(#[from] codec::Error),
}
