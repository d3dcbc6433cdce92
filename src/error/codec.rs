//! This module contains errors pertaining to the encoding and decoding of
//! traces on the wire.
//!
//! A malformed wire document is in the same tier as a malformed IR: it means
//! an upstream component violated the format contract, so decoding fails
//! loudly rather than salvaging a partial trace.

use thiserror::Error;

/// Errors that occur while serializing or deserializing a trace.
#[derive(Debug, Error)]
pub enum Error {
    /// The JSON document could not be produced or parsed.
    #[error("Malformed JSON trace document: {_0}")]
    Json(#[from] serde_json::Error),

    /// The CBOR document could not be produced.
    #[error("Failed to encode trace as CBOR: {_0}")]
    CborEncode(#[from] ciborium::ser::Error<std::io::Error>),

    /// The CBOR document could not be parsed.
    #[error("Malformed CBOR trace document: {_0}")]
    CborDecode(#[from] ciborium::de::Error<std::io::Error>),
}

/// The result type for methods that may have codec errors.
pub type Result<T> = std::result::Result<T, Error>;
