//! This module contains the wire encoding of recorded traces.
//!
//! Traces travel as JSON when a human needs to read them and as CBOR when
//! they only pass between tools. Both encodings share one convention: every
//! integer is carried as its signed decimal reading in a string, and every
//! boolean is carried natively. Strings keep integers exact at any magnitude
//! and make a bounded-mode trace and an unbounded-mode trace of the same run
//! byte-comparable whenever their signed readings agree.
//!
//! Decoding necessarily forgets widths: a decoded integer is always
//! unbounded, because the wire carries readings rather than bit patterns.
//! Decoded traces are compared and inspected, never executed further, so
//! nothing is lost.

use std::collections::BTreeMap;

use num_bigint::BigInt;
use serde::{
    de::{MapAccess, Visitor},
    Deserialize,
    Deserializer,
    Serialize,
    Serializer,
};

use crate::{
    error::{codec::Error as CodecError, Result},
    interpreter::heap::Heap,
    trace::CallRecord,
    value::{Int, Value},
};

/// Encodes `record` as a JSON document.
///
/// # Errors
///
/// Returns [`Err`] if the record cannot be represented as JSON.
pub fn to_json(record: &CallRecord) -> Result<serde_json::Value> {
    Ok(serde_json::to_value(record).map_err(CodecError::Json)?)
}

/// Decodes a record from a JSON document.
///
/// # Errors
///
/// Returns [`Err`] if the document is not a well-formed record.
pub fn from_json(document: serde_json::Value) -> Result<CallRecord> {
    Ok(serde_json::from_value(document).map_err(CodecError::Json)?)
}

/// Encodes `record` as a compact JSON string.
///
/// # Errors
///
/// Returns [`Err`] if the record cannot be represented as JSON.
pub fn to_json_string(record: &CallRecord) -> Result<String> {
    Ok(serde_json::to_string(record).map_err(CodecError::Json)?)
}

/// Encodes `record` as a human-readable JSON string.
///
/// # Errors
///
/// Returns [`Err`] if the record cannot be represented as JSON.
pub fn to_json_string_pretty(record: &CallRecord) -> Result<String> {
    Ok(serde_json::to_string_pretty(record).map_err(CodecError::Json)?)
}

/// Decodes a record from a JSON string.
///
/// # Errors
///
/// Returns [`Err`] if the document is not a well-formed record.
pub fn from_json_str(document: &str) -> Result<CallRecord> {
    Ok(serde_json::from_str(document).map_err(CodecError::Json)?)
}

/// Encodes `record` as CBOR bytes.
///
/// # Errors
///
/// Returns [`Err`] if the record cannot be encoded.
pub fn to_cbor(record: &CallRecord) -> Result<Vec<u8>> {
    let mut buffer = Vec::new();
    ciborium::ser::into_writer(record, &mut buffer).map_err(CodecError::CborEncode)?;
    Ok(buffer)
}

/// Decodes a record from CBOR bytes.
///
/// # Errors
///
/// Returns [`Err`] if the document is not a well-formed record.
pub fn from_cbor(document: &[u8]) -> Result<CallRecord> {
    Ok(ciborium::de::from_reader(document).map_err(CodecError::CborDecode)?)
}

/// Integers go on the wire as signed decimal strings, booleans natively.
impl Serialize for Value {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match self {
            Self::Bool(value) => serializer.serialize_bool(*value),
            Self::Int(value) => serializer.serialize_str(&value.to_string()),
        }
    }
}

impl<'de> Deserialize<'de> for Value {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        struct ValueVisitor;

        impl Visitor<'_> for ValueVisitor {
            type Value = Value;

            fn expecting(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
                write!(f, "a boolean or a decimal integer string")
            }

            fn visit_bool<E>(self, value: bool) -> std::result::Result<Self::Value, E>
            where
                E: serde::de::Error,
            {
                Ok(Value::Bool(value))
            }

            fn visit_str<E>(self, value: &str) -> std::result::Result<Self::Value, E>
            where
                E: serde::de::Error,
            {
                let parsed: BigInt = value.parse().map_err(E::custom)?;
                Ok(Value::Int(Int::unbounded(parsed)))
            }
        }

        deserializer.deserialize_any(ValueVisitor)
    }
}

/// The heap goes on the wire as a map from decimal address strings to
/// decimal cell strings, in address order.
impl Serialize for Heap {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.collect_map(
            self.cells()
                .map(|(address, cell)| (address.to_string(), cell.to_string())),
        )
    }
}

impl<'de> Deserialize<'de> for Heap {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        struct HeapVisitor;

        impl<'de> Visitor<'de> for HeapVisitor {
            type Value = Heap;

            fn expecting(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
                write!(f, "a map from decimal address strings to decimal cell strings")
            }

            fn visit_map<A>(self, mut access: A) -> std::result::Result<Self::Value, A::Error>
            where
                A: MapAccess<'de>,
            {
                let mut cells = BTreeMap::new();
                while let Some((address, cell)) = access.next_entry::<String, String>()? {
                    let address: BigInt = address.parse().map_err(serde::de::Error::custom)?;
                    let cell: BigInt = cell.parse().map_err(serde::de::Error::custom)?;
                    cells.insert(address, Int::unbounded(cell));
                }
                Ok(Heap::from_cells(cells))
            }
        }

        deserializer.deserialize_map(HeapVisitor)
    }
}
