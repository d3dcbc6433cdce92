//! This module contains constants that are needed throughout the codebase.

/// The width of a single heap granule in bits in bounded mode.
///
/// Bounded-mode runs decompose every stored value into cells of this width so
/// that accesses of mismatched width at the same base address agree with a
/// byte-addressable memory.
pub const BYTE_WIDTH_BITS: u32 = 8;

/// The bit-width of a boolean in the IR.
///
/// Integer constants of this width resolve to booleans rather than integers.
pub const BOOL_WIDTH_BITS: u32 = 1;

/// The bit-width of a pointer.
///
/// In bounded mode every value used as a heap address is coerced to this
/// width before it is used as a key.
pub const POINTER_WIDTH_BITS: u32 = 64;

/// The default width of a heap element in bits.
pub const DEFAULT_HEAP_ELEM_WIDTH_BITS: u32 = BYTE_WIDTH_BITS;

/// The default step budget for an interpretation run.
///
/// A step is the execution of one basic block, counted across the whole call
/// tree of the run.
pub const DEFAULT_MAX_STEPS: u32 = 1000;

/// The name under which a function's return value appears in a portable
/// state.
///
/// The interpreter binds the return value to a distinguished sentinel
/// reference rather than to a named IR value, and this is the textual name
/// that sentinel takes on the wire.
pub const RETURN_NAME: &str = "return";
