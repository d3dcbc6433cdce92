//! This module contains the representation of integer values that can be
//! manipulated concretely during interpretation.
//!
//! # Two Arithmetic Modes
//!
//! A run of the interpreter executes in exactly one of two integer modes. In
//! bounded mode every integer is a fixed-width two's-complement bit pattern
//! and arithmetic wraps at its width, matching what compiled code does on
//! real hardware. In unbounded mode integers are arbitrary-precision and
//! arithmetic never overflows, matching the idealised semantics the external
//! equivalence checker reasons in. Keeping both modes behind one operation
//! surface lets the interpreter itself be written once, mode-agnostically.
//!
//! The bit pattern of a bounded value is stored as its unsigned magnitude;
//! signed operations reinterpret the pattern on demand. Combining the two
//! modes in one operation, or two bounded values of different widths in a
//! width-sensitive operation, is a fatal error rather than a silent coercion.

use std::{
    cmp::Ordering,
    fmt::{Display, Formatter},
};

use num_bigint::{BigInt, BigUint, Sign};
use num_traits::{One, ToPrimitive, Zero};

use crate::{
    constant::POINTER_WIDTH_BITS,
    error::execution::Error,
};

/// The result type for integer operations, which fail without location
/// information attached.
pub type Result<T> = std::result::Result<T, Error>;

/// A concrete integer value in one of the two run modes.
#[derive(Clone, Debug, Eq, Hash, PartialEq)]
pub enum Int {
    /// A fixed-width two's-complement bit pattern.
    ///
    /// The `bits` are the unsigned magnitude of the pattern and are always
    /// strictly less than `2^width`.
    Bounded { width: u32, bits: BigUint },

    /// An arbitrary-precision signed integer.
    Unbounded(BigInt),
}

/// Reduces `value` into the two's-complement bit pattern of the given
/// `width`.
fn wrap_to_width(width: u32, value: &BigInt) -> BigUint {
    let modulus = BigInt::one() << (width as usize);
    let mut residue = value % &modulus;
    if residue.sign() == Sign::Minus {
        residue += &modulus;
    }
    residue
        .to_biguint()
        .expect("the residue has been made non-negative")
}

/// The all-ones pattern of the given `width`.
fn mask(width: u32) -> BigUint {
    (BigUint::one() << (width as usize)) - BigUint::one()
}

impl Int {
    /// Constructs a bounded integer of the given `width` holding `value`
    /// reduced into the width's two's-complement range.
    #[must_use]
    pub fn bounded(width: u32, value: impl Into<BigInt>) -> Self {
        let value = value.into();
        let bits = wrap_to_width(width, &value);
        Self::Bounded { width, bits }
    }

    /// Constructs an unbounded integer holding `value`.
    #[must_use]
    pub fn unbounded(value: impl Into<BigInt>) -> Self {
        Self::Unbounded(value.into())
    }

    /// Gets the bit-width of the value, or [`None`] for unbounded values.
    #[must_use]
    pub fn width(&self) -> Option<u32> {
        match self {
            Self::Bounded { width, .. } => Some(*width),
            Self::Unbounded(_) => None,
        }
    }

    /// Checks if the value is zero.
    #[must_use]
    pub fn is_zero(&self) -> bool {
        match self {
            Self::Bounded { bits, .. } => bits.is_zero(),
            Self::Unbounded(value) => value.is_zero(),
        }
    }

    /// Gets the signed numeric value: the two's-complement reading of a
    /// bounded pattern, or the value itself when unbounded.
    #[must_use]
    pub fn to_signed(&self) -> BigInt {
        match self {
            Self::Bounded { width, bits } => {
                let value = BigInt::from(bits.clone());
                if *width > 0 && bits.bit(u64::from(*width - 1)) {
                    value - (BigInt::one() << (*width as usize))
                } else {
                    value
                }
            }
            Self::Unbounded(value) => value.clone(),
        }
    }

    /// Applies `op` to the signed readings of both operands, wrapping the
    /// result back into the width in bounded mode.
    ///
    /// This is correct for every operation whose two's-complement result is
    /// the truncation of its arbitrary-precision result, which covers
    /// addition, subtraction, multiplication and the bitwise operations.
    fn wrapping_binary(
        &self,
        rhs: &Self,
        op: impl FnOnce(&BigInt, &BigInt) -> BigInt,
    ) -> Result<Self> {
        match (self, rhs) {
            (Self::Bounded { width, .. }, Self::Bounded { .. }) => {
                let width = self.require_same_width(rhs)?.unwrap_or(*width);
                Ok(Self::bounded(width, op(&self.to_signed(), &rhs.to_signed())))
            }
            (Self::Unbounded(lhs), Self::Unbounded(rhs)) => Ok(Self::Unbounded(op(lhs, rhs))),
            _ => Err(Error::ModeMismatch),
        }
    }

    /// Checks that the operands agree in mode and, when bounded, in width.
    ///
    /// Returns the common width for bounded operands and [`None`] for
    /// unbounded ones.
    fn require_same_width(&self, rhs: &Self) -> Result<Option<u32>> {
        match (self, rhs) {
            (Self::Bounded { width: left, .. }, Self::Bounded { width: right, .. }) => {
                if left == right {
                    Ok(Some(*left))
                } else {
                    Err(Error::WidthMismatch {
                        left:  *left,
                        right: *right,
                    })
                }
            }
            (Self::Unbounded(_), Self::Unbounded(_)) => Ok(None),
            _ => Err(Error::ModeMismatch),
        }
    }

    /// Computes the wrapping (bounded) or exact (unbounded) sum.
    pub fn add(&self, rhs: &Self) -> Result<Self> {
        self.wrapping_binary(rhs, |a, b| a + b)
    }

    /// Computes the wrapping (bounded) or exact (unbounded) difference.
    pub fn sub(&self, rhs: &Self) -> Result<Self> {
        self.wrapping_binary(rhs, |a, b| a - b)
    }

    /// Computes the wrapping (bounded) or exact (unbounded) product.
    pub fn mul(&self, rhs: &Self) -> Result<Self> {
        self.wrapping_binary(rhs, |a, b| a * b)
    }

    /// Computes the signed quotient, truncating toward zero.
    pub fn sdiv(&self, rhs: &Self) -> Result<Self> {
        self.division(rhs, true, false)
    }

    /// Computes the unsigned quotient.
    ///
    /// In unbounded mode there is no unsigned reading of a value, so this
    /// coincides with [`Self::sdiv`].
    pub fn udiv(&self, rhs: &Self) -> Result<Self> {
        self.division(rhs, false, false)
    }

    /// Computes the signed remainder, with the sign of the dividend.
    pub fn srem(&self, rhs: &Self) -> Result<Self> {
        self.division(rhs, true, true)
    }

    /// Computes the unsigned remainder.
    ///
    /// In unbounded mode this coincides with [`Self::srem`].
    pub fn urem(&self, rhs: &Self) -> Result<Self> {
        self.division(rhs, false, true)
    }

    /// The shared implementation of the four division operations.
    ///
    /// A zero divisor is fatal in all of them: the IR being executed has
    /// already been through the verifier front-end, so a division by zero
    /// here means the run's inputs were bad and no sensible result exists.
    fn division(&self, rhs: &Self, signed: bool, remainder: bool) -> Result<Self> {
        if rhs.is_zero() {
            return Err(Error::DivisionByZero);
        }
        let width = self.require_same_width(rhs)?;
        match (self, rhs, width) {
            (Self::Bounded { bits: l, .. }, Self::Bounded { bits: r, .. }, Some(width)) => {
                if signed {
                    let (a, b) = (self.to_signed(), rhs.to_signed());
                    let result = if remainder { a % b } else { a / b };
                    Ok(Self::bounded(width, result))
                } else {
                    let bits = if remainder { l % r } else { l / r };
                    Ok(Self::Bounded { width, bits })
                }
            }
            (Self::Unbounded(l), Self::Unbounded(r), _) => {
                let result = if remainder { l % r } else { l / r };
                Ok(Self::Unbounded(result))
            }
            _ => Err(Error::ModeMismatch),
        }
    }

    /// Computes the bitwise and of the operands.
    pub fn and(&self, rhs: &Self) -> Result<Self> {
        self.wrapping_binary(rhs, |a, b| a & b)
    }

    /// Computes the bitwise or of the operands.
    pub fn or(&self, rhs: &Self) -> Result<Self> {
        self.wrapping_binary(rhs, |a, b| a | b)
    }

    /// Computes the bitwise xor of the operands.
    pub fn xor(&self, rhs: &Self) -> Result<Self> {
        self.wrapping_binary(rhs, |a, b| a ^ b)
    }

    /// Reads the value as a shift amount.
    ///
    /// A bounded pattern clamps to its own width: every amount at or above
    /// the width shifts identically, so patterns too large for a `u64` need
    /// no exact conversion.
    fn shift_amount(&self) -> Result<u64> {
        match self {
            Self::Bounded { width, bits } => Ok(bits
                .to_u64()
                .map_or(u64::from(*width), |amount| amount.min(u64::from(*width)))),
            Self::Unbounded(value) => {
                if value.sign() == Sign::Minus {
                    Err(Error::ShiftAmountTooLarge)
                } else {
                    value.to_u64().ok_or(Error::ShiftAmountTooLarge)
                }
            }
        }
    }

    /// Computes the left shift of `self` by `rhs` bits.
    ///
    /// Shifting a bounded value by its full width or more yields zero.
    pub fn shl(&self, rhs: &Self) -> Result<Self> {
        self.require_same_width(rhs)?;
        let amount = rhs.shift_amount()?;
        match self {
            Self::Bounded { width, bits } => {
                if amount >= u64::from(*width) {
                    Ok(Self::Bounded {
                        width: *width,
                        bits:  BigUint::zero(),
                    })
                } else {
                    let bits = (bits.clone() << amount) & mask(*width);
                    Ok(Self::Bounded {
                        width: *width,
                        bits,
                    })
                }
            }
            Self::Unbounded(value) => Ok(Self::Unbounded(value.clone() << amount)),
        }
    }

    /// Computes the logical (zero-filling) right shift of `self` by `rhs`
    /// bits.
    ///
    /// Unbounded values have no fixed width to shift zeros into, so in
    /// unbounded mode this coincides with [`Self::ashr`].
    pub fn lshr(&self, rhs: &Self) -> Result<Self> {
        self.require_same_width(rhs)?;
        let amount = rhs.shift_amount()?;
        match self {
            Self::Bounded { width, bits } => {
                let bits = if amount >= u64::from(*width) {
                    BigUint::zero()
                } else {
                    bits.clone() >> amount
                };
                Ok(Self::Bounded {
                    width: *width,
                    bits,
                })
            }
            Self::Unbounded(value) => Ok(Self::Unbounded(value.clone() >> amount)),
        }
    }

    /// Computes the arithmetic (sign-filling) right shift of `self` by `rhs`
    /// bits.
    pub fn ashr(&self, rhs: &Self) -> Result<Self> {
        self.require_same_width(rhs)?;
        let amount = rhs.shift_amount()?;
        match self {
            Self::Bounded { width, .. } => {
                // Shifting by the full width leaves only the sign, which a
                // signed shift by width - 1 or more already produces.
                let amount = amount.min(u64::from(*width));
                Ok(Self::bounded(*width, self.to_signed() >> amount))
            }
            Self::Unbounded(value) => Ok(Self::Unbounded(value.clone() >> amount)),
        }
    }

    /// Compares the signed readings of the operands.
    fn cmp_signed(&self, rhs: &Self) -> Result<Ordering> {
        self.require_same_width(rhs)?;
        Ok(self.to_signed().cmp(&rhs.to_signed()))
    }

    /// Compares the unsigned readings of the operands.
    ///
    /// Unbounded values have no unsigned reading, so unbounded comparison is
    /// numeric in both flavours.
    fn cmp_unsigned(&self, rhs: &Self) -> Result<Ordering> {
        self.require_same_width(rhs)?;
        match (self, rhs) {
            (Self::Bounded { bits: l, .. }, Self::Bounded { bits: r, .. }) => Ok(l.cmp(r)),
            (Self::Unbounded(l), Self::Unbounded(r)) => Ok(l.cmp(r)),
            _ => Err(Error::ModeMismatch),
        }
    }

    /// Checks the operands for equality.
    pub fn eq(&self, rhs: &Self) -> Result<bool> {
        Ok(self.cmp_unsigned(rhs)? == Ordering::Equal)
    }

    /// Checks the operands for inequality.
    pub fn ne(&self, rhs: &Self) -> Result<bool> {
        Ok(self.cmp_unsigned(rhs)? != Ordering::Equal)
    }

    /// Checks signed greater-than-or-equal.
    pub fn sge(&self, rhs: &Self) -> Result<bool> {
        Ok(self.cmp_signed(rhs)? != Ordering::Less)
    }

    /// Checks signed greater-than.
    pub fn sgt(&self, rhs: &Self) -> Result<bool> {
        Ok(self.cmp_signed(rhs)? == Ordering::Greater)
    }

    /// Checks signed less-than-or-equal.
    pub fn sle(&self, rhs: &Self) -> Result<bool> {
        Ok(self.cmp_signed(rhs)? != Ordering::Greater)
    }

    /// Checks signed less-than.
    pub fn slt(&self, rhs: &Self) -> Result<bool> {
        Ok(self.cmp_signed(rhs)? == Ordering::Less)
    }

    /// Checks unsigned greater-than-or-equal.
    pub fn uge(&self, rhs: &Self) -> Result<bool> {
        Ok(self.cmp_unsigned(rhs)? != Ordering::Less)
    }

    /// Checks unsigned greater-than.
    pub fn ugt(&self, rhs: &Self) -> Result<bool> {
        Ok(self.cmp_unsigned(rhs)? == Ordering::Greater)
    }

    /// Checks unsigned less-than-or-equal.
    pub fn ule(&self, rhs: &Self) -> Result<bool> {
        Ok(self.cmp_unsigned(rhs)? != Ordering::Greater)
    }

    /// Checks unsigned less-than.
    pub fn ult(&self, rhs: &Self) -> Result<bool> {
        Ok(self.cmp_unsigned(rhs)? == Ordering::Less)
    }

    /// Zero-extends the value to `target` bits.
    ///
    /// Width conversions are identities on unbounded values.
    pub fn zext(&self, target: u32) -> Result<Self> {
        match self {
            Self::Bounded { width, bits } => {
                if target < *width {
                    Err(Error::InvalidWidthConversion {
                        from: *width,
                        to:   target,
                    })
                } else {
                    Ok(Self::Bounded {
                        width: target,
                        bits:  bits.clone(),
                    })
                }
            }
            Self::Unbounded(_) => Ok(self.clone()),
        }
    }

    /// Sign-extends the value to `target` bits.
    ///
    /// Width conversions are identities on unbounded values.
    pub fn sext(&self, target: u32) -> Result<Self> {
        match self {
            Self::Bounded { width, .. } => {
                if target < *width {
                    Err(Error::InvalidWidthConversion {
                        from: *width,
                        to:   target,
                    })
                } else {
                    Ok(Self::bounded(target, self.to_signed()))
                }
            }
            Self::Unbounded(_) => Ok(self.clone()),
        }
    }

    /// Truncates the value to its low `target` bits.
    ///
    /// Width conversions are identities on unbounded values.
    pub fn trunc(&self, target: u32) -> Result<Self> {
        match self {
            Self::Bounded { width, bits } => {
                if target > *width {
                    Err(Error::InvalidWidthConversion {
                        from: *width,
                        to:   target,
                    })
                } else {
                    Ok(Self::Bounded {
                        width: target,
                        bits:  bits.clone() & mask(target),
                    })
                }
            }
            Self::Unbounded(_) => Ok(self.clone()),
        }
    }

    /// Zero-extends or truncates the value to `target` bits, whichever the
    /// current width requires.
    #[must_use]
    pub fn zext_or_trunc(&self, target: u32) -> Self {
        match self {
            Self::Bounded { width, bits } => {
                let bits = if target >= *width {
                    bits.clone()
                } else {
                    bits.clone() & mask(target)
                };
                Self::Bounded {
                    width: target,
                    bits,
                }
            }
            Self::Unbounded(_) => self.clone(),
        }
    }

    /// Coerces the value into a heap address.
    ///
    /// In bounded mode addresses are fixed at [`POINTER_WIDTH_BITS`] wide; in
    /// unbounded mode the value is already a plain integer key.
    #[must_use]
    pub fn as_pointer(&self) -> Self {
        match self {
            Self::Bounded { .. } => self.zext_or_trunc(POINTER_WIDTH_BITS),
            Self::Unbounded(_) => self.clone(),
        }
    }
}

/// Renders the signed decimal reading of the value, which is also the
/// encoding integers take on the wire.
impl Display for Int {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.to_signed())
    }
}
