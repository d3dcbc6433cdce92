//! This module contains the byte-addressable heap that load and store
//! instructions operate on.
//!
//! The heap is a sparse map from numeric addresses to cells. In bounded mode
//! an address is keyed by the unsigned reading of its 64-bit pattern, a cell
//! is a fixed-width granule (one byte unless configured otherwise), and a
//! wide access spans consecutive addresses big-endianly, with the cell at the
//! lowest address holding the most significant bits; the granule addresses of
//! an access wrap at pointer width, so a single flat 64-bit address space is
//! modelled with no seam anywhere in it. In unbounded mode an address is
//! keyed by its plain integer value, a cell is a whole arbitrary-precision
//! word, and every access touches exactly one address.
//!
//! Addresses that have never been written read as zero. The zero fill happens
//! lazily on first load and is a real mutation: the freshly zeroed cells
//! appear in every later snapshot of the heap, so two runs that read
//! different addresses produce visibly different heaps even when all the
//! reads return zero.

use std::collections::BTreeMap;

use num_bigint::{BigInt, BigUint, Sign};
use num_traits::{One, Zero};

use crate::{
    constant::POINTER_WIDTH_BITS,
    error::execution::Error,
    value::Int,
};

/// The mutable heap of a single interpretation run.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Heap {
    /// The cells that have been touched so far, keyed by the unsigned
    /// reading of the address pattern in bounded mode and by the plain
    /// integer value in unbounded mode.
    cells: BTreeMap<BigInt, Int>,

    /// Whether the heap stores fixed-width granules or whole words.
    bounded: bool,

    /// The granule width in bits, only meaningful in bounded mode.
    elem_width: u32,
}

impl Heap {
    /// Constructs an empty heap for a run in the given mode.
    #[must_use]
    pub fn new(bounded: bool, elem_width: u32) -> Self {
        Self {
            cells: BTreeMap::new(),
            bounded,
            elem_width,
        }
    }

    /// Constructs a heap directly from decoded cells.
    ///
    /// Decoded heaps exist to be inspected and compared, not executed
    /// against, so they are always word-granular.
    #[must_use]
    pub fn from_cells(cells: BTreeMap<BigInt, Int>) -> Self {
        Self {
            cells,
            bounded: false,
            elem_width: crate::constant::DEFAULT_HEAP_ELEM_WIDTH_BITS,
        }
    }

    /// Loads a value of `width` bits starting at `address`.
    ///
    /// Untouched cells in the accessed range are zero-filled before being
    /// read, mutating the heap.
    pub fn load(&mut self, address: &Int, width: u32) -> Result<Int, Error> {
        let base = Self::base_key(address);

        if !self.bounded {
            let cell = self
                .cells
                .entry(base)
                .or_insert_with(|| Int::unbounded(0))
                .clone();
            return Ok(cell);
        }

        let count = self.cell_count(width)?;
        let elem_width = self.elem_width;
        let mut bits = BigUint::zero();
        for offset in 0..count {
            let key = Self::granule_key(&base, offset);
            let cell = self
                .cells
                .entry(key)
                .or_insert_with(|| Int::bounded(elem_width, 0));
            match cell {
                Int::Bounded {
                    width: cell_width,
                    bits: cell_bits,
                } => {
                    if *cell_width != self.elem_width {
                        return Err(Error::MalformedHeapCell {
                            expected: self.elem_width,
                            found:    *cell_width,
                        });
                    }
                    bits = (bits << (self.elem_width as usize)) | cell_bits.clone();
                }
                Int::Unbounded(_) => {
                    return Err(Error::ModeMismatch);
                }
            }
        }

        Ok(Int::Bounded { width, bits })
    }

    /// Stores `value` as `width` bits starting at `address`.
    pub fn store(&mut self, address: &Int, value: &Int, width: u32) -> Result<(), Error> {
        let base = Self::base_key(address);

        if !self.bounded {
            let Int::Unbounded(_) = value else {
                return Err(Error::ModeMismatch);
            };
            self.cells.insert(base, value.clone());
            return Ok(());
        }

        let Int::Bounded { .. } = value else {
            return Err(Error::ModeMismatch);
        };
        let count = self.cell_count(width)?;
        let Int::Bounded { bits, .. } = value.zext_or_trunc(width) else {
            unreachable!("coercing a bounded value preserves its mode")
        };

        // The most significant granule lands at the lowest address.
        let granule_mask = (BigUint::from(1_u8) << (self.elem_width as usize)) - BigUint::from(1_u8);
        for offset in 0..count {
            let key = Self::granule_key(&base, offset);
            let shift = (count - 1 - offset) * u64::from(self.elem_width);
            let cell_bits = (bits.clone() >> shift) & granule_mask.clone();
            self.cells.insert(
                key,
                Int::Bounded {
                    width: self.elem_width,
                    bits:  cell_bits,
                },
            );
        }

        Ok(())
    }

    /// Computes the cell key of an address.
    ///
    /// A bounded address keys by the unsigned reading of its pattern, so
    /// that an access computed through a wraparound and a direct access at
    /// the same pattern reach the same cell.
    fn base_key(address: &Int) -> BigInt {
        match address.as_pointer() {
            Int::Bounded { bits, .. } => BigInt::from(bits),
            Int::Unbounded(value) => value,
        }
    }

    /// Computes the cell key of the granule at `offset` from `base`,
    /// wrapping at pointer width.
    fn granule_key(base: &BigInt, offset: u64) -> BigInt {
        let modulus = BigInt::one() << (POINTER_WIDTH_BITS as usize);
        let mut key = (base + BigInt::from(offset)) % &modulus;
        if key.sign() == Sign::Minus {
            key += &modulus;
        }
        key
    }

    /// Computes how many granules an access of `width` bits spans.
    fn cell_count(&self, width: u32) -> Result<u64, Error> {
        if width == 0 || width % self.elem_width != 0 {
            return Err(Error::UnsupportedAccessWidth { width });
        }
        Ok(u64::from(width / self.elem_width))
    }

    /// Iterates over the touched cells in address order.
    pub fn cells(&self) -> impl Iterator<Item = (&BigInt, &Int)> {
        self.cells.iter()
    }

    /// Gets the number of touched cells.
    #[must_use]
    pub fn entry_count(&self) -> usize {
        self.cells.len()
    }

    /// Checks whether any cell has been touched.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }
}

#[cfg(test)]
mod test {
    use num_bigint::BigInt;

    use crate::{
        error::execution::Error,
        interpreter::heap::Heap,
        value::Int,
    };

    #[test]
    fn stored_values_load_back_unchanged() {
        let mut heap = Heap::new(true, 8);
        let address = Int::bounded(64, 0x1000);
        let value = Int::bounded(32, -123_456);

        heap.store(&address, &value, 32).unwrap();

        assert_eq!(heap.load(&address, 32).unwrap(), value);
    }

    #[test]
    fn wide_accesses_are_big_endian() {
        let mut heap = Heap::new(true, 8);
        let address = Int::bounded(64, 0);

        heap.store(&address, &Int::bounded(16, 0x1234), 16).unwrap();

        assert_eq!(
            heap.load(&Int::bounded(64, 0), 8).unwrap(),
            Int::bounded(8, 0x12)
        );
        assert_eq!(
            heap.load(&Int::bounded(64, 1), 8).unwrap(),
            Int::bounded(8, 0x34)
        );
    }

    #[test]
    fn accesses_crossing_the_sign_boundary_stay_contiguous() {
        let mut heap = Heap::new(true, 8);

        // The granules of this store straddle the signed 64-bit boundary:
        // the high byte sits at i64::MAX and the low byte at 2^63.
        heap.store(&Int::bounded(64, i64::MAX), &Int::bounded(16, 0x1234), 16)
            .unwrap();

        assert_eq!(
            heap.load(&Int::bounded(64, i64::MAX), 8).unwrap(),
            Int::bounded(8, 0x12)
        );
        assert_eq!(
            heap.load(&Int::bounded(64, 1_u64 << 63), 8).unwrap(),
            Int::bounded(8, 0x34)
        );
    }

    #[test]
    fn granule_addresses_wrap_at_pointer_width() {
        let mut heap = Heap::new(true, 8);

        // A store at the all-ones address places its low byte at zero.
        heap.store(&Int::bounded(64, -1), &Int::bounded(16, 0x1234), 16)
            .unwrap();

        assert_eq!(
            heap.load(&Int::bounded(64, u64::MAX), 8).unwrap(),
            Int::bounded(8, 0x12)
        );
        assert_eq!(
            heap.load(&Int::bounded(64, 0), 8).unwrap(),
            Int::bounded(8, 0x34)
        );
    }

    #[test]
    fn untouched_addresses_read_as_zero() {
        let mut heap = Heap::new(true, 8);

        let value = heap.load(&Int::bounded(64, 0xff), 16).unwrap();

        assert_eq!(value, Int::bounded(16, 0));
    }

    #[test]
    fn zero_fill_on_load_is_observable() {
        let mut heap = Heap::new(true, 8);
        assert!(heap.is_empty());

        heap.load(&Int::bounded(64, 0), 16).unwrap();

        // Both granules of the access now exist explicitly.
        assert_eq!(heap.entry_count(), 2);
        let addresses: Vec<BigInt> = heap.cells().map(|(a, _)| a.clone()).collect();
        assert_eq!(addresses, vec![BigInt::from(0), BigInt::from(1)]);

        // Repeating the identical read changes nothing further.
        heap.load(&Int::bounded(64, 0), 16).unwrap();
        assert_eq!(heap.entry_count(), 2);
    }

    #[test]
    fn partial_granule_accesses_are_fatal() {
        let mut heap = Heap::new(true, 8);
        let address = Int::bounded(64, 0);

        assert_eq!(
            heap.load(&address, 12),
            Err(Error::UnsupportedAccessWidth { width: 12 })
        );
        assert_eq!(
            heap.store(&address, &Int::bounded(12, 1), 12),
            Err(Error::UnsupportedAccessWidth { width: 12 })
        );
    }

    #[test]
    fn unbounded_heaps_are_word_granular() {
        let mut heap = Heap::new(false, 8);
        let address = Int::unbounded(7);
        let value = Int::unbounded(1_000_000_000_000_u64);

        heap.store(&address, &value, 64).unwrap();

        assert_eq!(heap.load(&address, 64).unwrap(), value);
        assert_eq!(heap.entry_count(), 1);
    }

    #[test]
    fn negative_addresses_are_distinct_keys() {
        let mut heap = Heap::new(false, 8);

        heap.store(&Int::unbounded(-1), &Int::unbounded(10), 64).unwrap();
        heap.store(&Int::unbounded(1), &Int::unbounded(20), 64).unwrap();

        assert_eq!(heap.load(&Int::unbounded(-1), 64).unwrap(), Int::unbounded(10));
        assert_eq!(heap.load(&Int::unbounded(1), 64).unwrap(), Int::unbounded(20));
    }

    #[test]
    fn wider_granules_change_the_access_unit() {
        let mut heap = Heap::new(true, 32);
        let address = Int::bounded(64, 0);

        heap.store(&address, &Int::bounded(64, 0x1122_3344_5566_7788_u64), 64)
            .unwrap();

        assert_eq!(heap.entry_count(), 2);
        assert_eq!(
            heap.load(&Int::bounded(64, 0), 32).unwrap(),
            Int::bounded(32, 0x1122_3344_u32)
        );
        assert_eq!(
            heap.load(&Int::bounded(64, 1), 32).unwrap(),
            Int::bounded(32, 0x5566_7788_u32)
        );
    }
}
