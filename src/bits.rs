//! Bit-level key inspection: symbols, discriminators and critical bits.
//!
//! A key is read one *symbol* per byte position. Positions inside the key read
//! as `0x100 | byte`; positions past its end read as `0`. The extra high bit
//! keeps "end of key" distinct from a `0x00` byte, so `b"\0"` and `b"\0\0"`
//! still differ at some bit, while a short key that is a prefix of a longer one
//! keeps routing to child 0 wherever the longer key has a byte.

use std::cmp::Ordering;
use std::fmt;

/// Flag bit set in every symbol read from inside a key.
pub(crate) const PRESENT: u16 = 0x100;

#[inline]
pub(crate) fn symbol_at(key: &[u8], pos: usize) -> u16 {
    match key.get(pos) {
        Some(&b) => PRESENT | u16::from(b),
        None => 0,
    }
}

/// The `(pos, bit)` pair a branch tests to route a key.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Discriminator {
    pos: usize,
    /// Single-bit mask over the 9-bit symbol at `pos`.
    mask: u16,
}

impl Discriminator {
    #[inline]
    pub(crate) fn new(pos: usize, mask: u16) -> Self {
        debug_assert!(mask.is_power_of_two() && mask <= PRESENT);
        Self { pos, mask }
    }

    /// Byte offset into the key.
    #[inline]
    pub fn pos(self) -> usize {
        self.pos
    }

    /// Index of the tested bit inside the symbol: `8` is the end-of-key flag,
    /// `7..=0` are the data bits from most to least significant.
    #[inline]
    pub fn bit(self) -> u8 {
        self.mask.trailing_zeros() as u8
    }

    /// Child index (`0` or `1`) that `key` routes to at this discriminator.
    #[inline]
    pub fn direction(self, key: &[u8]) -> usize {
        usize::from(symbol_at(key, self.pos) & self.mask != 0)
    }
}

/// Shallower discriminators sort first: by byte offset, then from the most
/// significant bit of the symbol down.
impl Ord for Discriminator {
    fn cmp(&self, other: &Self) -> Ordering {
        self.pos
            .cmp(&other.pos)
            .then_with(|| other.mask.cmp(&self.mask))
    }
}

impl PartialOrd for Discriminator {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Debug for Discriminator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "pos:{}, bit:{}", self.pos, self.bit())
    }
}

/// First bit at which `a` and `b` differ, or `None` when the keys are equal.
pub(crate) fn critical_bit(a: &[u8], b: &[u8]) -> Option<Discriminator> {
    let common = a.len().min(b.len());
    let pos = a
        .iter()
        .zip(b)
        .position(|(x, y)| x != y)
        .unwrap_or(common);
    if pos == a.len() && pos == b.len() {
        return None;
    }

    let diff = symbol_at(a, pos) ^ symbol_at(b, pos);
    debug_assert_ne!(diff, 0);
    let mask = 1u16 << (15 - diff.leading_zeros());
    Some(Discriminator::new(pos, mask))
}
