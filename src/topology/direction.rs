//! Direction bitmasks for axis-aligned entities.
//!
//! Bit `i` of a direction is set when the entity extends along axis `i`
//! (its dyadic coordinate is odd there). A direction therefore determines the
//! entity's dimension (`popcount`) and orientation at once.

use crate::topology::multi_index::MultiIndex;

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct Direction<const D: usize>(u32);

impl<const D: usize> Direction<D> {
    /// Number of distinct directions, `2^D`.
    pub const COUNT: usize = 1 << D;

    /// Build from raw bits. Bits beyond `D` are masked away.
    #[inline]
    pub const fn from_bits(bits: u32) -> Self {
        Self(bits & ((1u32 << D) - 1))
    }

    /// Parity vector of `id`.
    pub fn of(id: &MultiIndex<D>) -> Self {
        let mut bits = 0;
        for i in 0..D {
            bits |= ((id[i] & 1) as u32) << i;
        }
        Self(bits)
    }

    /// The direction of a cell: every axis set.
    #[inline]
    pub const fn full() -> Self {
        Self((1u32 << D) - 1)
    }

    #[inline]
    pub const fn bits(self) -> u32 {
        self.0
    }

    /// Returns 1 when axis `i` is free, 0 otherwise.
    #[inline]
    pub const fn bit(self, i: usize) -> i32 {
        ((self.0 >> i) & 1) as i32
    }

    #[inline]
    pub const fn is_free(self, i: usize) -> bool {
        (self.0 >> i) & 1 == 1
    }

    pub const fn mydimension(self) -> usize {
        self.0.count_ones() as usize
    }

    pub const fn codimension(self) -> usize {
        D - self.mydimension()
    }

    /// Free axes in increasing order.
    pub fn free_axes(self) -> impl Iterator<Item = usize> {
        (0..D).filter(move |&i| self.is_free(i))
    }

    /// Every direction, in increasing bitmask order.
    pub fn all() -> impl Iterator<Item = Self> {
        (0..(1u32 << D)).map(Self)
    }

    /// Directions of codimension `codim`, in increasing bitmask order.
    pub fn with_codim(codim: usize) -> impl Iterator<Item = Self> {
        Self::all().filter(move |d| d.codimension() == codim)
    }
}
