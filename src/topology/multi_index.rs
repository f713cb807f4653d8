//! `MultiIndex`: a dyadic integer coordinate shared by every entity kind.
//!
//! A component value `2k` denotes the grid line (vertex position) at cell
//! index `k`, while `2k+1` denotes the interior of cell `k` along that axis.
//! Thus a cell has only odd components, a vertex only even ones, and an
//! entity of codimension `c` has exactly `c` even components. This lets
//! cells, faces, edges and vertices share one storage, hashing and ordering
//! implementation.
//!
//! The same type doubles as a plain integer vector (widths, overlaps, cell
//! counts) where the parity convention does not apply.

use std::fmt;
use std::ops::{Add, AddAssign, Index, IndexMut, Mul, MulAssign, Neg, Sub, SubAssign};
use std::str::FromStr;

use crate::mesh_error::MeshLatticeError;
use crate::topology::direction::Direction;

/// Fixed-length signed integer vector.
#[derive(Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, serde::Serialize, serde::Deserialize)]
#[serde(into = "Vec<i32>", try_from = "Vec<i32>")]
#[repr(transparent)]
pub struct MultiIndex<const D: usize>([i32; D]);

impl<const D: usize> MultiIndex<D> {
    /// Number of components.
    pub const DIMENSION: usize = D;

    #[inline]
    pub const fn new(components: [i32; D]) -> Self {
        Self(components)
    }

    /// The all-zero index.
    #[inline]
    pub const fn zero() -> Self {
        Self([0; D])
    }

    /// Every component set to `value`.
    #[inline]
    pub const fn splat(value: i32) -> Self {
        Self([value; D])
    }

    /// Reset all components to zero.
    pub fn clear(&mut self) {
        self.0 = [0; D];
    }

    #[inline]
    pub fn as_array(&self) -> &[i32; D] {
        &self.0
    }

    pub fn iter(&self) -> impl Iterator<Item = i32> + '_ {
        self.0.iter().copied()
    }

    /// `self += a * other`
    pub fn axpy(&mut self, a: i32, other: &Self) {
        for (x, y) in self.0.iter_mut().zip(other.0.iter()) {
            *x += a * y;
        }
    }

    /// Carry-propagating increment: add `k` to axis 0; when an axis reaches
    /// its `bound` it is reset to zero and the carry moves to the next axis.
    /// After the last combination every component is zero again.
    pub fn increment(&mut self, bound: &Self, k: i32) {
        for i in 0..D {
            self.0[i] += k;
            if self.0[i] < bound.0[i] {
                return;
            }
            self.0[i] = 0;
        }
    }

    /// Number of even components.
    pub fn codimension(&self) -> usize {
        self.0.iter().filter(|&&x| x & 1 == 0).count()
    }

    /// Parity vector as a bitmask: bit `i` is set iff component `i` is odd.
    pub fn direction(&self) -> Direction<D> {
        Direction::of(self)
    }

    /// Index of the first maximal component (0 for an empty index).
    pub fn argmax(&self) -> usize {
        let mut m = 0;
        for i in 1..D {
            if self.0[i] > self.0[m] {
                m = i;
            }
        }
        m
    }

    /// Index of the first minimal component (0 for an empty index).
    pub fn argmin(&self) -> usize {
        let mut m = 0;
        for i in 1..D {
            if self.0[i] < self.0[m] {
                m = i;
            }
        }
        m
    }

    /// Component-wise maximum.
    pub fn max_with(&self, other: &Self) -> Self {
        Self(std::array::from_fn(|i| self.0[i].max(other.0[i])))
    }

    /// Component-wise minimum.
    pub fn min_with(&self, other: &Self) -> Self {
        Self(std::array::from_fn(|i| self.0[i].min(other.0[i])))
    }

    /// Apply `f` to every component.
    pub fn map(&self, f: impl Fn(i32) -> i32) -> Self {
        Self(self.0.map(f))
    }

    /// Product of all components, clamping negative values to zero.
    pub fn clamped_product(&self) -> usize {
        self.0.iter().map(|&x| x.max(0) as usize).product()
    }
}

impl<const D: usize> Default for MultiIndex<D> {
    fn default() -> Self {
        Self::zero()
    }
}

impl<const D: usize> From<[i32; D]> for MultiIndex<D> {
    fn from(components: [i32; D]) -> Self {
        Self(components)
    }
}

impl<const D: usize> From<MultiIndex<D>> for Vec<i32> {
    fn from(index: MultiIndex<D>) -> Self {
        index.0.to_vec()
    }
}

impl<const D: usize> TryFrom<Vec<i32>> for MultiIndex<D> {
    type Error = MeshLatticeError;

    fn try_from(v: Vec<i32>) -> Result<Self, Self::Error> {
        let len = v.len();
        let components: [i32; D] = v.try_into().map_err(|_| {
            MeshLatticeError::InvalidConfig(format!(
                "multi-index of dimension {D} built from {len} components"
            ))
        })?;
        Ok(Self(components))
    }
}

impl<const D: usize> Index<usize> for MultiIndex<D> {
    type Output = i32;
    #[inline]
    fn index(&self, i: usize) -> &i32 {
        &self.0[i]
    }
}

impl<const D: usize> IndexMut<usize> for MultiIndex<D> {
    #[inline]
    fn index_mut(&mut self, i: usize) -> &mut i32 {
        &mut self.0[i]
    }
}

impl<const D: usize> AddAssign for MultiIndex<D> {
    fn add_assign(&mut self, other: Self) {
        for (x, y) in self.0.iter_mut().zip(other.0) {
            *x += y;
        }
    }
}

impl<const D: usize> SubAssign for MultiIndex<D> {
    fn sub_assign(&mut self, other: Self) {
        for (x, y) in self.0.iter_mut().zip(other.0) {
            *x -= y;
        }
    }
}

impl<const D: usize> MulAssign<i32> for MultiIndex<D> {
    fn mul_assign(&mut self, a: i32) {
        for x in self.0.iter_mut() {
            *x *= a;
        }
    }
}

impl<const D: usize> Add for MultiIndex<D> {
    type Output = Self;
    fn add(mut self, other: Self) -> Self {
        self += other;
        self
    }
}

impl<const D: usize> Sub for MultiIndex<D> {
    type Output = Self;
    fn sub(mut self, other: Self) -> Self {
        self -= other;
        self
    }
}

impl<const D: usize> Mul<i32> for MultiIndex<D> {
    type Output = Self;
    fn mul(mut self, a: i32) -> Self {
        self *= a;
        self
    }
}

impl<const D: usize> Mul<MultiIndex<D>> for i32 {
    type Output = MultiIndex<D>;
    fn mul(self, mut index: MultiIndex<D>) -> MultiIndex<D> {
        index *= self;
        index
    }
}

impl<const D: usize> Neg for MultiIndex<D> {
    type Output = Self;
    fn neg(self) -> Self {
        self.map(|x| -x)
    }
}

impl<const D: usize> fmt::Debug for MultiIndex<D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("MultiIndex").field(&self.0).finish()
    }
}

/// Prints `( a, b, c )`.
impl<const D: usize> fmt::Display for MultiIndex<D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "(")?;
        for (i, x) in self.0.iter().enumerate() {
            if i > 0 {
                write!(f, ",")?;
            }
            write!(f, " {x}")?;
        }
        write!(f, " )")
    }
}

/// Parses the `Display` format; whitespace is optional.
impl<const D: usize> FromStr for MultiIndex<D> {
    type Err = MeshLatticeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let bad = || MeshLatticeError::InvalidConfig(format!("cannot parse multi-index from {s:?}"));
        let inner = s
            .trim()
            .strip_prefix('(')
            .and_then(|r| r.strip_suffix(')'))
            .ok_or_else(bad)?
            .trim();
        let values = if inner.is_empty() {
            Vec::new()
        } else {
            inner
                .split(',')
                .map(|t| t.trim().parse::<i32>().map_err(|_| bad()))
                .collect::<Result<Vec<_>, _>>()?
        };
        Self::try_from(values)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codimension_counts_even_components() {
        assert_eq!(MultiIndex::new([1, 3, 5]).codimension(), 0);
        assert_eq!(MultiIndex::new([2, 3, 5]).codimension(), 1);
        assert_eq!(MultiIndex::new([1, 4, 6]).codimension(), 2);
        assert_eq!(MultiIndex::new([0, 4, 6]).codimension(), 3);
    }

    #[test]
    fn direction_is_parity_vector() {
        assert_eq!(MultiIndex::new([1, 2, 3]).direction().bits(), 0b101);
        assert_eq!(MultiIndex::new([0, 0]).direction().bits(), 0);
    }

    #[test]
    fn increment_carries_and_wraps() {
        let bound = MultiIndex::new([2, 3]);
        let mut i = MultiIndex::<2>::zero();
        let mut seen = vec![i];
        for _ in 0..5 {
            i.increment(&bound, 1);
            seen.push(i);
        }
        assert_eq!(seen[1], MultiIndex::new([1, 0]));
        assert_eq!(seen[2], MultiIndex::new([0, 1]));
        assert_eq!(seen[5], MultiIndex::new([1, 2]));
        i.increment(&bound, 1);
        assert_eq!(i, MultiIndex::zero());
    }

    #[test]
    fn arithmetic() {
        let a = MultiIndex::new([1, 2]);
        let b = MultiIndex::new([3, -1]);
        assert_eq!(a + b, MultiIndex::new([4, 1]));
        assert_eq!(a - b, MultiIndex::new([-2, 3]));
        assert_eq!(2 * a, MultiIndex::new([2, 4]));
        let mut c = a;
        c.axpy(2, &b);
        assert_eq!(c, MultiIndex::new([7, 0]));
    }

    #[test]
    fn argmax_prefers_first() {
        assert_eq!(MultiIndex::new([4, 4, 2]).argmax(), 0);
        assert_eq!(MultiIndex::new([1, 4, 4]).argmax(), 1);
        assert_eq!(MultiIndex::new([3, 1, 1]).argmin(), 1);
    }

    #[test]
    fn display_and_parse() {
        let a = MultiIndex::new([1, -2, 3]);
        assert_eq!(a.to_string(), "( 1, -2, 3 )");
        assert_eq!("(1,-2, 3)".parse::<MultiIndex<3>>().unwrap(), a);
        assert!("(1, 2)".parse::<MultiIndex<3>>().is_err());
        assert!("1, 2, 3".parse::<MultiIndex<3>>().is_err());
    }

    #[test]
    fn serde_as_sequence() {
        let a = MultiIndex::new([4, 5]);
        let s = serde_json::to_string(&a).unwrap();
        assert_eq!(s, "[4,5]");
        let b: MultiIndex<2> = serde_json::from_str(&s).unwrap();
        assert_eq!(a, b);
        assert!(serde_json::from_str::<MultiIndex<2>>("[1,2,3]").is_err());
    }
}
