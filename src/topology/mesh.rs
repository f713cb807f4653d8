//! `Mesh`: a half-open box of cells in cell-index space.

use std::fmt;
use std::ops::{Add, AddAssign, Sub, SubAssign};

use serde::{Deserialize, Serialize};

use crate::mesh_error::MeshLatticeError;
use crate::topology::multi_index::MultiIndex;
use crate::topology::refinement::Refinement;

/// Cells `begin[i] <= k[i] < end[i]` on every axis.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Mesh<const D: usize> {
    begin: MultiIndex<D>,
    end: MultiIndex<D>,
}

impl<const D: usize> Mesh<D> {
    pub const fn new(begin: MultiIndex<D>, end: MultiIndex<D>) -> Self {
        Self { begin, end }
    }

    /// Box anchored at the origin.
    pub const fn from_width(width: MultiIndex<D>) -> Self {
        Self {
            begin: MultiIndex::zero(),
            end: width,
        }
    }

    /// The single cell at the origin.
    pub const fn unit() -> Self {
        Self::from_width(MultiIndex::splat(1))
    }

    #[inline]
    pub fn begin(&self) -> &MultiIndex<D> {
        &self.begin
    }

    #[inline]
    pub fn end(&self) -> &MultiIndex<D> {
        &self.end
    }

    /// `bound(0)` is the begin, `bound(1)` the end.
    #[inline]
    pub fn bound(&self, b: usize) -> &MultiIndex<D> {
        if b == 0 { &self.begin } else { &self.end }
    }

    /// True when some axis holds no cell.
    pub fn is_empty(&self) -> bool {
        (0..D).any(|i| self.end[i] <= self.begin[i])
    }

    /// Expand every face by `amount` cells.
    pub fn grow(&self, amount: i32) -> Self {
        self.grow_by(&MultiIndex::splat(amount))
    }

    /// Expand the faces normal to axis `i` by `amount[i]` cells.
    pub fn grow_by(&self, amount: &MultiIndex<D>) -> Self {
        Self::new(self.begin - *amount, self.end + *amount)
    }

    /// Component-wise intersection; the result may be empty.
    pub fn intersect(&self, other: &Self) -> Self {
        Self::new(
            self.begin.max_with(&other.begin),
            self.end.min_with(&other.end),
        )
    }

    /// Split along `axis` in the ratio `left_weight : right_weight`.
    ///
    /// The left child receives `left_weight * width / (left_weight + right_weight)`
    /// cells (truncated); the right child the rest.
    pub fn split(
        &self,
        axis: usize,
        left_weight: i32,
        right_weight: i32,
    ) -> Result<(Self, Self), MeshLatticeError> {
        let width = i64::from(self.width_at(axis));
        let total = i64::from(left_weight) + i64::from(right_weight);
        if left_weight < 0 || right_weight < 0 || total == 0 {
            return Err(MeshLatticeError::InvalidConfig(format!(
                "split weights {left_weight}:{right_weight}"
            )));
        }
        let left_width = i32::try_from(i64::from(left_weight) * width / total).map_err(|_| {
            MeshLatticeError::IndexOverflow(format!("split of {self} along axis {axis}"))
        })?;
        let mut left_end = self.end;
        let mut right_begin = self.begin;
        left_end[axis] = self.begin[axis] + left_width;
        right_begin[axis] = left_end[axis];
        Ok((Self::new(self.begin, left_end), Self::new(right_begin, self.end)))
    }

    /// The same region on a level refined by `refinement`.
    pub fn refine(&self, refinement: &Refinement<D>) -> Self {
        let mut child = *self;
        for i in 0..D {
            let f = refinement.factor(i);
            child.begin[i] *= f;
            child.end[i] *= f;
        }
        child
    }

    /// Number of cells; zero for an empty mesh.
    pub fn volume(&self) -> usize {
        if self.is_empty() {
            0
        } else {
            self.width().clamped_product()
        }
    }

    pub fn width(&self) -> MultiIndex<D> {
        self.end - self.begin
    }

    #[inline]
    pub fn width_at(&self, i: usize) -> i32 {
        self.end[i] - self.begin[i]
    }

    /// Whether the cell `cell` (cell-index coordinates) lies inside.
    pub fn contains_cell(&self, cell: &MultiIndex<D>) -> bool {
        (0..D).all(|i| self.begin[i] <= cell[i] && cell[i] < self.end[i])
    }
}

impl<const D: usize> AddAssign<MultiIndex<D>> for Mesh<D> {
    fn add_assign(&mut self, shift: MultiIndex<D>) {
        self.begin += shift;
        self.end += shift;
    }
}

impl<const D: usize> SubAssign<MultiIndex<D>> for Mesh<D> {
    fn sub_assign(&mut self, shift: MultiIndex<D>) {
        self.begin -= shift;
        self.end -= shift;
    }
}

impl<const D: usize> Add<MultiIndex<D>> for Mesh<D> {
    type Output = Self;
    fn add(mut self, shift: MultiIndex<D>) -> Self {
        self += shift;
        self
    }
}

impl<const D: usize> Sub<MultiIndex<D>> for Mesh<D> {
    type Output = Self;
    fn sub(mut self, shift: MultiIndex<D>) -> Self {
        self -= shift;
        self
    }
}

impl<const D: usize> fmt::Display for Mesh<D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[ {}, {} [", self.begin, self.end)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::topology::refinement::RefinementPolicy;

    fn mesh(b: [i32; 2], e: [i32; 2]) -> Mesh<2> {
        Mesh::new(MultiIndex::new(b), MultiIndex::new(e))
    }

    #[test]
    fn volume_and_emptiness() {
        assert_eq!(mesh([0, 0], [4, 3]).volume(), 12);
        assert_eq!(mesh([2, 0], [2, 3]).volume(), 0);
        assert!(mesh([2, 0], [1, 3]).is_empty());
        assert_eq!(mesh([2, 0], [1, 3]).volume(), 0);
        assert_eq!(Mesh::<3>::unit().volume(), 1);
    }

    #[test]
    fn split_truncates_toward_left() {
        let (l, r) = Mesh::<1>::from_width(MultiIndex::new([7])).split(0, 1, 2).unwrap();
        assert_eq!(l.width_at(0), 2);
        assert_eq!(r.width_at(0), 5);
        assert_eq!(l.end(), r.begin());
    }

    #[test]
    fn split_wide_axis_with_large_weights() {
        let m = Mesh::<1>::from_width(MultiIndex::new([i32::MAX]));
        let (l, r) = m.split(0, 1 << 20, 1 << 20).unwrap();
        assert_eq!(l.width_at(0), i32::MAX / 2);
        assert_eq!(l.width_at(0) + r.width_at(0), i32::MAX);
        assert!(matches!(m.split(0, 0, 0), Err(MeshLatticeError::InvalidConfig(_))));
    }

    #[test]
    fn intersect_and_grow() {
        let a = mesh([0, 0], [4, 4]);
        let b = mesh([2, -1], [6, 3]);
        assert_eq!(a.intersect(&b), mesh([2, 0], [4, 3]));
        assert_eq!(a.grow(1), mesh([-1, -1], [5, 5]));
        assert_eq!(a.grow_by(&MultiIndex::new([0, 2])), mesh([0, -2], [4, 6]));
        assert!(a.intersect(&mesh([5, 5], [6, 6])).is_empty());
    }

    #[test]
    fn refine_scales_bounds() {
        let r = Refinement::new(&Refinement::identity(), &RefinementPolicy::Anisotropic(0b01))
            .unwrap();
        assert_eq!(mesh([1, 1], [3, 2]).refine(&r), mesh([2, 1], [6, 2]));
    }

    #[test]
    fn shift_and_display() {
        let m = mesh([0, 0], [1, 2]) + MultiIndex::new([3, -1]);
        assert_eq!(m, mesh([3, -1], [4, 1]));
        assert_eq!(m.to_string(), "[ ( 3, -1 ), ( 4, 1 ) [");
    }
}
