//! `Partition`: a box in dyadic coordinates with neighbor and boundary data.
//!
//! Both bounds are inclusive. A *closed* partition of a mesh `[b, e)` spans
//! `[2b, 2e]` and therefore contains its boundary faces; an *open* partition
//! drops the faces that are not part of the global boundary.

use std::fmt;

use crate::topology::{Direction, Mesh, MultiIndex};

/// One box of entities owned by a partition list.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct Partition<const D: usize> {
    begin: MultiIndex<D>,
    end: MultiIndex<D>,
    number: u32,
    neighbors: [[Option<u32>; 2]; D],
    boundary: u32,
}

impl<const D: usize> Partition<D> {
    /// A partition that does not know the global mesh: every face is
    /// flagged as boundary.
    pub fn new(begin: MultiIndex<D>, end: MultiIndex<D>, number: u32) -> Self {
        Self {
            begin,
            end,
            number,
            neighbors: [[None; 2]; D],
            boundary: ((1u64 << (2 * D)) - 1) as u32,
        }
    }

    /// A partition whose boundary flags are derived from `global`.
    pub fn with_global(
        begin: MultiIndex<D>,
        end: MultiIndex<D>,
        global: &Mesh<D>,
        number: u32,
    ) -> Self {
        let mut boundary = 0u32;
        for i in 0..D {
            boundary |= ((begin[i] == 2 * global.begin()[i]) as u32) << (2 * i);
            boundary |= ((end[i] == 2 * global.end()[i]) as u32) << (2 * i + 1);
        }
        Self {
            begin,
            end,
            number,
            neighbors: [[None; 2]; D],
            boundary,
        }
    }

    /// Every entity of `mesh`, boundary faces included.
    pub fn closed(mesh: &Mesh<D>, global: &Mesh<D>, number: u32) -> Self {
        Self::with_global(*mesh.begin() * 2, *mesh.end() * 2, global, number)
    }

    /// The entities of `mesh` without the faces shared with other parts of
    /// `global`. Faces on the global boundary stay.
    pub fn open(mesh: &Mesh<D>, global: &Mesh<D>, number: u32) -> Self {
        let begin = MultiIndex::new(std::array::from_fn(|i| {
            2 * mesh.begin()[i] + (mesh.begin()[i] != global.begin()[i]) as i32
        }));
        let end = MultiIndex::new(std::array::from_fn(|i| {
            2 * mesh.end()[i] - (mesh.end()[i] != global.end()[i]) as i32
        }));
        Self::with_global(begin, end, global, number)
    }

    #[inline]
    pub fn begin(&self) -> &MultiIndex<D> {
        &self.begin
    }

    #[inline]
    pub fn end(&self) -> &MultiIndex<D> {
        &self.end
    }

    #[inline]
    pub fn bound(&self, b: usize) -> &MultiIndex<D> {
        if b == 0 { &self.begin } else { &self.end }
    }

    /// Bound `b` along axis `i`, tightened to the parity `d` (1 for a free
    /// axis, 0 otherwise) of the entities being enumerated.
    #[inline]
    pub fn bound_for(&self, b: usize, i: usize, d: i32) -> i32 {
        let v = self.bound(b)[i];
        v - (2 * b as i32 - 1) * ((v ^ d) & 1)
    }

    #[inline]
    pub fn number(&self) -> u32 {
        self.number
    }

    pub fn set_number(&mut self, number: u32) {
        self.number = number;
    }

    /// Neighbor across `face` (`2*axis` lower, `2*axis+1` upper).
    #[inline]
    pub fn neighbor(&self, face: usize) -> Option<u32> {
        self.neighbors[face / 2][face & 1]
    }

    pub fn set_neighbor(&mut self, face: usize, neighbor: Option<u32>) {
        self.neighbors[face / 2][face & 1] = neighbor;
    }

    #[inline]
    pub fn has_neighbor(&self, face: usize) -> bool {
        self.neighbor(face).is_some()
    }

    /// Bitmask of faces lying on the global boundary.
    #[inline]
    pub fn boundary(&self) -> u32 {
        self.boundary
    }

    #[inline]
    pub fn is_boundary(&self, face: usize) -> bool {
        (self.boundary >> face) & 1 == 1
    }

    /// Component-wise intersection keeping this partition's number. The
    /// result knows nothing of the global mesh or the neighbors.
    pub fn intersect(&self, other: &Self) -> Self {
        Self::new(
            self.begin.max_with(&other.begin),
            self.end.min_with(&other.end),
            self.number,
        )
    }

    /// Inclusive containment test.
    pub fn contains(&self, id: &MultiIndex<D>) -> bool {
        (0..D).all(|i| self.begin[i] <= id[i] && id[i] <= self.end[i])
    }

    pub fn is_empty(&self) -> bool {
        (0..D).any(|i| self.begin[i] > self.end[i])
    }

    /// Whether no entity with direction `dir` lies inside.
    pub fn is_empty_in(&self, dir: Direction<D>) -> bool {
        (0..D).any(|i| {
            let d = dir.bit(i);
            self.bound_for(0, i, d) > self.bound_for(1, i, d)
        })
    }

    /// Cells touched along axis `i`.
    #[inline]
    pub fn width_at(&self, i: usize) -> i32 {
        ((self.end[i] + 1) / 2 - self.begin[i] / 2).max(0)
    }

    pub fn width(&self) -> MultiIndex<D> {
        MultiIndex::new(std::array::from_fn(|i| self.width_at(i)))
    }

    /// Number of cells.
    pub fn volume(&self) -> usize {
        self.width().clamped_product()
    }
}

impl<const D: usize> fmt::Display for Partition<D> {
    /// Prints one interval per axis, e.g. `[ 0, 4 [ x ] 1, 3 ]`, where an
    /// inward bracket marks an excluded boundary face.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for i in 0..D {
            if i > 0 {
                write!(f, " x ")?;
            }
            let (b, e) = (self.begin[i], self.end[i]);
            let left = if b & 1 == 1 { ']' } else { '[' };
            let right = if e & 1 == 1 { '[' } else { ']' };
            write!(f, "{left} {}, {} {right}", b / 2, (e + 1) / 2)?;
        }
        Ok(())
    }
}
