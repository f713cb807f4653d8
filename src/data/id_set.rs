//! Globally unique, level-stable entity ids.
//!
//! An id packs the lexicographic position of the dyadic coordinate inside
//! the `(2 * cells + 1)` box of its level into the low 56 bits and the level
//! into the high 8 bits. Entities that a refinement merely copies from the
//! coarser level (vertices on father lines, faces inside father faces) are
//! first mapped to that level, so a copy keeps the id of the entity it copies.
//! On periodic axes the two ends of the domain are identified.

use crate::mesh_error::MeshLatticeError;
use crate::topology::{Mesh, MultiIndex, Refinement};

const LEVEL_SHIFT: u32 = 56;
const MAX_LEVELS: usize = 1 << (64 - LEVEL_SHIFT);

#[derive(Clone, Debug)]
struct LevelEntry<const D: usize> {
    global: Mesh<D>,
    refinement: Refinement<D>,
}

/// Id computation over the whole level hierarchy.
#[derive(Clone, Debug)]
pub struct IdSet<const D: usize> {
    levels: Vec<LevelEntry<D>>,
    periodic: u32,
}

impl<const D: usize> IdSet<D> {
    /// Id set with level 0 covering `global`.
    pub fn new(global: Mesh<D>, periodic: u32) -> Self {
        Self {
            levels: vec![LevelEntry {
                global,
                refinement: Refinement::identity(),
            }],
            periodic,
        }
    }

    /// Register the next finer level, produced from the previous one by
    /// `refinement`.
    pub fn push_level(
        &mut self,
        global: Mesh<D>,
        refinement: Refinement<D>,
    ) -> Result<(), MeshLatticeError> {
        if self.levels.len() >= MAX_LEVELS {
            return Err(MeshLatticeError::LevelOutOfRange {
                level: self.levels.len(),
                max_level: MAX_LEVELS - 1,
            });
        }
        self.levels.push(LevelEntry { global, refinement });
        Ok(())
    }

    pub fn max_level(&self) -> usize {
        self.levels.len() - 1
    }

    /// Id of the entity `id` living on `level`.
    pub fn id(&self, level: usize, id: &MultiIndex<D>) -> Result<u64, MeshLatticeError> {
        if level >= self.levels.len() {
            return Err(MeshLatticeError::LevelOutOfRange {
                level,
                max_level: self.max_level(),
            });
        }
        let (level, id) = self.origin(level, *id);
        let global = &self.levels[level].global;

        let mut linear: u64 = 0;
        let mut stride: u64 = 1;
        for i in 0..D {
            let w = 2 * i64::from(global.width_at(i));
            let mut k = i64::from(id[i]) - 2 * i64::from(global.begin()[i]);
            if (self.periodic >> i) & 1 == 1 && w > 0 {
                k = k.rem_euclid(w);
            }
            if k < 0 || k > w {
                return Err(MeshLatticeError::IndexOverflow(format!(
                    "{id} outside level {level}"
                )));
            }
            linear = (k as u64)
                .checked_mul(stride)
                .and_then(|v| v.checked_add(linear))
                .ok_or_else(|| MeshLatticeError::IndexOverflow(format!("id of {id}")))?;
            stride = stride
                .checked_mul(w as u64 + 1)
                .ok_or_else(|| MeshLatticeError::IndexOverflow(format!("id of {id}")))?;
        }
        if linear >> LEVEL_SHIFT != 0 {
            return Err(MeshLatticeError::IndexOverflow(format!("id of {id}")));
        }
        Ok(linear | ((level as u64) << LEVEL_SHIFT))
    }

    /// Coarsest level on which `id` exists, with its id there.
    fn origin(&self, mut level: usize, mut id: MultiIndex<D>) -> (usize, MultiIndex<D>) {
        while level > 0 {
            let refinement = &self.levels[level].refinement;
            if !refinement.is_copy(&id) {
                break;
            }
            id = refinement.father(&id);
            level -= 1;
        }
        (level, id)
    }

    /// Level encoded in an id.
    pub fn level_of(id: u64) -> usize {
        (id >> LEVEL_SHIFT) as usize
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::topology::RefinementPolicy;

    fn two_levels() -> IdSet<2> {
        let global = Mesh::from_width(MultiIndex::new([2, 2]));
        let mut ids = IdSet::new(global, 0);
        let r = Refinement::new(&Refinement::identity(), &RefinementPolicy::Isotropic).unwrap();
        ids.push_level(global.refine(&r), r).unwrap();
        ids
    }

    #[test]
    fn level_zero_is_lexicographic() {
        let ids = two_levels();
        assert_eq!(ids.id(0, &MultiIndex::new([0, 0])).unwrap(), 0);
        assert_eq!(ids.id(0, &MultiIndex::new([1, 0])).unwrap(), 1);
        assert_eq!(ids.id(0, &MultiIndex::new([0, 1])).unwrap(), 5);
    }

    #[test]
    fn copied_vertex_keeps_coarse_id() {
        let ids = two_levels();
        let coarse = ids.id(0, &MultiIndex::new([2, 4])).unwrap();
        assert_eq!(ids.id(1, &MultiIndex::new([4, 8])).unwrap(), coarse);
        assert_eq!(IdSet::<2>::level_of(coarse), 0);
    }

    #[test]
    fn new_entities_carry_their_level() {
        let ids = two_levels();
        let fine = ids.id(1, &MultiIndex::new([1, 1])).unwrap();
        assert_eq!(IdSet::<2>::level_of(fine), 1);
        assert_ne!(fine, ids.id(0, &MultiIndex::new([1, 1])).unwrap());
        // a fine vertex in the middle of a coarse edge is new as well
        assert_eq!(IdSet::<2>::level_of(ids.id(1, &MultiIndex::new([2, 0])).unwrap()), 1);
    }

    #[test]
    fn periodic_ends_are_identified() {
        let ids = IdSet::new(Mesh::from_width(MultiIndex::new([4])), 1);
        assert_eq!(
            ids.id(0, &MultiIndex::new([0])).unwrap(),
            ids.id(0, &MultiIndex::new([8])).unwrap()
        );
    }

    #[test]
    fn out_of_range() {
        let ids = two_levels();
        assert!(matches!(
            ids.id(2, &MultiIndex::new([0, 0])),
            Err(MeshLatticeError::LevelOutOfRange { level: 2, max_level: 1 })
        ));
        assert!(matches!(
            ids.id(0, &MultiIndex::new([5, 0])),
            Err(MeshLatticeError::IndexOverflow(_))
        ));
    }
}
