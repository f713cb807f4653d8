//! Refinement policies and their resolution into per-level refinements.
//!
//! A [`RefinementPolicy`] is what a user asks for; a [`Refinement`] is that
//! policy resolved against the refinement of the father level (bisection
//! cycles its axis from level to level). Every refinement reduces to an
//! integer factor per axis, and the father/child arithmetic below is written
//! in dyadic coordinates for an arbitrary factor vector.

use serde::{Deserialize, Serialize};

use crate::mesh_error::MeshLatticeError;
use crate::topology::multi_index::MultiIndex;

/// How a level is derived from its father.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum RefinementPolicy<const D: usize> {
    /// Factor 2 along every axis.
    Isotropic,
    /// Factor 2 along the axes whose bit is set, 1 elsewhere.
    Anisotropic(u32),
    /// Factor 2 along exactly one axis; `None` cycles through the axes.
    Bisection(Option<usize>),
    /// Any positive factor per axis.
    Arbitrary(MultiIndex<D>),
}

impl<const D: usize> Default for RefinementPolicy<D> {
    fn default() -> Self {
        RefinementPolicy::Isotropic
    }
}

impl<const D: usize> RefinementPolicy<D> {
    /// Check the policy against the dimension.
    pub fn validate(&self) -> Result<(), MeshLatticeError> {
        match self {
            RefinementPolicy::Isotropic => Ok(()),
            RefinementPolicy::Anisotropic(bits) => {
                if (*bits as u64) >= (1u64 << D) {
                    Err(MeshLatticeError::InvalidRefinement(format!(
                        "anisotropic direction {bits} does not fit dimension {D}"
                    )))
                } else {
                    Ok(())
                }
            }
            RefinementPolicy::Bisection(Some(axis)) if *axis >= D => {
                Err(MeshLatticeError::InvalidRefinement(format!(
                    "bisection axis {axis} does not exist in dimension {D}"
                )))
            }
            RefinementPolicy::Bisection(_) => Ok(()),
            RefinementPolicy::Arbitrary(factor) => {
                if factor.iter().any(|f| f <= 0) {
                    Err(MeshLatticeError::InvalidRefinement(format!(
                        "non-positive refinement factor {factor}"
                    )))
                } else {
                    Ok(())
                }
            }
        }
    }
}

/// A refinement policy resolved for one level.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Refinement<const D: usize> {
    policy: RefinementPolicy<D>,
    factor: MultiIndex<D>,
}

impl<const D: usize> Refinement<D> {
    /// Refinement of the macro level: factor one everywhere.
    pub fn identity() -> Self {
        Self {
            policy: RefinementPolicy::Arbitrary(MultiIndex::splat(1)),
            factor: MultiIndex::splat(1),
        }
    }

    /// Resolve `policy` for a level whose father was refined by `father`.
    pub fn new(father: &Self, policy: &RefinementPolicy<D>) -> Result<Self, MeshLatticeError> {
        policy.validate()?;
        let policy = match policy {
            RefinementPolicy::Bisection(None) => {
                if D == 0 {
                    return Err(MeshLatticeError::InvalidRefinement(
                        "bisection in dimension 0".into(),
                    ));
                }
                let axis = match father.policy {
                    RefinementPolicy::Bisection(Some(a)) => (a + 1) % D,
                    _ => 0,
                };
                RefinementPolicy::Bisection(Some(axis))
            }
            p => p.clone(),
        };
        let factor = match &policy {
            RefinementPolicy::Isotropic => MultiIndex::splat(2),
            RefinementPolicy::Anisotropic(bits) => {
                MultiIndex::new(std::array::from_fn(|i| ((bits >> i) & 1) as i32 + 1))
            }
            RefinementPolicy::Bisection(axis) => {
                MultiIndex::new(std::array::from_fn(|i| if Some(i) == *axis { 2 } else { 1 }))
            }
            RefinementPolicy::Arbitrary(f) => *f,
        };
        Ok(Self { policy, factor })
    }

    /// The resolved policy; bisection always carries its axis.
    pub fn policy(&self) -> &RefinementPolicy<D> {
        &self.policy
    }

    #[inline]
    pub fn factor(&self, i: usize) -> i32 {
        self.factor[i]
    }

    pub fn factors(&self) -> &MultiIndex<D> {
        &self.factor
    }

    /// Policy that reproduces this refinement when replayed on the same
    /// father, as stored in a grid descriptor.
    pub fn descriptor(&self) -> RefinementPolicy<D> {
        match self.policy {
            RefinementPolicy::Arbitrary(_) => RefinementPolicy::Arbitrary(self.factor),
            ref p => p.clone(),
        }
    }

    pub fn num_children(&self) -> usize {
        self.factor.clamped_product()
    }

    /// Map an entity id to the id of the father-level entity containing it.
    pub fn father(&self, id: &MultiIndex<D>) -> MultiIndex<D> {
        MultiIndex::new(std::array::from_fn(|i| {
            ((id[i] / self.factor[i]) & !1) | (id[i] & 1)
        }))
    }

    /// Id of the `index`-th child of the element `id`; axis 0 varies fastest.
    pub fn child(&self, id: &MultiIndex<D>, mut index: usize) -> MultiIndex<D> {
        let mut child = *id;
        for i in 0..D {
            let alpha = self.factor[i];
            child[i] = (id[i] - 1) * alpha + 2 * (index % alpha as usize) as i32 + 1;
            index /= alpha as usize;
        }
        child
    }

    /// Inverse of [`child`](Self::child).
    pub fn child_index(&self, id: &MultiIndex<D>) -> usize {
        let mut index = 0usize;
        for i in (0..D).rev() {
            let alpha = self.factor[i];
            index = index * alpha as usize + ((id[i] >> 1) % alpha) as usize;
        }
        index
    }

    pub fn first_child(&self, id: &MultiIndex<D>) -> MultiIndex<D> {
        MultiIndex::new(std::array::from_fn(|i| {
            (self.factor[i] * (id[i] & !1)) | (id[i] & 1)
        }))
    }

    /// Whether `id` coincides with an entity of the father level.
    pub fn is_copy(&self, id: &MultiIndex<D>) -> bool {
        (0..D).all(|i| {
            let alpha = self.factor[i];
            alpha == 1 || id[i].rem_euclid(2 * alpha) == 0
        })
    }

    /// Child cell width relative to the father cell.
    pub fn h_in_father(&self) -> [f64; D] {
        std::array::from_fn(|i| 1.0 / self.factor[i] as f64)
    }

    /// Lower corner of child `index` in the father's reference cube.
    pub fn origin_in_father(&self, mut index: usize) -> [f64; D] {
        let mut origin = [0.0; D];
        for (i, o) in origin.iter_mut().enumerate() {
            let alpha = self.factor[i] as usize;
            *o = (index % alpha) as f64 / alpha as f64;
            index /= alpha;
        }
        origin
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn root() -> Refinement<2> {
        Refinement::identity()
    }

    #[test]
    fn isotropic_children_round_trip() {
        let r = Refinement::new(&root(), &RefinementPolicy::Isotropic).unwrap();
        assert_eq!(r.num_children(), 4);
        let cell = MultiIndex::new([3, 5]);
        for k in 0..r.num_children() {
            let c = r.child(&cell, k);
            assert_eq!(c.codimension(), 0);
            assert_eq!(r.father(&c), cell);
            assert_eq!(r.child_index(&c), k);
        }
        assert_eq!(r.first_child(&cell), r.child(&cell, 0));
    }

    #[test]
    fn anisotropic_factors() {
        let r = Refinement::new(&root(), &RefinementPolicy::Anisotropic(0b10)).unwrap();
        assert_eq!(r.factors(), &MultiIndex::new([1, 2]));
        assert_eq!(r.num_children(), 2);
        assert!(Refinement::new(&root(), &RefinementPolicy::Anisotropic(4)).is_err());
    }

    #[test]
    fn bisection_cycles_axes() {
        let r1 = Refinement::new(&root(), &RefinementPolicy::Bisection(None)).unwrap();
        assert_eq!(r1.policy(), &RefinementPolicy::Bisection(Some(0)));
        let r2 = Refinement::new(&r1, &RefinementPolicy::Bisection(None)).unwrap();
        assert_eq!(r2.policy(), &RefinementPolicy::Bisection(Some(1)));
        let r3 = Refinement::new(&r2, &RefinementPolicy::Bisection(None)).unwrap();
        assert_eq!(r3.policy(), &RefinementPolicy::Bisection(Some(0)));
        assert_eq!(
            Refinement::new(&r2, &r3.descriptor()).unwrap(),
            r3
        );
        assert!(Refinement::new(&root(), &RefinementPolicy::Bisection(Some(2))).is_err());
    }

    #[test]
    fn arbitrary_rejects_non_positive() {
        let p = RefinementPolicy::Arbitrary(MultiIndex::new([3, 0]));
        assert!(matches!(
            Refinement::new(&root(), &p),
            Err(MeshLatticeError::InvalidRefinement(_))
        ));
        let r = Refinement::new(&root(), &RefinementPolicy::Arbitrary(MultiIndex::new([3, 1])))
            .unwrap();
        let cell = MultiIndex::new([1, 1]);
        let kids: Vec<_> = (0..3).map(|k| r.child(&cell, k)).collect();
        assert_eq!(kids, vec![
            MultiIndex::new([1, 1]),
            MultiIndex::new([3, 1]),
            MultiIndex::new([5, 1])
        ]);
        assert!(kids.iter().all(|k| r.father(k) == cell));
    }

    #[test]
    fn copies_are_father_vertices() {
        let r = Refinement::new(&root(), &RefinementPolicy::Isotropic).unwrap();
        assert!(r.is_copy(&MultiIndex::new([4, 8])));
        assert!(!r.is_copy(&MultiIndex::new([2, 4])));
        assert!(!r.is_copy(&MultiIndex::new([1, 4])));
    }

    #[test]
    fn geometry_in_father() {
        let r = Refinement::new(&root(), &RefinementPolicy::Anisotropic(0b01)).unwrap();
        assert_eq!(r.h_in_father(), [0.5, 1.0]);
        assert_eq!(r.origin_in_father(1), [0.5, 0.0]);
    }
}
