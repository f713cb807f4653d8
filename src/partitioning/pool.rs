//! `PartitionPool`: the six role lists of one rank.
//!
//! The pool classifies every entity a rank knows about by its parallel role.
//! It is built once per level from the rank's local mesh, the global mesh,
//! the overlap width and the periodicity bitmask.
//!
//! On a periodic axis the halo may leave the global domain; such regions are
//! wrapped around, which can split the halo into up to `2^n` shifted copies
//! (`n` = number of wrapped axes). Copies are numbered `0..2^n` and reference
//! each other through their neighbor slots on the wrapping faces.

use serde::{Deserialize, Serialize};

use crate::debug_invariants::DebugInvariants;
use crate::mesh_error::MeshLatticeError;
use crate::partitioning::partition::Partition;
use crate::partitioning::partition_list::PartitionList;
use crate::topology::{Mesh, MultiIndex};

/// Which of the six role lists to enumerate.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PartitionIteratorType {
    Interior,
    InteriorBorder,
    Overlap,
    OverlapFront,
    All,
    Ghost,
}

impl PartitionIteratorType {
    pub const ALL: [PartitionIteratorType; 6] = [
        PartitionIteratorType::Interior,
        PartitionIteratorType::InteriorBorder,
        PartitionIteratorType::Overlap,
        PartitionIteratorType::OverlapFront,
        PartitionIteratorType::All,
        PartitionIteratorType::Ghost,
    ];
}

/// Parallel role of a single entity.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PartitionType {
    Interior,
    Border,
    Overlap,
    Front,
    Ghost,
}

#[derive(Clone, Debug)]
pub struct PartitionPool<const D: usize> {
    global_mesh: Mesh<D>,
    overlap_width: MultiIndex<D>,
    periodic: u32,
    interior: PartitionList<D>,
    interior_border: PartitionList<D>,
    overlap: PartitionList<D>,
    overlap_front: PartitionList<D>,
    all: PartitionList<D>,
    ghost: PartitionList<D>,
}

impl<const D: usize> PartitionPool<D> {
    /// Build the role lists of `local` inside `global`.
    ///
    /// `periodic` bit `i` marks axis `i` as periodic; bits at or beyond `D`
    /// are rejected.
    pub fn new(
        local: &Mesh<D>,
        global: &Mesh<D>,
        overlap: &MultiIndex<D>,
        periodic: u32,
    ) -> Result<Self, MeshLatticeError> {
        if (periodic as u64) >= (1u64 << D) {
            return Err(MeshLatticeError::InvalidPeriodicity {
                bits: periodic,
                dimension: D,
            });
        }
        if overlap.iter().any(|o| o < 0) {
            return Err(MeshLatticeError::InvalidConfig(format!(
                "negative overlap {overlap}"
            )));
        }

        let mut pool = Self {
            global_mesh: *global,
            overlap_width: *overlap,
            periodic,
            interior: PartitionList::new(),
            interior_border: PartitionList::new(),
            overlap: PartitionList::new(),
            overlap_front: PartitionList::new(),
            all: PartitionList::new(),
            ghost: PartitionList::new(),
        };

        let interior = pool.open_partition(local, 0);
        let interior_border = pool.closed_partition(local, 0);
        pool.interior.push(interior);
        pool.interior_border.push(interior_border);

        // find the periodic axes along which the halo wraps around
        let global_width = global.width();
        let mut overlap_mesh = local.grow_by(overlap);
        let overlap_width = overlap_mesh.width();
        let mut wrapped: Vec<(usize, i32)> = Vec::new();
        for i in 0..D {
            if periodic & (1 << i) == 0 {
                continue;
            }
            if overlap_width[i] >= global_width[i] {
                let mut begin = *overlap_mesh.begin();
                let mut end = *overlap_mesh.end();
                begin[i] = global.begin()[i];
                end[i] = global.end()[i];
                overlap_mesh = Mesh::new(begin, end);
                continue;
            }
            let mut shift = 0;
            if overlap_mesh.begin()[i] < global.begin()[i] {
                shift += global_width[i];
            }
            if overlap_mesh.end()[i] > global.end()[i] {
                shift -= global_width[i];
            }
            if shift != 0 {
                wrapped.push((i, shift));
            }
        }

        let copies = 1u32 << wrapped.len();
        for d in 0..copies {
            let mut s = MultiIndex::zero();
            for (k, &(axis, shift)) in wrapped.iter().enumerate() {
                s[axis] = ((d >> k) & 1) as i32 * shift;
            }
            let region = global.intersect(&(overlap_mesh + s));
            let mut open = pool.open_partition(&region, d);
            let mut closed = pool.closed_partition(&region, d);
            for (k, &(axis, shift)) in wrapped.iter().enumerate() {
                let j = ((shift < 0) as u32 ^ ((d >> k) & 1)) as usize;
                open.set_neighbor(2 * axis + j, Some(d ^ (1 << k)));
                closed.set_neighbor(2 * axis + j, Some(d ^ (1 << k)));
            }
            pool.overlap.push(open);
            pool.overlap_front.push(closed);
        }

        pool.all = pool.overlap_front.clone();
        pool.debug_assert_invariants();
        Ok(pool)
    }

    /// The list for one role.
    pub fn get(&self, kind: PartitionIteratorType) -> &PartitionList<D> {
        match kind {
            PartitionIteratorType::Interior => &self.interior,
            PartitionIteratorType::InteriorBorder => &self.interior_border,
            PartitionIteratorType::Overlap => &self.overlap,
            PartitionIteratorType::OverlapFront => &self.overlap_front,
            PartitionIteratorType::All => &self.all,
            PartitionIteratorType::Ghost => &self.ghost,
        }
    }

    /// Role of the entity `id` seen through partition `number`.
    pub fn partition_type(&self, id: &MultiIndex<D>, number: u32) -> PartitionType {
        let codim = id.codimension();
        if self.interior_border.contains(id, number) {
            if codim == 0 || self.interior.contains(id, number) {
                PartitionType::Interior
            } else {
                PartitionType::Border
            }
        } else if self.overlap_front.contains(id, number) {
            if codim == 0 || self.overlap.contains(id, number) {
                PartitionType::Overlap
            } else {
                PartitionType::Front
            }
        } else {
            PartitionType::Ghost
        }
    }

    pub fn global_mesh(&self) -> &Mesh<D> {
        &self.global_mesh
    }

    /// Halo width the pool was built with.
    pub fn overlap(&self) -> &MultiIndex<D> {
        &self.overlap_width
    }

    pub fn periodic(&self) -> u32 {
        self.periodic
    }

    fn closed_partition(&self, local: &Mesh<D>, number: u32) -> Partition<D> {
        let mut p = Partition::closed(local, &self.global_mesh, number);
        self.mark_self_neighbors(&mut p, local);
        p
    }

    fn open_partition(&self, local: &Mesh<D>, number: u32) -> Partition<D> {
        let mut p = Partition::open(local, &self.global_mesh, number);
        self.mark_self_neighbors(&mut p, local);
        p
    }

    // a partition spanning a whole periodic axis touches itself
    fn mark_self_neighbors(&self, p: &mut Partition<D>, local: &Mesh<D>) {
        for i in 0..D {
            if self.periodic & (1 << i) == 0 {
                continue;
            }
            if local.begin()[i] == self.global_mesh.begin()[i]
                && local.end()[i] == self.global_mesh.end()[i]
            {
                p.set_neighbor(2 * i, Some(p.number()));
                p.set_neighbor(2 * i + 1, Some(p.number()));
            }
        }
    }
}

impl<const D: usize> DebugInvariants for PartitionPool<D> {
    fn debug_assert_invariants(&self) {
        crate::debug_invariants!(self.validate_invariants(), "PartitionPool");
    }

    fn validate_invariants(&self) -> Result<(), MeshLatticeError> {
        for kind in PartitionIteratorType::ALL {
            let list = self.get(kind);
            list.validate_invariants()?;
            if !list.has_unique_numbers() {
                return Err(MeshLatticeError::InvalidConfig(format!(
                    "{kind:?} list has repeated partition numbers"
                )));
            }
        }
        let chain = [
            self.interior.volume(),
            self.interior_border.volume(),
            self.overlap.volume(),
            self.overlap_front.volume(),
            self.all.volume(),
        ];
        if chain.windows(2).any(|w| w[0] > w[1]) {
            return Err(MeshLatticeError::InvalidConfig(format!(
                "role list volumes are not monotone: {chain:?}"
            )));
        }
        Ok(())
    }
}
