//! One level of the grid hierarchy on one rank.
//!
//! A level owns everything derived from its meshes: the role lists, the
//! linkage with the other ranks, the dense index set and one geometry cache
//! per direction. All of it is rebuilt from scratch for every level.

use crate::algs::communication::{DataHandle, communicate};
use crate::algs::communicator::Communicator;
use crate::data::IndexSet;
use crate::geometry::GeometryCache;
use crate::mesh_error::MeshLatticeError;
use crate::overlap::{CommunicationDirection, InterfaceType, Linkage};
use crate::partitioning::{PartitionIteratorType, PartitionList, PartitionPool, PartitionType};
use crate::topology::{Direction, Mesh, MultiIndex, Refinement, RefinementPolicy};

#[derive(Clone, Debug)]
pub struct GridLevel<const D: usize> {
    level: usize,
    rank: usize,
    refinement: Refinement<D>,
    origin: [f64; D],
    h: [f64; D],
    macro_factor: MultiIndex<D>,
    global_mesh: Mesh<D>,
    /// Local mesh of every rank on this level.
    decomposition: Vec<Mesh<D>>,
    pool: PartitionPool<D>,
    linkage: Linkage<D>,
    index_set: IndexSet<D>,
    geometry: Vec<GeometryCache<f64, D>>,
}

impl<const D: usize> GridLevel<D> {
    /// Macro level from the meshes of a decomposition.
    pub fn macro_level(
        rank: usize,
        global_mesh: Mesh<D>,
        decomposition: Vec<Mesh<D>>,
        origin: [f64; D],
        h: [f64; D],
        overlap: &MultiIndex<D>,
        periodic: u32,
    ) -> Result<Self, MeshLatticeError> {
        Self::build(
            0,
            rank,
            Refinement::identity(),
            MultiIndex::splat(1),
            origin,
            h,
            global_mesh,
            decomposition,
            overlap,
            periodic,
        )
    }

    /// The level obtained by refining `self` with `policy`.
    pub fn refined(&self, policy: &RefinementPolicy<D>) -> Result<Self, MeshLatticeError> {
        let refinement = Refinement::new(&self.refinement, policy)?;
        let h = std::array::from_fn(|i| self.h[i] / refinement.factor(i) as f64);
        let macro_factor = MultiIndex::new(std::array::from_fn(|i| {
            self.macro_factor[i] * refinement.factor(i)
        }));
        let global_mesh = self.global_mesh.refine(&refinement);
        let decomposition = self
            .decomposition
            .iter()
            .map(|m| m.refine(&refinement))
            .collect();
        Self::build(
            self.level + 1,
            self.rank,
            refinement,
            macro_factor,
            self.origin,
            h,
            global_mesh,
            decomposition,
            self.pool.overlap(),
            self.pool.periodic(),
        )
    }

    #[allow(clippy::too_many_arguments)]
    fn build(
        level: usize,
        rank: usize,
        refinement: Refinement<D>,
        macro_factor: MultiIndex<D>,
        origin: [f64; D],
        h: [f64; D],
        global_mesh: Mesh<D>,
        decomposition: Vec<Mesh<D>>,
        overlap: &MultiIndex<D>,
        periodic: u32,
    ) -> Result<Self, MeshLatticeError> {
        let local = decomposition
            .get(rank)
            .ok_or(MeshLatticeError::RankOutOfRange {
                rank,
                size: decomposition.len(),
            })?;
        let pool = PartitionPool::new(local, &global_mesh, overlap, periodic)?;
        let linkage = Linkage::new(rank, &pool, &decomposition)?;
        let index_set = IndexSet::new(pool.get(PartitionIteratorType::All));
        let geometry = GeometryCache::for_all_directions(&h);
        log::debug!(
            "rank {rank}: level {level} global {global_mesh} local {local}, {} cells",
            index_set.size(0)
        );
        Ok(Self {
            level,
            rank,
            refinement,
            origin,
            h,
            macro_factor,
            global_mesh,
            decomposition,
            pool,
            linkage,
            index_set,
            geometry,
        })
    }

    pub fn level(&self) -> usize {
        self.level
    }

    pub fn rank(&self) -> usize {
        self.rank
    }

    pub fn refinement(&self) -> &Refinement<D> {
        &self.refinement
    }

    pub fn h(&self) -> &[f64; D] {
        &self.h
    }

    pub fn global_mesh(&self) -> &Mesh<D> {
        &self.global_mesh
    }

    pub fn local_mesh(&self) -> &Mesh<D> {
        &self.decomposition[self.rank]
    }

    /// Global cell counts of this level.
    pub fn cells(&self) -> MultiIndex<D> {
        self.global_mesh.width()
    }

    pub fn pool(&self) -> &PartitionPool<D> {
        &self.pool
    }

    pub fn partitions(&self, kind: PartitionIteratorType) -> &PartitionList<D> {
        self.pool.get(kind)
    }

    pub fn partition_type(&self, id: &MultiIndex<D>, number: u32) -> PartitionType {
        self.pool.partition_type(id, number)
    }

    pub fn linkage(&self) -> &Linkage<D> {
        &self.linkage
    }

    pub fn index_set(&self) -> &IndexSet<D> {
        &self.index_set
    }

    pub fn geometry_cache(&self, direction: Direction<D>) -> &GeometryCache<f64, D> {
        &self.geometry[direction.bits() as usize]
    }

    /// Physical position of the center of entity `id`.
    pub fn center(&self, id: &MultiIndex<D>) -> [f64; D] {
        std::array::from_fn(|i| self.origin[i] + 0.5 * id[i] as f64 * self.h[i])
    }

    /// Id of the macro entity containing `id`.
    pub fn macro_id(&self, id: &MultiIndex<D>) -> MultiIndex<D> {
        MultiIndex::new(std::array::from_fn(|i| {
            (((id[i] >> 1) / self.macro_factor[i]) << 1) | (id[i] & 1)
        }))
    }

    /// Origin and spacing of child `index` in its father's reference cube.
    pub fn geometry_in_father(&self, index: usize) -> ([f64; D], [f64; D]) {
        (
            self.refinement.origin_in_father(index),
            self.refinement.h_in_father(),
        )
    }

    /// Exchange `handle`'s data over one interface of this level.
    pub fn communicate<C, H>(
        &self,
        comm: &C,
        interface: InterfaceType,
        direction: CommunicationDirection,
        handle: &mut H,
    ) -> Result<(), MeshLatticeError>
    where
        C: Communicator,
        H: DataHandle<D>,
    {
        communicate(comm, self.linkage.interface(interface), direction, handle)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn single_rank(width: [i32; 2]) -> GridLevel<2> {
        let global = Mesh::from_width(MultiIndex::new(width));
        GridLevel::macro_level(0, global, vec![global], [0.0; 2], [0.5, 0.25], &MultiIndex::zero(), 0)
            .unwrap()
    }

    #[test]
    fn refined_level_scales_everything() {
        let l0 = single_rank([2, 4]);
        let l1 = l0.refined(&RefinementPolicy::Anisotropic(0b01)).unwrap();
        assert_eq!(l1.level(), 1);
        assert_eq!(l1.cells(), MultiIndex::new([4, 4]));
        assert_eq!(l1.h(), &[0.25, 0.25]);
        assert_eq!(l1.index_set().size(0), 16);
        assert_eq!(l1.geometry_cache(Direction::full()).volume(), 0.0625);
    }

    #[test]
    fn macro_id_of_fine_cell() {
        let l0 = single_rank([2, 2]);
        let l2 = l0
            .refined(&RefinementPolicy::Isotropic)
            .unwrap()
            .refined(&RefinementPolicy::Isotropic)
            .unwrap();
        // fine cells 2 (x) and 4 (y) sit in macro cells 0 and 1
        assert_eq!(l2.macro_id(&MultiIndex::new([5, 9])), MultiIndex::new([1, 3]));
        assert_eq!(l2.geometry_in_father(3), ([0.5, 0.5], [0.5, 0.5]));
    }

    #[test]
    fn centers() {
        let l0 = single_rank([2, 4]);
        assert_eq!(l0.center(&MultiIndex::new([1, 1])), [0.25, 0.125]);
        assert_eq!(l0.center(&MultiIndex::new([4, 0])), [1.0, 0.0]);
    }
}
