//! The level hierarchy of a structured grid on one rank.
//!
//! Level 0 is built from a [`GridConfig`]: the global mesh is decomposed
//! among the ranks once, and every finer level refines both the global mesh
//! and every rank's share of it. Levels are kept in a `Vec` indexed by level
//! number and are never modified after construction.

pub mod config;
pub mod level;

pub use config::{Domain, GridConfig, GridDescriptor};
pub use level::GridLevel;

use crate::data::IdSet;
use crate::mesh_error::MeshLatticeError;
use crate::partitioning::Decomposition;
use crate::topology::{Mesh, MultiIndex, RefinementPolicy};

#[derive(Clone, Debug)]
pub struct Grid<const D: usize> {
    config: GridConfig<D>,
    size: usize,
    decomposition: Decomposition<D>,
    levels: Vec<GridLevel<D>>,
    ids: IdSet<D>,
}

impl<const D: usize> Grid<D> {
    /// Build level 0 for `rank` out of `size` ranks.
    pub fn new(config: GridConfig<D>, rank: usize, size: usize) -> Result<Self, MeshLatticeError> {
        config.validate()?;
        if rank >= size {
            return Err(MeshLatticeError::RankOutOfRange { rank, size });
        }
        let global = Mesh::from_width(config.cells);
        let decomposition = Decomposition::new(global, size)?;
        let level = GridLevel::macro_level(
            rank,
            global,
            decomposition.sub_meshes(),
            config.domain.lower,
            config.h(),
            &config.overlap,
            config.periodic,
        )?;
        let ids = IdSet::new(global, config.periodic);
        Ok(Self {
            config,
            size,
            decomposition,
            levels: vec![level],
            ids,
        })
    }

    /// Rebuild the grid described by `descriptor`. The rank count must match
    /// the one the descriptor was taken with.
    pub fn from_descriptor(
        descriptor: &GridDescriptor<D>,
        rank: usize,
        size: usize,
    ) -> Result<Self, MeshLatticeError> {
        if descriptor.size != size {
            return Err(MeshLatticeError::RankCountMismatch {
                expected: descriptor.size,
                actual: size,
            });
        }
        if descriptor.refinements.len() != descriptor.max_level {
            return Err(MeshLatticeError::InvalidConfig(format!(
                "{} refinements for max level {}",
                descriptor.refinements.len(),
                descriptor.max_level
            )));
        }
        let mut grid = Self::new(descriptor.config(), rank, size)?;
        for policy in &descriptor.refinements {
            grid.refine(policy)?;
        }
        Ok(grid)
    }

    pub fn descriptor(&self) -> GridDescriptor<D> {
        GridDescriptor {
            domain: self.config.domain,
            periodic: self.config.periodic,
            cells: self.config.cells,
            size: self.size,
            overlap: self.config.overlap,
            max_level: self.max_level(),
            refinements: self
                .levels
                .iter()
                .skip(1)
                .map(|l| l.refinement().descriptor())
                .collect(),
        }
    }

    /// Append one level refined from the current leaf.
    pub fn refine(&mut self, policy: &RefinementPolicy<D>) -> Result<&GridLevel<D>, MeshLatticeError> {
        policy.validate()?;
        let next = self.leaf().refined(policy)?;
        self.ids
            .push_level(*next.global_mesh(), next.refinement().clone())?;
        self.levels.push(next);
        Ok(self.leaf())
    }

    /// Refine `times` times with the same policy.
    pub fn global_refine(
        &mut self,
        times: usize,
        policy: &RefinementPolicy<D>,
    ) -> Result<(), MeshLatticeError> {
        for _ in 0..times {
            self.refine(policy)?;
        }
        Ok(())
    }

    pub fn level(&self, level: usize) -> Result<&GridLevel<D>, MeshLatticeError> {
        self.levels.get(level).ok_or(MeshLatticeError::LevelOutOfRange {
            level,
            max_level: self.max_level(),
        })
    }

    pub fn leaf(&self) -> &GridLevel<D> {
        &self.levels[self.levels.len() - 1]
    }

    pub fn levels(&self) -> &[GridLevel<D>] {
        &self.levels
    }

    pub fn max_level(&self) -> usize {
        self.levels.len() - 1
    }

    /// Level-stable id of entity `id` on `level`.
    pub fn id(&self, level: usize, id: &MultiIndex<D>) -> Result<u64, MeshLatticeError> {
        self.ids.id(level, id)
    }

    pub fn config(&self) -> &GridConfig<D> {
        &self.config
    }

    pub fn decomposition(&self) -> &Decomposition<D> {
        &self.decomposition
    }

    pub fn rank(&self) -> usize {
        self.leaf().rank()
    }

    pub fn size(&self) -> usize {
        self.size
    }
}
