//! Recursive coordinate bisection of the global mesh among ranks.
//!
//! A node for `size` ranks splits its mesh along the first widest axis in the
//! ratio `size/2 : size - size/2` and recurses, so leaves correspond to ranks
//! in order from left to right. The result depends only on the global mesh
//! and the rank count, which lets every rank rebuild every other rank's
//! sub-mesh without communication.

use itertools::Itertools;

use crate::debug_invariants::DebugInvariants;
use crate::mesh_error::MeshLatticeError;
use crate::topology::{Mesh, MultiIndex};

fn weight(ranks: usize) -> Result<i32, MeshLatticeError> {
    i32::try_from(ranks).map_err(|_| MeshLatticeError::InvalidRankCount(ranks))
}

#[derive(Clone, Debug)]
struct Node<const D: usize> {
    mesh: Mesh<D>,
    size: usize,
    children: Option<Box<(Node<D>, Node<D>)>>,
}

impl<const D: usize> Node<D> {
    fn new(mesh: Mesh<D>, size: usize) -> Result<Self, MeshLatticeError> {
        if size <= 1 {
            if mesh.is_empty() {
                log::warn!("decomposition leaf {mesh} holds no cells");
            }
            return Ok(Self {
                mesh,
                size,
                children: None,
            });
        }
        let left_weight = size / 2;
        let right_weight = size - left_weight;
        let axis = mesh.width().argmax();
        let (left, right) = mesh.split(axis, weight(left_weight)?, weight(right_weight)?)?;
        Ok(Self {
            mesh,
            size,
            children: Some(Box::new((
                Node::new(left, left_weight)?,
                Node::new(right, right_weight)?,
            ))),
        })
    }

    fn sub_mesh(&self, rank: usize) -> &Mesh<D> {
        match &self.children {
            Some(children) => {
                let half = self.size / 2;
                if rank < half {
                    children.0.sub_mesh(rank)
                } else {
                    children.1.sub_mesh(rank - half)
                }
            }
            None => &self.mesh,
        }
    }

    fn collect(&self, out: &mut Vec<Mesh<D>>) {
        match &self.children {
            Some(children) => {
                children.0.collect(out);
                children.1.collect(out);
            }
            None => out.push(self.mesh),
        }
    }
}

/// Binary tree of sub-meshes, one leaf per rank.
#[derive(Clone, Debug)]
pub struct Decomposition<const D: usize> {
    root: Node<D>,
}

impl<const D: usize> Decomposition<D> {
    pub fn new(mesh: Mesh<D>, size: usize) -> Result<Self, MeshLatticeError> {
        if size == 0 {
            return Err(MeshLatticeError::InvalidRankCount(size));
        }
        weight(size)?;
        let decomposition = Self {
            root: Node::new(mesh, size)?,
        };
        log::debug!(
            "decomposed {} into {} sub-meshes",
            decomposition.mesh(),
            decomposition.size()
        );
        decomposition.debug_assert_invariants();
        Ok(decomposition)
    }

    /// Decompose the mesh `[0, width)`.
    pub fn from_width(width: MultiIndex<D>, size: usize) -> Result<Self, MeshLatticeError> {
        Self::new(Mesh::from_width(width), size)
    }

    /// The decomposed (global) mesh.
    pub fn mesh(&self) -> &Mesh<D> {
        &self.root.mesh
    }

    /// Number of ranks.
    pub fn size(&self) -> usize {
        self.root.size
    }

    /// Sub-mesh of `rank`, found by descending the tree.
    pub fn sub_mesh(&self, rank: usize) -> Result<&Mesh<D>, MeshLatticeError> {
        if rank >= self.size() {
            return Err(MeshLatticeError::RankOutOfRange {
                rank,
                size: self.size(),
            });
        }
        Ok(self.root.sub_mesh(rank))
    }

    /// All leaves in rank order.
    pub fn sub_meshes(&self) -> Vec<Mesh<D>> {
        let mut meshes = Vec::with_capacity(self.size());
        self.root.collect(&mut meshes);
        meshes
    }
}

impl<const D: usize> DebugInvariants for Decomposition<D> {
    fn debug_assert_invariants(&self) {
        crate::debug_invariants!(self.validate_invariants(), "Decomposition");
    }

    fn validate_invariants(&self) -> Result<(), MeshLatticeError> {
        let leaves = self.sub_meshes();
        if leaves.len() != self.size() {
            return Err(MeshLatticeError::RankCountMismatch {
                expected: self.size(),
                actual: leaves.len(),
            });
        }
        let total: usize = leaves.iter().map(Mesh::volume).sum();
        if total != self.mesh().volume() {
            return Err(MeshLatticeError::InvalidConfig(format!(
                "sub-meshes cover {total} cells, the mesh has {}",
                self.mesh().volume()
            )));
        }
        for (a, b) in leaves.iter().tuple_combinations() {
            if !a.intersect(b).is_empty() {
                return Err(MeshLatticeError::InvalidConfig(format!(
                    "sub-meshes {a} and {b} overlap"
                )));
            }
        }
        for leaf in leaves.iter().filter(|m| !m.is_empty()) {
            if leaf.intersect(self.mesh()) != *leaf {
                return Err(MeshLatticeError::InvalidConfig(format!(
                    "sub-mesh {leaf} leaves {}",
                    self.mesh()
                )));
            }
        }
        Ok(())
    }
}
