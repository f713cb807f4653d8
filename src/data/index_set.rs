//! Dense per-codimension numbering of the entities of one level.
//!
//! Every `(partition, direction)` pair of the numbered list owns a
//! contiguous block of indices inside its codimension. Within a block the
//! index is the lexicographic position of the id (axis 0 fastest, step two),
//! which matches the enumeration order of
//! [`PartitionIter`](crate::algs::traversal::PartitionIter).

use crate::algs::traversal::count_in;
use crate::mesh_error::MeshLatticeError;
use crate::partitioning::PartitionList;
use crate::topology::{Direction, MultiIndex};

#[derive(Clone, Debug, Default)]
pub struct IndexSet<const D: usize> {
    partitions: PartitionList<D>,
    min_number: u32,
    /// `offsets[(number - min_number) * 2^D + dir]`
    offsets: Vec<usize>,
    sizes: Vec<usize>,
}

impl<const D: usize> IndexSet<D> {
    /// Number the entities of `partitions`, usually the `All` list of a level.
    pub fn new(partitions: &PartitionList<D>) -> Self {
        let mut sizes = vec![0usize; D + 1];
        let (min_number, max_number) = match (partitions.min_number(), partitions.max_number()) {
            (Some(lo), Some(hi)) => (lo, hi),
            _ => {
                return Self {
                    partitions: partitions.clone(),
                    min_number: 0,
                    offsets: Vec::new(),
                    sizes,
                };
            }
        };

        let slots = (max_number - min_number + 1) as usize;
        let mut offsets = vec![0usize; slots * Direction::<D>::COUNT];
        for p in partitions {
            let row = (p.number() - min_number) as usize * Direction::<D>::COUNT;
            for dir in Direction::<D>::all() {
                let codim = dir.codimension();
                offsets[row + dir.bits() as usize] = sizes[codim];
                sizes[codim] += count_in(p, dir);
            }
        }
        log::debug!("index set sizes per codim: {sizes:?}");
        Self {
            partitions: partitions.clone(),
            min_number,
            offsets,
            sizes,
        }
    }

    /// Dense index of `id`, found in the partition numbered `number`.
    pub fn index(&self, id: &MultiIndex<D>, number: u32) -> Result<usize, MeshLatticeError> {
        let partition = self.partitions.partition(number)?;
        if !partition.contains(id) {
            return Err(MeshLatticeError::IndexOverflow(format!(
                "{id} outside partition {number}"
            )));
        }
        let dir = id.direction();
        let mut index = 0usize;
        let mut stride = 1usize;
        for i in 0..D {
            let d = dir.bit(i);
            let begin = partition.bound_for(0, i, d);
            let end = partition.bound_for(1, i, d);
            index += ((id[i] - begin) >> 1) as usize * stride;
            stride *= ((end - begin) >> 1) as usize + 1;
        }
        let row = (number - self.min_number) as usize * Direction::<D>::COUNT;
        Ok(self.offsets[row + dir.bits() as usize] + index)
    }

    /// Number of indices handed out for codimension `codim`.
    pub fn size(&self, codim: usize) -> usize {
        self.sizes.get(codim).copied().unwrap_or(0)
    }

    pub fn contains(&self, id: &MultiIndex<D>, number: u32) -> bool {
        self.partitions.contains(id, number)
    }

    pub fn partitions(&self) -> &PartitionList<D> {
        &self.partitions
    }
}
