//! `PartitionList`: an ordered sequence of partitions with lookup by number.
//!
//! Order matters: every enumeration over a list visits its partitions in
//! insertion order, and the communication protocol depends on both sides
//! enumerating identically.

use std::ops::{AddAssign, Index};

use crate::debug_invariants::DebugInvariants;
use crate::mesh_error::MeshLatticeError;
use crate::partitioning::partition::Partition;
use crate::topology::MultiIndex;

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PartitionList<const D: usize> {
    partitions: Vec<Partition<D>>,
    /// Position of the first partition with number `min_number + k`.
    lookup: Vec<Option<usize>>,
    min_number: u32,
}

impl<const D: usize> PartitionList<D> {
    pub fn new() -> Self {
        Self {
            partitions: Vec::new(),
            lookup: Vec::new(),
            min_number: 0,
        }
    }

    /// Append a partition, keeping the number lookup current.
    pub fn push(&mut self, partition: Partition<D>) {
        let number = partition.number();
        let pos = self.partitions.len();
        self.partitions.push(partition);
        if self.lookup.is_empty() {
            self.min_number = number;
            self.lookup.push(Some(pos));
            return;
        }
        if number < self.min_number {
            let grow = (self.min_number - number) as usize;
            let mut lookup = vec![None; grow];
            lookup.append(&mut self.lookup);
            self.lookup = lookup;
            self.min_number = number;
        }
        let slot = (number - self.min_number) as usize;
        if slot >= self.lookup.len() {
            self.lookup.resize(slot + 1, None);
        }
        if self.lookup[slot].is_none() {
            self.lookup[slot] = Some(pos);
        }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.partitions.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.partitions.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Partition<D>> {
        self.partitions.iter()
    }

    pub fn as_slice(&self) -> &[Partition<D>] {
        &self.partitions
    }

    /// Total number of cells over all partitions.
    pub fn volume(&self) -> usize {
        self.partitions.iter().map(Partition::volume).sum()
    }

    /// Whether a partition with this number exists.
    pub fn contains_number(&self, number: u32) -> bool {
        self.slot(number).is_some()
    }

    /// Whether the partition numbered `number` contains `id`.
    pub fn contains(&self, id: &MultiIndex<D>, number: u32) -> bool {
        self.slot(number)
            .is_some_and(|pos| self.partitions[pos].contains(id))
    }

    /// The partition numbered `number`.
    pub fn partition(&self, number: u32) -> Result<&Partition<D>, MeshLatticeError> {
        self.slot(number)
            .map(|pos| &self.partitions[pos])
            .ok_or(MeshLatticeError::PartitionNotFound(number))
    }

    /// Smallest partition number; `None` for an empty list.
    pub fn min_number(&self) -> Option<u32> {
        (!self.is_empty()).then_some(self.min_number)
    }

    /// Largest partition number; `None` for an empty list.
    pub fn max_number(&self) -> Option<u32> {
        (!self.is_empty()).then(|| self.min_number + self.lookup.len() as u32 - 1)
    }

    /// True when no two partitions share a number.
    pub fn has_unique_numbers(&self) -> bool {
        self.lookup.iter().flatten().count() == self.partitions.len()
    }

    fn slot(&self, number: u32) -> Option<usize> {
        let k = number.checked_sub(self.min_number)? as usize;
        self.lookup.get(k).copied().flatten()
    }
}

impl<const D: usize> AddAssign<Partition<D>> for PartitionList<D> {
    fn add_assign(&mut self, partition: Partition<D>) {
        self.push(partition);
    }
}

impl<const D: usize> FromIterator<Partition<D>> for PartitionList<D> {
    fn from_iter<I: IntoIterator<Item = Partition<D>>>(iter: I) -> Self {
        let mut list = Self::new();
        for p in iter {
            list.push(p);
        }
        list
    }
}

impl<const D: usize> Index<usize> for PartitionList<D> {
    type Output = Partition<D>;
    fn index(&self, i: usize) -> &Partition<D> {
        &self.partitions[i]
    }
}

impl<'a, const D: usize> IntoIterator for &'a PartitionList<D> {
    type Item = &'a Partition<D>;
    type IntoIter = std::slice::Iter<'a, Partition<D>>;
    fn into_iter(self) -> Self::IntoIter {
        self.partitions.iter()
    }
}

impl<const D: usize> DebugInvariants for PartitionList<D> {
    fn debug_assert_invariants(&self) {
        crate::debug_invariants!(self.validate_invariants(), "PartitionList");
    }

    fn validate_invariants(&self) -> Result<(), MeshLatticeError> {
        for (k, slot) in self.lookup.iter().enumerate() {
            if let Some(pos) = *slot {
                let number = self.min_number + k as u32;
                let found = self.partitions.get(pos).map(Partition::number);
                if found != Some(number) {
                    return Err(MeshLatticeError::PartitionNotFound(number));
                }
            }
        }
        for p in &self.partitions {
            if !self.contains_number(p.number()) {
                return Err(MeshLatticeError::PartitionNotFound(p.number()));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn part(b: i32, e: i32, n: u32) -> Partition<1> {
        Partition::new(MultiIndex::new([b]), MultiIndex::new([e]), n)
    }

    #[test]
    fn lookup_by_number() {
        let list: PartitionList<1> = [part(0, 4, 3), part(6, 10, 1), part(12, 14, 2)]
            .into_iter()
            .collect();
        assert_eq!(list.len(), 3);
        assert_eq!(list.min_number(), Some(1));
        assert_eq!(list.max_number(), Some(3));
        assert_eq!(list.partition(1).unwrap().begin()[0], 6);
        assert!(list.contains(&MultiIndex::new([13]), 2));
        assert!(!list.contains(&MultiIndex::new([13]), 3));
        assert!(matches!(list.partition(7), Err(MeshLatticeError::PartitionNotFound(7))));
        assert_eq!(list.volume(), 2 + 2 + 1);
        list.validate_invariants().unwrap();
    }

    #[test]
    fn duplicate_numbers_resolve_to_first() {
        let mut list = PartitionList::new();
        list += part(0, 2, 0);
        list += part(4, 6, 0);
        assert!(!list.has_unique_numbers());
        assert_eq!(list.partition(0).unwrap().begin()[0], 0);
        // iteration still sees both
        assert_eq!(list.iter().count(), 2);
    }

    #[test]
    fn empty_list() {
        let list = PartitionList::<2>::new();
        assert!(list.is_empty());
        assert_eq!(list.min_number(), None);
        assert_eq!(list.volume(), 0);
        assert!(!list.contains(&MultiIndex::zero(), 0));
    }
}
