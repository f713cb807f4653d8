//! Deterministic enumeration of the entities inside a partition list.
//!
//! Order: partitions in list order; within a partition the directions of the
//! requested codimension in increasing bitmask order (directions in which the
//! partition is empty are skipped); within a direction the ids
//! lexicographically with axis 0 varying fastest, in steps of two. Gather and
//! scatter both rely on this order.

use crate::partitioning::{Partition, PartitionList};
use crate::topology::{Direction, MultiIndex};

/// An entity together with the number of the partition it was found in.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct EntityInfo<const D: usize> {
    pub id: MultiIndex<D>,
    pub partition: u32,
}

impl<const D: usize> EntityInfo<D> {
    pub fn codimension(&self) -> usize {
        self.id.codimension()
    }

    pub fn direction(&self) -> Direction<D> {
        self.id.direction()
    }
}

struct Cursor<const D: usize> {
    begin: MultiIndex<D>,
    end: MultiIndex<D>,
    id: MultiIndex<D>,
    partition: u32,
}

/// Iterator over the entities of one codimension in a partition list.
pub struct PartitionIter<'a, const D: usize> {
    partitions: &'a [Partition<D>],
    directions: Vec<Direction<D>>,
    part: usize,
    dir: usize,
    cursor: Option<Cursor<D>>,
}

impl<'a, const D: usize> PartitionIter<'a, D> {
    pub fn new(list: &'a PartitionList<D>, codim: usize) -> Self {
        Self {
            partitions: list.as_slice(),
            directions: Direction::with_codim(codim).collect(),
            part: 0,
            dir: 0,
            cursor: None,
        }
    }

    fn open_next_box(&mut self) -> bool {
        while self.part < self.partitions.len() {
            let p = &self.partitions[self.part];
            if self.dir >= self.directions.len() {
                self.part += 1;
                self.dir = 0;
                continue;
            }
            let d = self.directions[self.dir];
            self.dir += 1;
            if p.is_empty_in(d) {
                continue;
            }
            let begin = MultiIndex::new(std::array::from_fn(|i| p.bound_for(0, i, d.bit(i))));
            let end = MultiIndex::new(std::array::from_fn(|i| p.bound_for(1, i, d.bit(i))));
            self.cursor = Some(Cursor {
                begin,
                end,
                id: begin,
                partition: p.number(),
            });
            return true;
        }
        false
    }
}

impl<const D: usize> Iterator for PartitionIter<'_, D> {
    type Item = EntityInfo<D>;

    fn next(&mut self) -> Option<EntityInfo<D>> {
        if self.cursor.is_none() && !self.open_next_box() {
            return None;
        }
        let cursor = self.cursor.as_mut()?;
        let item = EntityInfo {
            id: cursor.id,
            partition: cursor.partition,
        };
        let mut exhausted = true;
        for i in 0..D {
            cursor.id[i] += 2;
            if cursor.id[i] <= cursor.end[i] {
                exhausted = false;
                break;
            }
            cursor.id[i] = cursor.begin[i];
        }
        if exhausted {
            self.cursor = None;
        }
        Some(item)
    }
}

/// Number of entities with direction `dir` inside `partition`.
pub fn count_in<const D: usize>(partition: &Partition<D>, dir: Direction<D>) -> usize {
    if partition.is_empty_in(dir) {
        return 0;
    }
    (0..D)
        .map(|i| {
            let d = dir.bit(i);
            ((partition.bound_for(1, i, d) - partition.bound_for(0, i, d)) / 2 + 1) as usize
        })
        .product()
}

/// Number of entities of codimension `codim` enumerated over `list`.
pub fn entity_count<const D: usize>(list: &PartitionList<D>, codim: usize) -> usize {
    list.iter()
        .map(|p| Direction::with_codim(codim).map(|d| count_in(p, d)).sum::<usize>())
        .sum()
}
