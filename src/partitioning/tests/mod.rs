use super::*;

use crate::topology::{Mesh, MultiIndex};

/// 2-D mesh helper.
pub(crate) fn mesh2(b: [i32; 2], e: [i32; 2]) -> Mesh<2> {
    Mesh::new(MultiIndex::new(b), MultiIndex::new(e))
}

#[test]
fn pools_of_a_decomposition_tile_the_domain() {
    let global = mesh2([0, 0], [6, 5]);
    let d = Decomposition::new(global, 4).unwrap();
    let overlap = MultiIndex::new([1, 1]);
    let mut owned = 0;
    for leaf in d.sub_meshes() {
        let pool = PartitionPool::new(&leaf, &global, &overlap, 0).unwrap();
        owned += pool.get(PartitionIteratorType::InteriorBorder).volume();
    }
    assert_eq!(owned, global.volume());
}

#[test]
fn every_cell_has_exactly_one_interior_owner() {
    let global = mesh2([0, 0], [5, 3]);
    let d = Decomposition::new(global, 3).unwrap();
    let pools: Vec<_> = d
        .sub_meshes()
        .iter()
        .map(|m| PartitionPool::new(m, &global, &MultiIndex::new([1, 1]), 0).unwrap())
        .collect();
    for x in 0..5 {
        for y in 0..3 {
            let cell = MultiIndex::new([2 * x + 1, 2 * y + 1]);
            let owners = pools
                .iter()
                .filter(|p| p.partition_type(&cell, 0) == PartitionType::Interior)
                .count();
            assert_eq!(owners, 1, "cell {cell}");
        }
    }
}
