#![allow(dead_code)]
use mesh_lattice::algs::communicator::LocalComm;
use mesh_lattice::overlap::Linkage;
use mesh_lattice::partitioning::{Decomposition, PartitionPool};
use mesh_lattice::topology::MultiIndex;

/// Pools and linkages of every rank of a decomposition of `[0, width)`.
pub fn ranks<const D: usize>(
    width: [i32; D],
    size: usize,
    overlap: [i32; D],
    periodic: u32,
) -> Vec<(PartitionPool<D>, Linkage<D>)> {
    let d = Decomposition::from_width(MultiIndex::new(width), size).unwrap();
    let meshes = d.sub_meshes();
    (0..size)
        .map(|r| {
            let pool =
                PartitionPool::new(&meshes[r], d.mesh(), &MultiIndex::new(overlap), periodic)
                    .unwrap();
            let linkage = Linkage::new(r, &pool, &meshes).unwrap();
            (pool, linkage)
        })
        .collect()
}

/// Run `f` once per rank of an in-process universe, each on its own thread,
/// and collect the results in rank order.
pub fn on_threads<T, F>(size: usize, f: F) -> Vec<T>
where
    T: Send,
    F: Fn(&LocalComm) -> T + Sync,
{
    let comms = LocalComm::universe(size);
    let f = &f;
    std::thread::scope(|s| {
        let handles: Vec<_> = comms.iter().map(|c| s.spawn(move || f(c))).collect();
        handles.into_iter().map(|h| h.join().unwrap()).collect()
    })
}
