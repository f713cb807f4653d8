use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};

use mesh_lattice::algs::traversal::PartitionIter;
use mesh_lattice::overlap::Linkage;
use mesh_lattice::partitioning::{Decomposition, PartitionIteratorType, PartitionPool};
use mesh_lattice::topology::MultiIndex;

fn bench_decomposition(c: &mut Criterion) {
    let mut group = c.benchmark_group("decomposition");
    for &ranks in &[16usize, 256, 4096] {
        group.bench_with_input(BenchmarkId::from_parameter(ranks), &ranks, |b, &ranks| {
            b.iter(|| {
                let d = Decomposition::from_width(MultiIndex::new([512, 512, 256]), ranks).unwrap();
                black_box(d.sub_meshes())
            })
        });
    }
    group.finish();
}

fn bench_linkage(c: &mut Criterion) {
    let mut group = c.benchmark_group("linkage");
    for &ranks in &[8usize, 64, 512] {
        let d = Decomposition::from_width(MultiIndex::new([128, 128, 128]), ranks).unwrap();
        let meshes = d.sub_meshes();
        let pool =
            PartitionPool::new(&meshes[0], d.mesh(), &MultiIndex::splat(2), 0b111).unwrap();
        group.bench_with_input(BenchmarkId::from_parameter(ranks), &ranks, |b, _| {
            b.iter(|| black_box(Linkage::new(0, &pool, &meshes).unwrap()))
        });
    }
    group.finish();
}

fn bench_enumeration(c: &mut Criterion) {
    let d = Decomposition::from_width(MultiIndex::new([64, 64, 64]), 8).unwrap();
    let meshes = d.sub_meshes();
    let pool = PartitionPool::new(&meshes[0], d.mesh(), &MultiIndex::splat(1), 0).unwrap();
    let all = pool.get(PartitionIteratorType::All);
    let mut group = c.benchmark_group("enumeration");
    for codim in 0..=3 {
        group.bench_with_input(BenchmarkId::from_parameter(codim), &codim, |b, &codim| {
            b.iter(|| PartitionIter::new(all, codim).count())
        });
    }
    group.finish();
}

criterion_group!(benches, bench_decomposition, bench_linkage, bench_enumeration);
criterion_main!(benches);
