use mesh_lattice::grid::{Domain, Grid, GridConfig, GridDescriptor};
use mesh_lattice::mesh_error::MeshLatticeError;
use mesh_lattice::partitioning::PartitionIteratorType;
use mesh_lattice::topology::{MultiIndex, RefinementPolicy};

fn config() -> GridConfig<3> {
    GridConfig::new(Domain::new([0.0; 3], [2.0, 1.0, 1.0]), MultiIndex::new([8, 4, 4]))
        .with_overlap(MultiIndex::splat(1))
        .with_periodic(0b001)
}

#[test]
fn config_round_trips_through_json_and_bincode() {
    let c = config();
    let json = serde_json::to_string(&c).unwrap();
    assert_eq!(serde_json::from_str::<GridConfig<3>>(&json).unwrap(), c);
    let bytes = bincode::serialize(&c).unwrap();
    assert_eq!(bincode::deserialize::<GridConfig<3>>(&bytes).unwrap(), c);
}

#[test]
fn partial_json_falls_back_to_defaults() {
    let c: GridConfig<2> = serde_json::from_str(r#"{"cells":[4,2]}"#).unwrap();
    assert_eq!(c.cells, MultiIndex::new([4, 2]));
    assert_eq!(c.overlap, MultiIndex::zero());
    assert_eq!(c.domain, Domain::unit());
    assert_eq!(c.h(), [0.25, 0.5]);
}

#[test]
fn descriptor_survives_serialization_and_rebuilds_the_grid() {
    let mut grid = Grid::new(config(), 2, 4).unwrap();
    grid.refine(&RefinementPolicy::Anisotropic(0b110)).unwrap();
    grid.refine(&RefinementPolicy::Arbitrary(MultiIndex::new([3, 1, 1]))).unwrap();

    let json = serde_json::to_string(&grid.descriptor()).unwrap();
    let descriptor: GridDescriptor<3> = serde_json::from_str(&json).unwrap();
    assert_eq!(descriptor, grid.descriptor());

    let rebuilt = Grid::from_descriptor(&descriptor, 2, 4).unwrap();
    assert_eq!(rebuilt.max_level(), 2);
    assert_eq!(rebuilt.leaf().cells(), MultiIndex::new([24, 8, 8]));
    for (a, b) in grid.levels().iter().zip(rebuilt.levels()) {
        assert_eq!(a.local_mesh(), b.local_mesh());
        for kind in PartitionIteratorType::ALL {
            assert_eq!(a.partitions(kind), b.partitions(kind));
        }
    }
    assert!(matches!(
        Grid::from_descriptor(&descriptor, 0, 2),
        Err(MeshLatticeError::RankCountMismatch { expected: 4, actual: 2 })
    ));
}

#[test]
fn invalid_configs_are_rejected() {
    let bad = config().with_periodic(0b1000);
    assert!(matches!(
        Grid::new(bad, 0, 1),
        Err(MeshLatticeError::InvalidPeriodicity { .. })
    ));
    assert!(matches!(
        Grid::new(config(), 0, 0),
        Err(MeshLatticeError::RankOutOfRange { .. })
    ));
    let mut grid = Grid::new(config(), 0, 1).unwrap();
    assert!(matches!(
        grid.refine(&RefinementPolicy::Bisection(Some(3))),
        Err(MeshLatticeError::InvalidRefinement(_))
    ));
    assert_eq!(grid.max_level(), 0);
}

#[test]
fn leaf_spacing_follows_refinement() {
    let mut grid = Grid::new(config(), 0, 1).unwrap();
    grid.global_refine(2, &RefinementPolicy::Bisection(None)).unwrap();
    assert_eq!(grid.leaf().h(), &[0.125, 0.125, 0.25]);
    let cell = grid.leaf().geometry_cache(mesh_lattice::topology::Direction::full());
    assert_eq!(cell.volume(), 0.125 * 0.125 * 0.25);
}
