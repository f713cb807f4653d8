use mesh_lattice::geometry::GeometryCache;
use mesh_lattice::mesh_error::MeshLatticeError;
use mesh_lattice::topology::Direction;

#[test]
fn cell_with_spacing_two_by_three() {
    let cell = GeometryCache::<f64, 2>::new(&[2.0, 3.0], Direction::from_bits(0b11));
    assert_eq!(cell.codimension(), 0);
    assert_eq!(cell.volume(), 6.0);
    let jt = cell.jacobian_transposed();
    assert_eq!(jt.to_dense(), vec![vec![2.0, 0.0], vec![0.0, 3.0]]);
    assert_eq!(jt.determinant().unwrap(), 6.0);
    let jit = cell.jacobian_inverse_transposed();
    assert_eq!(jit.to_dense(), vec![vec![0.5, 0.0], vec![0.0, 1.0 / 3.0]]);
}

#[test]
fn face_with_axis_zero_free() {
    let face = GeometryCache::<f64, 2>::new(&[2.0, 3.0], Direction::from_bits(0b01));
    assert_eq!(face.codimension(), 1);
    assert_eq!(face.volume(), 2.0);
    assert!(matches!(
        face.jacobian_transposed().determinant(),
        Err(MeshLatticeError::NotSquare { rows: 1, cols: 2 })
    ));
}

#[test]
fn jacobian_times_inverse_is_identity_on_free_axes() {
    let h = [0.5, 2.0, 4.0];
    for dir in Direction::<3>::all() {
        let c = GeometryCache::new(&h, dir);
        let local: Vec<f64> = (0..dir.mydimension()).map(|k| k as f64 + 1.0).collect();
        let mut global = [0.0; 3];
        c.jacobian_transposed().mtv(&local, &mut global);
        let mut back = vec![0.0; dir.mydimension()];
        c.jacobian_inverse_transposed().mtv(&global, &mut back);
        // J^T x then J^{-T}^T undoes the scaling on each free axis
        for (k, axis) in dir.free_axes().enumerate() {
            assert_eq!(global[axis], h[axis] * local[k]);
            assert_eq!(back[k], local[k]);
        }
    }
}
