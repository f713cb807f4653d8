//! Closed-form geometry of axis-aligned entities.
//!
//! Every entity with direction `d` on a level with cell spacing `h` is an
//! axis-aligned box whose Jacobian only has entries on the free axes of `d`.
//! The matrices here store just those entries, so every product is
//! `O(min(rows, cols))`.

use num_traits::Float;

use crate::mesh_error::MeshLatticeError;
use crate::topology::Direction;

/// Diagonal entries together with the axis each one sits on.
#[derive(Clone, Debug, PartialEq)]
struct AxisDiagonal<T> {
    diag: Vec<T>,
    axes: Vec<usize>,
    rows: usize,
    cols: usize,
    /// Whether `A x` scatters onto the axes (true for `D x mydimension`).
    expands: bool,
}

impl<T: Float> AxisDiagonal<T> {
    /// `y[k] = op(y[k], diag[k] * x[axes[k]])`
    fn compress(&self, x: &[T], y: &mut [T], op: impl Fn(T, T) -> T) {
        for (k, (&a, &axis)) in self.diag.iter().zip(&self.axes).enumerate() {
            y[k] = op(y[k], a * x[axis]);
        }
    }

    /// `y[axes[k]] = op(y[axes[k]], diag[k] * x[k])`
    fn expand(&self, x: &[T], y: &mut [T], op: impl Fn(T, T) -> T) {
        for (k, (&a, &axis)) in self.diag.iter().zip(&self.axes).enumerate() {
            y[axis] = op(y[axis], a * x[k]);
        }
    }

    fn apply(&self, transpose: bool, x: &[T], y: &mut [T], op: impl Fn(T, T) -> T) {
        if self.expands != transpose {
            self.expand(x, y, op);
        } else {
            self.compress(x, y, op);
        }
    }

    /// Overwriting product; entries off the pattern become zero.
    fn assign(&self, transpose: bool, x: &[T], y: &mut [T]) {
        if self.expands != transpose {
            y.iter_mut().for_each(|v| *v = T::zero());
        }
        self.apply(transpose, x, y, |_, v| v);
    }

    fn product(&self) -> T {
        self.diag.iter().fold(T::one(), |acc, &a| acc * a)
    }

    fn norm2(&self) -> T {
        self.diag.iter().fold(T::zero(), |acc, &a| acc + a * a)
    }

    fn max_abs(&self) -> T {
        self.diag.iter().fold(T::zero(), |acc, &a| acc.max(a.abs()))
    }
}

/// Transposed Jacobian: `mydimension x D`, entry `(k, axes[k]) = h[axes[k]]`.
#[derive(Clone, Debug, PartialEq)]
pub struct JacobianTransposed<T, const D: usize> {
    inner: AxisDiagonal<T>,
}

/// Inverse transposed Jacobian: `D x mydimension`, entry
/// `(axes[k], k) = 1 / h[axes[k]]`.
#[derive(Clone, Debug, PartialEq)]
pub struct JacobianInverseTransposed<T, const D: usize> {
    inner: AxisDiagonal<T>,
}

macro_rules! axis_matrix_ops {
    ($ty:ident) => {
        impl<T: Float, const D: usize> $ty<T, D> {
            pub fn rows(&self) -> usize {
                self.inner.rows
            }

            pub fn cols(&self) -> usize {
                self.inner.cols
            }

            /// `y = A x`
            pub fn mv(&self, x: &[T], y: &mut [T]) {
                self.inner.assign(false, x, y);
            }

            /// `y = A^T x`
            pub fn mtv(&self, x: &[T], y: &mut [T]) {
                self.inner.assign(true, x, y);
            }

            /// `y += A x`
            pub fn umv(&self, x: &[T], y: &mut [T]) {
                self.inner.apply(false, x, y, |a, b| a + b);
            }

            /// `y += A^T x`
            pub fn umtv(&self, x: &[T], y: &mut [T]) {
                self.inner.apply(true, x, y, |a, b| a + b);
            }

            /// `y += alpha A x`
            pub fn usmv(&self, alpha: T, x: &[T], y: &mut [T]) {
                self.inner.apply(false, x, y, |a, b| a + alpha * b);
            }

            /// `y += alpha A^T x`
            pub fn usmtv(&self, alpha: T, x: &[T], y: &mut [T]) {
                self.inner.apply(true, x, y, |a, b| a + alpha * b);
            }

            /// `y -= A x`
            pub fn mmv(&self, x: &[T], y: &mut [T]) {
                self.inner.apply(false, x, y, |a, b| a - b);
            }

            /// `y -= A^T x`
            pub fn mmtv(&self, x: &[T], y: &mut [T]) {
                self.inner.apply(true, x, y, |a, b| a - b);
            }

            /// Product of the stored entries.
            pub fn det(&self) -> T {
                self.inner.product()
            }

            /// Determinant; only defined for square matrices (cells).
            pub fn determinant(&self) -> Result<T, MeshLatticeError> {
                if self.rows() != self.cols() {
                    return Err(MeshLatticeError::NotSquare {
                        rows: self.rows(),
                        cols: self.cols(),
                    });
                }
                Ok(self.det())
            }

            pub fn frobenius_norm(&self) -> T {
                self.inner.norm2().sqrt()
            }

            pub fn frobenius_norm2(&self) -> T {
                self.inner.norm2()
            }

            pub fn infinity_norm(&self) -> T {
                self.inner.max_abs()
            }

            /// Row-major dense copy.
            pub fn to_dense(&self) -> Vec<Vec<T>> {
                let mut dense = vec![vec![T::zero(); self.cols()]; self.rows()];
                for (k, (&a, &axis)) in self.inner.diag.iter().zip(&self.inner.axes).enumerate() {
                    if self.inner.expands {
                        dense[axis][k] = a;
                    } else {
                        dense[k][axis] = a;
                    }
                }
                dense
            }
        }
    };
}

axis_matrix_ops!(JacobianTransposed);
axis_matrix_ops!(JacobianInverseTransposed);

/// Cached geometry of all entities sharing one direction on one level.
#[derive(Clone, Debug, PartialEq)]
pub struct GeometryCache<T, const D: usize> {
    direction: Direction<D>,
    jacobian_transposed: JacobianTransposed<T, D>,
    jacobian_inverse_transposed: JacobianInverseTransposed<T, D>,
    volume: T,
}

impl<T: Float, const D: usize> GeometryCache<T, D> {
    pub fn new(h: &[T; D], direction: Direction<D>) -> Self {
        let axes: Vec<usize> = direction.free_axes().collect();
        let diag: Vec<T> = axes.iter().map(|&i| h[i]).collect();
        let inv: Vec<T> = diag.iter().map(|&a| a.recip()).collect();
        let mydim = axes.len();
        let jacobian_transposed = JacobianTransposed {
            inner: AxisDiagonal {
                diag,
                axes: axes.clone(),
                rows: mydim,
                cols: D,
                expands: false,
            },
        };
        let volume = jacobian_transposed.det();
        Self {
            direction,
            jacobian_transposed,
            jacobian_inverse_transposed: JacobianInverseTransposed {
                inner: AxisDiagonal {
                    diag: inv,
                    axes,
                    rows: D,
                    cols: mydim,
                    expands: true,
                },
            },
            volume,
        }
    }

    /// One cache per direction, indexed by the direction bits.
    pub fn for_all_directions(h: &[T; D]) -> Vec<Self> {
        Direction::<D>::all().map(|d| Self::new(h, d)).collect()
    }

    pub fn direction(&self) -> Direction<D> {
        self.direction
    }

    pub fn codimension(&self) -> usize {
        self.direction.codimension()
    }

    /// Measure of the entity; 1 for a vertex.
    pub fn volume(&self) -> T {
        self.volume
    }

    pub fn jacobian_transposed(&self) -> &JacobianTransposed<T, D> {
        &self.jacobian_transposed
    }

    pub fn jacobian_inverse_transposed(&self) -> &JacobianInverseTransposed<T, D> {
        &self.jacobian_inverse_transposed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cell_volume_and_diagonal() {
        let c = GeometryCache::<f64, 2>::new(&[2.0, 3.0], Direction::from_bits(0b11));
        assert_eq!(c.codimension(), 0);
        assert_eq!(c.volume(), 6.0);
        assert_eq!(
            c.jacobian_transposed().to_dense(),
            vec![vec![2.0, 0.0], vec![0.0, 3.0]]
        );
        assert_eq!(c.jacobian_transposed().determinant().unwrap(), 6.0);
    }

    #[test]
    fn face_products() {
        let c = GeometryCache::<f64, 2>::new(&[2.0, 3.0], Direction::from_bits(0b01));
        assert_eq!(c.volume(), 2.0);
        let jt = c.jacobian_transposed();
        assert_eq!((jt.rows(), jt.cols()), (1, 2));

        let mut y = [0.0];
        jt.mv(&[5.0, 7.0], &mut y);
        assert_eq!(y, [10.0]);
        jt.umv(&[1.0, 7.0], &mut y);
        assert_eq!(y, [12.0]);
        jt.usmv(0.5, &[1.0, 0.0], &mut y);
        assert_eq!(y, [13.0]);
        jt.mmv(&[1.0, 0.0], &mut y);
        assert_eq!(y, [11.0]);

        let mut z = [9.0, 9.0];
        jt.mtv(&[1.5], &mut z);
        assert_eq!(z, [3.0, 0.0]);
        jt.umtv(&[1.0], &mut z);
        jt.usmtv(2.0, &[1.0], &mut z);
        jt.mmtv(&[0.5], &mut z);
        assert_eq!(z, [8.0, 0.0]);

        assert!(matches!(
            jt.determinant(),
            Err(MeshLatticeError::NotSquare { rows: 1, cols: 2 })
        ));
    }

    #[test]
    fn inverse_transposed() {
        let c = GeometryCache::<f64, 2>::new(&[2.0, 4.0], Direction::from_bits(0b10));
        let jit = c.jacobian_inverse_transposed();
        assert_eq!((jit.rows(), jit.cols()), (2, 1));
        assert_eq!(jit.to_dense(), vec![vec![0.0], vec![0.25]]);
        let mut y = [1.0, 1.0];
        jit.mv(&[8.0], &mut y);
        assert_eq!(y, [0.0, 2.0]);
        let mut x = [0.0];
        jit.mtv(&[3.0, 8.0], &mut x);
        assert_eq!(x, [2.0]);
        assert_eq!(jit.det(), 0.25);
    }

    #[test]
    fn vertex_has_unit_volume_and_norms() {
        let v = GeometryCache::<f32, 3>::new(&[2.0, 3.0, 4.0], Direction::from_bits(0));
        assert_eq!(v.volume(), 1.0);
        assert_eq!(v.jacobian_transposed().rows(), 0);
        let c = GeometryCache::<f64, 2>::new(&[3.0, 4.0], Direction::full());
        assert_eq!(c.jacobian_transposed().frobenius_norm(), 5.0);
        assert_eq!(c.jacobian_transposed().frobenius_norm2(), 25.0);
        assert_eq!(c.jacobian_transposed().infinity_norm(), 4.0);
    }

    #[test]
    fn one_cache_per_direction() {
        let all = GeometryCache::<f64, 3>::for_all_directions(&[1.0, 2.0, 3.0]);
        assert_eq!(all.len(), 8);
        assert_eq!(all[0b101].volume(), 3.0);
        assert_eq!(all[0b101].codimension(), 1);
    }
}
