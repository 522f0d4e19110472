//! Dense-matrix operator implementation on top of Faer.

use crate::core::traits::LinearOperator;
use faer::Mat;
use num_traits::Float;

impl<T: Float> LinearOperator<T> for Mat<T> {
    fn nrows(&self) -> usize {
        Mat::nrows(self)
    }

    fn ncols(&self) -> usize {
        Mat::ncols(self)
    }

    fn apply(&self, x: &[T], y: &mut [T]) {
        assert_eq!(Mat::ncols(self), x.len(), "input vector x has incorrect length");
        assert_eq!(Mat::nrows(self), y.len(), "output vector y has incorrect length");
        for i in 0..Mat::nrows(self) {
            y[i] = T::zero();
            for j in 0..Mat::ncols(self) {
                y[i] = y[i] + self[(i, j)] * x[j];
            }
        }
    }

    fn apply_transpose(&self, x: &[T], y: &mut [T]) {
        assert_eq!(Mat::nrows(self), x.len(), "input vector x has incorrect length");
        assert_eq!(Mat::ncols(self), y.len(), "output vector y has incorrect length");
        for j in 0..Mat::ncols(self) {
            y[j] = T::zero();
            for i in 0..Mat::nrows(self) {
                y[j] = y[j] + self[(i, j)] * x[i];
            }
        }
    }
}
