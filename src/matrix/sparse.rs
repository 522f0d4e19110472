// CSR matrix with forward and transpose products

use crate::core::traits::LinearOperator;
use num_traits::Float;

/// A read-only sparse matrix in compressed sparse row form.
pub struct CsrMatrix<T> {
    nrows: usize,
    ncols: usize,
    row_ptr: Vec<usize>,
    col_idx: Vec<usize>,
    values: Vec<T>,
}

impl<T: Float> CsrMatrix<T> {
    /// Build a CSR from raw row-ptr, col-idx, and values.
    pub fn from_csr(
        nrows: usize,
        ncols: usize,
        row_ptr: Vec<usize>,
        col_idx: Vec<usize>,
        values: Vec<T>,
    ) -> Self {
        assert_eq!(row_ptr.len(), nrows + 1, "row_ptr must have nrows + 1 entries");
        assert_eq!(col_idx.len(), values.len(), "col_idx and values must have equal length");
        assert_eq!(*row_ptr.last().unwrap_or(&0), values.len(), "row_ptr must end at nnz");
        assert!(col_idx.iter().all(|&j| j < ncols), "column index out of bounds");
        Self { nrows, ncols, row_ptr, col_idx, values }
    }

    pub fn nrows(&self) -> usize {
        self.nrows
    }

    pub fn ncols(&self) -> usize {
        self.ncols
    }

    /// Main diagonal, zero where a diagonal entry is structurally absent.
    pub fn diagonal(&self) -> Vec<T> {
        let n = self.nrows.min(self.ncols);
        let mut diag = vec![T::zero(); n];
        for i in 0..n {
            for k in self.row_ptr[i]..self.row_ptr[i + 1] {
                if self.col_idx[k] == i {
                    diag[i] = self.values[k];
                }
            }
        }
        diag
    }
}

impl<T: Float> LinearOperator<T> for CsrMatrix<T> {
    fn nrows(&self) -> usize {
        self.nrows
    }

    fn ncols(&self) -> usize {
        self.ncols
    }

    fn apply(&self, x: &[T], y: &mut [T]) {
        assert_eq!(x.len(), self.ncols);
        assert_eq!(y.len(), self.nrows);
        for i in 0..self.nrows {
            let mut sum = T::zero();
            for k in self.row_ptr[i]..self.row_ptr[i + 1] {
                sum = sum + self.values[k] * x[self.col_idx[k]];
            }
            y[i] = sum;
        }
    }

    fn apply_transpose(&self, x: &[T], y: &mut [T]) {
        assert_eq!(x.len(), self.nrows);
        assert_eq!(y.len(), self.ncols);
        for yj in y.iter_mut() {
            *yj = T::zero();
        }
        for i in 0..self.nrows {
            for k in self.row_ptr[i]..self.row_ptr[i + 1] {
                y[self.col_idx[k]] = y[self.col_idx[k]] + self.values[k] * x[i];
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identity_spmv() {
        // 3×3 identity in CSR: row_ptr=[0,1,2,3], col_idx=[0,1,2], vals=[1,1,1]
        let m = CsrMatrix::from_csr(3, 3, vec![0, 1, 2, 3], vec![0, 1, 2], vec![1.0, 1.0, 1.0]);
        let x = vec![2.0, 3.0, 5.0];
        let mut y = vec![0.0; 3];
        m.apply(&x, &mut y);
        assert_eq!(y, x);
    }

    #[test]
    fn simple_pattern() {
        // 2×3 matrix [[1,2,0],[0,3,4]]
        let m = CsrMatrix::from_csr(
            2,
            3,
            vec![0, 2, 4],
            vec![0, 1, 1, 2],
            vec![1.0, 2.0, 3.0, 4.0],
        );
        let x = vec![1.0, 1.0, 1.0];
        let mut y = vec![0.0; 2];
        m.apply(&x, &mut y);
        assert_eq!(y, vec![3.0, 7.0]);

        let z = vec![1.0, 1.0];
        let mut w = vec![0.0; 3];
        m.apply_transpose(&z, &mut w);
        assert_eq!(w, vec![1.0, 5.0, 4.0]);
    }

    #[test]
    fn diagonal_extraction() {
        // [[4,1],[0,9]]
        let m = CsrMatrix::from_csr(2, 2, vec![0, 2, 3], vec![0, 1, 1], vec![4.0, 1.0, 9.0]);
        assert_eq!(m.diagonal(), vec![4.0, 9.0]);
    }
}
