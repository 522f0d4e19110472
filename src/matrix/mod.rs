//! Matrix module: the tagged system-matrix representation and its backends.
//!
//! The dispatch layer never inspects matrix internals; it only needs shape
//! queries, forward/transpose products, and the representation kind (so
//! placeholder workspaces can preserve it).

pub mod dense;
pub mod sparse;

pub use sparse::CsrMatrix;

use crate::core::traits::LinearOperator;
use faer::Mat;
use num_traits::Float;

/// Representation kind of a system matrix. Placeholder workspaces carry this
/// tag so a cache seeded before the real problem is known stays type-correct.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MatKind {
    Dense,
    Sparse,
    Operator,
}

/// System matrix `A`, specialized on representation.
pub enum SystemMatrix<T> {
    /// Dense column-major storage (`faer::Mat`).
    Dense(Mat<T>),
    /// Compressed sparse row storage.
    Sparse(CsrMatrix<T>),
    /// Matrix-free operator supplied by the caller.
    Operator(Box<dyn LinearOperator<T> + Send + Sync>),
}

impl<T: Float + Send + Sync> SystemMatrix<T> {
    pub fn kind(&self) -> MatKind {
        match self {
            SystemMatrix::Dense(_) => MatKind::Dense,
            SystemMatrix::Sparse(_) => MatKind::Sparse,
            SystemMatrix::Operator(_) => MatKind::Operator,
        }
    }

    pub fn nrows(&self) -> usize {
        match self {
            SystemMatrix::Dense(m) => m.nrows(),
            SystemMatrix::Sparse(m) => m.nrows(),
            SystemMatrix::Operator(op) => op.nrows(),
        }
    }

    pub fn ncols(&self) -> usize {
        match self {
            SystemMatrix::Dense(m) => m.ncols(),
            SystemMatrix::Sparse(m) => m.ncols(),
            SystemMatrix::Operator(op) => op.ncols(),
        }
    }

    /// y = A · x.
    pub fn apply(&self, x: &[T], y: &mut [T]) {
        match self {
            SystemMatrix::Dense(m) => LinearOperator::apply(m, x, y),
            SystemMatrix::Sparse(m) => LinearOperator::apply(m, x, y),
            SystemMatrix::Operator(op) => op.apply(x, y),
        }
    }

    /// y = Aᵀ · x.
    pub fn apply_transpose(&self, x: &[T], y: &mut [T]) {
        match self {
            SystemMatrix::Dense(m) => LinearOperator::apply_transpose(m, x, y),
            SystemMatrix::Sparse(m) => LinearOperator::apply_transpose(m, x, y),
            SystemMatrix::Operator(op) => op.apply_transpose(x, y),
        }
    }
}

impl<T> From<Mat<T>> for SystemMatrix<T> {
    fn from(m: Mat<T>) -> Self {
        SystemMatrix::Dense(m)
    }
}

impl<T> From<CsrMatrix<T>> for SystemMatrix<T> {
    fn from(m: CsrMatrix<T>) -> Self {
        SystemMatrix::Sparse(m)
    }
}
