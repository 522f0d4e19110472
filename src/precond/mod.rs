//! Preconditioner handles for the dispatch layer.
//!
//! A preconditioner here is an opaque handle with a distinguished `Identity`
//! sentinel; the orchestrator tests the sentinel explicitly instead of
//! comparing against a concrete identity matrix. Application is always
//! division-form: `apply` computes z = M⁻¹ r.

use crate::matrix::SystemMatrix;
use num_traits::Float;

/// A custom preconditioner M ≈ A⁻¹, applied as z = M⁻¹ r.
pub trait PrecondOp<T>: Send + Sync {
    fn apply(&self, r: &[T], z: &mut [T]);
}

/// Preconditioner handle. `Identity` means "no preconditioning" and is
/// normalized away before the kernel is invoked.
pub enum Precond<T> {
    /// No-op sentinel.
    Identity,
    /// Diagonal (Jacobi) preconditioner; stores the inverted diagonal.
    Diagonal(Vec<T>),
    /// Caller-supplied operator.
    Operator(Box<dyn PrecondOp<T>>),
}

impl<T: Float + Send + Sync> Precond<T> {
    pub fn is_identity(&self) -> bool {
        matches!(self, Precond::Identity)
    }

    /// Jacobi preconditioner M⁻¹ = D⁻¹ built from the system matrix.
    ///
    /// Dense and sparse matrices expose their diagonal directly; opaque
    /// operators are probed with unit basis vectors.
    pub fn jacobi(a: &SystemMatrix<T>) -> Self {
        let diag = match a {
            SystemMatrix::Dense(m) => (0..m.nrows().min(m.ncols())).map(|i| m[(i, i)]).collect(),
            SystemMatrix::Sparse(m) => m.diagonal(),
            SystemMatrix::Operator(op) => {
                let n = op.nrows().min(op.ncols());
                let mut e = vec![T::zero(); op.ncols()];
                let mut col = vec![T::zero(); op.nrows()];
                let mut diag = vec![T::zero(); n];
                for (i, d) in diag.iter_mut().enumerate() {
                    e.iter_mut().for_each(|x| *x = T::zero());
                    e[i] = T::one();
                    op.apply(&e, &mut col);
                    *d = col[i];
                }
                diag
            }
        };
        let inv_diag = diag
            .into_iter()
            .map(|d| if d != T::zero() { T::one() / d } else { T::zero() })
            .collect();
        Precond::Diagonal(inv_diag)
    }

    /// z = M⁻¹ r.
    pub fn apply(&self, r: &[T], z: &mut [T]) {
        match self {
            Precond::Identity => z.copy_from_slice(r),
            Precond::Diagonal(inv_diag) => {
                for ((zi, ri), di) in z.iter_mut().zip(r).zip(inv_diag) {
                    *zi = *di * *ri;
                }
            }
            Precond::Operator(op) => op.apply(r, z),
        }
    }
}

/// Split application z = Pr⁻¹ Pl⁻¹ r, with either side optional.
///
/// `tmp` is caller-provided scratch, only touched when both sides are
/// present.
pub(crate) fn apply_split<T: Float + Send + Sync>(
    pl: Option<&Precond<T>>,
    pr: Option<&Precond<T>>,
    r: &[T],
    tmp: &mut [T],
    z: &mut [T],
) {
    match (pl, pr) {
        (None, None) => z.copy_from_slice(r),
        (Some(l), None) => l.apply(r, z),
        (None, Some(rp)) => rp.apply(r, z),
        (Some(l), Some(rp)) => {
            l.apply(r, tmp);
            rp.apply(tmp, z);
        }
    }
}
