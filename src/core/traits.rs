//! Core linear-algebra traits for krydis.

/// An opaque linear operator A with forward and transpose products.
///
/// Dense (`faer::Mat`) and CSR matrices implement this; callers may also
/// supply their own matrix-free operators.
pub trait LinearOperator<T> {
    /// Number of rows.
    fn nrows(&self) -> usize;
    /// Number of columns.
    fn ncols(&self) -> usize;
    /// Compute y = A · x. `x.len() == ncols()`, `y.len() == nrows()`.
    fn apply(&self, x: &[T], y: &mut [T]);
    /// Compute y = Aᵀ · x. `x.len() == nrows()`, `y.len() == ncols()`.
    fn apply_transpose(&self, x: &[T], y: &mut [T]);
}
