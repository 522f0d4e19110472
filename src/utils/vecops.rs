//! Vector reductions for the solver kernels, with optional Rayon parallelism.
//!
//! When the `rayon` feature is enabled (the default), dot products and norms
//! use parallel iterators; otherwise they fall back to sequential folds.

use num_traits::Float;

/// Computes the dot product of two slices: `xᵀ y`.
pub fn dot<T: Float + Send + Sync>(x: &[T], y: &[T]) -> T {
    assert_eq!(x.len(), y.len(), "vectors must have the same length");
    #[cfg(feature = "rayon")]
    {
        use rayon::prelude::*;
        x.par_iter()
            .zip(y.par_iter())
            .map(|(xi, yi)| *xi * *yi)
            .reduce(|| T::zero(), |acc, v| acc + v)
    }
    #[cfg(not(feature = "rayon"))]
    {
        x.iter()
            .zip(y.iter())
            .map(|(xi, yi)| *xi * *yi)
            .fold(T::zero(), |acc, v| acc + v)
    }
}

/// Computes the Euclidean norm of a slice: `‖x‖₂`.
pub fn norm2<T: Float + Send + Sync>(x: &[T]) -> T {
    #[cfg(feature = "rayon")]
    {
        use rayon::prelude::*;
        x.par_iter()
            .map(|xi| *xi * *xi)
            .reduce(|| T::zero(), |acc, v| acc + v)
            .sqrt()
    }
    #[cfg(not(feature = "rayon"))]
    {
        x.iter()
            .map(|xi| *xi * *xi)
            .fold(T::zero(), |acc, v| acc + v)
            .sqrt()
    }
}

/// y ← y + alpha · x.
pub fn axpy<T: Float>(alpha: T, x: &[T], y: &mut [T]) {
    for (yi, xi) in y.iter_mut().zip(x) {
        *yi = *yi + alpha * *xi;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dot_and_norm() {
        let x = vec![3.0f64, 4.0];
        assert_eq!(dot(&x, &x), 25.0);
        assert_eq!(norm2(&x), 5.0);
    }

    #[test]
    fn axpy_accumulates() {
        let x = vec![1.0f64, 2.0];
        let mut y = vec![10.0f64, 20.0];
        axpy(2.0, &x, &mut y);
        assert_eq!(y, vec![12.0, 24.0]);
    }
}
