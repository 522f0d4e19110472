//! Convergence tracking & tolerance checks for iterative solvers.

use num_traits::Float;

/// Stopping criteria: absolute tolerance, relative tolerance, iteration cap.
#[derive(Clone, Copy, Debug)]
pub struct Convergence<T> {
    pub abstol: T,
    pub reltol: T,
    pub maxiters: usize,
}

/// Terminal status of a solve. Non-convergence is a status, not an error.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ConvergenceStatus {
    /// Residual reached the requested tolerance.
    Converged,
    /// Iteration cap exhausted (or the method stagnated / broke down).
    MaxIterations,
}

impl<T: Float> Convergence<T> {
    /// Residual norm below which the solve counts as converged, given the
    /// initial residual norm `res0`.
    pub fn target(&self, res0: T) -> T {
        self.abstol.max(self.reltol * res0)
    }

    /// Whether `res` satisfies the stopping criterion relative to `res0`.
    pub fn converged(&self, res: T, res0: T) -> bool {
        res <= self.target(res0)
    }
}
