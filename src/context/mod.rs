//! Solver context: the problem cache and the solve orchestrator.
//!
//! `LinearCache` owns the system (matrix, right-hand side, solution vector,
//! preconditioner handles, tolerances) together with a lazily allocated
//! per-algorithm workspace. Repeated solves against an unchanged system reuse
//! the workspace; replacing the matrix marks the cache stale and the next
//! solve reallocates.

use crate::config::{KrylovConfig, SolveOptions, RESERVED_OPTIONS};
use crate::error::KError;
use crate::matrix::SystemMatrix;
use crate::precond::Precond;
use crate::registry::resolve;
use crate::utils::convergence::ConvergenceStatus;
use crate::workspace::{AllocMode, Workspace};
use num_traits::Float;

/// Structural hints about the operator. Purely advisory: kernels do not
/// branch on these, but they are logged alongside verbose solves so a
/// mismatch between hint and algorithm choice is visible.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct OperatorAssumptions {
    pub symmetric: bool,
    pub positive_definite: bool,
}

/// Borrowed view of a finished solve.
///
/// `u` aliases the cache's solution vector; the next solve on the same cache
/// overwrites it in place.
#[derive(Debug)]
pub struct LinearSolution<'a, T> {
    /// Solution vector, owned by the cache.
    pub u: &'a [T],
    /// Final entry of the residual history.
    pub resid: T,
    /// Iterations performed by the kernel.
    pub iters: usize,
    pub status: ConvergenceStatus,
}

/// Problem cache: one linear system plus reusable solver state.
pub struct LinearCache<T> {
    a: SystemMatrix<T>,
    b: Vec<T>,
    /// Solution vector. Kernels accumulate into it, so a warm start is just
    /// leaving the previous solution in place.
    pub u: Vec<T>,
    pub pl: Precond<T>,
    pub pr: Precond<T>,
    pub abstol: T,
    pub reltol: T,
    pub maxiters: usize,
    pub verbose: bool,
    pub assumptions: OperatorAssumptions,
    isfresh: bool,
    workspace: Option<Workspace<T>>,
    allocations: usize,
}

impl<T: Float + Send + Sync> LinearCache<T> {
    /// Build a cache for `A u = b` with default tolerances (√ε) and an
    /// iteration cap of `b.len()`.
    ///
    /// # Panics
    ///
    /// Panics if `b.len() != a.nrows()`. Later replacements go through the
    /// fallible [`LinearCache::set_b`].
    pub fn new(a: SystemMatrix<T>, b: Vec<T>) -> Self {
        assert_eq!(
            b.len(),
            a.nrows(),
            "right-hand side length must equal the matrix row count"
        );
        let u = vec![T::zero(); a.ncols()];
        let maxiters = b.len();
        let tol = T::epsilon().sqrt();
        Self {
            a,
            b,
            u,
            pl: Precond::Identity,
            pr: Precond::Identity,
            abstol: tol,
            reltol: tol,
            maxiters,
            verbose: false,
            assumptions: OperatorAssumptions::default(),
            isfresh: true,
            workspace: None,
            allocations: 0,
        }
    }

    pub fn a(&self) -> &SystemMatrix<T> {
        &self.a
    }

    pub fn b(&self) -> &[T] {
        &self.b
    }

    /// Replace the matrix. Marks the cache stale so the next solve
    /// reallocates its workspace.
    pub fn set_a(&mut self, a: SystemMatrix<T>) {
        self.a = a;
        self.isfresh = true;
    }

    /// Replace the right-hand side; the shape must match the cached matrix.
    pub fn set_b(&mut self, b: Vec<T>) -> Result<(), KError> {
        if b.len() != self.a.nrows() {
            return Err(KError::ShapeMismatch { expected: self.a.nrows(), got: b.len() });
        }
        self.b = b;
        Ok(())
    }

    /// Replace the initial guess; the shape must match the cached matrix.
    pub fn set_u(&mut self, u: Vec<T>) -> Result<(), KError> {
        if u.len() != self.a.ncols() {
            return Err(KError::ShapeMismatch { expected: self.a.ncols(), got: u.len() });
        }
        self.u = u;
        Ok(())
    }

    /// Force workspace reallocation on the next solve.
    pub fn invalidate(&mut self) {
        self.isfresh = true;
    }

    pub fn is_fresh(&self) -> bool {
        self.isfresh
    }

    pub fn workspace(&self) -> Option<&Workspace<T>> {
        self.workspace.as_ref()
    }

    /// Number of real workspace allocations performed so far.
    pub fn allocations(&self) -> usize {
        self.allocations
    }

    /// Seed a zero-sized workspace of the right variant without touching the
    /// numeric state. The cache stays fresh, so the first solve still
    /// performs the real allocation.
    pub fn prepare(&mut self, cfg: &KrylovConfig) {
        let desc = resolve(cfg.alg);
        self.workspace = Some(Workspace::allocate(desc, &self.a, cfg, AllocMode::Placeholder));
    }

    /// Per-solve option set: tolerances and flags always come from the
    /// cache; user extras ride along, but reserved keys can never override
    /// the fixed options.
    fn assemble_options(&self, cfg: &KrylovConfig) -> SolveOptions<T> {
        let mut extra = cfg.options.clone();
        for key in RESERVED_OPTIONS {
            if extra.remove(key).is_some() {
                log::debug!("{}: dropping reserved option override `{key}`", cfg.alg);
            }
        }
        SolveOptions {
            abstol: self.abstol,
            reltol: self.reltol,
            maxiters: self.maxiters,
            verbose: u8::from(self.verbose),
            ldiv: true,
            history: true,
            extra,
        }
    }

    /// Run the configured algorithm against the cached system.
    ///
    /// Identity preconditioner sentinels are dropped before dispatch; a
    /// non-identity preconditioner on a side the algorithm does not support
    /// is dropped with a warning rather than an error. Not converging within
    /// the iteration cap is a status on the returned solution, not an error.
    pub fn solve(&mut self, cfg: &KrylovConfig) -> Result<LinearSolution<'_, T>, KError> {
        let desc = resolve(cfg.alg);

        let stale = self.isfresh
            || self
                .workspace
                .as_ref()
                .map(|ws| ws.kind() != desc.workspace || ws.nrows() != self.a.nrows())
                .unwrap_or(true);
        if stale {
            self.workspace = Some(Workspace::allocate(desc, &self.a, cfg, AllocMode::Real));
            self.allocations += 1;
            self.isfresh = false;
        }

        let mut pl = (!self.pl.is_identity()).then_some(&self.pl);
        if pl.is_some() && !desc.left_precond {
            log::warn!("{}: left preconditioning is not supported, ignoring Pl", desc.alg);
            pl = None;
        }
        let mut pr = (!self.pr.is_identity()).then_some(&self.pr);
        if pr.is_some() && !desc.right_precond {
            log::warn!("{}: right preconditioning is not supported, ignoring Pr", desc.alg);
            pr = None;
        }

        let opts = self.assemble_options(cfg);
        if self.verbose {
            log::debug!(
                "{}: n = {}, assumptions = {:?}",
                desc.alg,
                self.a.nrows(),
                self.assumptions
            );
        }

        let ws = self
            .workspace
            .as_mut()
            .expect("workspace allocated above");
        ws.run(&self.a, &self.b, &mut self.u, &opts, pl, pr);

        let resid = ws
            .residual_history()
            .last()
            .copied()
            .ok_or(KError::EmptyHistory)?;
        let status = if ws.converged() {
            ConvergenceStatus::Converged
        } else {
            ConvergenceStatus::MaxIterations
        };
        Ok(LinearSolution { u: &self.u, resid, iters: ws.iterations(), status })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use faer::Mat;

    fn spd_cache() -> LinearCache<f64> {
        let a = SystemMatrix::Dense(Mat::from_fn(3, 3, |i, j| {
            if i == j { (i + 2) as f64 } else { 0.0 }
        }));
        LinearCache::new(a, vec![2.0, 6.0, 12.0])
    }

    #[test]
    fn solve_reports_converged_status() {
        let mut cache = spd_cache();
        cache.abstol = 1e-12;
        cache.reltol = 1e-10;
        cache.maxiters = 10;
        let sol = cache.solve(&KrylovConfig::cg()).unwrap();
        assert_eq!(sol.status, ConvergenceStatus::Converged);
        for (ui, ei) in sol.u.iter().zip([1.0, 2.0, 3.0]) {
            assert!((ui - ei).abs() < 1e-8);
        }
    }

    #[test]
    fn iteration_cap_is_a_status_not_an_error() {
        let mut cache = spd_cache();
        cache.abstol = 1e-15;
        cache.reltol = 1e-15;
        cache.maxiters = 1;
        let sol = cache.solve(&KrylovConfig::cg()).unwrap();
        assert_eq!(sol.status, ConvergenceStatus::MaxIterations);
        assert_eq!(sol.iters, 1);
    }

    #[test]
    fn shape_mismatch_is_rejected() {
        let mut cache = spd_cache();
        assert!(matches!(
            cache.set_b(vec![1.0; 4]),
            Err(KError::ShapeMismatch { expected: 3, got: 4 })
        ));
        assert!(matches!(
            cache.set_u(vec![0.0; 2]),
            Err(KError::ShapeMismatch { expected: 3, got: 2 })
        ));
    }

    #[test]
    fn reserved_option_overrides_never_reach_the_kernel() {
        use crate::config::OptValue;

        let mut cache = spd_cache();
        cache.abstol = 1e-15;
        cache.reltol = 1e-15;
        cache.maxiters = 1;
        let cfg = KrylovConfig::cg()
            .with_option("maxiters", OptValue::Int(1000))
            .with_option("ldiv", OptValue::Bool(false))
            .with_option("history", OptValue::Bool(false))
            .with_option("itref", OptValue::Int(2));

        let opts = cache.assemble_options(&cfg);
        assert_eq!(opts.maxiters, 1, "cache's iteration cap must win");
        assert!(opts.ldiv && opts.history, "fixed flags must stay fixed");
        for key in crate::config::RESERVED_OPTIONS {
            assert!(!opts.extra.contains_key(key), "reserved key `{key}` leaked");
        }
        assert_eq!(opts.extra.get("itref"), Some(&OptValue::Int(2)));

        // The solve itself also honors the cache, not the override.
        let sol = cache.solve(&cfg).unwrap();
        assert_eq!(sol.iters, 1);
        assert_eq!(sol.status, ConvergenceStatus::MaxIterations);
    }

    #[test]
    #[should_panic(expected = "right-hand side length")]
    fn mismatched_rhs_length_panics_at_construction() {
        let a = SystemMatrix::Dense(Mat::from_fn(3, 3, |i, j| {
            if i == j { 1.0 } else { 0.0 }
        }));
        let _ = LinearCache::new(a, vec![1.0; 4]);
    }

    #[test]
    fn switching_algorithms_reallocates_the_workspace() {
        let mut cache = spd_cache();
        cache.solve(&KrylovConfig::cg()).unwrap();
        assert_eq!(cache.allocations(), 1);
        cache.u.iter_mut().for_each(|x| *x = 0.0);
        cache.solve(&KrylovConfig::minres()).unwrap();
        assert_eq!(cache.allocations(), 2);
    }
}
