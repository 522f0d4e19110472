//! Minimum-norm workspace: CG on the normal equations A Aᵀ y = b with
//! x = Aᵀ y, folded into the x-space recurrence (CGNE / Craig's method).
//!
//! For underdetermined consistent systems this converges to the minimum-norm
//! solution. The history tracks ‖b − A x‖.

use crate::config::SolveOptions;
use crate::matrix::{MatKind, SystemMatrix};
use crate::utils::vecops::{axpy, dot, norm2};
use num_traits::{Float, ToPrimitive};

pub struct CraigmrWorkspace<T> {
    mat_kind: MatKind,
    nrows: usize,
    ncols: usize,
    r: Vec<T>,
    q: Vec<T>,
    z: Vec<T>,
    p: Vec<T>,
    residuals: Vec<T>,
    iterations: usize,
    converged: bool,
}

impl<T: Float + Send + Sync> CraigmrWorkspace<T> {
    pub fn new(mat_kind: MatKind, nrows: usize, ncols: usize) -> Self {
        Self {
            mat_kind,
            nrows,
            ncols,
            r: vec![T::zero(); nrows],
            q: vec![T::zero(); nrows],
            z: vec![T::zero(); ncols],
            p: vec![T::zero(); ncols],
            residuals: Vec::new(),
            iterations: 0,
            converged: false,
        }
    }

    /// Zero-sized sentinel preserving the matrix representation kind.
    pub fn placeholder(mat_kind: MatKind) -> Self {
        Self::new(mat_kind, 0, 0)
    }

    pub fn mat_kind(&self) -> MatKind {
        self.mat_kind
    }

    pub fn nrows(&self) -> usize {
        self.nrows
    }

    pub fn ncols(&self) -> usize {
        self.ncols
    }

    pub fn residual_history(&self) -> &[T] {
        &self.residuals
    }

    pub fn iterations(&self) -> usize {
        self.iterations
    }

    pub fn converged(&self) -> bool {
        self.converged
    }

    fn reset(&mut self) {
        self.residuals.clear();
        self.iterations = 0;
        self.converged = false;
    }

    pub(crate) fn run(
        &mut self,
        a: &SystemMatrix<T>,
        b: &[T],
        x: &mut [T],
        opts: &SolveOptions<T>,
    ) {
        self.reset();
        let conv = opts.convergence();

        // r = b - A x, p = Aᵀ r
        a.apply(x, &mut self.r);
        for (ri, bi) in self.r.iter_mut().zip(b) {
            *ri = *bi - *ri;
        }
        a.apply_transpose(&self.r, &mut self.p);
        let mut gamma = dot(&self.r, &self.r);
        let mut res = gamma.sqrt();
        let res0 = res;
        if opts.history {
            self.residuals.push(res);
        }
        if conv.converged(res, res0) {
            self.converged = true;
            return;
        }

        for i in 1..=conv.maxiters {
            let pp = dot(&self.p, &self.p);
            if pp <= T::zero() {
                log::warn!("craigmr: Aᵀr vanished at iteration {i}");
                break;
            }
            let alpha = gamma / pp;
            a.apply(&self.p, &mut self.q);
            axpy(alpha, &self.p, x);
            axpy(-alpha, &self.q, &mut self.r);
            res = norm2(&self.r);
            self.iterations = i;
            if opts.history {
                self.residuals.push(res);
            }
            if conv.converged(res, res0) {
                self.converged = true;
                break;
            }
            let gamma_new = res * res;
            let beta = gamma_new / gamma;
            a.apply_transpose(&self.r, &mut self.z);
            for (pj, zj) in self.p.iter_mut().zip(&self.z) {
                *pj = *zj + beta * *pj;
            }
            gamma = gamma_new;
        }

        if opts.verbose > 0 {
            log::debug!(
                "craigmr: iterations = {}, converged = {}, final residual = {:.4e}",
                self.iterations,
                self.converged,
                res.to_f64().unwrap_or(f64::NAN)
            );
        }
    }
}
