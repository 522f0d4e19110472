//! Least-squares workspace: CG on the normal equations AᵀA x = Aᵀb (CGNR).
//!
//! Handles rectangular systems; for an m×n matrix the residual buffers live
//! in row space (length m) and the direction buffers in column space
//! (length n). The reported history is ‖Aᵀr‖, the natural residual of the
//! normal equations.

use crate::config::SolveOptions;
use crate::matrix::{MatKind, SystemMatrix};
use crate::utils::vecops::{axpy, dot};
use num_traits::{Float, ToPrimitive};

pub struct LsmrWorkspace<T> {
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

impl<T: Float + Send + Sync> LsmrWorkspace<T> {
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

        // r = b - A x, z = Aᵀ r
        a.apply(x, &mut self.r);
        for (ri, bi) in self.r.iter_mut().zip(b) {
            *ri = *bi - *ri;
        }
        a.apply_transpose(&self.r, &mut self.z);
        self.p.copy_from_slice(&self.z);
        let mut gamma = dot(&self.z, &self.z);
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
            a.apply(&self.p, &mut self.q);
            let qq = dot(&self.q, &self.q);
            if qq <= T::zero() {
                log::warn!("lsmr: A·p vanished at iteration {i}");
                break;
            }
            let alpha = gamma / qq;
            axpy(alpha, &self.p, x);
            axpy(-alpha, &self.q, &mut self.r);
            a.apply_transpose(&self.r, &mut self.z);
            let gamma_new = dot(&self.z, &self.z);
            res = gamma_new.sqrt();
            self.iterations = i;
            if opts.history {
                self.residuals.push(res);
            }
            if conv.converged(res, res0) {
                self.converged = true;
                break;
            }
            let beta = gamma_new / gamma;
            for (pj, zj) in self.p.iter_mut().zip(&self.z) {
                *pj = *zj + beta * *pj;
            }
            gamma = gamma_new;
        }

        if opts.verbose > 0 {
            log::debug!(
                "lsmr: iterations = {}, converged = {}, final ‖Aᵀr‖ = {:.4e}",
                self.iterations,
                self.converged,
                res.to_f64().unwrap_or(f64::NAN)
            );
        }
    }
}
