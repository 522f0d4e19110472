//! Conjugate Gradient workspace (Saad §6.1 / §9.2 with left preconditioning).

use crate::config::SolveOptions;
use crate::matrix::{MatKind, SystemMatrix};
use crate::precond::Precond;
use crate::utils::vecops::{axpy, dot, norm2};
use num_traits::{Float, ToPrimitive};

/// Stateful CG workspace: residual, search direction, and scratch vectors are
/// allocated once per system shape and reused across solves.
pub struct CgWorkspace<T> {
    mat_kind: MatKind,
    n: usize,
    r: Vec<T>,
    z: Vec<T>,
    p: Vec<T>,
    ap: Vec<T>,
    residuals: Vec<T>,
    iterations: usize,
    converged: bool,
}

impl<T: Float + Send + Sync> CgWorkspace<T> {
    pub fn new(mat_kind: MatKind, n: usize) -> Self {
        Self {
            mat_kind,
            n,
            r: vec![T::zero(); n],
            z: vec![T::zero(); n],
            p: vec![T::zero(); n],
            ap: vec![T::zero(); n],
            residuals: Vec::new(),
            iterations: 0,
            converged: false,
        }
    }

    /// Zero-sized sentinel preserving the matrix representation kind.
    pub fn placeholder(mat_kind: MatKind) -> Self {
        Self::new(mat_kind, 0)
    }

    pub fn mat_kind(&self) -> MatKind {
        self.mat_kind
    }

    pub fn nrows(&self) -> usize {
        self.n
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
        pl: Option<&Precond<T>>,
    ) {
        debug_assert!(opts.ldiv, "preconditioners are division-form");
        self.reset();
        let conv = opts.convergence();

        // r = b - A x
        a.apply(x, &mut self.r);
        for (ri, bi) in self.r.iter_mut().zip(b) {
            *ri = *bi - *ri;
        }
        let mut res = norm2(&self.r);
        let res0 = res;
        if opts.history {
            self.residuals.push(res);
        }
        if conv.converged(res, res0) {
            self.converged = true;
            return;
        }

        match pl {
            Some(m) => m.apply(&self.r, &mut self.z),
            None => self.z.copy_from_slice(&self.r),
        }
        self.p.copy_from_slice(&self.z);
        let mut rz = dot(&self.r, &self.z);

        for i in 1..=conv.maxiters {
            a.apply(&self.p, &mut self.ap);
            let denom = dot(&self.p, &self.ap);
            if denom <= T::zero() {
                log::warn!(
                    "cg: non-positive curvature p·Ap = {:.4e} at iteration {i}",
                    denom.to_f64().unwrap_or(f64::NAN)
                );
                break;
            }
            let alpha = rz / denom;
            axpy(alpha, &self.p, x);
            axpy(-alpha, &self.ap, &mut self.r);
            res = norm2(&self.r);
            self.iterations = i;
            if opts.history {
                self.residuals.push(res);
            }
            if conv.converged(res, res0) {
                self.converged = true;
                break;
            }
            match pl {
                Some(m) => m.apply(&self.r, &mut self.z),
                None => self.z.copy_from_slice(&self.r),
            }
            let rz_new = dot(&self.r, &self.z);
            let beta = rz_new / rz;
            for (pj, zj) in self.p.iter_mut().zip(&self.z) {
                *pj = *zj + beta * *pj;
            }
            rz = rz_new;
        }

        if opts.verbose > 0 {
            log::debug!(
                "cg: iterations = {}, converged = {}, final residual = {:.4e}",
                self.iterations,
                self.converged,
                res.to_f64().unwrap_or(f64::NAN)
            );
        }
    }
}
