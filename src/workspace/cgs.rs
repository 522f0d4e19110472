//! CGS (conjugate gradient squared) workspace.
//!
//! Sonneveld's transpose-free squaring of BiCG. Convergence can be erratic
//! compared to BiCGStab, but each iteration costs two matrix products and no
//! transpose application.

use crate::config::SolveOptions;
use crate::matrix::{MatKind, SystemMatrix};
use crate::precond::{apply_split, Precond};
use crate::utils::vecops::{axpy, dot, norm2};
use num_traits::{Float, ToPrimitive};

pub struct CgsWorkspace<T> {
    mat_kind: MatKind,
    n: usize,
    r: Vec<T>,
    rtilde: Vec<T>,
    p: Vec<T>,
    q: Vec<T>,
    u: Vec<T>,
    phat: Vec<T>,
    vhat: Vec<T>,
    uhat: Vec<T>,
    t: Vec<T>,
    tmp: Vec<T>,
    residuals: Vec<T>,
    iterations: usize,
    converged: bool,
}

impl<T: Float + Send + Sync> CgsWorkspace<T> {
    pub fn new(mat_kind: MatKind, n: usize) -> Self {
        Self {
            mat_kind,
            n,
            r: vec![T::zero(); n],
            rtilde: vec![T::zero(); n],
            p: vec![T::zero(); n],
            q: vec![T::zero(); n],
            u: vec![T::zero(); n],
            phat: vec![T::zero(); n],
            vhat: vec![T::zero(); n],
            uhat: vec![T::zero(); n],
            t: vec![T::zero(); n],
            tmp: vec![T::zero(); n],
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
        pr: Option<&Precond<T>>,
    ) {
        debug_assert!(opts.ldiv, "preconditioners are division-form");
        self.reset();
        let conv = opts.convergence();
        let tiny = T::epsilon() * T::epsilon();

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
        self.rtilde.copy_from_slice(&self.r);

        let mut rho = T::one();

        for i in 1..=conv.maxiters {
            let rho_new = dot(&self.rtilde, &self.r);
            if rho_new.abs() < tiny {
                log::warn!(
                    "cgs: rho breakdown ({:.4e}) at iteration {i}",
                    rho_new.to_f64().unwrap_or(f64::NAN)
                );
                break;
            }
            if i == 1 {
                self.u.copy_from_slice(&self.r);
                self.p.copy_from_slice(&self.u);
            } else {
                let beta = rho_new / rho;
                for j in 0..self.n {
                    self.u[j] = self.r[j] + beta * self.q[j];
                }
                for j in 0..self.n {
                    self.p[j] = self.u[j] + beta * (self.q[j] + beta * self.p[j]);
                }
            }
            rho = rho_new;

            apply_split(pl, pr, &self.p, &mut self.tmp, &mut self.phat);
            a.apply(&self.phat, &mut self.vhat);
            let den = dot(&self.rtilde, &self.vhat);
            if den.abs() < tiny {
                log::warn!("cgs: rtilde·vhat breakdown at iteration {i}");
                break;
            }
            let alpha = rho / den;
            for j in 0..self.n {
                self.q[j] = self.u[j] - alpha * self.vhat[j];
            }
            for j in 0..self.n {
                self.t[j] = self.u[j] + self.q[j];
            }
            apply_split(pl, pr, &self.t, &mut self.tmp, &mut self.uhat);
            axpy(alpha, &self.uhat, x);
            a.apply(&self.uhat, &mut self.t);
            axpy(-alpha, &self.t, &mut self.r);

            res = norm2(&self.r);
            self.iterations = i;
            if opts.history {
                self.residuals.push(res);
            }
            if conv.converged(res, res0) {
                self.converged = true;
                break;
            }
        }

        if opts.verbose > 0 {
            log::debug!(
                "cgs: iterations = {}, converged = {}, final residual = {:.4e}",
                self.iterations,
                self.converged,
                res.to_f64().unwrap_or(f64::NAN)
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use faer::Mat;
    use std::collections::BTreeMap;

    fn opts(maxiters: usize) -> SolveOptions<f64> {
        SolveOptions {
            abstol: 1e-12,
            reltol: 1e-10,
            maxiters,
            verbose: 0,
            ldiv: true,
            history: true,
            extra: BTreeMap::new(),
        }
    }

    #[test]
    fn cgs_solves_nonsymmetric() {
        let data = [[5.0, 1.0, 0.0], [1.0, 4.0, 2.0], [0.0, 2.0, 6.0]];
        let a = SystemMatrix::Dense(Mat::from_fn(3, 3, |i, j| data[i][j]));
        let x_true = vec![1.0, 2.0, -1.0];
        let mut b = vec![0.0; 3];
        a.apply(&x_true, &mut b);
        let mut x = vec![0.0; 3];
        let mut ws = CgsWorkspace::new(MatKind::Dense, 3);
        ws.run(&a, &b, &mut x, &opts(100), None, None);
        for (xi, ei) in x.iter().zip(&x_true) {
            assert!((xi - ei).abs() < 1e-7, "xi = {xi}, expected = {ei}");
        }
        assert!(ws.converged());
    }

    #[test]
    fn cgs_with_left_jacobi() {
        let data = [[10.0, 1.0], [2.0, 8.0]];
        let a = SystemMatrix::Dense(Mat::from_fn(2, 2, |i, j| data[i][j]));
        let x_true = vec![3.0, -1.0];
        let mut b = vec![0.0; 2];
        a.apply(&x_true, &mut b);
        let pc = Precond::jacobi(&a);
        let mut x = vec![0.0; 2];
        let mut ws = CgsWorkspace::new(MatKind::Dense, 2);
        ws.run(&a, &b, &mut x, &opts(50), Some(&pc), None);
        for (xi, ei) in x.iter().zip(&x_true) {
            assert!((xi - ei).abs() < 1e-7, "xi = {xi}, expected = {ei}");
        }
        assert!(ws.converged());
    }
}
