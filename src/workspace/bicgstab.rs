//! BiCGStab workspace for general nonsymmetric systems.
//!
//! Van der Vorst's stabilized bi-conjugate gradient. Left and right
//! preconditioning are folded into a single split application K⁻¹ = Pr⁻¹ Pl⁻¹
//! applied to the search and stabilization directions.

use crate::config::SolveOptions;
use crate::matrix::{MatKind, SystemMatrix};
use crate::precond::{apply_split, Precond};
use crate::utils::vecops::{axpy, dot, norm2};
use num_traits::{Float, ToPrimitive};

pub struct BicgstabWorkspace<T> {
    mat_kind: MatKind,
    n: usize,
    r: Vec<T>,
    rhat: Vec<T>,
    p: Vec<T>,
    v: Vec<T>,
    s: Vec<T>,
    t: Vec<T>,
    y: Vec<T>,
    z: Vec<T>,
    tmp: Vec<T>,
    residuals: Vec<T>,
    iterations: usize,
    converged: bool,
}

impl<T: Float + Send + Sync> BicgstabWorkspace<T> {
    pub fn new(mat_kind: MatKind, n: usize) -> Self {
        Self {
            mat_kind,
            n,
            r: vec![T::zero(); n],
            rhat: vec![T::zero(); n],
            p: vec![T::zero(); n],
            v: vec![T::zero(); n],
            s: vec![T::zero(); n],
            t: vec![T::zero(); n],
            y: vec![T::zero(); n],
            z: vec![T::zero(); n],
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

        // r = b - A x, rhat fixed shadow residual.
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
        self.rhat.copy_from_slice(&self.r);

        let mut rho = T::one();
        let mut alpha = T::one();
        let mut omega = T::one();

        for i in 1..=conv.maxiters {
            let rho_new = dot(&self.rhat, &self.r);
            if rho_new.abs() < tiny {
                log::warn!(
                    "bicgstab: rho breakdown ({:.4e}) at iteration {i}",
                    rho_new.to_f64().unwrap_or(f64::NAN)
                );
                break;
            }
            if i == 1 {
                self.p.copy_from_slice(&self.r);
            } else {
                let beta = (rho_new / rho) * (alpha / omega);
                for j in 0..self.n {
                    self.p[j] = self.r[j] + beta * (self.p[j] - omega * self.v[j]);
                }
            }
            rho = rho_new;

            apply_split(pl, pr, &self.p, &mut self.tmp, &mut self.y);
            a.apply(&self.y, &mut self.v);
            let den = dot(&self.rhat, &self.v);
            if den.abs() < tiny {
                log::warn!(
                    "bicgstab: rhat·v breakdown ({:.4e}) at iteration {i}",
                    den.to_f64().unwrap_or(f64::NAN)
                );
                break;
            }
            alpha = rho / den;

            for j in 0..self.n {
                self.s[j] = self.r[j] - alpha * self.v[j];
            }
            res = norm2(&self.s);
            if conv.converged(res, res0) {
                axpy(alpha, &self.y, x);
                self.iterations = i;
                if opts.history {
                    self.residuals.push(res);
                }
                self.converged = true;
                break;
            }

            apply_split(pl, pr, &self.s, &mut self.tmp, &mut self.z);
            a.apply(&self.z, &mut self.t);
            let tt = dot(&self.t, &self.t);
            if tt < tiny {
                log::warn!("bicgstab: t·t breakdown at iteration {i}");
                break;
            }
            omega = dot(&self.t, &self.s) / tt;

            for j in 0..self.n {
                x[j] = x[j] + alpha * self.y[j] + omega * self.z[j];
            }
            for j in 0..self.n {
                self.r[j] = self.s[j] - omega * self.t[j];
            }
            res = norm2(&self.r);
            self.iterations = i;
            if opts.history {
                self.residuals.push(res);
            }
            if conv.converged(res, res0) {
                self.converged = true;
                break;
            }
            if omega.abs() < tiny {
                log::warn!("bicgstab: omega breakdown at iteration {i}");
                break;
            }
        }

        if opts.verbose > 0 {
            log::debug!(
                "bicgstab: iterations = {}, converged = {}, final residual = {:.4e}",
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

    fn nonsym() -> SystemMatrix<f64> {
        let data = [[4.0, 1.0, 0.0], [2.0, 5.0, 1.0], [0.0, 1.0, 3.0]];
        SystemMatrix::Dense(Mat::from_fn(3, 3, |i, j| data[i][j]))
    }

    #[test]
    fn bicgstab_solves_nonsymmetric() {
        let a = nonsym();
        let x_true = vec![1.0, -2.0, 0.5];
        let mut b = vec![0.0; 3];
        a.apply(&x_true, &mut b);
        let mut x = vec![0.0; 3];
        let mut ws = BicgstabWorkspace::new(MatKind::Dense, 3);
        ws.run(&a, &b, &mut x, &opts(100), None, None);
        for (xi, ei) in x.iter().zip(&x_true) {
            assert!((xi - ei).abs() < 1e-7, "xi = {xi}, expected = {ei}");
        }
        assert!(ws.converged());
    }

    #[test]
    fn bicgstab_with_right_jacobi() {
        let a = nonsym();
        let x_true = vec![0.5, 1.5, -1.0];
        let mut b = vec![0.0; 3];
        a.apply(&x_true, &mut b);
        let pc = Precond::jacobi(&a);
        let mut x = vec![0.0; 3];
        let mut ws = BicgstabWorkspace::new(MatKind::Dense, 3);
        ws.run(&a, &b, &mut x, &opts(100), None, Some(&pc));
        for (xi, ei) in x.iter().zip(&x_true) {
            assert!((xi - ei).abs() < 1e-7, "xi = {xi}, expected = {ei}");
        }
        assert!(ws.converged());
    }
}
