//! MINRES workspace for symmetric (possibly indefinite) systems.
//!
//! Classical Paige–Saunders recurrence: preconditioned Lanczos with a QR
//! factorization of the tridiagonal maintained by Givens rotations. `phibar`
//! tracks the residual norm (in the preconditioned norm when a left
//! preconditioner is present) without forming the residual.

use crate::config::SolveOptions;
use crate::matrix::{MatKind, SystemMatrix};
use crate::precond::Precond;
use crate::utils::vecops::{axpy, dot, norm2};
use num_traits::{Float, ToPrimitive};
use std::collections::VecDeque;

/// Default length of the stagnation window when none is configured.
const DEFAULT_WINDOW: usize = 5;

pub struct MinresWorkspace<T> {
    mat_kind: MatKind,
    n: usize,
    window: usize,
    r1: Vec<T>,
    r2: Vec<T>,
    y: Vec<T>,
    v: Vec<T>,
    w: Vec<T>,
    w1: Vec<T>,
    w2: Vec<T>,
    recent: VecDeque<T>,
    residuals: Vec<T>,
    iterations: usize,
    converged: bool,
}

impl<T: Float + Send + Sync> MinresWorkspace<T> {
    pub fn new(mat_kind: MatKind, n: usize) -> Self {
        Self::with_window(mat_kind, n, DEFAULT_WINDOW)
    }

    /// Constructor with an explicit stagnation-window length.
    pub fn with_window(mat_kind: MatKind, n: usize, window: usize) -> Self {
        Self {
            mat_kind,
            n,
            window,
            r1: vec![T::zero(); n],
            r2: vec![T::zero(); n],
            y: vec![T::zero(); n],
            v: vec![T::zero(); n],
            w: vec![T::zero(); n],
            w1: vec![T::zero(); n],
            w2: vec![T::zero(); n],
            recent: VecDeque::with_capacity(window),
            residuals: Vec::new(),
            iterations: 0,
            converged: false,
        }
    }

    /// Zero-sized sentinel preserving the matrix representation kind.
    pub fn placeholder(mat_kind: MatKind) -> Self {
        Self::with_window(mat_kind, 0, 0)
    }

    pub fn mat_kind(&self) -> MatKind {
        self.mat_kind
    }

    pub fn nrows(&self) -> usize {
        self.n
    }

    pub fn window(&self) -> usize {
        self.window
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
        self.recent.clear();
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

        // r1 = b - A x
        a.apply(x, &mut self.v);
        for (ri, (bi, ai)) in self.r1.iter_mut().zip(b.iter().zip(&self.v)) {
            *ri = *bi - *ai;
        }
        let res0 = norm2(&self.r1);
        if opts.history {
            self.residuals.push(res0);
        }
        if conv.converged(res0, res0) {
            self.converged = true;
            return;
        }

        match pl {
            Some(m) => m.apply(&self.r1, &mut self.y),
            None => self.y.copy_from_slice(&self.r1),
        }
        let beta1_sq = dot(&self.r1, &self.y);
        if beta1_sq < T::zero() {
            log::warn!("minres: left preconditioner is indefinite (rᵀM⁻¹r < 0)");
            return;
        }
        let beta1 = beta1_sq.sqrt();
        if beta1 == T::zero() {
            self.converged = true;
            return;
        }

        let mut oldb = T::zero();
        let mut beta = beta1;
        let mut dbar = T::zero();
        let mut epsln = T::zero();
        let mut phibar = beta1;
        let mut cs = -T::one();
        let mut sn = T::zero();
        self.w.iter_mut().for_each(|e| *e = T::zero());
        self.w2.iter_mut().for_each(|e| *e = T::zero());
        self.r2.copy_from_slice(&self.r1);

        for itn in 1..=conv.maxiters {
            // Lanczos step.
            let s = T::one() / beta;
            for (vi, yi) in self.v.iter_mut().zip(&self.y) {
                *vi = *yi * s;
            }
            a.apply(&self.v, &mut self.y);
            if itn >= 2 {
                axpy(-(beta / oldb), &self.r1, &mut self.y);
            }
            let alfa = dot(&self.v, &self.y);
            axpy(-(alfa / beta), &self.r2, &mut self.y);
            self.r1.copy_from_slice(&self.r2);
            self.r2.copy_from_slice(&self.y);
            match pl {
                Some(m) => m.apply(&self.r2, &mut self.y),
                None => self.y.copy_from_slice(&self.r2),
            }
            oldb = beta;
            let beta_sq = dot(&self.r2, &self.y);
            if beta_sq < T::zero() {
                log::warn!("minres: left preconditioner is indefinite (rᵀM⁻¹r < 0)");
                break;
            }
            beta = beta_sq.sqrt();

            // Apply the previous rotation and compute the next one.
            let oldeps = epsln;
            let delta = cs * dbar + sn * alfa;
            let gbar = sn * dbar - cs * alfa;
            epsln = sn * beta;
            dbar = -cs * beta;
            let gamma = (gbar * gbar + beta * beta).sqrt().max(T::epsilon());
            cs = gbar / gamma;
            sn = beta / gamma;
            let phi = cs * phibar;
            phibar = sn * phibar;

            // Update the solution via the w recurrence.
            let denom = T::one() / gamma;
            self.w1.copy_from_slice(&self.w2);
            self.w2.copy_from_slice(&self.w);
            for i in 0..self.n {
                self.w[i] = (self.v[i] - oldeps * self.w1[i] - delta * self.w2[i]) * denom;
            }
            axpy(phi, &self.w, x);

            let res_est = phibar.abs();
            self.iterations = itn;
            if opts.history {
                self.residuals.push(res_est);
            }
            if conv.converged(res_est, res0) {
                self.converged = true;
                break;
            }
            // Stagnation over the configured window of residual estimates.
            if self.window > 0 {
                if self.recent.len() == self.window {
                    if let Some(oldest) = self.recent.pop_front() {
                        if res_est >= oldest {
                            log::warn!(
                                "minres: no residual progress over {} iterations, stopping at {itn}",
                                self.window
                            );
                            break;
                        }
                    }
                }
                self.recent.push_back(res_est);
            }
        }

        if opts.verbose > 0 {
            log::debug!(
                "minres(window = {}): iterations = {}, converged = {}, final residual = {:.4e}",
                self.window,
                self.iterations,
                self.converged,
                phibar.abs().to_f64().unwrap_or(f64::NAN)
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
            abstol: 1e-10,
            reltol: 1e-8,
            maxiters,
            verbose: 0,
            ldiv: true,
            history: true,
            extra: BTreeMap::new(),
        }
    }

    #[test]
    fn minres_solves_spd() {
        let data = [[4.0, 1.0, 0.0], [1.0, 3.0, 1.0], [0.0, 1.0, 2.0]];
        let a = SystemMatrix::Dense(Mat::from_fn(3, 3, |i, j| data[i][j]));
        let x_true = vec![1.0, 2.0, 3.0];
        let mut b = vec![0.0; 3];
        a.apply(&x_true, &mut b);
        let mut x = vec![0.0; 3];
        let mut ws = MinresWorkspace::new(MatKind::Dense, 3);
        ws.run(&a, &b, &mut x, &opts(100), None);
        let mut r = vec![0.0; 3];
        a.apply(&x, &mut r);
        let res = r
            .iter()
            .zip(&b)
            .map(|(ai, bi)| (bi - ai).powi(2))
            .sum::<f64>()
            .sqrt();
        assert!(res < 1e-7, "final residual = {res:.3e}");
        assert!(ws.converged(), "MINRES did not converge");
    }

    #[test]
    fn minres_solves_symmetric_indefinite() {
        // [[0,1],[1,0]] x = [1,1] has solution [1,1].
        let a = SystemMatrix::Dense(Mat::from_fn(2, 2, |i, j| if i != j { 1.0 } else { 0.0 }));
        let b = vec![1.0, 1.0];
        let mut x = vec![0.0; 2];
        let mut ws = MinresWorkspace::new(MatKind::Dense, 2);
        ws.run(&a, &b, &mut x, &opts(100), None);
        assert!((x[0] - 1.0).abs() < 1e-8 && (x[1] - 1.0).abs() < 1e-8, "x = {x:?}");
        assert!(ws.converged());
    }
}
