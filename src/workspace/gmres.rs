//! Restarted GMRES workspace (Saad §6.4).
//!
//! Modified Gram–Schmidt with one reorthogonalization pass, Givens rotations
//! for the least-squares update, happy-breakdown detection, and left/right
//! preconditioning. The Krylov basis and Hessenberg storage are sized by the
//! restart/memory parameter and reused across solves.

use crate::config::SolveOptions;
use crate::matrix::{MatKind, SystemMatrix};
use crate::precond::Precond;
use crate::utils::vecops::{axpy, dot, norm2};
use num_traits::{Float, ToPrimitive};

pub struct GmresWorkspace<T> {
    mat_kind: MatKind,
    n: usize,
    memory: usize,
    v: Vec<Vec<T>>,
    h: Vec<Vec<T>>,
    g: Vec<T>,
    cs: Vec<T>,
    sn: Vec<T>,
    y: Vec<T>,
    r: Vec<T>,
    z: Vec<T>,
    pr_v: Vec<T>,
    av: Vec<T>,
    residuals: Vec<T>,
    iterations: usize,
    converged: bool,
}

impl<T: Float + Send + Sync> GmresWorkspace<T> {
    pub fn new(mat_kind: MatKind, n: usize, memory: usize) -> Self {
        Self {
            mat_kind,
            n,
            memory,
            v: Vec::with_capacity(memory + 1),
            h: vec![vec![T::zero(); memory]; memory + 1],
            g: vec![T::zero(); memory + 1],
            cs: vec![T::zero(); memory],
            sn: vec![T::zero(); memory],
            y: vec![T::zero(); memory],
            r: vec![T::zero(); n],
            z: vec![T::zero(); n],
            pr_v: vec![T::zero(); n],
            av: vec![T::zero(); n],
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
        self.n
    }

    /// Number of Arnoldi vectors kept before restarting.
    pub fn memory(&self) -> usize {
        self.memory
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
        self.v.clear();
    }

    /// Apply previous Givens rotations to column `j` of H, form the rotation
    /// eliminating H[j+1][j], and update the residual vector g.
    fn apply_givens_and_update_g(
        h: &mut [Vec<T>],
        g: &mut [T],
        cs: &mut [T],
        sn: &mut [T],
        j: usize,
        epsilon: T,
    ) {
        for i in 0..j {
            let temp = cs[i] * h[i][j] + sn[i] * h[i + 1][j];
            h[i + 1][j] = -sn[i] * h[i][j] + cs[i] * h[i + 1][j];
            h[i][j] = temp;
        }
        let h_kk = h[j][j];
        let h_k1k = h[j + 1][j];
        let r = (h_kk * h_kk + h_k1k * h_k1k).sqrt();
        if r.abs() < epsilon {
            cs[j] = T::one();
            sn[j] = T::zero();
        } else {
            cs[j] = h_kk / r;
            sn[j] = h_k1k / r;
        }
        h[j][j] = cs[j] * h_kk + sn[j] * h_k1k;
        h[j + 1][j] = T::zero();
        let temp = cs[j] * g[j] + sn[j] * g[j + 1];
        g[j + 1] = -sn[j] * g[j] + cs[j] * g[j + 1];
        g[j] = temp;
    }

    /// Solve the upper-triangular system Hy = g, with zero-pivot protection.
    fn back_substitution(h: &[Vec<T>], g: &[T], y: &mut [T], m: usize, epsilon: T) {
        for i in (0..m).rev() {
            y[i] = g[i];
            for j in (i + 1)..m {
                y[i] = y[i] - h[i][j] * y[j];
            }
            if h[i][i].abs() > epsilon {
                y[i] = y[i] / h[i][i];
            } else {
                y[i] = T::zero();
            }
        }
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
        let epsilon = num_traits::cast::<f64, T>(1e-14).unwrap_or_else(T::epsilon);

        // True residual r = b - A x.
        a.apply(x, &mut self.av);
        for (ri, (bi, ai)) in self.r.iter_mut().zip(b.iter().zip(&self.av)) {
            *ri = *bi - *ai;
        }
        let mut beta_true = norm2(&self.r);
        let res0 = beta_true;
        if opts.history {
            self.residuals.push(beta_true);
        }
        if conv.converged(beta_true, res0) {
            self.converged = true;
            return;
        }

        let n_outer = conv.maxiters.div_ceil(self.memory.max(1));
        let mut iteration = 0;
        let mut res0_precond = T::zero();
        let mut first_cycle = true;

        for _ in 0..n_outer {
            // Preconditioned residual starts the Arnoldi basis.
            match pl {
                Some(m) => m.apply(&self.r, &mut self.z),
                None => self.z.copy_from_slice(&self.r),
            }
            let beta_p = norm2(&self.z);
            if beta_p.abs() < epsilon {
                break;
            }
            if first_cycle {
                res0_precond = beta_p;
                first_cycle = false;
            }
            self.v.clear();
            self.v.push(self.z.iter().map(|&zi| zi / beta_p).collect());
            for row in self.h.iter_mut() {
                row.iter_mut().for_each(|e| *e = T::zero());
            }
            self.g.iter_mut().for_each(|e| *e = T::zero());
            self.g[0] = beta_p;
            self.cs.iter_mut().for_each(|e| *e = T::zero());
            self.sn.iter_mut().for_each(|e| *e = T::zero());

            let mut m = 0;
            let mut happy_breakdown = false;
            for j in 0..self.memory {
                iteration += 1;
                // z = Pl⁻¹ A Pr⁻¹ v_j
                match pr {
                    Some(mr) => mr.apply(&self.v[j], &mut self.pr_v),
                    None => self.pr_v.copy_from_slice(&self.v[j]),
                }
                a.apply(&self.pr_v, &mut self.av);
                match pl {
                    Some(ml) => ml.apply(&self.av, &mut self.z),
                    None => self.z.copy_from_slice(&self.av),
                }
                // Modified Gram-Schmidt with one refinement pass.
                for i in 0..=j {
                    let hij = dot(&self.z, &self.v[i]);
                    self.h[i][j] = hij;
                    axpy(-hij, &self.v[i], &mut self.z);
                }
                for i in 0..=j {
                    let tmp = dot(&self.z, &self.v[i]);
                    self.h[i][j] = self.h[i][j] + tmp;
                    axpy(-tmp, &self.v[i], &mut self.z);
                }
                let h_next = norm2(&self.z);
                self.h[j + 1][j] = h_next;
                if h_next.abs() < epsilon {
                    happy_breakdown = true;
                } else {
                    self.v.push(self.z.iter().map(|&zi| zi / h_next).collect());
                }
                Self::apply_givens_and_update_g(
                    &mut self.h, &mut self.g, &mut self.cs, &mut self.sn, j, epsilon,
                );
                let est = self.g[j + 1].abs();
                self.iterations = iteration;
                if opts.history {
                    self.residuals.push(est);
                }
                m = j + 1;
                if happy_breakdown
                    || conv.converged(est, res0_precond)
                    || iteration >= conv.maxiters
                {
                    break;
                }
            }

            // Least-squares solve and solution update x += Pr⁻¹ (V y).
            Self::back_substitution(&self.h, &self.g, &mut self.y, m, epsilon);
            self.z.iter_mut().for_each(|e| *e = T::zero());
            for j in 0..m {
                axpy(self.y[j], &self.v[j], &mut self.z);
            }
            match pr {
                Some(mr) => {
                    mr.apply(&self.z, &mut self.pr_v);
                    axpy(T::one(), &self.pr_v, x);
                }
                None => axpy(T::one(), &self.z, x),
            }

            // True residual decides convergence and seeds the next cycle.
            a.apply(x, &mut self.av);
            for (ri, (bi, ai)) in self.r.iter_mut().zip(b.iter().zip(&self.av)) {
                *ri = *bi - *ai;
            }
            beta_true = norm2(&self.r);
            if opts.history {
                self.residuals.push(beta_true);
            }
            if conv.converged(beta_true, res0) {
                self.converged = true;
                break;
            }
            if iteration >= conv.maxiters {
                break;
            }
        }

        if opts.verbose > 0 {
            log::debug!(
                "gmres(memory = {}): iterations = {}, converged = {}, final residual = {:.4e}",
                self.memory,
                self.iterations,
                self.converged,
                beta_true.to_f64().unwrap_or(f64::NAN)
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

    fn nonsym_4x4() -> (SystemMatrix<f64>, Vec<f64>, Vec<f64>) {
        let data = [
            [4.0, 1.0, 0.0, 0.0],
            [1.0, 3.0, 1.0, 0.0],
            [0.0, 1.0, 2.0, 1.0],
            [0.0, 0.0, 1.0, 3.0],
        ];
        let a = SystemMatrix::Dense(Mat::from_fn(4, 4, |i, j| data[i][j]));
        let x_true = vec![1.0, 2.0, 3.0, 4.0];
        let mut b = vec![0.0; 4];
        a.apply(&x_true, &mut b);
        (a, x_true, b)
    }

    #[test]
    fn gmres_solves_well_conditioned_nonsym() {
        let (a, x_true, b) = nonsym_4x4();
        let mut x = vec![0.0; 4];
        let mut ws = GmresWorkspace::new(MatKind::Dense, 4, 4);
        ws.run(&a, &b, &mut x, &opts(100), None, None);
        for (xi, ei) in x.iter().zip(x_true.iter()) {
            assert!((xi - ei).abs() < 1e-8, "xi = {}, expected = {}", xi, ei);
        }
        assert!(ws.converged(), "GMRES did not converge");
    }

    #[test]
    fn gmres_with_left_jacobi() {
        let (a, x_true, b) = nonsym_4x4();
        let pc = Precond::jacobi(&a);
        let mut x = vec![0.0; 4];
        let mut ws = GmresWorkspace::new(MatKind::Dense, 4, 4);
        ws.run(&a, &b, &mut x, &opts(100), Some(&pc), None);
        for (xi, ei) in x.iter().zip(x_true.iter()) {
            assert!((xi - ei).abs() < 1e-8, "xi = {}, expected = {}", xi, ei);
        }
        assert!(ws.converged());
    }

    #[test]
    fn gmres_with_right_jacobi() {
        let (a, _x_true, b) = nonsym_4x4();
        let pc = Precond::jacobi(&a);
        let mut x = vec![0.0; 4];
        let mut ws = GmresWorkspace::new(MatKind::Dense, 4, 4);
        ws.run(&a, &b, &mut x, &opts(100), None, Some(&pc));
        let mut ax = vec![0.0; 4];
        a.apply(&x, &mut ax);
        let res = ax
            .iter()
            .zip(&b)
            .map(|(ai, bi)| (ai - bi).powi(2))
            .sum::<f64>()
            .sqrt();
        assert!(res < 1e-8, "residual norm = {res}");
    }

    #[test]
    fn small_restart_still_converges() {
        let (a, x_true, b) = nonsym_4x4();
        let mut x = vec![0.0; 4];
        let mut ws = GmresWorkspace::new(MatKind::Dense, 4, 2);
        ws.run(&a, &b, &mut x, &opts(200), None, None);
        for (xi, ei) in x.iter().zip(x_true.iter()) {
            assert!((xi - ei).abs() < 1e-6, "xi = {}, expected = {}", xi, ei);
        }
        assert!(ws.converged());
    }
}
