//! Dispatch and cache behavior: placeholder seeding, lazy allocation,
//! invalidation, warm starts, and solution aliasing.

use faer::Mat;
use krydis::{
    AllocMode, ConvergenceStatus, CsrMatrix, KError, KrylovAlg, KrylovConfig, LinearCache,
    LinearOperator, MatKind, SystemMatrix, Workspace, WorkspaceKind,
};

fn dense_spd(n: usize) -> SystemMatrix<f64> {
    SystemMatrix::Dense(Mat::from_fn(n, n, |i, j| {
        if i == j {
            4.0
        } else if i.abs_diff(j) == 1 {
            -1.0
        } else {
            0.0
        }
    }))
}

struct Scale(f64, usize);

impl LinearOperator<f64> for Scale {
    fn nrows(&self) -> usize {
        self.1
    }
    fn ncols(&self) -> usize {
        self.1
    }
    fn apply(&self, x: &[f64], y: &mut [f64]) {
        for (yi, xi) in y.iter_mut().zip(x) {
            *yi = self.0 * xi;
        }
    }
    fn apply_transpose(&self, x: &[f64], y: &mut [f64]) {
        self.apply(x, y);
    }
}

#[test]
fn unknown_algorithm_name_is_an_error() {
    assert!(matches!(
        krydis::resolve_name("jacobi"),
        Err(KError::UnsupportedAlgorithm(_))
    ));
    assert_eq!(krydis::resolve_name("GMRES").unwrap().alg, KrylovAlg::Gmres);
}

#[test]
fn placeholder_preserves_matrix_kind_across_representations() {
    let cfg = KrylovConfig::bicgstab();
    let desc = krydis::resolve(KrylovAlg::Bicgstab);

    let dense = dense_spd(4);
    let sparse = SystemMatrix::from(CsrMatrix::from_csr(
        2,
        2,
        vec![0, 1, 2],
        vec![0, 1],
        vec![1.0, 1.0],
    ));
    let op = SystemMatrix::Operator(Box::new(Scale(2.0, 3)));

    for (a, kind) in [
        (&dense, MatKind::Dense),
        (&sparse, MatKind::Sparse),
        (&op, MatKind::Operator),
    ] {
        let ws = Workspace::allocate(desc, a, &cfg, AllocMode::Placeholder);
        assert_eq!(ws.kind(), WorkspaceKind::Bicgstab);
        assert_eq!(ws.mat_kind(), kind);
        assert_eq!(ws.nrows(), 0);
    }
}

#[test]
fn prepare_seeds_without_real_allocation() {
    let mut cache = LinearCache::new(dense_spd(10), vec![1.0; 10]);
    cache.prepare(&KrylovConfig::cg());
    assert!(cache.is_fresh());
    assert_eq!(cache.allocations(), 0);
    let ws = cache.workspace().expect("placeholder seeded");
    assert_eq!(ws.kind(), WorkspaceKind::Cg);
    assert_eq!(ws.nrows(), 0);

    // First solve swaps in the real workspace.
    cache.solve(&KrylovConfig::cg()).unwrap();
    assert_eq!(cache.allocations(), 1);
    assert_eq!(cache.workspace().unwrap().nrows(), 10);
}

#[test]
fn repeated_solves_reuse_the_workspace() {
    let mut cache = LinearCache::new(dense_spd(10), vec![1.0; 10]);
    cache.maxiters = 100;
    let cfg = KrylovConfig::cg();
    cache.solve(&cfg).unwrap();
    cache.solve(&cfg).unwrap();
    cache.solve(&cfg).unwrap();
    assert_eq!(cache.allocations(), 1);
}

#[test]
fn invalidation_forces_reallocation() {
    let mut cache = LinearCache::new(dense_spd(10), vec![1.0; 10]);
    cache.maxiters = 100;
    let cfg = KrylovConfig::cg();
    cache.solve(&cfg).unwrap();
    assert_eq!(cache.allocations(), 1);

    cache.invalidate();
    assert!(cache.is_fresh());
    cache.solve(&cfg).unwrap();
    assert_eq!(cache.allocations(), 2);

    // Replacing the matrix also marks the cache stale.
    cache.set_a(dense_spd(10));
    cache.solve(&cfg).unwrap();
    assert_eq!(cache.allocations(), 3);
}

#[test]
fn solution_borrows_the_cached_vector() {
    let mut cache = LinearCache::new(dense_spd(6), vec![1.0; 6]);
    cache.maxiters = 100;
    let before = cache.u.as_ptr();
    let sol = cache.solve(&KrylovConfig::cg()).unwrap();
    assert_eq!(sol.u.as_ptr(), before, "solution must alias the cache's vector");
}

#[test]
fn warm_start_from_the_previous_solution_is_free() {
    let mut cache = LinearCache::new(dense_spd(8), vec![1.0; 8]);
    cache.maxiters = 200;
    // Absolute tolerance only: the warm-started residual is already below
    // the target, so the second solve must stop at iteration zero.
    cache.abstol = 1e-8;
    cache.reltol = 0.0;
    let cfg = KrylovConfig::cg();
    let first = cache.solve(&cfg).unwrap();
    assert_eq!(first.status, ConvergenceStatus::Converged);
    assert!(first.iters > 0);

    // The solution stays in `u`, so solving again starts converged.
    let second = cache.solve(&cfg).unwrap();
    assert_eq!(second.status, ConvergenceStatus::Converged);
    assert_eq!(second.iters, 0);
}

#[test]
fn gmres_restart_controls_cached_memory() {
    let mut cache = LinearCache::new(dense_spd(50), vec![1.0; 50]);
    cache.maxiters = 200;
    cache.solve(&KrylovConfig::gmres()).unwrap();
    match cache.workspace().unwrap() {
        Workspace::Gmres(w) => assert_eq!(w.memory(), 20),
        _ => panic!("wrong workspace variant"),
    }

    cache.invalidate();
    cache.u.iter_mut().for_each(|x| *x = 0.0);
    cache.solve(&KrylovConfig::gmres().with_restart(7)).unwrap();
    match cache.workspace().unwrap() {
        Workspace::Gmres(w) => assert_eq!(w.memory(), 7),
        _ => panic!("wrong workspace variant"),
    }
}
