//! Per-algorithm workspaces and their allocation factory.
//!
//! Each Krylov kernel owns a workspace struct holding every vector it needs,
//! sized once for a given system shape and reused across repeated solves.
//! The factory can also hand out zero-sized placeholders so a cache can be
//! seeded with the right workspace variant before any numeric work happens.

pub mod bicgstab;
pub mod cg;
pub mod cgs;
pub mod craigmr;
pub mod gmres;
pub mod lsmr;
pub mod minres;

pub use bicgstab::BicgstabWorkspace;
pub use cg::CgWorkspace;
pub use cgs::CgsWorkspace;
pub use craigmr::CraigmrWorkspace;
pub use gmres::GmresWorkspace;
pub use lsmr::LsmrWorkspace;
pub use minres::MinresWorkspace;

use crate::config::{KrylovConfig, SolveOptions};
use crate::matrix::{MatKind, SystemMatrix};
use crate::precond::Precond;
use crate::registry::{AlgorithmDescriptor, WorkspaceKind};
use num_traits::Float;

/// Fallback Arnoldi memory when no restart length is configured.
const DEFAULT_GMRES_MEMORY: usize = 20;

/// Whether to allocate real iteration vectors or a zero-sized stand-in.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AllocMode {
    /// Zero-sized workspace carrying only the variant and matrix kind.
    Placeholder,
    /// Fully sized buffers for the given system.
    Real,
}

/// A solver workspace, tagged by algorithm.
pub enum Workspace<T> {
    Cg(CgWorkspace<T>),
    Minres(MinresWorkspace<T>),
    Gmres(GmresWorkspace<T>),
    Bicgstab(BicgstabWorkspace<T>),
    Cgs(CgsWorkspace<T>),
    Lsmr(LsmrWorkspace<T>),
    Craigmr(CraigmrWorkspace<T>),
}

impl<T: Float + Send + Sync> Workspace<T> {
    /// Build the workspace the descriptor calls for.
    ///
    /// `Placeholder` mode ignores the system dimensions (and the restart and
    /// window settings) but still records the matrix representation kind, so
    /// a later real allocation can be checked against it.
    pub fn allocate(
        desc: &AlgorithmDescriptor,
        a: &SystemMatrix<T>,
        cfg: &KrylovConfig,
        mode: AllocMode,
    ) -> Self {
        let kind = a.kind();
        if mode == AllocMode::Placeholder {
            return match desc.workspace {
                WorkspaceKind::Cg => Workspace::Cg(CgWorkspace::placeholder(kind)),
                WorkspaceKind::Minres => Workspace::Minres(MinresWorkspace::placeholder(kind)),
                WorkspaceKind::Gmres => Workspace::Gmres(GmresWorkspace::placeholder(kind)),
                WorkspaceKind::Bicgstab => {
                    Workspace::Bicgstab(BicgstabWorkspace::placeholder(kind))
                }
                WorkspaceKind::Cgs => Workspace::Cgs(CgsWorkspace::placeholder(kind)),
                WorkspaceKind::Lsmr => Workspace::Lsmr(LsmrWorkspace::placeholder(kind)),
                WorkspaceKind::Craigmr => Workspace::Craigmr(CraigmrWorkspace::placeholder(kind)),
            };
        }
        let nrows = a.nrows();
        let ncols = a.ncols();
        match desc.workspace {
            WorkspaceKind::Cg => Workspace::Cg(CgWorkspace::new(kind, nrows)),
            WorkspaceKind::Minres => {
                let ws = if cfg.window != 0 {
                    MinresWorkspace::with_window(kind, nrows, cfg.window)
                } else {
                    MinresWorkspace::new(kind, nrows)
                };
                Workspace::Minres(ws)
            }
            WorkspaceKind::Gmres => {
                let memory = if cfg.gmres_restart != 0 {
                    cfg.gmres_restart
                } else {
                    DEFAULT_GMRES_MEMORY.min(nrows)
                };
                Workspace::Gmres(GmresWorkspace::new(kind, nrows, memory))
            }
            WorkspaceKind::Bicgstab => Workspace::Bicgstab(BicgstabWorkspace::new(kind, nrows)),
            WorkspaceKind::Cgs => Workspace::Cgs(CgsWorkspace::new(kind, nrows)),
            WorkspaceKind::Lsmr => Workspace::Lsmr(LsmrWorkspace::new(kind, nrows, ncols)),
            WorkspaceKind::Craigmr => Workspace::Craigmr(CraigmrWorkspace::new(kind, nrows, ncols)),
        }
    }

    pub fn kind(&self) -> WorkspaceKind {
        match self {
            Workspace::Cg(_) => WorkspaceKind::Cg,
            Workspace::Minres(_) => WorkspaceKind::Minres,
            Workspace::Gmres(_) => WorkspaceKind::Gmres,
            Workspace::Bicgstab(_) => WorkspaceKind::Bicgstab,
            Workspace::Cgs(_) => WorkspaceKind::Cgs,
            Workspace::Lsmr(_) => WorkspaceKind::Lsmr,
            Workspace::Craigmr(_) => WorkspaceKind::Craigmr,
        }
    }

    pub fn mat_kind(&self) -> MatKind {
        match self {
            Workspace::Cg(w) => w.mat_kind(),
            Workspace::Minres(w) => w.mat_kind(),
            Workspace::Gmres(w) => w.mat_kind(),
            Workspace::Bicgstab(w) => w.mat_kind(),
            Workspace::Cgs(w) => w.mat_kind(),
            Workspace::Lsmr(w) => w.mat_kind(),
            Workspace::Craigmr(w) => w.mat_kind(),
        }
    }

    pub fn nrows(&self) -> usize {
        match self {
            Workspace::Cg(w) => w.nrows(),
            Workspace::Minres(w) => w.nrows(),
            Workspace::Gmres(w) => w.nrows(),
            Workspace::Bicgstab(w) => w.nrows(),
            Workspace::Cgs(w) => w.nrows(),
            Workspace::Lsmr(w) => w.nrows(),
            Workspace::Craigmr(w) => w.nrows(),
        }
    }

    pub fn residual_history(&self) -> &[T] {
        match self {
            Workspace::Cg(w) => w.residual_history(),
            Workspace::Minres(w) => w.residual_history(),
            Workspace::Gmres(w) => w.residual_history(),
            Workspace::Bicgstab(w) => w.residual_history(),
            Workspace::Cgs(w) => w.residual_history(),
            Workspace::Lsmr(w) => w.residual_history(),
            Workspace::Craigmr(w) => w.residual_history(),
        }
    }

    pub fn iterations(&self) -> usize {
        match self {
            Workspace::Cg(w) => w.iterations(),
            Workspace::Minres(w) => w.iterations(),
            Workspace::Gmres(w) => w.iterations(),
            Workspace::Bicgstab(w) => w.iterations(),
            Workspace::Cgs(w) => w.iterations(),
            Workspace::Lsmr(w) => w.iterations(),
            Workspace::Craigmr(w) => w.iterations(),
        }
    }

    pub fn converged(&self) -> bool {
        match self {
            Workspace::Cg(w) => w.converged(),
            Workspace::Minres(w) => w.converged(),
            Workspace::Gmres(w) => w.converged(),
            Workspace::Bicgstab(w) => w.converged(),
            Workspace::Cgs(w) => w.converged(),
            Workspace::Lsmr(w) => w.converged(),
            Workspace::Craigmr(w) => w.converged(),
        }
    }

    /// Dispatch to the kernel. The preconditioner slots have already been
    /// normalized: identity sentinels are `None`, and sides the algorithm
    /// does not support are dropped upstream.
    pub(crate) fn run(
        &mut self,
        a: &SystemMatrix<T>,
        b: &[T],
        x: &mut [T],
        opts: &SolveOptions<T>,
        pl: Option<&Precond<T>>,
        pr: Option<&Precond<T>>,
    ) {
        match self {
            Workspace::Cg(w) => w.run(a, b, x, opts, pl),
            Workspace::Minres(w) => w.run(a, b, x, opts, pl),
            Workspace::Gmres(w) => w.run(a, b, x, opts, pl, pr),
            Workspace::Bicgstab(w) => w.run(a, b, x, opts, pl, pr),
            Workspace::Cgs(w) => w.run(a, b, x, opts, pl, pr),
            Workspace::Lsmr(w) => w.run(a, b, x, opts),
            Workspace::Craigmr(w) => w.run(a, b, x, opts),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::{resolve, KrylovAlg};
    use faer::Mat;

    fn dense_eye(n: usize) -> SystemMatrix<f64> {
        SystemMatrix::Dense(Mat::from_fn(n, n, |i, j| if i == j { 1.0 } else { 0.0 }))
    }

    #[test]
    fn placeholder_is_zero_sized_but_typed() {
        let a = dense_eye(8);
        let cfg = KrylovConfig::gmres();
        let ws = Workspace::allocate(resolve(KrylovAlg::Gmres), &a, &cfg, AllocMode::Placeholder);
        assert_eq!(ws.kind(), WorkspaceKind::Gmres);
        assert_eq!(ws.mat_kind(), MatKind::Dense);
        assert_eq!(ws.nrows(), 0);
    }

    #[test]
    fn real_allocation_sizes_to_the_system() {
        let a = dense_eye(8);
        let cfg = KrylovConfig::cg();
        let ws = Workspace::allocate(resolve(KrylovAlg::Cg), &a, &cfg, AllocMode::Real);
        assert_eq!(ws.nrows(), 8);
    }

    #[test]
    fn gmres_memory_follows_restart_policy() {
        let a = dense_eye(50);
        let auto = Workspace::allocate(
            resolve(KrylovAlg::Gmres),
            &a,
            &KrylovConfig::gmres(),
            AllocMode::Real,
        );
        match auto {
            Workspace::Gmres(w) => assert_eq!(w.memory(), 20),
            _ => panic!("wrong workspace variant"),
        }
        let explicit = Workspace::allocate(
            resolve(KrylovAlg::Gmres),
            &a,
            &KrylovConfig::gmres().with_restart(7),
            AllocMode::Real,
        );
        match explicit {
            Workspace::Gmres(w) => assert_eq!(w.memory(), 7),
            _ => panic!("wrong workspace variant"),
        }
    }

    #[test]
    fn minres_window_is_configurable() {
        let a = dense_eye(4);
        let ws = Workspace::allocate(
            resolve(KrylovAlg::Minres),
            &a,
            &KrylovConfig::minres().with_window(9),
            AllocMode::Real,
        );
        match ws {
            Workspace::Minres(w) => assert_eq!(w.window(), 9),
            _ => panic!("wrong workspace variant"),
        }
    }
}
