//! Algorithm registry: the closed mapping from algorithm identifier to
//! workspace type and structural metadata.
//!
//! Each supported algorithm is one row in a static table; adding an algorithm
//! is a one-row edit plus a new workspace binding. The set is closed and part
//! of the external contract, because each algorithm binds to a distinct
//! workspace layout.

use crate::error::KError;

/// Identifier of a supported Krylov algorithm.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum KrylovAlg {
    /// Conjugate Gradient (SPD systems).
    Cg,
    /// Minimal Residual (symmetric, possibly indefinite).
    Minres,
    /// Restarted Generalized Minimal Residual (general square systems).
    Gmres,
    /// BiConjugate Gradient Stabilized (general square systems).
    Bicgstab,
    /// Conjugate Gradient Squared (general square systems).
    Cgs,
    /// Least-squares solver on the normal equations (rectangular systems).
    Lsmr,
    /// Minimum-norm solver on the normal equations (underdetermined systems).
    Craigmr,
}

/// Tag of the workspace type an algorithm binds to. Exactly one binding per
/// algorithm.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum WorkspaceKind {
    Cg,
    Minres,
    Gmres,
    Bicgstab,
    Cgs,
    Lsmr,
    Craigmr,
}

/// Static metadata for one algorithm.
#[derive(Clone, Copy, Debug)]
pub struct AlgorithmDescriptor {
    pub alg: KrylovAlg,
    pub workspace: WorkspaceKind,
    /// Accepts a restart/memory parameter.
    pub supports_restart: bool,
    /// Accepts a window parameter.
    pub supports_window: bool,
    /// Accepts a left preconditioner.
    pub left_precond: bool,
    /// Accepts a right preconditioner.
    pub right_precond: bool,
}

/// One row per supported algorithm; order matches `KrylovAlg`.
pub static REGISTRY: [AlgorithmDescriptor; 7] = [
    AlgorithmDescriptor {
        alg: KrylovAlg::Cg,
        workspace: WorkspaceKind::Cg,
        supports_restart: false,
        supports_window: false,
        left_precond: true,
        right_precond: false,
    },
    AlgorithmDescriptor {
        alg: KrylovAlg::Minres,
        workspace: WorkspaceKind::Minres,
        supports_restart: false,
        supports_window: true,
        left_precond: true,
        right_precond: false,
    },
    AlgorithmDescriptor {
        alg: KrylovAlg::Gmres,
        workspace: WorkspaceKind::Gmres,
        supports_restart: true,
        supports_window: false,
        left_precond: true,
        right_precond: true,
    },
    AlgorithmDescriptor {
        alg: KrylovAlg::Bicgstab,
        workspace: WorkspaceKind::Bicgstab,
        supports_restart: false,
        supports_window: false,
        left_precond: true,
        right_precond: true,
    },
    AlgorithmDescriptor {
        alg: KrylovAlg::Cgs,
        workspace: WorkspaceKind::Cgs,
        supports_restart: false,
        supports_window: false,
        left_precond: true,
        right_precond: true,
    },
    AlgorithmDescriptor {
        alg: KrylovAlg::Lsmr,
        workspace: WorkspaceKind::Lsmr,
        supports_restart: false,
        supports_window: false,
        left_precond: false,
        right_precond: false,
    },
    AlgorithmDescriptor {
        alg: KrylovAlg::Craigmr,
        workspace: WorkspaceKind::Craigmr,
        supports_restart: false,
        supports_window: false,
        left_precond: false,
        right_precond: false,
    },
];

impl KrylovAlg {
    pub fn name(&self) -> &'static str {
        match self {
            KrylovAlg::Cg => "cg",
            KrylovAlg::Minres => "minres",
            KrylovAlg::Gmres => "gmres",
            KrylovAlg::Bicgstab => "bicgstab",
            KrylovAlg::Cgs => "cgs",
            KrylovAlg::Lsmr => "lsmr",
            KrylovAlg::Craigmr => "craigmr",
        }
    }

    /// Parse an algorithm identifier. Unknown identifiers are a hard
    /// configuration error.
    pub fn from_name(name: &str) -> Result<Self, KError> {
        match name.to_lowercase().as_str() {
            "cg" => Ok(KrylovAlg::Cg),
            "minres" => Ok(KrylovAlg::Minres),
            "gmres" => Ok(KrylovAlg::Gmres),
            "bicgstab" => Ok(KrylovAlg::Bicgstab),
            "cgs" => Ok(KrylovAlg::Cgs),
            "lsmr" => Ok(KrylovAlg::Lsmr),
            "craigmr" => Ok(KrylovAlg::Craigmr),
            _ => Err(KError::UnsupportedAlgorithm(name.to_string())),
        }
    }
}

impl std::fmt::Display for KrylovAlg {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Look up the descriptor for `alg`. Total over `KrylovAlg`.
pub fn resolve(alg: KrylovAlg) -> &'static AlgorithmDescriptor {
    REGISTRY
        .iter()
        .find(|d| d.alg == alg)
        .expect("descriptor table is total over KrylovAlg")
}

/// Look up a descriptor by identifier string; fails with
/// `UnsupportedAlgorithm` for anything outside the closed set.
pub fn resolve_name(name: &str) -> Result<&'static AlgorithmDescriptor, KError> {
    KrylovAlg::from_name(name).map(resolve)
}
