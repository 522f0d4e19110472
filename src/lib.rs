//! # krydis
//!
//! Unified dispatch layer over a family of Krylov subspace solvers.
//!
//! The crate separates three concerns:
//!
//! - **Registry** ([`registry`]): a closed, static table mapping each
//!   algorithm identifier to its workspace type and structural metadata
//!   (restart/window support, accepted preconditioner sides).
//! - **Workspaces** ([`workspace`]): one stateful struct per algorithm
//!   holding every iteration vector, allocated once per system shape and
//!   reused across solves. Zero-sized placeholders let a cache be seeded
//!   before the real problem exists.
//! - **Context** ([`context`]): [`LinearCache`] owns the system and
//!   orchestrates solves — lazy workspace (re)allocation, preconditioner
//!   normalization, option assembly, and solution reporting.
//!
//! ```
//! use krydis::{KrylovConfig, LinearCache, SystemMatrix};
//! use faer::Mat;
//!
//! let a: Mat<f64> = Mat::from_fn(3, 3, |i, j| if i == j { 2.0 } else { 0.0 });
//! let mut cache = LinearCache::new(SystemMatrix::from(a), vec![2.0, 4.0, 6.0]);
//! let sol = cache.solve(&KrylovConfig::cg()).unwrap();
//! assert!((sol.u[1] - 2.0).abs() < 1e-8);
//! ```

pub mod config;
pub mod context;
pub mod core;
pub mod error;
pub mod matrix;
pub mod precond;
pub mod registry;
pub mod utils;
pub mod workspace;

pub use config::{KrylovConfig, OptValue, SolveOptions};
pub use context::{LinearCache, LinearSolution, OperatorAssumptions};
pub use crate::core::LinearOperator;
pub use error::KError;
pub use matrix::{CsrMatrix, MatKind, SystemMatrix};
pub use precond::{Precond, PrecondOp};
pub use registry::{resolve, resolve_name, AlgorithmDescriptor, KrylovAlg, WorkspaceKind};
pub use utils::convergence::ConvergenceStatus;
pub use workspace::{AllocMode, Workspace};
