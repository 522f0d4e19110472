//! Shared utilities: convergence tracking and vector reductions.

pub mod convergence;
pub mod vecops;

pub use convergence::{Convergence, ConvergenceStatus};
