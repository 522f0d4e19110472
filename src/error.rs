use thiserror::Error;

// Unified error type for krydis

#[derive(Error, Debug)]
pub enum KError {
    #[error("unsupported Krylov algorithm: {0}")]
    UnsupportedAlgorithm(String),
    #[error("residual history is empty after a solve (history was requested)")]
    EmptyHistory,
    #[error("shape mismatch: expected length {expected}, got {got}")]
    ShapeMismatch { expected: usize, got: usize },
}
