//! Core linear-algebra traits.

pub mod traits;
pub use traits::LinearOperator;
