//! Per-solve option set assembled by the orchestrator.
//!
//! The five fixed options (`verbose`, `ldiv`, `history`, plus the tolerance
//! pair and the iteration cap) always come from the cache; user extras ride
//! along in an opaque key→value bag and never override them.

use crate::utils::convergence::Convergence;
use num_traits::Float;
use std::collections::BTreeMap;

/// Keys the orchestrator owns; matching user extras are dropped.
pub const RESERVED_OPTIONS: [&str; 6] =
    ["abstol", "reltol", "maxiters", "verbose", "ldiv", "history"];

/// An opaque option value, forwarded verbatim to the kernel.
#[derive(Clone, Debug, PartialEq)]
pub enum OptValue {
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
}

/// The full option set a kernel receives for one solve.
#[derive(Clone, Debug)]
pub struct SolveOptions<T> {
    pub abstol: T,
    pub reltol: T,
    pub maxiters: usize,
    /// Verbosity level; the cache's boolean collapses to 0 or 1.
    pub verbose: u8,
    /// Preconditioners are applied via division (z = M⁻¹ r), never via
    /// multiplication. Fixed to `true` by the orchestrator.
    pub ldiv: bool,
    /// Residual history is always retained. Fixed to `true` by the
    /// orchestrator.
    pub history: bool,
    /// User extras, reserved keys already filtered out.
    pub extra: BTreeMap<String, OptValue>,
}

impl<T: Float> SolveOptions<T> {
    pub fn convergence(&self) -> Convergence<T> {
        Convergence { abstol: self.abstol, reltol: self.reltol, maxiters: self.maxiters }
    }
}
