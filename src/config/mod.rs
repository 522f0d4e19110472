//! User-facing solver configuration.
//!
//! `KrylovConfig` pins the algorithm identifier and carries the options every
//! algorithm shares (restart/memory size, window size, extra named options).
//! Named constructors exist for each supported algorithm; they perform no
//! validation — the registry, factory, and orchestrator validate lazily.

pub mod options;

pub use options::{OptValue, SolveOptions, RESERVED_OPTIONS};

use crate::registry::KrylovAlg;
use std::collections::BTreeMap;

/// Configuration for a Krylov solve, immutable once constructed.
#[derive(Clone, Debug)]
pub struct KrylovConfig {
    /// Which algorithm to run.
    pub alg: KrylovAlg,
    /// Restart/memory size for restart-capable algorithms; 0 means auto
    /// (`min(20, nrows)`).
    pub gmres_restart: usize,
    /// Window size for window-capable algorithms; 0 means disabled (the
    /// workspace falls back to its size-only constructor).
    pub window: usize,
    /// Extra named options, forwarded verbatim to the kernel. Reserved keys
    /// (see [`RESERVED_OPTIONS`]) never override the orchestrator's fixed
    /// options.
    pub options: BTreeMap<String, OptValue>,
}

impl KrylovConfig {
    pub fn new(alg: KrylovAlg) -> Self {
        Self { alg, gmres_restart: 0, window: 0, options: BTreeMap::new() }
    }

    /// Conjugate Gradient variant.
    pub fn cg() -> Self {
        Self::new(KrylovAlg::Cg)
    }

    /// MINRES variant.
    pub fn minres() -> Self {
        Self::new(KrylovAlg::Minres)
    }

    /// Restarted GMRES variant.
    pub fn gmres() -> Self {
        Self::new(KrylovAlg::Gmres)
    }

    /// BiCGStab variant.
    pub fn bicgstab() -> Self {
        Self::new(KrylovAlg::Bicgstab)
    }

    /// CGS variant.
    pub fn cgs() -> Self {
        Self::new(KrylovAlg::Cgs)
    }

    /// Least-squares variant.
    pub fn lsmr() -> Self {
        Self::new(KrylovAlg::Lsmr)
    }

    /// Least-norm variant.
    pub fn craigmr() -> Self {
        Self::new(KrylovAlg::Craigmr)
    }

    /// Set the restart/memory size (0 = auto).
    pub fn with_restart(mut self, restart: usize) -> Self {
        self.gmres_restart = restart;
        self
    }

    /// Set the window size (0 = disabled).
    pub fn with_window(mut self, window: usize) -> Self {
        self.window = window;
        self
    }

    /// Attach an extra named option.
    pub fn with_option(mut self, key: impl Into<String>, value: OptValue) -> Self {
        self.options.insert(key.into(), value);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn constructors_pin_the_algorithm() {
        assert_eq!(KrylovConfig::cg().alg, KrylovAlg::Cg);
        assert_eq!(KrylovConfig::gmres().alg, KrylovAlg::Gmres);
        assert_eq!(KrylovConfig::lsmr().alg, KrylovAlg::Lsmr);
    }

    #[test]
    fn builder_forwards_options_uninspected() {
        let cfg = KrylovConfig::gmres()
            .with_restart(7)
            .with_option("itref", OptValue::Int(2));
        assert_eq!(cfg.gmres_restart, 7);
        assert_eq!(cfg.options.get("itref"), Some(&OptValue::Int(2)));
    }
}
