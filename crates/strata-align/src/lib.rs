// ─────────────────────────────────────────────────────────────────────
// Strata Kernel — Log-Alignment Transform
// ─────────────────────────────────────────────────────────────────────
#![deny(unsafe_code)]
//! Logarithmic pre-compression of raw pressure vectors:
//!
//!   p_hat[i] = sign(p[i]) * log(1 + alpha * |p[i]|) / log(b)   (|p| >= eps)
//!   p_hat[i] = 0                                               (|p| <  eps)
//!
//! Monotone non-decreasing in |p| for fixed alpha, asymptotically
//! sub-linear: large inputs are compressed far more than small ones.
//! The gain alpha adapts across steps — it grows when the compressed
//! magnitude falls short of the configured target, never shrinks, and is
//! clamped to [alpha_min, alpha_max]. Disabling the transform makes it
//! the identity.

use serde::{Deserialize, Serialize};

pub use strata_types::AlignConfig;

/// A compressed pressure vector together with its Euclidean norm.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AlignedPressure {
    pub values: Vec<f64>,
    pub magnitude: f64,
}

impl AlignedPressure {
    pub fn compute(pressure: &[f64], alpha: f64, cfg: &AlignConfig) -> Self {
        let values = align(pressure, alpha, cfg);
        let magnitude = magnitude(&values);
        Self { values, magnitude }
    }
}

/// Apply the log-alignment transform to one pressure vector.
///
/// Identity copy when the transform is disabled.
pub fn align(pressure: &[f64], alpha: f64, cfg: &AlignConfig) -> Vec<f64> {
    if !cfg.enabled {
        return pressure.to_vec();
    }
    let ln_base = cfg.log_base.ln();
    pressure
        .iter()
        .map(|&p| {
            if p.abs() < cfg.eps {
                0.0
            } else {
                p.signum() * (1.0 + alpha * p.abs()).ln() / ln_base
            }
        })
        .collect()
}

/// Euclidean norm of an aligned vector.
pub fn magnitude(aligned: &[f64]) -> f64 {
    aligned.iter().map(|v| v * v).sum::<f64>().sqrt()
}

/// Advance the adaptive gain from one step's compressed magnitude.
///
/// The gain grows in proportion to the deficit below `target_norm`
/// and is clamped above by `alpha_max`. It never decreases: once the
/// structure has adapted to strong input, that adaptation persists.
pub fn adapt_gain(alpha: f64, aligned_norm: f64, cfg: &AlignConfig) -> f64 {
    if !cfg.enabled {
        return alpha;
    }
    let deficit = (cfg.target_norm - aligned_norm).max(0.0) / cfg.target_norm;
    let grown = alpha * (1.0 + cfg.adapt_rate * deficit);
    grown.min(cfg.alpha_max).max(alpha)
}
