// ─────────────────────────────────────────────────────────────────────
// Strata Kernel — Configuration
// ─────────────────────────────────────────────────────────────────────
//! Immutable per-tier parameters for the core dynamics engine and the
//! log-alignment transform.
//!
//! Parameters are validated once at engine construction and never
//! mutated during a run; retuning means constructing a new engine.

use serde::{Deserialize, Serialize};

use crate::error::{StrataError, StrataResult};

/// Log-alignment transform configuration.
///
/// The transform compresses a raw pressure vector as
/// `p_hat = sign(p) * log(1 + alpha * |p|) / log(base)`, with an adaptive
/// gain `alpha` that only grows (clamped to `[alpha_min, alpha_max]`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AlignConfig {
    /// When false the transform is the identity.
    pub enabled: bool,
    /// Logarithm base b. Default: e.
    pub log_base: f64,
    /// Initial adaptive gain alpha_0.
    pub alpha0: f64,
    /// Lower gain bound.
    pub alpha_min: f64,
    /// Upper gain bound. Keeps the gain adaptation from running away.
    pub alpha_max: f64,
    /// Dead zone: inputs with |p| below this map to exactly 0.
    pub eps: f64,
    /// Compressed-magnitude level the gain adaptation steers toward.
    pub target_norm: f64,
    /// Relative gain growth per step at full deficit.
    pub adapt_rate: f64,
}

impl Default for AlignConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            log_base: std::f64::consts::E,
            alpha0: 1.0,
            alpha_min: 1e-3,
            alpha_max: 64.0,
            eps: 1e-6,
            target_norm: 4.0,
            adapt_rate: 0.05,
        }
    }
}

impl AlignConfig {
    pub fn validate(&self) -> StrataResult<()> {
        if !(self.log_base.is_finite() && self.log_base > 1.0) {
            return Err(StrataError::Config(format!(
                "log_base must be > 1, got {}",
                self.log_base
            )));
        }
        if !(self.alpha_min > 0.0 && self.alpha_min <= self.alpha_max) {
            return Err(StrataError::Config(format!(
                "alpha bounds must satisfy 0 < alpha_min <= alpha_max, got [{}, {}]",
                self.alpha_min, self.alpha_max
            )));
        }
        if !(self.alpha_min..=self.alpha_max).contains(&self.alpha0) {
            return Err(StrataError::Config(format!(
                "alpha0 {} outside [{}, {}]",
                self.alpha0, self.alpha_min, self.alpha_max
            )));
        }
        if !(self.eps.is_finite() && self.eps >= 0.0) {
            return Err(StrataError::Config(format!("eps must be >= 0, got {}", self.eps)));
        }
        if !(self.target_norm > 0.0) {
            return Err(StrataError::Config(format!(
                "target_norm must be > 0, got {}",
                self.target_norm
            )));
        }
        if !(self.adapt_rate >= 0.0) {
            return Err(StrataError::Config(format!(
                "adapt_rate must be >= 0, got {}",
                self.adapt_rate
            )));
        }
        Ok(())
    }
}

/// Immutable per-tier configuration for the core dynamics engine.
///
/// All per-tier vectors must share one length (the tier count). The
/// defaults are the canonical four-tier set.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CoreParams {
    /// Rigidity rank R, strictly decreasing with tier index. Used only
    /// as a tie-break ordering.
    pub rigidity: Vec<f64>,
    /// Pressure-growth gain gamma.
    pub gamma: Vec<f64>,
    /// Accumulated-pressure decay rate beta.
    pub beta: Vec<f64>,
    /// Rigidity responsiveness eta.
    pub eta: Vec<f64>,
    /// Rigidity decay rate lambda.
    pub lambda_kappa: Vec<f64>,
    /// Rigidity floor kappa_min.
    pub kappa_min: Vec<f64>,
    /// Static leap threshold Theta.
    pub theta: Vec<f64>,

    /// Scale thresholds with entrenchment: Theta_dyn = Theta * g(kappa).
    pub enable_dynamic_theta: bool,
    /// Slope of g in kappa.
    pub theta_sensitivity: f64,

    /// Fraction of E discharged on leap. 1.0 = full reset (default).
    pub leap_discharge: f64,
    /// Rigidity bump applied to the leaping tier.
    pub kappa_leap_gain: f64,
    /// Capacity of the leap-history ring buffer.
    pub leap_capacity: usize,

    /// Temperature-governed leaps below threshold.
    pub enable_stochastic_leap: bool,
    /// Temperature T. T = 0 disables stochastic leaps regardless of the toggle.
    pub temperature: f64,

    pub align: AlignConfig,
}

impl Default for CoreParams {
    fn default() -> Self {
        Self {
            rigidity: vec![1000.0, 100.0, 10.0, 1.0],
            gamma: vec![0.15, 0.10, 0.08, 0.05],
            beta: vec![0.001, 0.01, 0.05, 0.1],
            eta: vec![0.9, 0.5, 0.3, 0.2],
            lambda_kappa: vec![0.001, 0.01, 0.02, 0.05],
            kappa_min: vec![0.9, 0.8, 0.5, 0.3],
            theta: vec![200.0, 100.0, 50.0, 30.0],
            enable_dynamic_theta: true,
            theta_sensitivity: 0.3,
            leap_discharge: 1.0,
            kappa_leap_gain: 0.1,
            leap_capacity: 512,
            enable_stochastic_leap: false,
            temperature: 0.0,
            align: AlignConfig::default(),
        }
    }
}

impl CoreParams {
    /// Number of tiers this parameter set describes.
    pub fn tier_count(&self) -> usize {
        self.rigidity.len()
    }

    /// Validate parameter arrays and scalar ranges.
    pub fn validate(&self) -> StrataResult<()> {
        let n = self.tier_count();
        if n == 0 {
            return Err(StrataError::Config("tier count must be >= 1".to_string()));
        }
        let arrays: [(&str, &Vec<f64>); 7] = [
            ("rigidity", &self.rigidity),
            ("gamma", &self.gamma),
            ("beta", &self.beta),
            ("eta", &self.eta),
            ("lambda_kappa", &self.lambda_kappa),
            ("kappa_min", &self.kappa_min),
            ("theta", &self.theta),
        ];
        for (name, arr) in arrays {
            if arr.len() != n {
                return Err(StrataError::Config(format!(
                    "{name} has length {}, expected tier count {n}",
                    arr.len()
                )));
            }
            if arr.iter().any(|v| !v.is_finite()) {
                return Err(StrataError::Config(format!("{name} contains a non-finite value")));
            }
        }
        if self.rigidity.windows(2).any(|w| w[0] <= w[1]) {
            return Err(StrataError::Config(
                "rigidity must be strictly decreasing with tier index".to_string(),
            ));
        }
        for (name, arr) in [("gamma", &self.gamma), ("beta", &self.beta), ("eta", &self.eta), ("lambda_kappa", &self.lambda_kappa)] {
            if arr.iter().any(|&v| v < 0.0) {
                return Err(StrataError::Config(format!("{name} must be non-negative")));
            }
        }
        if self.theta.iter().any(|&v| v <= 0.0) {
            return Err(StrataError::Config("theta must be positive".to_string()));
        }
        if !(0.0..=1.0).contains(&self.leap_discharge) {
            return Err(StrataError::Config(format!(
                "leap_discharge must be in [0, 1], got {}",
                self.leap_discharge
            )));
        }
        if !(self.kappa_leap_gain >= 0.0 && self.kappa_leap_gain.is_finite()) {
            return Err(StrataError::Config(format!(
                "kappa_leap_gain must be >= 0, got {}",
                self.kappa_leap_gain
            )));
        }
        if self.theta_sensitivity < 0.0 {
            return Err(StrataError::Config(format!(
                "theta_sensitivity must be >= 0, got {}",
                self.theta_sensitivity
            )));
        }
        if !(self.temperature >= 0.0 && self.temperature.is_finite()) {
            return Err(StrataError::Config(format!(
                "temperature must be >= 0, got {}",
                self.temperature
            )));
        }
        if self.leap_capacity == 0 {
            return Err(StrataError::Config("leap_capacity must be >= 1".to_string()));
        }
        self.align.validate()
    }

    /// Load from JSON string.
    pub fn from_json(json: &str) -> StrataResult<Self> {
        let params: Self = serde_json::from_str(json)
            .map_err(|e| StrataError::Config(format!("JSON parse error: {e}")))?;
        params.validate()?;
        Ok(params)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tier::TIER_COUNT;

    #[test]
    fn test_default_params_valid() {
        assert!(CoreParams::default().validate().is_ok());
        assert_eq!(CoreParams::default().tier_count(), TIER_COUNT);
    }

    #[test]
    fn test_length_mismatch_rejected() {
        let params = CoreParams {
            gamma: vec![0.1, 0.1],
            ..CoreParams::default()
        };
        assert!(params.validate().is_err());
    }

    #[test]
    fn test_non_decreasing_rigidity_rejected() {
        let params = CoreParams {
            rigidity: vec![1.0, 10.0, 100.0, 1000.0],
            ..CoreParams::default()
        };
        assert!(params.validate().is_err());
    }

    #[test]
    fn test_discharge_out_of_range_rejected() {
        let params = CoreParams {
            leap_discharge: 1.5,
            ..CoreParams::default()
        };
        assert!(params.validate().is_err());
    }

    #[test]
    fn test_negative_temperature_rejected() {
        let params = CoreParams {
            temperature: -1.0,
            ..CoreParams::default()
        };
        assert!(params.validate().is_err());
    }

    #[test]
    fn test_alpha0_outside_bounds_rejected() {
        let mut params = CoreParams::default();
        params.align.alpha0 = 1000.0;
        assert!(params.validate().is_err());
    }

    #[test]
    fn test_from_json_roundtrip() {
        let json = serde_json::to_string(&CoreParams::default()).unwrap();
        let params = CoreParams::from_json(&json).unwrap();
        assert_eq!(params.tier_count(), TIER_COUNT);
        assert!((params.theta[0] - 200.0).abs() < 1e-12);
    }

    #[test]
    fn test_from_json_invalid_rejected() {
        assert!(CoreParams::from_json("{not json").is_err());
    }
}
