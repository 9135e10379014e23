// ─────────────────────────────────────────────────────────────────────
// Strata Kernel — Core Engine
// ─────────────────────────────────────────────────────────────────────
//! Discretised tier dynamics:
//!
//!   E[i]     += (gamma[i] * p_hat[i] - beta[i] * E[i]) * dt + transfer[i] * dt
//!   kappa[i] += (eta[i] * (p_hat[i] - kappa[i]^2)
//!                 - lambda[i] * (kappa[i] - kappa_min[i])) * dt
//!   kappa[i]  = max(kappa[i], kappa_min[i])
//!
//! followed by the leap check against the dynamic threshold
//! `Theta_dyn[i] = Theta[i] * max(0.1, 1 + s * (kappa[i] - 1))`.
//!
//! E is deliberately not clamped at zero: a negative transfer may pull a
//! tier transiently below zero, and the decay term then relaxes it back.

use rand::{Rng, RngCore};
use serde::{Deserialize, Serialize};

use strata_align::{adapt_gain, align, magnitude};
use strata_types::{CoreParams, StrataError, StrataResult};

use crate::leap::{BoltzmannSampler, LeapEvent, LeapHistory, LeapKind, LeapSampler};

/// Threshold slope floor: g(kappa) never drops below this.
const G_FLOOR: f64 = 0.1;

/// Mutable per-entity state advanced by [`CoreEngine::step`].
///
/// One state, one owner. The engine itself is immutable and may be
/// shared across states.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CoreState {
    /// Accumulated pressure E per tier.
    pub e: Vec<f64>,
    /// Rigidity kappa per tier.
    pub kappa: Vec<f64>,
    /// Simulation time.
    pub t: f64,
    /// Current adaptive alignment gain.
    pub alpha: f64,
    /// Bounded record of past leaps.
    pub leaps: LeapHistory,
    /// Diagnostics of the most recent completed step.
    pub diagnostics: Diagnostics,
}

impl CoreState {
    /// Fresh state: zero pressure, rigidity at `max(1, kappa_min)`.
    pub fn new(params: &CoreParams) -> Self {
        let n = params.tier_count();
        Self {
            e: vec![0.0; n],
            kappa: params.kappa_min.iter().map(|&k| k.max(1.0)).collect(),
            t: 0.0,
            alpha: params.align.alpha0,
            leaps: LeapHistory::new(params.leap_capacity),
            diagnostics: Diagnostics::empty(n, params.align.alpha0),
        }
    }

    pub fn tier_count(&self) -> usize {
        self.e.len()
    }
}

/// Per-step observables, stored on the state and returned from `step`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Diagnostics {
    /// Tier holding the largest E, first on ties; `None` while every
    /// tier's |E| sits inside the dead zone.
    pub dominant_tier: Option<usize>,
    /// Sum of E across tiers.
    pub total_power: f64,
    /// Thresholds in effect for this step's leap check.
    pub dynamic_theta: Vec<f64>,
    /// Which tiers leapt this step.
    pub leap_occurred: Vec<bool>,
    /// Euclidean norm of the aligned pressure vector.
    pub aligned_norm: f64,
    /// Alignment gain after this step's adaptation.
    pub alpha: f64,
}

impl Diagnostics {
    fn empty(n: usize, alpha: f64) -> Self {
        Self {
            dominant_tier: None,
            total_power: 0.0,
            dynamic_theta: vec![0.0; n],
            leap_occurred: vec![false; n],
            aligned_norm: 0.0,
            alpha,
        }
    }
}

/// Immutable stepping engine over validated [`CoreParams`].
pub struct CoreEngine {
    params: CoreParams,
    sampler: Box<dyn LeapSampler>,
}

impl CoreEngine {
    /// Build an engine with the Boltzmann leap sampler. Fails if the
    /// parameters are inconsistent.
    pub fn new(params: CoreParams) -> StrataResult<Self> {
        Self::with_sampler(params, Box::new(BoltzmannSampler))
    }

    /// Build an engine with a custom stochastic-leap sampler.
    pub fn with_sampler(params: CoreParams, sampler: Box<dyn LeapSampler>) -> StrataResult<Self> {
        params.validate()?;
        Ok(Self { params, sampler })
    }

    pub fn params(&self) -> &CoreParams {
        &self.params
    }

    /// Thresholds a given rigidity vector would produce.
    pub fn dynamic_thresholds(&self, kappa: &[f64]) -> Vec<f64> {
        if !self.params.enable_dynamic_theta {
            return self.params.theta.clone();
        }
        self.params
            .theta
            .iter()
            .zip(kappa)
            .map(|(&theta, &k)| {
                let g = (1.0 + self.params.theta_sensitivity * (k - 1.0)).max(G_FLOOR);
                theta * g
            })
            .collect()
    }

    /// Advance one state by `dt`.
    ///
    /// `transfer` is an optional per-tier external in/outflow rate;
    /// `rng` is required only when stochastic leaps are live
    /// (`enable_stochastic_leap` with `temperature > 0`).
    ///
    /// Every contract violation is reported before any mutation, so an
    /// `Err` leaves the state untouched. `dt = 0` returns the previous
    /// diagnostics and changes nothing.
    pub fn step(
        &self,
        state: &mut CoreState,
        pressure: &[f64],
        dt: f64,
        transfer: Option<&[f64]>,
        mut rng: Option<&mut dyn RngCore>,
    ) -> StrataResult<Diagnostics> {
        let n = self.params.tier_count();
        if state.tier_count() != n {
            return Err(StrataError::ShapeMismatch { expected: n, got: state.tier_count() });
        }
        if pressure.len() != n {
            return Err(StrataError::ShapeMismatch { expected: n, got: pressure.len() });
        }
        if let Some(tr) = transfer {
            if tr.len() != n {
                return Err(StrataError::ShapeMismatch { expected: n, got: tr.len() });
            }
            if tr.iter().any(|v| !v.is_finite()) {
                return Err(StrataError::Numerical("non-finite transfer value".to_string()));
            }
        }
        if !(dt.is_finite() && dt >= 0.0) {
            return Err(StrataError::InvalidTimestep(dt));
        }
        if pressure.iter().any(|v| !v.is_finite()) {
            return Err(StrataError::Numerical("non-finite pressure value".to_string()));
        }
        let stochastic = self.params.enable_stochastic_leap && self.params.temperature > 0.0;
        if stochastic && rng.is_none() {
            return Err(StrataError::MissingRandomSource);
        }
        if dt == 0.0 {
            return Ok(state.diagnostics.clone());
        }

        let p_hat = align(pressure, state.alpha, &self.params.align);
        let aligned_norm = magnitude(&p_hat);

        for i in 0..n {
            let growth = self.params.gamma[i] * p_hat[i] - self.params.beta[i] * state.e[i];
            state.e[i] += growth * dt;
            if let Some(tr) = transfer {
                state.e[i] += tr[i] * dt;
            }

            let k = state.kappa[i];
            let dk = self.params.eta[i] * (p_hat[i] - k * k)
                - self.params.lambda_kappa[i] * (k - self.params.kappa_min[i]);
            state.kappa[i] = (k + dk * dt).max(self.params.kappa_min[i]);
        }

        let theta_dyn = self.dynamic_thresholds(&state.kappa);
        let mut leap_occurred = vec![false; n];
        for i in 0..n {
            let excess = state.e[i] - theta_dyn[i];
            let kind = if excess >= 0.0 {
                Some(LeapKind::Deterministic)
            } else if stochastic {
                let p = self.sampler.probability(excess, self.params.temperature);
                let fired = match rng.as_mut() {
                    Some(r) if p > 0.0 => r.random::<f64>() < p,
                    _ => false,
                };
                fired.then_some(LeapKind::Stochastic)
            } else {
                None
            };
            if let Some(kind) = kind {
                state.e[i] *= 1.0 - self.params.leap_discharge;
                state.kappa[i] += self.params.kappa_leap_gain;
                state.leaps.push(LeapEvent { t: state.t, tier: i, kind });
                leap_occurred[i] = true;
                tracing::debug!(tier = i, ?kind, threshold = theta_dyn[i], "leap triggered");
            }
        }

        state.alpha = adapt_gain(state.alpha, aligned_norm, &self.params.align);

        let diagnostics = Diagnostics {
            dominant_tier: dominant_tier(&state.e, self.params.align.eps),
            total_power: state.e.iter().sum(),
            dynamic_theta: theta_dyn,
            leap_occurred,
            aligned_norm,
            alpha: state.alpha,
        };
        state.t += dt;
        state.diagnostics = diagnostics.clone();
        Ok(diagnostics)
    }

    /// Run `n_steps` ticks under a constant pressure vector. Returns the
    /// final step's diagnostics (or the state's previous diagnostics
    /// when `n_steps` is 0).
    pub fn run(
        &self,
        state: &mut CoreState,
        pressure: &[f64],
        dt: f64,
        n_steps: usize,
        mut rng: Option<&mut dyn RngCore>,
    ) -> StrataResult<Diagnostics> {
        let mut last = state.diagnostics.clone();
        for _ in 0..n_steps {
            // Reborrow per iteration so the RNG is not held across the loop.
            let r = rng.as_mut().map(|r| &mut **r as &mut dyn RngCore);
            last = self.step(state, pressure, dt, None, r)?;
        }
        Ok(last)
    }
}

/// Index of the first maximal E, `None` when all of them sit inside the
/// dead zone.
fn dominant_tier(e: &[f64], eps: f64) -> Option<usize> {
    if e.iter().all(|v| v.abs() <= eps) {
        return None;
    }
    let mut best = 0;
    for (i, &v) in e.iter().enumerate().skip(1) {
        if v > e[best] {
            best = i;
        }
    }
    Some(best)
}
