// ─────────────────────────────────────────────────────────────────────
// Strata Kernel — Leap Events
// ─────────────────────────────────────────────────────────────────────
//! Leap events, the bounded leap history, and the stochastic sampling
//! strategy.
//!
//! A leap is a discontinuous discharge of a tier's accumulated pressure,
//! triggered either deterministically (E crosses the dynamic threshold)
//! or probabilistically below it, governed by a temperature T.

use std::collections::VecDeque;

use serde::{Deserialize, Serialize};

/// How a leap was triggered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LeapKind {
    /// E reached the dynamic threshold.
    Deterministic,
    /// A temperature-governed draw fired below the threshold.
    Stochastic,
}

/// One recorded leap: simulation time at the start of the tick, tier
/// index, and trigger kind.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LeapEvent {
    pub t: f64,
    pub tier: usize,
    pub kind: LeapKind,
}

/// Append-only leap record with a fixed capacity.
///
/// The oldest event is dropped on overflow; `total_recorded` keeps the
/// lifetime count so a bounded buffer never hides how many leaps
/// actually happened.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LeapHistory {
    capacity: usize,
    events: VecDeque<LeapEvent>,
    total_recorded: u64,
}

impl LeapHistory {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity: capacity.max(1),
            events: VecDeque::new(),
            total_recorded: 0,
        }
    }

    pub fn push(&mut self, event: LeapEvent) {
        if self.events.len() == self.capacity {
            self.events.pop_front();
        }
        self.events.push_back(event);
        self.total_recorded += 1;
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Lifetime leap count, including events already evicted.
    pub fn total_recorded(&self) -> u64 {
        self.total_recorded
    }

    pub fn last(&self) -> Option<&LeapEvent> {
        self.events.back()
    }

    pub fn iter(&self) -> impl Iterator<Item = &LeapEvent> {
        self.events.iter()
    }
}

/// Stochastic leap sampling strategy.
///
/// Implementations must be monotone non-decreasing in `excess`
/// (E - Theta_dyn), vanish as excess goes deeply negative, and return 0
/// whenever `temperature <= 0`.
pub trait LeapSampler: Send + Sync {
    fn probability(&self, excess: f64, temperature: f64) -> f64;
}

/// Boltzmann-form sampler: `p = min(1, exp(excess / T))`.
///
/// At zero excess the deterministic rule already fires, so in practice
/// this is evaluated only for negative excess, where it decays
/// exponentially with the deficit.
#[derive(Debug, Clone, Copy, Default)]
pub struct BoltzmannSampler;

/// Below this ratio the probability is flushed to an exact zero.
const RATIO_CUTOFF: f64 = -60.0;

impl LeapSampler for BoltzmannSampler {
    fn probability(&self, excess: f64, temperature: f64) -> f64 {
        if temperature <= 0.0 {
            return 0.0;
        }
        let ratio = excess / temperature;
        if ratio < RATIO_CUTOFF {
            return 0.0;
        }
        ratio.exp().min(1.0)
    }
}
