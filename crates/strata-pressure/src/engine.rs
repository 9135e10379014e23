// ─────────────────────────────────────────────────────────────────────
// Strata Kernel — Pressure Aggregation Engine
// ─────────────────────────────────────────────────────────────────────
//! Folds every enabled dimension into a per-tier pressure vector and
//! derives diagnostics: dominant tier, inter-tier conflict indices, and
//! the leap-trigger decision.
//!
//! A misconfigured dimension (non-finite value, negative or non-finite
//! weight) is logged and skipped — aggregation never fails wholesale
//! because one dimension is broken.

use std::collections::{BTreeMap, VecDeque};

use serde::{Deserialize, Serialize};
use tracing::warn;

use strata_align::AlignedPressure;
use strata_types::{AlignConfig, StrataResult, Tier, TIER_COUNT};

use crate::dimension::{DimensionRegistry, PressureDimension};

/// Result of one aggregation pass.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AggregationResult {
    /// Per-tier pressure, indexed by `Tier::index()`.
    pub tier_pressures: Vec<f64>,
    /// Sum across tiers.
    pub total_pressure: f64,
    /// Arg-max tier; `None` when the vector is within epsilon of zero.
    pub dominant_tier: Option<Tier>,
    /// Adjusted scalar value per participating dimension.
    pub contributions: BTreeMap<String, f64>,
    /// Log-aligned copy of the vector, when requested.
    pub aligned: Option<AlignedPressure>,
}

impl AggregationResult {
    fn empty() -> Self {
        Self {
            tier_pressures: vec![0.0; TIER_COUNT],
            total_pressure: 0.0,
            dominant_tier: None,
            contributions: BTreeMap::new(),
            aligned: None,
        }
    }

    pub fn pressure(&self, tier: Tier) -> f64 {
        self.tier_pressures[tier.index()]
    }
}

/// Pressure aggregation engine over a dimension registry.
///
/// Keeps a bounded history of recent results; the latest result backs
/// the read-only diagnostics accessors.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PressureEngine {
    pub registry: DimensionRegistry,
    eps: f64,
    history_capacity: usize,
    history: VecDeque<AggregationResult>,
}

impl Default for PressureEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl PressureEngine {
    pub fn new() -> Self {
        Self::with_capacity(256)
    }

    /// `history_capacity` bounds the retained result ring; the oldest
    /// entry is dropped on overflow.
    pub fn with_capacity(history_capacity: usize) -> Self {
        Self {
            registry: DimensionRegistry::new(),
            eps: 1e-6,
            history_capacity: history_capacity.max(1),
            history: VecDeque::new(),
        }
    }

    /// Register a dimension (delegates to the registry).
    pub fn register(&mut self, dimension: PressureDimension) -> StrataResult<()> {
        self.registry.register(dimension)
    }

    pub fn set_value(&mut self, name: &str, value: f64) -> StrataResult<()> {
        self.registry.set_value(name, value)
    }

    /// Aggregate every enabled dimension into a per-tier pressure vector.
    ///
    /// Weighted-sum semantics: `tier += value * sensitivity * global
    /// modifier * weight * base_intensity`, additive and unnormalised.
    pub fn aggregate(&mut self) -> AggregationResult {
        let mut result = AggregationResult::empty();
        let global = self.registry.global_modifier();

        for (dim, value) in self.registry.iter() {
            if !dim.enabled {
                continue;
            }
            let adjusted = value * dim.sensitivity * global;
            if let Err(reason) = check_dimension(dim, adjusted) {
                warn!(dimension = %dim.name, %reason, "skipping misconfigured dimension");
                continue;
            }
            for (&tier, &weight) in &dim.weights {
                if weight != 0.0 {
                    result.tier_pressures[tier.index()] += adjusted * weight * dim.base_intensity;
                }
            }
            result.contributions.insert(dim.name.clone(), adjusted);
        }

        result.total_pressure = result.tier_pressures.iter().sum();
        if result.total_pressure.abs() > self.eps {
            result.dominant_tier = arg_max_tier(&result.tier_pressures);
        }

        self.push_history(result.clone());
        result
    }

    /// Aggregate and attach a log-aligned copy of the tier vector plus
    /// its Euclidean norm, using the caller's current adaptive gain.
    pub fn aggregate_aligned(&mut self, alpha: f64, cfg: &AlignConfig) -> AggregationResult {
        let mut result = self.aggregate();
        result.aligned = Some(AlignedPressure::compute(&result.tier_pressures, alpha, cfg));
        if let Some(last) = self.history.back_mut() {
            last.aligned.clone_from(&result.aligned);
        }
        result
    }

    /// Set the given dimension values, then aggregate.
    pub fn aggregate_values<'a>(
        &mut self,
        values: impl IntoIterator<Item = (&'a str, f64)>,
    ) -> StrataResult<AggregationResult> {
        self.registry.set_values(values)?;
        Ok(self.aggregate())
    }

    /// Most recently aggregated dominant tier and its pressure.
    ///
    /// Before the first aggregation (or when the latest vector is ~0)
    /// this is the lowest-rank tier with value 0.
    pub fn dominant_tier(&self) -> (Tier, f64) {
        match self.history.back() {
            Some(result) => match result.dominant_tier {
                Some(tier) => (tier, result.pressure(tier)),
                None => (Tier::Upper, 0.0),
            },
            None => (Tier::Upper, 0.0),
        }
    }

    /// Inter-tier conflict indices from the latest aggregation.
    ///
    /// For each unordered pair of non-Physical tiers:
    /// `P(a) * P(b) * (1 - P(Physical))` — physical-tier dominance
    /// mechanically suppresses all higher-tier conflict.
    pub fn conflict_index(&self) -> BTreeMap<(Tier, Tier), f64> {
        let mut indices = BTreeMap::new();
        let pressures = self
            .history
            .back()
            .map(|r| r.tier_pressures.as_slice())
            .unwrap_or(&[0.0; TIER_COUNT]);
        let survival_gate = 1.0 - pressures[Tier::Physical.index()];

        let upper_tiers: Vec<Tier> = Tier::ALL.iter().copied().filter(|t| !t.is_physical()).collect();
        for (i, &a) in upper_tiers.iter().enumerate() {
            for &b in &upper_tiers[i + 1..] {
                let index = pressures[a.index()] * pressures[b.index()] * survival_gate;
                indices.insert((a, b), index);
            }
        }
        indices
    }

    /// Tiers whose latest pressure strictly exceeds `threshold`; of
    /// those, the one with the highest rigidity rank wins — the most
    /// immovable triggered tier dominates the response, independent of
    /// raw magnitude ordering.
    pub fn should_trigger_leap(&self, threshold: f64) -> Option<Tier> {
        let result = self.history.back()?;
        Tier::ALL
            .iter()
            .copied()
            .find(|&tier| result.pressure(tier) > threshold)
    }

    /// Latest aggregation result, if any.
    pub fn last(&self) -> Option<&AggregationResult> {
        self.history.back()
    }

    pub fn history(&self) -> impl Iterator<Item = &AggregationResult> {
        self.history.iter()
    }

    fn push_history(&mut self, result: AggregationResult) {
        if self.history.len() == self.history_capacity {
            self.history.pop_front();
        }
        self.history.push_back(result);
    }
}

/// First strictly-maximal tier (ties keep the lower index, i.e. the
/// higher rigidity rank).
fn arg_max_tier(pressures: &[f64]) -> Option<Tier> {
    let mut best: Option<(usize, f64)> = None;
    for (idx, &p) in pressures.iter().enumerate() {
        match best {
            Some((_, top)) if p <= top => {}
            _ => best = Some((idx, p)),
        }
    }
    best.and_then(|(idx, _)| Tier::from_index(idx))
}

/// Reject dimensions whose evaluation would poison the tier vector.
fn check_dimension(dim: &PressureDimension, adjusted: f64) -> Result<(), &'static str> {
    if !adjusted.is_finite() {
        return Err("non-finite adjusted value");
    }
    if !dim.base_intensity.is_finite() {
        return Err("non-finite base intensity");
    }
    for &weight in dim.weights.values() {
        if !weight.is_finite() {
            return Err("non-finite tier weight");
        }
        if weight < 0.0 {
            return Err("negative tier weight");
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn debt_dimension() -> PressureDimension {
        PressureDimension::with_weights(
            "debt_pressure",
            [
                (Tier::Physical, 0.4),
                (Tier::Base, 0.4),
                (Tier::Core, 0.1),
                (Tier::Upper, 0.1),
            ],
        )
        .intensity(1.2)
    }

    #[test]
    fn test_weighted_sum_contributions() {
        let mut engine = PressureEngine::new();
        engine.register(debt_dimension()).unwrap();
        engine.set_value("debt_pressure", 60.0).unwrap();
        let result = engine.aggregate();

        assert_relative_eq!(result.pressure(Tier::Physical), 28.8, epsilon = 1e-10);
        assert_relative_eq!(result.pressure(Tier::Base), 28.8, epsilon = 1e-10);
        assert_relative_eq!(result.pressure(Tier::Core), 7.2, epsilon = 1e-10);
        assert_relative_eq!(result.pressure(Tier::Upper), 7.2, epsilon = 1e-10);
        assert_relative_eq!(result.contributions["debt_pressure"], 60.0, epsilon = 1e-12);
    }

    #[test]
    fn test_contributions_are_additive() {
        let mut engine = PressureEngine::new();
        engine.register(debt_dimension()).unwrap();
        engine
            .register(
                PressureDimension::with_weights("shame", [(Tier::Core, 0.5)]).intensity(0.8),
            )
            .unwrap();
        let result = engine
            .aggregate_values([("debt_pressure", 60.0), ("shame", 40.0)])
            .unwrap();
        // 7.2 from debt plus 40 * 0.5 * 0.8 = 16 from shame.
        assert_relative_eq!(result.pressure(Tier::Core), 23.2, epsilon = 1e-10);
    }

    #[test]
    fn test_disabled_dimension_contributes_nothing() {
        let mut engine = PressureEngine::new();
        engine.register(debt_dimension()).unwrap();
        engine.set_value("debt_pressure", 60.0).unwrap();
        engine.registry.set_enabled("debt_pressure", false).unwrap();
        let result = engine.aggregate();
        assert_eq!(result.total_pressure, 0.0);
        assert!(!result.contributions.contains_key("debt_pressure"));
        assert_eq!(result.dominant_tier, None);
    }

    #[test]
    fn test_misconfigured_dimension_skipped() {
        let mut engine = PressureEngine::new();
        engine.register(debt_dimension()).unwrap();
        engine
            .register(PressureDimension::with_weights("broken", [(Tier::Base, f64::NAN)]))
            .unwrap();
        engine
            .aggregate_values([("debt_pressure", 60.0), ("broken", 10.0)])
            .unwrap();
        let result = engine.last().unwrap();
        // Aggregation survives and the broken dimension is absent.
        assert!(!result.contributions.contains_key("broken"));
        assert_relative_eq!(result.pressure(Tier::Base), 28.8, epsilon = 1e-10);
    }

    #[test]
    fn test_dominant_tier_before_aggregation() {
        let engine = PressureEngine::new();
        assert_eq!(engine.dominant_tier(), (Tier::Upper, 0.0));
    }

    #[test]
    fn test_dominant_tier_argmax() {
        let mut engine = PressureEngine::new();
        engine.register(debt_dimension()).unwrap();
        engine.set_value("debt_pressure", 60.0).unwrap();
        engine.aggregate();
        // Physical and Base tie at 28.8; arg-max keeps the first.
        let (tier, value) = engine.dominant_tier();
        assert_eq!(tier, Tier::Physical);
        assert_relative_eq!(value, 28.8, epsilon = 1e-10);
    }

    #[test]
    fn test_near_zero_vector_has_no_dominant() {
        let mut engine = PressureEngine::new();
        engine.register(PressureDimension::new("quiet")).unwrap();
        engine.set_value("quiet", 1e-9).unwrap();
        let result = engine.aggregate();
        assert_eq!(result.dominant_tier, None);
        assert_eq!(engine.dominant_tier(), (Tier::Upper, 0.0));
    }

    fn engine_with_pressures(p: [f64; 4]) -> PressureEngine {
        let mut engine = PressureEngine::new();
        for (i, tier) in Tier::ALL.into_iter().enumerate() {
            engine
                .register(PressureDimension::with_weights(tier.name(), [(tier, 1.0)]))
                .unwrap();
            engine.set_value(tier.name(), p[i]).unwrap();
        }
        engine.aggregate();
        engine
    }

    #[test]
    fn test_conflict_index_formula() {
        let engine = engine_with_pressures([0.2, 0.6, 0.5, 0.4]);
        let indices = engine.conflict_index();
        let expected = 0.6 * 0.4 * (1.0 - 0.2);
        assert_relative_eq!(indices[&(Tier::Base, Tier::Upper)], expected, epsilon = 1e-10);
        assert_eq!(indices.len(), 3);
    }

    #[test]
    fn test_physical_dominance_suppresses_conflict() {
        let engine = engine_with_pressures([1.0, 0.9, 0.9, 0.9]);
        for &index in engine.conflict_index().values() {
            assert_eq!(index, 0.0);
        }
    }

    #[test]
    fn test_trigger_picks_highest_rank_not_highest_pressure() {
        let engine = engine_with_pressures([0.2, 0.8, 0.75, 0.9]);
        // Triggered set is {Base, Core, Upper}; Base outranks them all.
        assert_eq!(engine.should_trigger_leap(0.7), Some(Tier::Base));
    }

    #[test]
    fn test_trigger_none_when_nothing_exceeds() {
        let engine = engine_with_pressures([0.2, 0.3, 0.1, 0.4]);
        assert_eq!(engine.should_trigger_leap(0.7), None);
    }

    #[test]
    fn test_trigger_is_strict() {
        let engine = engine_with_pressures([0.0, 0.7, 0.0, 0.0]);
        assert_eq!(engine.should_trigger_leap(0.7), None);
    }

    #[test]
    fn test_aggregate_aligned_attaches_magnitude() {
        let mut engine = PressureEngine::new();
        engine.register(debt_dimension()).unwrap();
        engine.set_value("debt_pressure", 60.0).unwrap();
        let cfg = AlignConfig::default();
        let result = engine.aggregate_aligned(1.0, &cfg);
        let aligned = result.aligned.expect("aligned copy present");
        assert_eq!(aligned.values.len(), TIER_COUNT);
        assert!(aligned.magnitude > 0.0);
        // Compression: aligned magnitude is well below the raw one.
        let raw_norm: f64 = result.tier_pressures.iter().map(|v| v * v).sum::<f64>().sqrt();
        assert!(aligned.magnitude < raw_norm);
        assert!(engine.last().unwrap().aligned.is_some());
    }

    #[test]
    fn test_history_ring_is_bounded() {
        let mut engine = PressureEngine::with_capacity(4);
        engine.register(PressureDimension::new("noise")).unwrap();
        for i in 0..10 {
            engine.set_value("noise", i as f64).unwrap();
            engine.aggregate();
        }
        assert_eq!(engine.history().count(), 4);
        // Latest entry corresponds to the last value set.
        let last_total = engine.last().unwrap().total_pressure;
        assert_relative_eq!(last_total, 9.0, epsilon = 1e-10);
    }
}
