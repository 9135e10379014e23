// ─────────────────────────────────────────────────────────────────────
// Strata Kernel — Dimension Registry
// ─────────────────────────────────────────────────────────────────────
//! Named pressure-dimension definitions and their current values.
//!
//! A dimension is declarative configuration: a tier weight map, a base
//! intensity, and a sensitivity factor, evaluated by one generic
//! aggregation routine. There is no per-dimension callable.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use strata_types::{StrataError, StrataResult, Tier};

/// A named source of pressure.
///
/// `weights` maps each targeted tier to a non-negative weight; weights
/// need not sum to 1. `temporal_decay` is informational — it tells a
/// collaborator how fast this dimension's effect should fade if values
/// are decayed between ticks; the registry itself is stateless with
/// respect to it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PressureDimension {
    pub name: String,
    pub description: String,
    pub weights: BTreeMap<Tier, f64>,
    pub base_intensity: f64,
    pub sensitivity: f64,
    pub temporal_decay: f64,
    pub enabled: bool,
}

impl PressureDimension {
    /// A dimension with uniform weights across all tiers.
    pub fn new(name: &str) -> Self {
        let weights = Tier::ALL
            .iter()
            .map(|&t| (t, 1.0 / Tier::ALL.len() as f64))
            .collect();
        Self {
            name: name.to_string(),
            description: String::new(),
            weights,
            base_intensity: 1.0,
            sensitivity: 1.0,
            temporal_decay: 0.95,
            enabled: true,
        }
    }

    pub fn with_weights(name: &str, weights: impl IntoIterator<Item = (Tier, f64)>) -> Self {
        Self {
            weights: weights.into_iter().collect(),
            ..Self::new(name)
        }
    }

    pub fn intensity(mut self, base_intensity: f64) -> Self {
        self.base_intensity = base_intensity;
        self
    }

    pub fn sensitivity(mut self, sensitivity: f64) -> Self {
        self.sensitivity = sensitivity;
        self
    }

    pub fn decay(mut self, temporal_decay: f64) -> Self {
        self.temporal_decay = temporal_decay;
        self
    }
}

/// Stores dimension definitions and their current scalar values.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DimensionRegistry {
    dimensions: BTreeMap<String, PressureDimension>,
    values: BTreeMap<String, f64>,
    /// Multiplies every dimension's effective sensitivity at aggregation.
    global_modifier: f64,
}

impl DimensionRegistry {
    pub fn new() -> Self {
        Self {
            dimensions: BTreeMap::new(),
            values: BTreeMap::new(),
            global_modifier: 1.0,
        }
    }

    /// Register a dimension. Re-registration with an existing name
    /// overwrites the prior definition; the current value resets to 0.
    pub fn register(&mut self, dimension: PressureDimension) -> StrataResult<()> {
        if dimension.name.is_empty() {
            return Err(StrataError::Config("dimension name must be non-empty".to_string()));
        }
        self.values.insert(dimension.name.clone(), 0.0);
        self.dimensions.insert(dimension.name.clone(), dimension);
        Ok(())
    }

    /// Set the current value of a registered dimension. The value is an
    /// arbitrary real; callers apply their own domain clipping.
    pub fn set_value(&mut self, name: &str, value: f64) -> StrataResult<()> {
        if !self.dimensions.contains_key(name) {
            return Err(StrataError::UnknownDimension { name: name.to_string() });
        }
        self.values.insert(name.to_string(), value);
        Ok(())
    }

    /// Bulk value update; fails on the first unknown name.
    pub fn set_values<'a>(
        &mut self,
        values: impl IntoIterator<Item = (&'a str, f64)>,
    ) -> StrataResult<()> {
        for (name, value) in values {
            self.set_value(name, value)?;
        }
        Ok(())
    }

    pub fn set_enabled(&mut self, name: &str, enabled: bool) -> StrataResult<()> {
        let dim = self
            .dimensions
            .get_mut(name)
            .ok_or_else(|| StrataError::UnknownDimension { name: name.to_string() })?;
        dim.enabled = enabled;
        Ok(())
    }

    /// Override one tier's weight for a registered dimension.
    pub fn set_weight(&mut self, name: &str, tier: Tier, weight: f64) -> StrataResult<()> {
        let dim = self
            .dimensions
            .get_mut(name)
            .ok_or_else(|| StrataError::UnknownDimension { name: name.to_string() })?;
        dim.weights.insert(tier, weight);
        Ok(())
    }

    /// Remove a dimension and its value.
    pub fn remove(&mut self, name: &str) -> StrataResult<PressureDimension> {
        let dim = self
            .dimensions
            .remove(name)
            .ok_or_else(|| StrataError::UnknownDimension { name: name.to_string() })?;
        self.values.remove(name);
        Ok(dim)
    }

    /// Apply a global sensitivity modulation (e.g. heightened perceptual
    /// gain). The modifier becomes `(1 + level*0.5) * (1 + context_weight*0.3)`;
    /// strong modulation (level > 0.5) additionally boosts each
    /// dimension's own sensitivity, so reapplication is idempotent only
    /// at level 0.
    pub fn apply_global_sensitivity(&mut self, level: f64, context_weight: f64) {
        let base_multiplier = 1.0 + level * 0.5;
        let context_modifier = 1.0 + context_weight * 0.3;
        self.global_modifier = base_multiplier * context_modifier;

        if level > 0.5 {
            for dim in self.dimensions.values_mut() {
                dim.sensitivity *= 1.0 + level * 0.2;
            }
        }
    }

    pub fn global_modifier(&self) -> f64 {
        self.global_modifier
    }

    pub fn contains(&self, name: &str) -> bool {
        self.dimensions.contains_key(name)
    }

    pub fn get(&self, name: &str) -> Option<&PressureDimension> {
        self.dimensions.get(name)
    }

    pub fn value(&self, name: &str) -> Option<f64> {
        self.values.get(name).copied()
    }

    pub fn len(&self) -> usize {
        self.dimensions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.dimensions.is_empty()
    }

    /// Iterate over (dimension, current value) pairs.
    pub fn iter(&self) -> impl Iterator<Item = (&PressureDimension, f64)> {
        self.dimensions
            .values()
            .map(|dim| (dim, self.values.get(&dim.name).copied().unwrap_or(0.0)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_dimension_uniform_weights() {
        let dim = PressureDimension::new("noise");
        let sum: f64 = dim.weights.values().sum();
        assert!((sum - 1.0).abs() < 1e-12);
        assert!(dim.enabled);
    }

    #[test]
    fn test_register_and_set_value() {
        let mut reg = DimensionRegistry::new();
        reg.register(PressureDimension::new("debt")).unwrap();
        assert_eq!(reg.value("debt"), Some(0.0));
        reg.set_value("debt", 42.0).unwrap();
        assert_eq!(reg.value("debt"), Some(42.0));
    }

    #[test]
    fn test_empty_name_rejected() {
        let mut reg = DimensionRegistry::new();
        assert!(reg.register(PressureDimension::new("")).is_err());
    }

    #[test]
    fn test_reregistration_overwrites() {
        let mut reg = DimensionRegistry::new();
        reg.register(PressureDimension::new("debt").intensity(1.0)).unwrap();
        reg.set_value("debt", 99.0).unwrap();
        reg.register(PressureDimension::new("debt").intensity(2.5)).unwrap();
        assert_eq!(reg.get("debt").unwrap().base_intensity, 2.5);
        // Value resets with the new definition.
        assert_eq!(reg.value("debt"), Some(0.0));
        assert_eq!(reg.len(), 1);
    }

    #[test]
    fn test_set_value_unknown_name() {
        let mut reg = DimensionRegistry::new();
        let err = reg.set_value("ghost", 1.0).unwrap_err();
        assert!(matches!(err, StrataError::UnknownDimension { .. }));
        assert!(reg.is_empty());
    }

    #[test]
    fn test_set_enabled_and_weight() {
        let mut reg = DimensionRegistry::new();
        reg.register(PressureDimension::new("debt")).unwrap();
        reg.set_enabled("debt", false).unwrap();
        assert!(!reg.get("debt").unwrap().enabled);
        reg.set_weight("debt", Tier::Base, 0.9).unwrap();
        assert_eq!(reg.get("debt").unwrap().weights[&Tier::Base], 0.9);
        assert!(reg.set_weight("ghost", Tier::Base, 0.9).is_err());
    }

    #[test]
    fn test_remove() {
        let mut reg = DimensionRegistry::new();
        reg.register(PressureDimension::new("debt")).unwrap();
        reg.remove("debt").unwrap();
        assert!(reg.is_empty());
        assert!(reg.remove("debt").is_err());
    }

    #[test]
    fn test_global_sensitivity_modifier() {
        let mut reg = DimensionRegistry::new();
        reg.register(PressureDimension::new("debt")).unwrap();
        reg.apply_global_sensitivity(0.8, 0.9);
        let expected = (1.0 + 0.8 * 0.5) * (1.0 + 0.9 * 0.3);
        assert!((reg.global_modifier() - expected).abs() < 1e-12);
        // Strong modulation also boosts per-dimension sensitivity.
        assert!((reg.get("debt").unwrap().sensitivity - 1.16).abs() < 1e-12);
    }

    #[test]
    fn test_global_sensitivity_level_zero_idempotent() {
        let mut reg = DimensionRegistry::new();
        reg.register(PressureDimension::new("debt")).unwrap();
        reg.apply_global_sensitivity(0.0, 0.0);
        reg.apply_global_sensitivity(0.0, 0.0);
        assert!((reg.global_modifier() - 1.0).abs() < 1e-12);
        assert!((reg.get("debt").unwrap().sensitivity - 1.0).abs() < 1e-12);
    }
}
