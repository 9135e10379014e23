// ─────────────────────────────────────────────────────────────────────
// Strata Kernel — Pressure Aggregation
// ─────────────────────────────────────────────────────────────────────
#![deny(unsafe_code)]
//! Named pressure dimensions and their per-tier aggregation.
//!
//! Each dimension distributes its current scalar value across the tier
//! hierarchy by a weight map; the aggregation engine folds every enabled
//! dimension into one per-tier pressure vector plus diagnostics
//! (dominant tier, inter-tier conflict indices, leap-trigger decision).
//! Aggregation uses unnormalised weighted-sum semantics: contributions
//! are additive and weights need not sum to 1.

pub mod dimension;
pub mod engine;

pub use dimension::{DimensionRegistry, PressureDimension};
pub use engine::{AggregationResult, PressureEngine};
