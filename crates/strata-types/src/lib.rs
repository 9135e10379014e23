// ─────────────────────────────────────────────────────────────────────
// Strata Kernel — Types
// ─────────────────────────────────────────────────────────────────────
#![deny(unsafe_code)]
//! Type definitions, configuration, and error hierarchy for the
//! Strata Kernel — a layered stress-accumulation and discontinuous-release
//! engine.

pub mod config;
pub mod error;
pub mod tier;

pub use config::{AlignConfig, CoreParams};
pub use error::{StrataError, StrataResult};
pub use tier::{Tier, TIER_COUNT, TIER_NAMES};
