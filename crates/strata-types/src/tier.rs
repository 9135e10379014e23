// ─────────────────────────────────────────────────────────────────────
// Strata Kernel — Structural Tiers
// ─────────────────────────────────────────────────────────────────────
//! Ordered structural tiers with fixed rigidity ranks.
//!
//! The canonical hierarchy has four tiers with strictly decreasing
//! rigidity: Physical (1000) > Base (100) > Core (10) > Upper (1).
//! The rank is an ordering device for tie-breaking — never compared
//! against pressure magnitudes.

use serde::{Deserialize, Serialize};

/// Number of tiers in the canonical hierarchy.
pub const TIER_COUNT: usize = 4;

pub const TIER_NAMES: [&str; TIER_COUNT] = ["Physical", "Base", "Core", "Upper"];

/// Canonical rigidity ranks, strictly decreasing with tier index.
const RIGIDITY_RANKS: [f64; TIER_COUNT] = [1000.0, 100.0, 10.0, 1.0];

/// A structural tier. Declaration order encodes the rigidity ordering:
/// lower index = higher rank = harder to move.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Tier {
    /// Physiology and reflex. Survival-level; dominates everything above it.
    Physical,
    /// Instinct, drive, emotion.
    Base,
    /// Norms, values, identity.
    Core,
    /// Ideals and transcendent commitments. Most mobile.
    Upper,
}

impl Tier {
    pub const ALL: [Tier; TIER_COUNT] = [Tier::Physical, Tier::Base, Tier::Core, Tier::Upper];

    /// Position in the per-tier vectors (E, kappa, theta).
    pub fn index(self) -> usize {
        self as usize
    }

    pub fn from_index(idx: usize) -> Option<Tier> {
        Tier::ALL.get(idx).copied()
    }

    pub fn name(self) -> &'static str {
        TIER_NAMES[self.index()]
    }

    /// Rigidity rank R. Used only for tie-breaking, never for
    /// magnitude comparison against pressures.
    pub fn rigidity_rank(self) -> f64 {
        RIGIDITY_RANKS[self.index()]
    }

    pub fn is_physical(self) -> bool {
        matches!(self, Tier::Physical)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tier_count_consistent() {
        assert_eq!(Tier::ALL.len(), TIER_COUNT);
        assert_eq!(TIER_NAMES.len(), TIER_COUNT);
    }

    #[test]
    fn test_index_roundtrip() {
        for tier in Tier::ALL {
            assert_eq!(Tier::from_index(tier.index()), Some(tier));
        }
        assert_eq!(Tier::from_index(TIER_COUNT), None);
    }

    #[test]
    fn test_rigidity_strictly_decreasing() {
        for pair in Tier::ALL.windows(2) {
            assert!(
                pair[0].rigidity_rank() > pair[1].rigidity_rank(),
                "{} should outrank {}",
                pair[0].name(),
                pair[1].name()
            );
        }
    }

    #[test]
    fn test_enum_order_matches_rank_order() {
        // Lower index = higher rank, so Ord on the enum sorts by rank.
        assert!(Tier::Physical < Tier::Base);
        assert!(Tier::Base < Tier::Core);
        assert!(Tier::Core < Tier::Upper);
    }
}
