// ─────────────────────────────────────────────────────────────────────
// Strata Kernel — Core Dynamics
// ─────────────────────────────────────────────────────────────────────
#![deny(unsafe_code)]
//! Core dynamics engine: per-tier accumulated pressure E and rigidity
//! kappa, advanced by a discretised first-order update with log-aligned
//! input, dynamic thresholds, and deterministic/stochastic leaps.
//!
//! # Ownership Invariants
//!
//! 1. **One owner per state**: a `CoreState` belongs to exactly one
//!    logical entity and is never advanced by two callers at once. The
//!    intended parallelism is data parallelism across independent
//!    states sharing one read-only `CoreEngine`.
//!
//! 2. **Fail fast, never corrupt**: every contract check (vector
//!    shapes, timestep, random source) runs before the first state
//!    mutation. A step either completes or leaves the state exactly as
//!    it was.
//!
//! 3. **dt = 0 is a no-op tick**: the state is bit-for-bit unchanged
//!    regardless of any input, including the interlayer transfer.

pub mod engine;
pub mod leap;

pub use engine::{CoreEngine, CoreState, Diagnostics};
pub use leap::{BoltzmannSampler, LeapEvent, LeapHistory, LeapKind, LeapSampler};
