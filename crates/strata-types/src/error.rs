// ─────────────────────────────────────────────────────────────────────
// Strata Kernel — Error Hierarchy
// ─────────────────────────────────────────────────────────────────────

use thiserror::Error;

/// Root error type for all Strata Kernel failures.
///
/// Per-dimension evaluation failures during aggregation are deliberately
/// absent: they are isolated, logged, and skipped inside the aggregation
/// loop and never surface as an error.
#[derive(Error, Debug)]
pub enum StrataError {
    /// A dimension name was used without prior registration.
    #[error("unknown pressure dimension: {name}")]
    UnknownDimension { name: String },

    /// A pressure or transfer vector does not match the tier count.
    #[error("vector length {got} does not match tier count {expected}")]
    ShapeMismatch { expected: usize, got: usize },

    /// Negative or non-finite timestep. dt = 0 is a valid no-op tick.
    #[error("invalid timestep: {0}")]
    InvalidTimestep(f64),

    /// Stochastic leaps are enabled with T > 0 but no RNG was supplied.
    #[error("stochastic leaps enabled with T > 0 but no random source supplied")]
    MissingRandomSource,

    /// Configuration error.
    #[error("config error: {0}")]
    Config(String),

    /// Numerical error (NaN/Inf in computation).
    #[error("numerical error: {0}")]
    Numerical(String),
}

pub type StrataResult<T> = Result<T, StrataError>;
