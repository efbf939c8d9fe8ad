//! Error types for incline-sim.
//!
//! The integration step itself never fails: out-of-range parameters are
//! clamped and ticks at the rail end are ignored. Errors only surface at the
//! edges of the system: loading configuration, serializing reports, and the
//! optional run-time invariant guard.

use thiserror::Error;

/// Result type alias for incline-sim operations.
pub type SimResult<T> = Result<T, SimError>;

/// Unified error type for all incline-sim operations.
#[derive(Debug, Error)]
pub enum SimError {
    // ===== Invariant Violations =====
    /// Numerical instability detected (NaN or Inf).
    #[error("Invariant: non-finite value detected at {location}")]
    NonFiniteValue {
        /// Location where the non-finite value was detected.
        location: String,
    },

    /// Physical constraint (bounds, monotonic losses) violated.
    #[error("Invariant: constraint '{name}' violated by {violation:.6e} (tolerance: {tolerance:.6e})")]
    ConstraintViolation {
        /// Name of the violated constraint.
        name: String,
        /// Amount of violation.
        violation: f64,
        /// Configured tolerance.
        tolerance: f64,
    },

    /// Energy ledger (PE + KE + losses) drifted beyond tolerance.
    #[error("Invariant: energy ledger drift {drift:.6e} exceeds tolerance {tolerance:.6e}")]
    EnergyLedgerDrift {
        /// Relative drift from the baseline ledger.
        drift: f64,
        /// Configured tolerance threshold.
        tolerance: f64,
    },

    // ===== Configuration Errors =====
    /// Invalid configuration parameter.
    #[error("Configuration error: {message}")]
    Config {
        /// Description of the configuration error.
        message: String,
    },

    /// YAML parsing error.
    #[error("YAML parsing error: {0}")]
    YamlParse(#[from] serde_yaml::Error),

    /// Validation error.
    #[error("Validation error: {0}")]
    Validation(#[from] validator::ValidationErrors),

    /// No preset scenario with the requested name.
    #[error("Unknown scenario '{0}'")]
    UnknownScenario(String),

    // ===== I/O Errors =====
    /// File I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error.
    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl SimError {
    /// Create a configuration error with a message.
    #[must_use]
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Create a serialization error.
    #[must_use]
    pub fn serialization(message: impl Into<String>) -> Self {
        Self::Serialization(message.into())
    }

    /// Check if this error was raised by the invariant guard.
    #[must_use]
    pub const fn is_invariant_violation(&self) -> bool {
        matches!(
            self,
            Self::NonFiniteValue { .. }
                | Self::ConstraintViolation { .. }
                | Self::EnergyLedgerDrift { .. }
        )
    }
}

impl From<serde_json::Error> for SimError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}
