//! Jidoka (自働化) - invariant monitoring after each tick.
//!
//! The engine itself never fails a tick. A driver that wants to stop the
//! line on an anomaly runs [`InvariantGuard::check`] after every tick.
//!
//! # Anomaly Types
//!
//! 1. **Non-finite values**: NaN or Inf in state, forces or telemetry
//! 2. **Bound violations**: sphere off the rail, negative speed
//! 3. **Decreasing losses**: cumulative dissipation went down
//! 4. **Ledger drift**: `PE + KE + losses` wandered from its baseline
//!
//! # Severity Levels
//!
//! - **Acceptable**: within tolerance, continue
//! - **Warning**: past the warning fraction of the tolerance, log and continue
//! - **Critical**: tolerance exceeded, halt
//! - **Fatal**: non-finite, halt

use log::warn;
use serde::{Deserialize, Serialize};

use crate::engine::{InclineEngine, Phase};
use crate::error::{SimError, SimResult};

/// Severity levels for guard findings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ViolationSeverity {
    /// Within tolerance.
    Acceptable,
    /// Approaching tolerance.
    Warning,
    /// Tolerance exceeded.
    Critical,
    /// Unrecoverable state.
    Fatal,
}

/// Classifier for graduated responses.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SeverityClassifier {
    /// Warning threshold as fraction of tolerance (0.8 = warn at 80%).
    pub warning_fraction: f64,
}

impl Default for SeverityClassifier {
    fn default() -> Self {
        Self {
            warning_fraction: 0.8,
        }
    }
}

impl SeverityClassifier {
    /// Create a new severity classifier.
    #[must_use]
    pub const fn new(warning_fraction: f64) -> Self {
        Self { warning_fraction }
    }

    /// Classify a non-negative deviation against a tolerance.
    #[must_use]
    pub fn classify(&self, deviation: f64, tolerance: f64) -> ViolationSeverity {
        let deviation = deviation.abs();
        if !deviation.is_finite() {
            ViolationSeverity::Fatal
        } else if deviation > tolerance {
            ViolationSeverity::Critical
        } else if deviation > tolerance * self.warning_fraction {
            ViolationSeverity::Warning
        } else {
            ViolationSeverity::Acceptable
        }
    }
}

/// Non-critical finding.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum GuardWarning {
    /// Energy ledger drift approaching tolerance.
    LedgerDriftApproaching {
        /// Relative drift.
        drift: f64,
        /// Tolerance threshold.
        tolerance: f64,
    },
    /// Constraint approaching violation.
    ConstraintApproaching {
        /// Constraint name.
        name: String,
        /// Violation amount.
        violation: f64,
        /// Tolerance threshold.
        tolerance: f64,
    },
}

/// Guard configuration.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GuardConfig {
    /// Maximum relative drift of `PE + KE + losses` from the baseline.
    ///
    /// Buoyancy work is not booked as a loss, so the ledger of a sphere in
    /// air sags by roughly `ρ_air / ρ_sphere` of its initial energy.
    pub ledger_tolerance: f64,
    /// Absolute slack on bound and monotonicity constraints.
    pub constraint_tolerance: f64,
    /// NaN/Inf detection enabled.
    pub check_finite: bool,
    /// Energy ledger check enabled.
    pub check_ledger: bool,
    /// Severity classifier.
    #[serde(default)]
    pub severity_classifier: SeverityClassifier,
}

impl Default for GuardConfig {
    fn default() -> Self {
        Self {
            ledger_tolerance: 0.05,
            constraint_tolerance: 1e-9,
            check_finite: true,
            check_ledger: true,
            severity_classifier: SeverityClassifier::default(),
        }
    }
}

/// Result of one guard inspection.
#[derive(Debug)]
pub enum GuardResponse {
    /// All checks acceptable.
    Continue,
    /// Approaching a tolerance; logged, keep going.
    Warning(Vec<GuardWarning>),
    /// Stop the line.
    Halt(SimError),
}

impl GuardResponse {
    /// Whether the driver must stop.
    #[must_use]
    pub const fn is_halt(&self) -> bool {
        matches!(self, Self::Halt(_))
    }

    /// Convert into a result carrying any warnings.
    ///
    /// # Errors
    ///
    /// Returns the halting error.
    pub fn into_result(self) -> SimResult<Vec<GuardWarning>> {
        match self {
            Self::Continue => Ok(Vec::new()),
            Self::Warning(warnings) => Ok(warnings),
            Self::Halt(err) => Err(err),
        }
    }
}

/// Post-tick invariant monitor for an [`InclineEngine`].
///
/// # Example
///
/// ```rust
/// use incline_sim::engine::{InclineEngine, InvariantGuard};
///
/// let mut engine = InclineEngine::default();
/// let mut guard = InvariantGuard::for_engine(&engine);
///
/// engine.start();
/// engine.step();
/// assert!(!guard.check(&engine).is_halt());
/// ```
#[derive(Debug, Clone)]
pub struct InvariantGuard {
    config: GuardConfig,
    baseline_ledger: Option<f64>,
    last_friction_loss: f64,
    last_drag_loss: f64,
    checks: u64,
}

impl Default for InvariantGuard {
    fn default() -> Self {
        Self::new(GuardConfig::default())
    }
}

impl InvariantGuard {
    /// Create a guard; the ledger baseline is taken on the first check.
    #[must_use]
    pub const fn new(config: GuardConfig) -> Self {
        Self {
            config,
            baseline_ledger: None,
            last_friction_loss: 0.0,
            last_drag_loss: 0.0,
            checks: 0,
        }
    }

    /// Create a guard with default settings baselined on `engine`.
    #[must_use]
    pub fn for_engine(engine: &InclineEngine) -> Self {
        let mut guard = Self::default();
        guard.rebase(engine);
        guard
    }

    /// Re-take the ledger baseline and loss marks, e.g. after a reset or a
    /// change of gravity, mass or angle.
    pub fn rebase(&mut self, engine: &InclineEngine) {
        self.baseline_ledger = Some(engine.telemetry().energy_ledger_j());
        self.last_friction_loss = engine.state().friction_loss_j;
        self.last_drag_loss = engine.state().drag_loss_j;
    }

    /// Number of inspections performed.
    #[must_use]
    pub const fn checks(&self) -> u64 {
        self.checks
    }

    /// Current configuration.
    #[must_use]
    pub const fn config(&self) -> &GuardConfig {
        &self.config
    }

    /// Inspect the engine after a tick.
    pub fn check(&mut self, engine: &InclineEngine) -> GuardResponse {
        self.checks += 1;

        if self.config.check_finite {
            if let Err(err) = Self::check_finite(engine) {
                return GuardResponse::Halt(err);
            }
        }

        let mut warnings = match self.check_constraints(engine) {
            Ok(warnings) => warnings,
            Err(err) => return GuardResponse::Halt(err),
        };

        if self.config.check_ledger {
            match self.check_ledger(engine) {
                Ok(Some(warning)) => warnings.push(warning),
                Ok(None) => {}
                Err(err) => return GuardResponse::Halt(err),
            }
        }

        self.last_friction_loss = engine.state().friction_loss_j;
        self.last_drag_loss = engine.state().drag_loss_j;

        if warnings.is_empty() {
            GuardResponse::Continue
        } else {
            for warning in &warnings {
                warn!("invariant guard: {warning:?}");
            }
            GuardResponse::Warning(warnings)
        }
    }

    fn check_finite(engine: &InclineEngine) -> SimResult<()> {
        let state = engine.state();
        let telemetry = engine.telemetry();
        let fields = [
            ("state.elapsed_time_s", state.elapsed_time_s),
            ("state.displacement_m", state.displacement_m),
            ("state.speed_mps", state.speed_mps),
            ("state.friction_loss_j", state.friction_loss_j),
            ("state.drag_loss_j", state.drag_loss_j),
            ("telemetry.acceleration_mps2", telemetry.acceleration_mps2),
            ("telemetry.drag_n", telemetry.drag_n),
            ("telemetry.total_j", telemetry.total_j),
        ];

        for (location, value) in fields {
            if !value.is_finite() {
                return Err(SimError::NonFiniteValue {
                    location: location.to_string(),
                });
            }
        }
        if !engine.forces().is_finite() {
            return Err(SimError::NonFiniteValue {
                location: "forces".to_string(),
            });
        }
        Ok(())
    }

    fn constraint_violations(&self, engine: &InclineEngine) -> Vec<(&'static str, f64)> {
        let state = engine.state();
        let mut violations = vec![
            ("displacement_nonnegative", (-state.displacement_m).max(0.0)),
            ("speed_nonnegative", (-state.speed_mps).max(0.0)),
            (
                "friction_loss_monotone",
                (self.last_friction_loss - state.friction_loss_j).max(0.0),
            ),
            (
                "drag_loss_monotone",
                (self.last_drag_loss - state.drag_loss_j).max(0.0),
            ),
        ];

        // A paused sphere may sit past a rail shortened since the last tick.
        if state.phase != Phase::Paused {
            let overshoot = state.displacement_m - engine.rail().rail_length_m();
            violations.push(("displacement_within_rail", overshoot.max(0.0)));
        }

        violations
    }

    fn check_constraints(&self, engine: &InclineEngine) -> SimResult<Vec<GuardWarning>> {
        let tolerance = self.config.constraint_tolerance;
        let mut warnings = Vec::new();

        for (name, violation) in self.constraint_violations(engine) {
            match self.config.severity_classifier.classify(violation, tolerance) {
                ViolationSeverity::Acceptable => {}
                ViolationSeverity::Warning => warnings.push(GuardWarning::ConstraintApproaching {
                    name: name.to_string(),
                    violation,
                    tolerance,
                }),
                ViolationSeverity::Critical | ViolationSeverity::Fatal => {
                    return Err(SimError::ConstraintViolation {
                        name: name.to_string(),
                        violation,
                        tolerance,
                    });
                }
            }
        }

        Ok(warnings)
    }

    fn check_ledger(&mut self, engine: &InclineEngine) -> SimResult<Option<GuardWarning>> {
        let ledger = engine.telemetry().energy_ledger_j();

        let Some(baseline) = self.baseline_ledger else {
            self.baseline_ledger = Some(ledger);
            return Ok(None);
        };

        // Nothing to compare against (flat rail at rest).
        if baseline.abs() < f64::EPSILON {
            return Ok(None);
        }

        let drift = (ledger - baseline).abs() / baseline.abs();
        let tolerance = self.config.ledger_tolerance;

        match self.config.severity_classifier.classify(drift, tolerance) {
            ViolationSeverity::Acceptable => Ok(None),
            ViolationSeverity::Warning => Ok(Some(GuardWarning::LedgerDriftApproaching { drift, tolerance })),
            ViolationSeverity::Critical | ViolationSeverity::Fatal => {
                Err(SimError::EnergyLedgerDrift { drift, tolerance })
            }
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
mod tests {
    use super::*;
    use crate::config::{PhysicalConstants, SimConfig};

    #[test]
    fn test_classifier_levels() {
        let c = SeverityClassifier::default();
        assert_eq!(c.classify(0.5, 1.0), ViolationSeverity::Acceptable);
        assert_eq!(c.classify(0.9, 1.0), ViolationSeverity::Warning);
        assert_eq!(c.classify(1.5, 1.0), ViolationSeverity::Critical);
        assert_eq!(c.classify(f64::NAN, 1.0), ViolationSeverity::Fatal);
        assert_eq!(c.classify(f64::INFINITY, 1.0), ViolationSeverity::Fatal);
    }

    #[test]
    fn test_clean_run_never_halts() {
        let mut engine = InclineEngine::default();
        let mut guard = InvariantGuard::for_engine(&engine);
        engine.start();

        while engine.is_running() {
            engine.step();
            let response = guard.check(&engine);
            assert!(!response.is_halt(), "{response:?}");
        }
        assert!(guard.checks() > 100);
    }

    #[test]
    fn test_vacuum_ledger_stays_tight() {
        let config = SimConfig::builder()
            .angle_deg(45.0)
            .rail_length_m(50.0)
            .constants(PhysicalConstants::frictionless_vacuum())
            .build();
        let mut engine = InclineEngine::new(config).unwrap();
        let mut guard = InvariantGuard::new(GuardConfig {
            ledger_tolerance: 0.01,
            ..GuardConfig::default()
        });
        guard.rebase(&engine);
        engine.start();

        while engine.is_running() {
            engine.step();
            let warnings = guard.check(&engine).into_result().unwrap();
            assert!(warnings.is_empty());
        }
    }

    #[test]
    fn test_ledger_drift_halts() {
        let mut engine = InclineEngine::default();
        let mut guard = InvariantGuard::for_engine(&engine);

        // Quadrupling gravity without a rebase inflates PE well past tolerance.
        engine.set_gravity(40.0);
        let err = guard.check(&engine).into_result().unwrap_err();
        assert!(matches!(err, SimError::EnergyLedgerDrift { .. }));

        guard.rebase(&engine);
        assert!(!guard.check(&engine).is_halt());
    }

    #[test]
    fn test_ledger_drift_warns_near_tolerance() {
        let mut engine = InclineEngine::default();
        let mut guard = InvariantGuard::for_engine(&engine);

        // PE scales with gravity: +4.5 % sits between 80 % and 100 % of 5 %.
        engine.set_gravity(9.81 * 1.045);
        match guard.check(&engine) {
            GuardResponse::Warning(warnings) => assert!(matches!(
                warnings[0],
                GuardWarning::LedgerDriftApproaching { .. }
            )),
            other => panic!("expected warning, got {other:?}"),
        }
    }

    #[test]
    fn test_decreasing_loss_halts() {
        let mut engine = InclineEngine::default();
        engine.start();
        for _ in 0..200 {
            engine.step();
        }
        let mut guard = InvariantGuard::for_engine(&engine);

        // A reset without a rebase looks like losses running backwards.
        engine.reset();
        let err = guard.check(&engine).into_result().unwrap_err();
        assert!(matches!(err, SimError::ConstraintViolation { .. }));
        assert!(err.is_invariant_violation());
    }

    #[test]
    fn test_paused_overshoot_tolerated_until_next_tick() {
        let config = SimConfig::builder().angle_deg(60.0).rail_length_m(20.0).build();
        let mut engine = InclineEngine::new(config).unwrap();
        engine.start();
        while engine.state().displacement_m < 5.0 {
            engine.step();
        }
        engine.pause();
        engine.set_rail_length(2.0);

        let mut guard = InvariantGuard::new(GuardConfig {
            check_ledger: false,
            ..GuardConfig::default()
        });
        guard.rebase(&engine);
        assert!(!guard.check(&engine).is_halt());

        engine.start();
        engine.step();
        assert!(!guard.check(&engine).is_halt());
    }

    #[test]
    fn test_first_check_takes_baseline() {
        let engine = InclineEngine::default();
        let mut guard = InvariantGuard::default();
        assert!(matches!(guard.check(&engine), GuardResponse::Continue));
        assert_eq!(guard.checks(), 1);
    }
}
