//! Pre-built rail scenarios with analytic expectations.
//!
//! - `classic-incline`: 30° rail, 10 m, default constants
//! - `vertical-drop`: 90° rail, 10 m, friction switched off by geometry
//! - `flat-rail`: 0° rail, sphere at rest, never reaches the end
//! - `long-drop`: 90° rail, 1000 m, converges to the drag-limited speed

use serde::{Deserialize, Serialize};

use crate::config::SimConfig;
use crate::engine::forces::{effective_gravity, terminal_speed};
use crate::engine::{InclineEngine, RunOutcome};
use crate::error::{SimError, SimResult};

/// Analytic check applied to a finished run.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Expectation {
    /// Final speed at or somewhat below the drag-free kinematic bound
    /// `sqrt(v0² + 2·a_eff·L)`, where drag costs at most `max_drag_shortfall`.
    KinematicBound {
        /// Drag-free final speed (m/s).
        bound_mps: f64,
        /// Largest accepted relative shortfall below the bound.
        max_drag_shortfall: f64,
    },
    /// Final speed within `tolerance` (relative) of the drag-limited speed.
    TerminalSpeed {
        /// Drag-limited speed (m/s).
        terminal_mps: f64,
        /// Relative tolerance.
        tolerance: f64,
    },
    /// The sphere never moves.
    AtRest,
}

impl Expectation {
    /// Reference speed, if the expectation has one.
    #[must_use]
    pub const fn reference_speed(&self) -> Option<f64> {
        match self {
            Self::KinematicBound { bound_mps, .. } => Some(*bound_mps),
            Self::TerminalSpeed { terminal_mps, .. } => Some(*terminal_mps),
            Self::AtRest => None,
        }
    }

    /// Judge a finished run.
    #[must_use]
    pub fn holds(&self, engine: &InclineEngine, outcome: RunOutcome) -> bool {
        let speed = engine.state().speed_mps;
        match *self {
            Self::KinematicBound {
                bound_mps,
                max_drag_shortfall,
            } => {
                // Euler error may push slightly past the bound.
                outcome.reached_end()
                    && speed <= bound_mps * 1.01
                    && speed >= bound_mps * (1.0 - max_drag_shortfall)
            }
            Self::TerminalSpeed {
                terminal_mps,
                tolerance,
            } => outcome.reached_end() && (speed - terminal_mps).abs() <= tolerance * terminal_mps,
            Self::AtRest => {
                !outcome.reached_end()
                    && speed == 0.0
                    && engine.state().displacement_m == 0.0
            }
        }
    }
}

/// A named preset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Scenario {
    /// Preset name used on the command line.
    pub name: String,
    /// One-line description.
    pub description: String,
    /// Full configuration.
    pub config: SimConfig,
    /// Tick budget for [`InclineEngine::run_to_end`].
    pub max_steps: u64,
    /// Analytic expectation.
    pub expectation: Expectation,
}

impl Scenario {
    fn new(name: &str, description: &str, config: SimConfig, max_steps: u64) -> Self {
        let expectation = expectation_for(&config);
        Self {
            name: name.to_string(),
            description: description.to_string(),
            config,
            max_steps,
            expectation,
        }
    }

    /// Classic incline: 30°, 10 m, 1 kg, from rest.
    #[must_use]
    pub fn classic_incline() -> Self {
        Self::new(
            "classic-incline",
            "30° rail, 10 m, 1 kg sphere released from rest",
            SimConfig::builder().angle_deg(30.0).rail_length_m(10.0).build(),
            100_000,
        )
    }

    /// Vertical drop: 90°, 10 m. Friction is zero throughout.
    #[must_use]
    pub fn vertical_drop() -> Self {
        Self::new(
            "vertical-drop",
            "90° rail, 10 m: free fall against drag, no friction",
            SimConfig::builder().angle_deg(90.0).rail_length_m(10.0).build(),
            100_000,
        )
    }

    /// Flat rail: 0°, at rest. Never terminates; bounded by `max_steps`.
    #[must_use]
    pub fn flat_rail() -> Self {
        Self::new(
            "flat-rail",
            "0° rail, sphere at rest: no drive, no progress",
            SimConfig::builder().angle_deg(0.0).rail_length_m(10.0).build(),
            4_000,
        )
    }

    /// Long vertical drop that converges to the drag-limited speed.
    #[must_use]
    pub fn long_drop() -> Self {
        Self::new(
            "long-drop",
            "90° rail, 1000 m: converges to the drag-limited speed",
            SimConfig::builder().angle_deg(90.0).rail_length_m(1000.0).build(),
            1_000_000,
        )
    }

    /// Every preset, in listing order.
    #[must_use]
    pub fn all() -> Vec<Self> {
        vec![
            Self::classic_incline(),
            Self::vertical_drop(),
            Self::flat_rail(),
            Self::long_drop(),
        ]
    }

    /// Look up a preset by name.
    ///
    /// # Errors
    ///
    /// Returns [`SimError::UnknownScenario`] if no preset matches.
    pub fn by_name(name: &str) -> SimResult<Self> {
        Self::all()
            .into_iter()
            .find(|s| s.name == name)
            .ok_or_else(|| SimError::UnknownScenario(name.to_string()))
    }

    /// Build a fresh engine for this preset.
    ///
    /// # Errors
    ///
    /// Returns error if the preset configuration fails validation.
    pub fn engine(&self) -> SimResult<InclineEngine> {
        InclineEngine::new(self.config.clone())
    }

    /// Run the preset to completion (or its tick budget) and judge it.
    ///
    /// # Errors
    ///
    /// Returns error if the preset configuration fails validation.
    pub fn run(&self) -> SimResult<(InclineEngine, ScenarioOutcome)> {
        let mut engine = self.engine()?;
        let outcome = engine.run_to_end(self.max_steps);
        let report = ScenarioOutcome::judge(self, &engine, outcome);
        Ok((engine, report))
    }
}

/// Verdict for one preset run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScenarioOutcome {
    /// Preset name.
    pub name: String,
    /// How the run finished.
    pub run: RunOutcome,
    /// Simulated time at the end of the run (s).
    pub elapsed_time_s: f64,
    /// Final speed (m/s).
    pub final_speed_mps: f64,
    /// Final displacement (m).
    pub final_displacement_m: f64,
    /// Reference speed from the analytic expectation (m/s).
    pub reference_speed_mps: Option<f64>,
    /// Relative deviation from the reference speed.
    pub relative_error: Option<f64>,
    /// Whether the expectation held.
    pub passed: bool,
}

impl ScenarioOutcome {
    fn judge(scenario: &Scenario, engine: &InclineEngine, run: RunOutcome) -> Self {
        let speed = engine.state().speed_mps;
        let reference = scenario.expectation.reference_speed();
        Self {
            name: scenario.name.clone(),
            run,
            elapsed_time_s: engine.state().elapsed_time_s,
            final_speed_mps: speed,
            final_displacement_m: engine.state().displacement_m,
            reference_speed_mps: reference,
            relative_error: reference.map(|r| (speed - r) / r),
            passed: scenario.expectation.holds(engine, run),
        }
    }
}

/// Drag-free acceleration along the rail, `g_eff·(sin θ − μ·cos θ)`.
#[must_use]
pub fn drag_free_acceleration(config: &SimConfig) -> f64 {
    let rail = &config.rail;
    let g_eff = effective_gravity(rail.gravity_mps2(), rail.mass_kg(), &config.constants);
    let angle = rail.angle_rad();
    let friction = if rail.angle_deg() >= 90.0 {
        0.0
    } else {
        config.constants.friction_coefficient * angle.cos()
    };
    g_eff * (angle.sin() - friction)
}

/// Drag-free final speed at the rail end, `sqrt(v0² + 2·a_eff·L)`.
///
/// `None` when the sphere would stop before the end.
#[must_use]
pub fn kinematic_final_speed(config: &SimConfig) -> Option<f64> {
    let rail = &config.rail;
    let v0 = rail.initial_speed_mps();
    let v_sq = 2.0f64.mul_add(drag_free_acceleration(config) * rail.rail_length_m(), v0 * v0);
    (v_sq > 0.0).then(|| v_sq.sqrt())
}

fn expectation_for(config: &SimConfig) -> Expectation {
    let rail = &config.rail;
    let kinematic = kinematic_final_speed(config);
    let g_eff = effective_gravity(rail.gravity_mps2(), rail.mass_kg(), &config.constants);
    let terminal = terminal_speed(rail.mass_kg(), g_eff, &config.constants);

    match (kinematic, terminal) {
        // A drop long enough to pass the drag-limited speed many times over.
        (Some(v), Some(v_t)) if rail.angle_deg() >= 90.0 && v > 3.0 * v_t => {
            Expectation::TerminalSpeed {
                terminal_mps: v_t,
                tolerance: 0.01,
            }
        }
        (Some(v), _) => Expectation::KinematicBound {
            bound_mps: v,
            max_drag_shortfall: 0.08,
        },
        (None, _) => Expectation::AtRest,
    }
}
