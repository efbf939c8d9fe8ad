//! Simulation state owned by the physics engine.
//!
//! Mutated only by [`InclineEngine`](crate::engine::InclineEngine) through
//! `tick`, `start`, `pause` and `reset`.

use serde::{Deserialize, Serialize};

/// Engine lifecycle phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Phase {
    /// Integration inactive; resumes on `start`.
    #[default]
    Paused,
    /// Integration active; each tick advances the sphere.
    Running,
    /// The sphere reached the rail end. Terminal until `reset`.
    AtRailEnd,
}

/// Kinematic and bookkeeping state of the sphere.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SimulationState {
    /// Simulated time since the last reset (s).
    pub elapsed_time_s: f64,
    /// Distance travelled along the rail, within [0, rail length] (m).
    pub displacement_m: f64,
    /// Speed along the rail, never negative (m/s).
    pub speed_mps: f64,
    /// Energy dissipated by dry friction (J), non-decreasing.
    pub friction_loss_j: f64,
    /// Energy dissipated by air drag (J), non-decreasing.
    pub drag_loss_j: f64,
    /// Lifecycle phase.
    pub phase: Phase,
    /// Timestamp of the last regular sample (s).
    pub last_sample_time_s: f64,
}

impl SimulationState {
    /// Fresh state at the top of the rail.
    ///
    /// The sampling clock starts one interval in the past so the first tick
    /// after a reset records a sample.
    #[must_use]
    pub fn initial(initial_speed_mps: f64, sample_interval_s: f64) -> Self {
        Self {
            elapsed_time_s: 0.0,
            displacement_m: 0.0,
            speed_mps: initial_speed_mps.max(0.0),
            friction_loss_j: 0.0,
            drag_loss_j: 0.0,
            phase: Phase::Paused,
            last_sample_time_s: -sample_interval_s,
        }
    }

    /// Whether integration is active.
    #[must_use]
    pub fn is_running(&self) -> bool {
        self.phase == Phase::Running
    }

    /// Whether the sphere has reached the rail end.
    #[must_use]
    pub fn at_rail_end(&self) -> bool {
        self.phase == Phase::AtRailEnd
    }

    /// Total dissipated energy (J).
    #[must_use]
    pub fn total_loss_j(&self) -> f64 {
        self.friction_loss_j + self.drag_loss_j
    }

    /// Check that every field is finite.
    #[must_use]
    pub fn all_finite(&self) -> bool {
        self.elapsed_time_s.is_finite()
            && self.displacement_m.is_finite()
            && self.speed_mps.is_finite()
            && self.friction_loss_j.is_finite()
            && self.drag_loss_j.is_finite()
    }
}
