//! Live telemetry and the time-sampled record of a run.

use std::collections::{vec_deque, VecDeque};

use serde::{Deserialize, Serialize};

use crate::config::RailConfig;
use crate::engine::forces::ForceBreakdown;
use crate::engine::state::SimulationState;

/// Derived physical quantities for the current tick.
///
/// Refreshed after every tick regardless of whether a sample was recorded.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Telemetry {
    /// Simulated time (s).
    pub time_s: f64,
    /// Distance along the rail (m).
    pub displacement_m: f64,
    /// Height above the rail end (m).
    pub height_m: f64,
    /// Speed along the rail (m/s).
    pub speed_mps: f64,
    /// Gravity setting in force (m/s²).
    pub gravity_mps2: f64,
    /// Net acceleration along the rail (m/s²).
    pub acceleration_mps2: f64,
    /// Gravity component parallel to the rail (N).
    pub gravity_parallel_n: f64,
    /// Dry friction (N).
    pub friction_n: f64,
    /// Air drag (N).
    pub drag_n: f64,
    /// Potential energy m·g·h (J).
    pub potential_j: f64,
    /// Kinetic energy ½·m·v² (J).
    pub kinetic_j: f64,
    /// PE + KE (J).
    pub total_j: f64,
    /// Cumulative friction loss (J).
    pub friction_loss_j: f64,
    /// Cumulative drag loss (J).
    pub drag_loss_j: f64,
    /// Horizontal speed component v·cos θ (m/s).
    pub horizontal_speed_mps: f64,
    /// Vertical speed component v·sin θ (m/s).
    pub vertical_speed_mps: f64,
}

impl Telemetry {
    /// Capture telemetry from the current state and the forces of the last
    /// tick.
    #[must_use]
    pub fn capture(rail: &RailConfig, state: &SimulationState, forces: &ForceBreakdown) -> Self {
        let angle = rail.angle_rad();
        let mass = rail.mass_kg();
        let speed = state.speed_mps;

        let height = (rail.rail_length_m() - state.displacement_m).max(0.0) * angle.sin();
        let potential = mass * rail.gravity_mps2() * height;
        let kinetic = 0.5 * mass * speed * speed;

        Self {
            time_s: state.elapsed_time_s,
            displacement_m: state.displacement_m,
            height_m: height,
            speed_mps: speed,
            gravity_mps2: rail.gravity_mps2(),
            acceleration_mps2: forces.acceleration_mps2,
            gravity_parallel_n: forces.gravity_parallel_n,
            friction_n: forces.friction_n,
            drag_n: forces.drag_n,
            potential_j: potential,
            kinetic_j: kinetic,
            total_j: potential + kinetic,
            friction_loss_j: state.friction_loss_j,
            drag_loss_j: state.drag_loss_j,
            horizontal_speed_mps: speed * angle.cos(),
            vertical_speed_mps: speed * angle.sin(),
        }
    }

    /// Mechanical energy plus everything dissipated so far (J).
    #[must_use]
    pub fn energy_ledger_j(&self) -> f64 {
        self.total_j + self.friction_loss_j + self.drag_loss_j
    }
}

/// Why a sample was recorded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SampleKind {
    /// Recorded on the regular sampling interval.
    #[default]
    Regular,
    /// Forced when the sphere reached the rail end.
    Terminal,
}

/// One immutable telemetry record.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Sample {
    /// Why this sample was recorded.
    pub kind: SampleKind,
    /// Timestamp (s).
    pub time_s: f64,
    /// Height above the rail end (m).
    pub height_m: f64,
    /// Speed along the rail (m/s).
    pub speed_mps: f64,
    /// Gravity setting in force (m/s²).
    pub gravity_mps2: f64,
    /// Net acceleration (m/s²).
    pub acceleration_mps2: f64,
    /// Gravity component parallel to the rail (N).
    pub gravity_parallel_n: f64,
    /// Dry friction (N).
    pub friction_n: f64,
    /// Air drag (N).
    pub drag_n: f64,
    /// Potential energy (J).
    pub potential_j: f64,
    /// Kinetic energy (J).
    pub kinetic_j: f64,
    /// PE + KE (J).
    pub total_j: f64,
    /// Cumulative friction loss (J).
    pub friction_loss_j: f64,
    /// Cumulative drag loss (J).
    pub drag_loss_j: f64,
    /// Horizontal speed component (m/s).
    pub horizontal_speed_mps: f64,
    /// Vertical speed component (m/s).
    pub vertical_speed_mps: f64,
}

impl Sample {
    /// Regular sample mirroring the live telemetry.
    #[must_use]
    pub fn regular(telemetry: &Telemetry) -> Self {
        Self {
            kind: SampleKind::Regular,
            time_s: telemetry.time_s,
            height_m: telemetry.height_m,
            speed_mps: telemetry.speed_mps,
            gravity_mps2: telemetry.gravity_mps2,
            acceleration_mps2: telemetry.acceleration_mps2,
            gravity_parallel_n: telemetry.gravity_parallel_n,
            friction_n: telemetry.friction_n,
            drag_n: telemetry.drag_n,
            potential_j: telemetry.potential_j,
            kinetic_j: telemetry.kinetic_j,
            total_j: telemetry.total_j,
            friction_loss_j: telemetry.friction_loss_j,
            drag_loss_j: telemetry.drag_loss_j,
            horizontal_speed_mps: telemetry.horizontal_speed_mps,
            vertical_speed_mps: telemetry.vertical_speed_mps,
        }
    }

    /// Terminal sample at the rail end: zero height and potential energy,
    /// timestamped at the end of the crossing tick.
    #[must_use]
    pub fn terminal(telemetry: &Telemetry, time_s: f64) -> Self {
        Self {
            kind: SampleKind::Terminal,
            time_s,
            height_m: 0.0,
            potential_j: 0.0,
            total_j: telemetry.kinetic_j,
            ..Self::regular(telemetry)
        }
    }

    /// Mechanical energy plus cumulative losses (J).
    #[must_use]
    pub fn energy_ledger_j(&self) -> f64 {
        self.total_j + self.friction_loss_j + self.drag_loss_j
    }
}

/// Ordered, append-only record of samples.
///
/// With a retention cap the oldest samples are evicted first.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SampleLog {
    samples: VecDeque<Sample>,
    max_samples: Option<usize>,
    evicted: u64,
}

impl SampleLog {
    /// Create an unbounded log.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a log retaining at most `max_samples` entries.
    #[must_use]
    pub fn with_capacity_limit(max_samples: Option<usize>) -> Self {
        Self {
            samples: VecDeque::new(),
            max_samples: max_samples.map(|m| m.max(1)),
            evicted: 0,
        }
    }

    /// Append a sample, evicting the oldest one when the cap is reached.
    pub fn push(&mut self, sample: Sample) {
        if let Some(max) = self.max_samples {
            if self.samples.len() >= max && self.samples.pop_front().is_some() {
                self.evicted += 1;
            }
        }
        self.samples.push_back(sample);
    }

    /// Drop every sample (reset).
    pub fn clear(&mut self) {
        self.samples.clear();
        self.evicted = 0;
    }

    /// Copy of the samples in recording order.
    #[must_use]
    pub fn to_vec(&self) -> Vec<Sample> {
        self.samples.iter().copied().collect()
    }

    /// Sample at `index` in recording order.
    #[must_use]
    pub fn get(&self, index: usize) -> Option<&Sample> {
        self.samples.get(index)
    }

    /// Iterate samples in recording order.
    pub fn iter(&self) -> vec_deque::Iter<'_, Sample> {
        self.samples.iter()
    }

    /// Number of retained samples.
    #[must_use]
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    /// Whether the log is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Most recent sample.
    #[must_use]
    pub fn last(&self) -> Option<&Sample> {
        self.samples.back()
    }

    /// Number of samples dropped by the retention cap since the last reset.
    #[must_use]
    pub const fn evicted(&self) -> u64 {
        self.evicted
    }

    /// Retention cap, if any.
    #[must_use]
    pub const fn max_samples(&self) -> Option<usize> {
        self.max_samples
    }

    /// Count samples of the given kind.
    #[must_use]
    pub fn count_kind(&self, kind: SampleKind) -> usize {
        self.samples.iter().filter(|s| s.kind == kind).count()
    }
}

impl<'a> IntoIterator for &'a SampleLog {
    type Item = &'a Sample;
    type IntoIter = vec_deque::Iter<'a, Sample>;

    fn into_iter(self) -> Self::IntoIter {
        self.samples.iter()
    }
}
