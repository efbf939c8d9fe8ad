//! Core simulation engine.
//!
//! [`InclineEngine`] owns the rail configuration, the sphere's state and the
//! sample log. All mutation funnels through `configure`, `start`, `pause`,
//! `reset` and `tick`.
//!
//! Each running tick is one semi-implicit Euler step:
//! - forces are evaluated at the start-of-step speed
//! - speed is updated first (clamped at zero), then displacement
//! - dissipated energy is accumulated from the pre-update speed
//! - crossing the rail end clamps the sphere and forces a terminal sample

pub mod clock;
pub mod forces;
pub mod jidoka;
pub mod shared;
pub mod state;
pub mod telemetry;

use log::{debug, trace, warn};
use serde::{Deserialize, Serialize};

pub use clock::{FixedStepDriver, FrameResult};
pub use forces::ForceBreakdown;
pub use jidoka::{GuardConfig, GuardResponse, InvariantGuard};
pub use shared::SharedEngine;
pub use state::{Phase, SimulationState};
pub use telemetry::{Sample, SampleKind, SampleLog, Telemetry};

use crate::config::{IntegrationConfig, PhysicalConstants, RailConfig, RailUpdate, SimConfig};
use crate::error::SimResult;
use crate::geometry::{self, RailGeometry, RailPose, Vec3};

/// Slack on the sampling comparison so accumulated rounding in
/// `elapsed_time_s` never skips a sample.
const SAMPLE_EPSILON: f64 = 1e-9;

/// What a single call to [`InclineEngine::tick`] did.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TickOutcome {
    /// Nothing happened: the engine is paused, at the rail end, or `dt` was
    /// not a positive finite number.
    Idle,
    /// The sphere advanced.
    Advanced {
        /// Whether a regular sample was recorded.
        sampled: bool,
    },
    /// The sphere reached the rail end on this tick.
    ReachedEnd,
}

/// How [`InclineEngine::run_to_end`] finished.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RunOutcome {
    /// The sphere reached the rail end.
    ReachedEnd {
        /// Ticks taken.
        steps: u64,
    },
    /// The step budget ran out first (e.g. a flat rail with no launch speed).
    StepLimit {
        /// Ticks taken.
        steps: u64,
    },
}

impl RunOutcome {
    /// Whether the rail end was reached.
    #[must_use]
    pub const fn reached_end(&self) -> bool {
        matches!(self, Self::ReachedEnd { .. })
    }

    /// Ticks taken.
    #[must_use]
    pub const fn steps(&self) -> u64 {
        match self {
            Self::ReachedEnd { steps } | Self::StepLimit { steps } => *steps,
        }
    }
}

/// Physics engine for a sphere on an inclined rail.
#[derive(Debug, Clone)]
pub struct InclineEngine {
    rail: RailConfig,
    constants: PhysicalConstants,
    integration: IntegrationConfig,
    anchor: Vec3,
    geometry: RailGeometry,
    state: SimulationState,
    forces: ForceBreakdown,
    telemetry: Telemetry,
    samples: SampleLog,
    tick_count: u64,
}

impl Default for InclineEngine {
    fn default() -> Self {
        Self::from_checked(SimConfig::default())
    }
}

impl InclineEngine {
    /// Create a new engine from configuration.
    ///
    /// # Errors
    ///
    /// Returns error if the physical constants or integration settings fail
    /// validation.
    pub fn new(mut config: SimConfig) -> SimResult<Self> {
        config.check()?;
        config.rail = config.rail.clamped();
        Ok(Self::from_checked(config))
    }

    fn from_checked(config: SimConfig) -> Self {
        let SimConfig {
            rail,
            constants,
            integration,
            anchor,
            ..
        } = config;

        let mut engine = Self {
            rail,
            constants,
            integration,
            anchor,
            geometry: geometry::resolve(rail.angle_deg(), rail.rail_length_m(), anchor),
            state: SimulationState::initial(rail.initial_speed_mps(), integration.sample_interval_s),
            forces: ForceBreakdown::default(),
            telemetry: Telemetry::default(),
            samples: SampleLog::with_capacity_limit(integration.max_samples),
            tick_count: 0,
        };
        engine.refresh_forces();
        engine
    }

    // ===== Control surface =====

    /// Merge a partial rail update. State is kept; geometry is recomputed
    /// when the angle or length changed.
    ///
    /// A rail shortened below the current displacement is clamped by the next
    /// running tick.
    pub fn configure(&mut self, update: RailUpdate) {
        let before = self.rail;
        update.apply_to(&mut self.rail);

        if self.rail.geometry_differs(&before) {
            self.geometry =
                geometry::resolve(self.rail.angle_deg(), self.rail.rail_length_m(), self.anchor);
            debug!(
                "rail geometry: angle {}°, length {} m",
                self.rail.angle_deg(),
                self.rail.rail_length_m()
            );
        }

        if update.initial_speed_mps.is_some() && self.is_pristine() {
            self.state.speed_mps = self.rail.initial_speed_mps();
        }

        self.refresh_forces();
    }

    /// Set the incline angle (degrees), clamped to [0, 90].
    pub fn set_angle(&mut self, deg: f64) {
        self.configure(RailUpdate {
            angle_deg: Some(deg),
            ..RailUpdate::default()
        });
    }

    /// Set the rail length (m), clamped to [1, 1000].
    pub fn set_rail_length(&mut self, meters: f64) {
        self.configure(RailUpdate {
            rail_length_m: Some(meters),
            ..RailUpdate::default()
        });
    }

    /// Set gravitational acceleration (m/s²), clamped to [1, 274].
    pub fn set_gravity(&mut self, mps2: f64) {
        self.configure(RailUpdate {
            gravity_mps2: Some(mps2),
            ..RailUpdate::default()
        });
    }

    /// Set the sphere mass (kg), clamped to [1, 100].
    pub fn set_mass(&mut self, kg: f64) {
        self.configure(RailUpdate {
            mass_kg: Some(kg),
            ..RailUpdate::default()
        });
    }

    /// Set the launch speed (m/s), clamped to [0, 1000].
    ///
    /// Applied immediately on a pristine engine, otherwise at the next reset.
    pub fn set_initial_speed(&mut self, mps: f64) {
        self.configure(RailUpdate {
            initial_speed_mps: Some(mps),
            ..RailUpdate::default()
        });
    }

    /// Begin or resume integration. No-op at the rail end.
    pub fn start(&mut self) {
        match self.state.phase {
            Phase::Paused => {
                self.state.phase = Phase::Running;
                debug!("running at t={:.4}s", self.state.elapsed_time_s);
            }
            Phase::Running => {}
            Phase::AtRailEnd => debug!("start ignored: sphere is at the rail end"),
        }
    }

    /// Alias for [`start`](Self::start).
    pub fn play(&mut self) {
        self.start();
    }

    /// Suspend integration without touching state.
    pub fn pause(&mut self) {
        if self.state.phase == Phase::Running {
            self.state.phase = Phase::Paused;
            debug!("paused at t={:.4}s", self.state.elapsed_time_s);
        }
    }

    /// Flip between running and paused.
    pub fn toggle(&mut self) {
        if self.state.is_running() {
            self.pause();
        } else {
            self.start();
        }
    }

    /// Return to the top of the rail at the configured launch speed, clear
    /// the losses and the sample log, and pause.
    pub fn reset(&mut self) {
        self.state = SimulationState::initial(
            self.rail.initial_speed_mps(),
            self.integration.sample_interval_s,
        );
        self.samples.clear();
        self.tick_count = 0;
        self.refresh_forces();
        debug!("reset: initial speed {} m/s", self.state.speed_mps);
    }

    /// Set the launch speed, then [`reset`](Self::reset).
    pub fn reset_with_speed(&mut self, initial_speed_mps: f64) {
        self.rail.set_initial_speed_mps(initial_speed_mps);
        self.reset();
    }

    // ===== Integration =====

    /// Advance the simulation by `dt` seconds.
    ///
    /// Never fails: a paused or finished engine and a non-positive or
    /// non-finite `dt` are all no-ops.
    pub fn tick(&mut self, dt: f64) -> TickOutcome {
        if !self.state.is_running() {
            return TickOutcome::Idle;
        }
        if !(dt.is_finite() && dt > 0.0) {
            warn!("tick ignored: invalid dt {dt}");
            return TickOutcome::Idle;
        }

        let speed_before = self.state.speed_mps;
        let forces = ForceBreakdown::evaluate(&self.rail, &self.constants, speed_before);

        let speed = (speed_before + forces.acceleration_mps2 * dt).max(0.0);
        self.state.speed_mps = speed;
        self.state.displacement_m += speed * dt;

        self.state.friction_loss_j += forces.friction_n * speed_before * dt;
        self.state.drag_loss_j += forces.drag_n * speed_before * dt;

        self.forces = forces;
        self.tick_count += 1;

        let length = self.rail.rail_length_m();
        if self.state.displacement_m >= length {
            self.state.displacement_m = length;
            self.state.phase = Phase::AtRailEnd;
            self.refresh_telemetry();

            let sample = Sample::terminal(&self.telemetry, self.state.elapsed_time_s + dt);
            trace!("terminal sample: {sample:?}");
            self.samples.push(sample);

            debug!(
                "rail end reached at t={:.4}s, speed {:.4} m/s",
                sample.time_s, sample.speed_mps
            );
            return TickOutcome::ReachedEnd;
        }

        self.state.elapsed_time_s += dt;
        self.refresh_telemetry();

        let since_last = self.state.elapsed_time_s - self.state.last_sample_time_s;
        let sampled = since_last >= self.integration.sample_interval_s - SAMPLE_EPSILON;
        if sampled {
            let sample = Sample::regular(&self.telemetry);
            trace!("sample: {sample:?}");
            self.samples.push(sample);
            self.state.last_sample_time_s = self.state.elapsed_time_s;
        }

        TickOutcome::Advanced { sampled }
    }

    /// Advance by the configured time step.
    pub fn step(&mut self) -> TickOutcome {
        self.tick(self.integration.dt)
    }

    /// Start the engine and step until the rail end or `max_steps` ticks.
    pub fn run_to_end(&mut self, max_steps: u64) -> RunOutcome {
        if self.state.at_rail_end() {
            return RunOutcome::ReachedEnd { steps: 0 };
        }
        self.start();

        let mut steps = 0;
        while steps < max_steps {
            match self.step() {
                TickOutcome::ReachedEnd => return RunOutcome::ReachedEnd { steps: steps + 1 },
                TickOutcome::Advanced { .. } => steps += 1,
                TickOutcome::Idle => break,
            }
        }
        RunOutcome::StepLimit { steps }
    }

    fn refresh_forces(&mut self) {
        self.forces = ForceBreakdown::evaluate(&self.rail, &self.constants, self.state.speed_mps);
        self.refresh_telemetry();
    }

    fn refresh_telemetry(&mut self) {
        self.telemetry = Telemetry::capture(&self.rail, &self.state, &self.forces);
    }

    fn is_pristine(&self) -> bool {
        self.state.phase == Phase::Paused
            && self.state.elapsed_time_s == 0.0
            && self.state.displacement_m == 0.0
            && self.samples.is_empty()
    }

    // ===== Queries =====

    /// Rail end points plus the sphere's world position.
    #[must_use]
    pub fn pose(&self) -> RailPose {
        RailPose {
            rail_start: self.geometry.start,
            rail_end: self.geometry.end,
            ball_position: self.geometry.point_at(self.state.displacement_m),
        }
    }

    /// Resolved rail geometry.
    #[must_use]
    pub const fn geometry(&self) -> &RailGeometry {
        &self.geometry
    }

    /// Latest telemetry snapshot.
    #[must_use]
    pub const fn telemetry(&self) -> &Telemetry {
        &self.telemetry
    }

    /// Forces evaluated on the last tick.
    #[must_use]
    pub const fn forces(&self) -> &ForceBreakdown {
        &self.forces
    }

    /// Recorded samples since the last reset.
    #[must_use]
    pub const fn samples(&self) -> &SampleLog {
        &self.samples
    }

    /// Current simulation state.
    #[must_use]
    pub const fn state(&self) -> &SimulationState {
        &self.state
    }

    /// Lifecycle phase.
    #[must_use]
    pub const fn phase(&self) -> Phase {
        self.state.phase
    }

    /// Whether integration is active.
    #[must_use]
    pub fn is_running(&self) -> bool {
        self.state.is_running()
    }

    /// Live rail configuration.
    #[must_use]
    pub const fn rail(&self) -> &RailConfig {
        &self.rail
    }

    /// Physical constants.
    #[must_use]
    pub const fn constants(&self) -> &PhysicalConstants {
        &self.constants
    }

    /// Integration settings.
    #[must_use]
    pub const fn integration(&self) -> &IntegrationConfig {
        &self.integration
    }

    /// Fixed physics time step (s).
    #[must_use]
    pub const fn dt(&self) -> f64 {
        self.integration.dt
    }

    /// Ticks integrated since the last reset.
    #[must_use]
    pub const fn tick_count(&self) -> u64 {
        self.tick_count
    }

    /// Rebuild the full configuration this engine is running with.
    #[must_use]
    pub fn config(&self) -> SimConfig {
        SimConfig {
            rail: self.rail,
            constants: self.constants,
            integration: self.integration,
            anchor: self.anchor,
            ..SimConfig::default()
        }
    }
}
