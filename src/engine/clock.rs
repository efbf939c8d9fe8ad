//! Fixed-timestep driver.
//!
//! Decouples the render cadence from the physics cadence: wall-clock frame
//! time is accumulated and drained in whole `dt` ticks, carrying the
//! remainder to the next frame. A cap on substeps per frame keeps a slow
//! frame from stalling the caller (spiral of death); the excess is dropped.

use serde::{Deserialize, Serialize};

use crate::engine::{InclineEngine, TickOutcome};

/// Default cap on physics ticks per frame.
pub const DEFAULT_MAX_SUBSTEPS: u32 = 64;

/// Outcome of one [`FixedStepDriver::advance`] call.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct FrameResult {
    /// Physics ticks performed this frame.
    pub substeps: u32,
    /// Simulated time advanced this frame (s).
    pub sim_time_advanced: f64,
    /// Frame time discarded because of the substep cap (s).
    pub dropped_secs: f64,
    /// Whether the sphere reached the rail end during this frame.
    pub reached_end: bool,
    /// Whether the per-tick observer stopped the frame.
    pub halted: bool,
}

/// Accumulator-based fixed-step driver.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FixedStepDriver {
    /// Physics time step (s).
    dt: f64,
    /// Unconsumed frame time (s).
    accumulator: f64,
    /// Cap on ticks per frame.
    max_substeps: u32,
    /// Ticks performed since creation or reset.
    step_count: u64,
}

impl FixedStepDriver {
    /// Create a driver ticking at `dt` seconds.
    ///
    /// # Panics
    ///
    /// Panics if `dt` is not positive or not finite.
    #[must_use]
    pub fn new(dt: f64) -> Self {
        assert!(dt > 0.0, "Timestep must be positive");
        assert!(dt.is_finite(), "Timestep must be finite");

        Self {
            dt,
            accumulator: 0.0,
            max_substeps: DEFAULT_MAX_SUBSTEPS,
            step_count: 0,
        }
    }

    /// Create a driver using the engine's configured time step.
    #[must_use]
    pub fn for_engine(engine: &InclineEngine) -> Self {
        Self::new(engine.dt())
    }

    /// Set the cap on ticks per frame (at least one).
    #[must_use]
    pub fn with_max_substeps(mut self, max_substeps: u32) -> Self {
        self.max_substeps = max_substeps.max(1);
        self
    }

    /// Physics time step (s).
    #[must_use]
    pub const fn dt(&self) -> f64 {
        self.dt
    }

    /// Unconsumed frame time (s).
    #[must_use]
    pub const fn accumulator(&self) -> f64 {
        self.accumulator
    }

    /// Ticks performed since creation or reset.
    #[must_use]
    pub const fn step_count(&self) -> u64 {
        self.step_count
    }

    /// Clear the accumulator and the step counter.
    pub fn reset(&mut self) {
        self.accumulator = 0.0;
        self.step_count = 0;
    }

    /// Feed `frame_secs` of wall-clock time and tick the engine as many
    /// whole steps as fit.
    ///
    /// Stops early when the engine stops running; leftover time is discarded
    /// in that case so a later resume does not burst.
    pub fn advance(&mut self, engine: &mut InclineEngine, frame_secs: f64) -> FrameResult {
        self.advance_with(engine, frame_secs, |_| true)
    }

    /// Like [`advance`](Self::advance), calling `on_tick` after every tick.
    ///
    /// Returning `false` from `on_tick` halts the frame and sets
    /// [`FrameResult::halted`].
    pub fn advance_with<F>(
        &mut self,
        engine: &mut InclineEngine,
        frame_secs: f64,
        mut on_tick: F,
    ) -> FrameResult
    where
        F: FnMut(&InclineEngine) -> bool,
    {
        let mut result = FrameResult::default();
        if !(frame_secs.is_finite() && frame_secs > 0.0) {
            return result;
        }
        if !engine.is_running() {
            self.accumulator = 0.0;
            return result;
        }

        self.accumulator += frame_secs;

        while self.accumulator >= self.dt {
            if result.substeps >= self.max_substeps {
                result.dropped_secs = self.accumulator - self.accumulator % self.dt;
                self.accumulator %= self.dt;
                break;
            }

            let outcome = engine.tick(self.dt);
            self.accumulator -= self.dt;

            if outcome == TickOutcome::Idle {
                self.accumulator = 0.0;
                break;
            }

            result.substeps += 1;
            result.sim_time_advanced += self.dt;
            self.step_count += 1;

            if !on_tick(engine) {
                result.halted = true;
                self.accumulator = 0.0;
                break;
            }
            if outcome == TickOutcome::ReachedEnd {
                result.reached_end = true;
                self.accumulator = 0.0;
                break;
            }
        }

        result
    }
}

impl Default for FixedStepDriver {
    fn default() -> Self {
        Self::new(0.0025)
    }
}
